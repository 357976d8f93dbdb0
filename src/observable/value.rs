// Transactable<T> - single-value container with transactional writes

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::history::context::UndoContext;
use crate::history::operation::Operation;
use crate::observable::subscribers::{SubscriberId, Subscribers};

/// Payload of a value-change notification
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange<T> {
    pub previous: T,
    pub current: T,
}

struct ValueState<T> {
    value: RefCell<T>,
    subscribers: Subscribers<ValueChange<T>>,
}

/// A single typed value whose writes participate in undo/redo
///
/// While a transaction is ambient on the bound context, `set` is captured as
/// an operation (apply = new value, undo = previous value) and applied
/// through it, so rolling the transaction back restores the exact prior
/// value. Outside a transaction, `set` applies directly and is not
/// undoable.
///
/// Writing a value equal to the current one is a complete no-op: nothing is
/// recorded and no notification fires.
pub struct Transactable<T> {
    ctx: UndoContext,
    state: Rc<ValueState<T>>,
}

impl<T: Clone + PartialEq + 'static> Transactable<T> {
    pub fn new(ctx: &UndoContext, value: T) -> Self {
        Self {
            ctx: ctx.clone(),
            state: Rc::new(ValueState {
                value: RefCell::new(value),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.state.value.borrow().clone()
    }

    /// Read the current value without cloning it
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.value.borrow())
    }

    /// Write a new value
    ///
    /// Equal values are suppressed; distinct values transition the container
    /// and notify subscribers with (previous, current) exactly once.
    pub fn set(&self, value: T) {
        if *self.state.value.borrow() == value {
            return;
        }
        if !self.ctx.in_transaction() {
            Self::transition(&self.state, value);
            return;
        }
        let previous = self.state.value.borrow().clone();
        let apply_state = Rc::clone(&self.state);
        let undo_state = Rc::clone(&self.state);
        self.ctx.record(Operation::new(
            move || Self::transition(&apply_state, value.clone()),
            move || Self::transition(&undo_state, previous.clone()),
        ));
    }

    /// Register a change callback; fires on every actual transition
    pub fn subscribe(&self, callback: impl Fn(&ValueChange<T>) + 'static) -> SubscriberId {
        self.state.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.state.subscribers.unsubscribe(id)
    }

    /// Replace the stored value and notify, no capture involved
    ///
    /// Shared by direct writes and by the apply/undo closures, which is what
    /// keeps replayed transitions observable to the UI.
    fn transition(state: &Rc<ValueState<T>>, next: T) {
        let previous = state.value.replace(next.clone());
        state.subscribers.notify(&ValueChange {
            previous,
            current: next,
        });
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Transactable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transactable")
            .field(&*self.state.value.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_direct_set_outside_transaction() {
        let ctx = UndoContext::new();
        let value = Transactable::new(&ctx, 1);

        value.set(2);

        assert_eq!(value.get(), 2);
        assert!(!ctx.can_undo());
    }

    #[test]
    fn test_set_inside_transaction_is_undoable() {
        let ctx = UndoContext::new();
        let name = Transactable::new(&ctx, "A".to_string());

        let tx = ctx.begin("rename");
        name.set("B".to_string());
        tx.commit().unwrap();
        assert_eq!(name.get(), "B");

        ctx.undo().unwrap();
        assert_eq!(name.get(), "A");

        ctx.redo().unwrap();
        assert_eq!(name.get(), "B");
    }

    #[test]
    fn test_noop_write_records_and_notifies_nothing() {
        let ctx = UndoContext::new();
        let value = Transactable::new(&ctx, 5);
        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        value.subscribe(move |_| counter.set(counter.get() + 1));

        let tx = ctx.begin("noop");
        value.set(5);
        assert_eq!(tx.operation_count(), 0);
        tx.commit().unwrap();

        assert_eq!(notified.get(), 0);
        assert!(!ctx.can_undo());
    }

    #[test]
    fn test_noop_write_on_empty_sentinel() {
        let ctx = UndoContext::new();
        let value: Transactable<Option<u32>> = Transactable::new(&ctx, None);

        let tx = ctx.begin("noop");
        value.set(None);
        assert_eq!(tx.operation_count(), 0);
        tx.cancel().unwrap();
    }

    #[test]
    fn test_notification_carries_previous_and_current() {
        let ctx = UndoContext::new();
        let value = Transactable::new(&ctx, 10);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        value.subscribe(move |change| sink.borrow_mut().push((change.previous, change.current)));

        let tx = ctx.begin("edit");
        value.set(20);
        tx.commit().unwrap();
        ctx.undo().unwrap();
        ctx.redo().unwrap();

        assert_eq!(*seen.borrow(), vec![(10, 20), (20, 10), (10, 20)]);
    }

    #[test]
    fn test_cancel_restores_previous_value() {
        let ctx = UndoContext::new();
        let value = Transactable::new(&ctx, 1);

        let tx = ctx.begin("edit");
        value.set(2);
        value.set(3);
        tx.cancel().unwrap();

        assert_eq!(value.get(), 1);
    }

    #[test]
    fn test_multiple_writes_in_one_transaction_replay_exactly() {
        let ctx = UndoContext::new();
        let value = Transactable::new(&ctx, 0);

        let tx = ctx.begin("steps");
        value.set(1);
        value.set(2);
        value.set(3);
        tx.commit().unwrap();

        ctx.undo().unwrap();
        assert_eq!(value.get(), 0);
        ctx.redo().unwrap();
        assert_eq!(value.get(), 3);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let ctx = UndoContext::new();
        let value = Transactable::new(&ctx, 0);
        let notified = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notified);
        let id = value.subscribe(move |_| counter.set(counter.get() + 1));

        value.set(1);
        assert!(value.unsubscribe(id));
        value.set(2);

        assert_eq!(notified.get(), 1);
    }
}
