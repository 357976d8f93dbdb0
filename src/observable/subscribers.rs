// Subscriber list - registration-ordered change callbacks

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle for removing a registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Plain callback registry invoked synchronously on every change
///
/// Callbacks run in registration order. The list is snapshotted before
/// invocation, so a callback may subscribe or unsubscribe (even itself)
/// without disturbing the notification in flight.
pub(crate) struct Subscribers<E> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Rc<dyn Fn(&E)>)>>,
}

impl<E> Subscribers<E> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, callback: impl Fn(&E) + 'static) -> SubscriberId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let callback: Rc<dyn Fn(&E)> = Rc::new(callback);
        self.entries.borrow_mut().push((id, callback));
        SubscriberId(id)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id.0);
        entries.len() != before
    }

    pub(crate) fn notify(&self, event: &E) {
        let callbacks: Vec<Rc<dyn Fn(&E)>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let subscribers: Subscribers<i32> = Subscribers::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            subscribers.subscribe(move |value| seen.borrow_mut().push((tag, *value)));
        }

        subscribers.notify(&7);

        assert_eq!(
            *seen.borrow(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let subscribers: Subscribers<()> = Subscribers::new();
        let count = Rc::new(Cell::new(0));

        let a = Rc::clone(&count);
        let keep = subscribers.subscribe(move |_| a.set(a.get() + 1));
        let b = Rc::clone(&count);
        let drop_me = subscribers.subscribe(move |_| b.set(b.get() + 10));

        assert!(subscribers.unsubscribe(drop_me));
        assert!(!subscribers.unsubscribe(drop_me));
        subscribers.notify(&());

        assert_eq!(count.get(), 1);
        let _ = keep;
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let subscribers: Rc<Subscribers<()>> = Rc::new(Subscribers::new());
        let fired = Rc::new(Cell::new(0));

        let id_slot: Rc<Cell<Option<SubscriberId>>> = Rc::new(Cell::new(None));
        let inner_subscribers = Rc::clone(&subscribers);
        let inner_slot = Rc::clone(&id_slot);
        let inner_fired = Rc::clone(&fired);
        let id = subscribers.subscribe(move |_| {
            inner_fired.set(inner_fired.get() + 1);
            if let Some(id) = inner_slot.get() {
                inner_subscribers.unsubscribe(id);
            }
        });
        id_slot.set(Some(id));

        subscribers.notify(&());
        subscribers.notify(&());

        assert_eq!(fired.get(), 1);
    }
}
