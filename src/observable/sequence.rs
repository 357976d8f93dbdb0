// TransactableSequence<T> - ordered observable container with undoable
// structural mutations
//
// Every primitive (insert/remove/move/replace/clear) has an exact structural
// inverse, captured as an Operation while a transaction is ambient. The
// `replaying` flag is the reentrancy guard: it marks the window in which the
// engine itself drives the structural primitives (operation apply during
// capture, and undo/replay later), so those calls are never wrapped into a
// fresh Operation.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::history::context::UndoContext;
use crate::history::operation::Operation;
use crate::observable::subscribers::{SubscriberId, Subscribers};

/// Structural-change descriptor delivered to subscribers
///
/// Bulk mutations notify per affected item (`add_range` as a run of
/// `Inserted`), except `clear`, which reports the removed items in one
/// `Cleared` event.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceChange<T> {
    Inserted { index: usize, item: T },
    Removed { index: usize, item: T },
    Moved { from: usize, to: usize },
    Replaced { index: usize, previous: T, current: T },
    Cleared { items: Vec<T> },
}

struct SequenceState<T> {
    items: RefCell<Vec<T>>,
    subscribers: Subscribers<SequenceChange<T>>,
    /// Reentrancy guard; true while the engine drives the primitives
    replaying: Cell<bool>,
}

/// Scoped hold on the reentrancy flag; restores the prior value on exit so a
/// panicking observer cannot leave the flag stuck.
struct ReplayScope<'a> {
    flag: &'a Cell<bool>,
    prev: bool,
}

impl<'a> ReplayScope<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let prev = flag.replace(true);
        Self { flag, prev }
    }
}

impl Drop for ReplayScope<'_> {
    fn drop(&mut self) {
        self.flag.set(self.prev);
    }
}

/// An ordered collection whose structural mutations participate in undo/redo
///
/// Index arguments follow `Vec` semantics, including panics on out-of-range
/// indexes. Mutations outside a transaction apply directly and are not
/// undoable.
pub struct TransactableSequence<T> {
    ctx: UndoContext,
    state: Rc<SequenceState<T>>,
}

impl<T: Clone + 'static> TransactableSequence<T> {
    pub fn new(ctx: &UndoContext) -> Self {
        Self::with_items(ctx, Vec::new())
    }

    pub fn with_items(ctx: &UndoContext, items: Vec<T>) -> Self {
        Self {
            ctx: ctx.clone(),
            state: Rc::new(SequenceState {
                items: RefCell::new(items),
                subscribers: Subscribers::new(),
                replaying: Cell::new(false),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.state.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.state.items.borrow().get(index).cloned()
    }

    /// Copy of the current items in order
    pub fn snapshot(&self) -> Vec<T> {
        self.state.items.borrow().clone()
    }

    /// True when the next mutation should be captured into a transaction
    fn capturing(&self) -> bool {
        !self.state.replaying.get() && self.ctx.in_transaction()
    }

    pub fn insert(&self, index: usize, item: T) {
        if !self.capturing() {
            Self::apply_insert(&self.state, index, item);
            return;
        }
        let _guard = ReplayScope::enter(&self.state.replaying);
        let apply_state = Rc::clone(&self.state);
        let undo_state = Rc::clone(&self.state);
        self.ctx.record(Operation::new(
            move || Self::replay_insert(&apply_state, index, item.clone()),
            move || {
                Self::replay_remove(&undo_state, index);
            },
        ));
    }

    /// Append at the tail
    pub fn push(&self, item: T) {
        let index = self.len();
        self.insert(index, item);
    }

    /// Append every item at the tail, each captured as its own mutation
    pub fn add_range(&self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.push(item);
        }
    }

    pub fn remove_at(&self, index: usize) -> T {
        if !self.capturing() {
            return Self::apply_remove(&self.state, index);
        }
        let _guard = ReplayScope::enter(&self.state.replaying);
        let removed = self.state.items.borrow()[index].clone();
        let restored = removed.clone();
        let apply_state = Rc::clone(&self.state);
        let undo_state = Rc::clone(&self.state);
        self.ctx.record(Operation::new(
            move || {
                Self::replay_remove(&apply_state, index);
            },
            move || Self::replay_insert(&undo_state, index, restored.clone()),
        ));
        removed
    }

    /// Relocate one item; `new_index` addresses the list after removal
    pub fn move_item(&self, old_index: usize, new_index: usize) {
        if old_index == new_index {
            return;
        }
        if !self.capturing() {
            Self::apply_move(&self.state, old_index, new_index);
            return;
        }
        let _guard = ReplayScope::enter(&self.state.replaying);
        let apply_state = Rc::clone(&self.state);
        let undo_state = Rc::clone(&self.state);
        self.ctx.record(Operation::new(
            move || Self::replay_move(&apply_state, old_index, new_index),
            move || Self::replay_move(&undo_state, new_index, old_index),
        ));
    }

    /// Replace the item at `index`, returning the previous one
    pub fn set_at(&self, index: usize, item: T) -> T {
        if !self.capturing() {
            return Self::apply_set(&self.state, index, item);
        }
        let _guard = ReplayScope::enter(&self.state.replaying);
        let previous = self.state.items.borrow()[index].clone();
        let restored = previous.clone();
        let apply_state = Rc::clone(&self.state);
        let undo_state = Rc::clone(&self.state);
        self.ctx.record(Operation::new(
            move || {
                Self::replay_set(&apply_state, index, item.clone());
            },
            move || {
                Self::replay_set(&undo_state, index, restored.clone());
            },
        ));
        previous
    }

    /// Remove every item
    ///
    /// Undo restores the full snapshot at the head in original order.
    pub fn clear(&self) {
        if self.is_empty() {
            return;
        }
        if !self.capturing() {
            Self::apply_clear(&self.state);
            return;
        }
        let _guard = ReplayScope::enter(&self.state.replaying);
        let snapshot = self.state.items.borrow().clone();
        let apply_state = Rc::clone(&self.state);
        let undo_state = Rc::clone(&self.state);
        self.ctx.record(Operation::new(
            move || {
                Self::replay_clear(&apply_state);
            },
            move || Self::replay_restore(&undo_state, snapshot.clone()),
        ));
    }

    /// Register a change callback; fires on every structural mutation,
    /// direct or replayed
    pub fn subscribe(&self, callback: impl Fn(&SequenceChange<T>) + 'static) -> SubscriberId {
        self.state.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.state.subscribers.unsubscribe(id)
    }

    // Base primitives: mutate, release the borrow, then notify. No capture
    // logic here; these are what the operation closures drive.

    fn apply_insert(state: &Rc<SequenceState<T>>, index: usize, item: T) {
        state.items.borrow_mut().insert(index, item.clone());
        state
            .subscribers
            .notify(&SequenceChange::Inserted { index, item });
    }

    fn apply_remove(state: &Rc<SequenceState<T>>, index: usize) -> T {
        let item = state.items.borrow_mut().remove(index);
        state.subscribers.notify(&SequenceChange::Removed {
            index,
            item: item.clone(),
        });
        item
    }

    fn apply_move(state: &Rc<SequenceState<T>>, from: usize, to: usize) {
        {
            let mut items = state.items.borrow_mut();
            let item = items.remove(from);
            items.insert(to, item);
        }
        state.subscribers.notify(&SequenceChange::Moved { from, to });
    }

    fn apply_set(state: &Rc<SequenceState<T>>, index: usize, item: T) -> T {
        let previous = std::mem::replace(&mut state.items.borrow_mut()[index], item.clone());
        state.subscribers.notify(&SequenceChange::Replaced {
            index,
            previous: previous.clone(),
            current: item,
        });
        previous
    }

    fn apply_clear(state: &Rc<SequenceState<T>>) -> Vec<T> {
        let items = std::mem::take(&mut *state.items.borrow_mut());
        state.subscribers.notify(&SequenceChange::Cleared {
            items: items.clone(),
        });
        items
    }

    // Replay entries: same primitives with the reentrancy flag held, used by
    // operation closures so their structural calls are never re-captured.

    fn replay_insert(state: &Rc<SequenceState<T>>, index: usize, item: T) {
        let _scope = ReplayScope::enter(&state.replaying);
        Self::apply_insert(state, index, item);
    }

    fn replay_remove(state: &Rc<SequenceState<T>>, index: usize) -> T {
        let _scope = ReplayScope::enter(&state.replaying);
        Self::apply_remove(state, index)
    }

    fn replay_move(state: &Rc<SequenceState<T>>, from: usize, to: usize) {
        let _scope = ReplayScope::enter(&state.replaying);
        Self::apply_move(state, from, to);
    }

    fn replay_set(state: &Rc<SequenceState<T>>, index: usize, item: T) -> T {
        let _scope = ReplayScope::enter(&state.replaying);
        Self::apply_set(state, index, item)
    }

    fn replay_clear(state: &Rc<SequenceState<T>>) -> Vec<T> {
        let _scope = ReplayScope::enter(&state.replaying);
        Self::apply_clear(state)
    }

    fn replay_restore(state: &Rc<SequenceState<T>>, items: Vec<T>) {
        let _scope = ReplayScope::enter(&state.replaying);
        for (index, item) in items.into_iter().enumerate() {
            Self::apply_insert(state, index, item);
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for TransactableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.state.items.borrow().iter()).finish()
    }
}
