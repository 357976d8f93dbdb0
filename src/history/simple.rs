// SimpleHistory - single-object undo/redo without the shared context
//
// A narrower front-end over the same transaction primitives: one unbounded
// undo stack, one redo stack, no capacity eviction, no suspension machinery.
// Meant for widgets that keep their own local history (a formula editor, a
// label field) instead of participating in the document-wide one.

use crate::history::context::UndoContext;
use crate::history::error::HistoryError;
use crate::history::transaction::{CommittedTransaction, Transaction};

/// Minimal undo/redo stack pair scoped to one object
///
/// Owns a private [`UndoContext`] so its transactables never touch the
/// document-wide history; committed transactions go straight onto this
/// history's own stack.
pub struct SimpleHistory {
    ctx: UndoContext,
    undo_stack: Vec<CommittedTransaction>,
    redo_stack: Vec<CommittedTransaction>,
}

impl SimpleHistory {
    pub fn new() -> Self {
        Self {
            // Capacity 0: a stray Transaction::commit on this context records
            // nothing; everything reaches the stacks through commit() below.
            ctx: UndoContext::with_capacity(0),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Context to bind this history's transactables to
    pub fn context(&self) -> &UndoContext {
        &self.ctx
    }

    /// Open a transaction on the private context
    pub fn begin(&self, name: impl Into<String>) -> Transaction {
        self.ctx.begin(name)
    }

    /// Complete a transaction onto the undo stack
    ///
    /// Zero-operation transactions are dropped. New forward work invalidates
    /// the redo stack.
    pub fn commit(&mut self, tx: Transaction) -> Result<(), HistoryError> {
        if let Some(record) = tx.commit_detached()? {
            self.undo_stack.push(record);
            self.redo_stack.clear();
        }
        Ok(())
    }

    /// Roll back the most recent transaction, if any
    pub fn undo(&mut self) -> Result<Option<String>, HistoryError> {
        let Some(mut tx) = self.undo_stack.pop() else {
            return Ok(None);
        };
        tx.rollback()?;
        let name = tx.name().to_string();
        self.redo_stack.push(tx);
        Ok(Some(name))
    }

    /// Replay the most recently undone transaction, if any
    pub fn redo(&mut self) -> Result<Option<String>, HistoryError> {
        let Some(mut tx) = self.redo_stack.pop() else {
            return Ok(None);
        };
        tx.replay()?;
        let name = tx.name().to_string();
        self.undo_stack.push(tx);
        Ok(Some(name))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for SimpleHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::operation::Operation;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_op(counter: &Rc<Cell<i32>>) -> Operation {
        let up = Rc::clone(counter);
        let down = Rc::clone(counter);
        Operation::new(
            move || up.set(up.get() + 1),
            move || down.set(down.get() - 1),
        )
    }

    #[test]
    fn test_commit_undo_redo_cycle() {
        let mut history = SimpleHistory::new();
        let counter = Rc::new(Cell::new(0));

        let tx = history.begin("bump");
        tx.perform(counting_op(&counter)).unwrap();
        history.commit(tx).unwrap();
        assert_eq!(counter.get(), 1);
        assert!(history.can_undo());

        assert_eq!(history.undo().unwrap().as_deref(), Some("bump"));
        assert_eq!(counter.get(), 0);
        assert!(history.can_redo());

        assert_eq!(history.redo().unwrap().as_deref(), Some("bump"));
        assert_eq!(counter.get(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_history_is_a_noop() {
        let mut history = SimpleHistory::new();
        assert_eq!(history.undo().unwrap(), None);
        assert_eq!(history.redo().unwrap(), None);
    }

    #[test]
    fn test_new_commit_clears_redo_stack() {
        let mut history = SimpleHistory::new();
        let counter = Rc::new(Cell::new(0));

        let tx = history.begin("first");
        tx.perform(counting_op(&counter)).unwrap();
        history.commit(tx).unwrap();
        history.undo().unwrap();
        assert!(history.can_redo());

        let tx = history.begin("second");
        tx.perform(counting_op(&counter)).unwrap();
        history.commit(tx).unwrap();

        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_transaction_is_dropped() {
        let mut history = SimpleHistory::new();
        let tx = history.begin("noop");
        history.commit(tx).unwrap();
        assert!(!history.can_undo());
    }
}
