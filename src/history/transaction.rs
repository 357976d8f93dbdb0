// Transaction - a named, nestable unit of reversible work
//
// While open, a transaction is a guard value: dropping it without an explicit
// commit cancels it, so early-exit paths never leak half-applied mutations.
// Committing the outermost transaction hands a CommittedTransaction record to
// the context's history; committing a nested one merges its operations into
// the enclosing transaction.

use std::fmt;

use uuid::Uuid;

use crate::history::context::UndoContext;
use crate::history::error::HistoryError;
use crate::history::operation::Operation;

/// Unique identifier of a transaction
///
/// Assigned when the transaction is opened. Used to target multi-step
/// undo/redo jumps and to correlate log events; names are display labels and
/// need not be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An open unit of work accepting recorded operations
///
/// Obtained from [`UndoContext::begin`]. All mutations performed on
/// transactables bound to the same context are captured into the innermost
/// open transaction until this guard is committed or canceled.
///
/// Completing a transaction that is not the innermost open one is an
/// [`HistoryError::InvalidState`]; open transactions close in LIFO order.
#[must_use = "an unused transaction cancels itself when dropped"]
pub struct Transaction {
    ctx: UndoContext,
    id: TransactionId,
    completed: bool,
}

impl Transaction {
    pub(crate) fn new(ctx: UndoContext, id: TransactionId) -> Self {
        Self {
            ctx,
            id,
            completed: false,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Display name given at `begin`
    pub fn name(&self) -> String {
        self.ctx.frame_name(self.id).unwrap_or_default()
    }

    /// Number of operations recorded so far
    pub fn operation_count(&self) -> usize {
        self.ctx.frame_operation_count(self.id).unwrap_or(0)
    }

    /// Record a custom operation
    ///
    /// Applies the operation immediately and appends it to this transaction.
    /// This is the integration point for mutation sites outside the built-in
    /// containers (e.g. scene-graph edits wrapped by the application).
    pub fn perform(&self, op: Operation) -> Result<(), HistoryError> {
        if !self.ctx.is_innermost(self.id) {
            return Err(HistoryError::InvalidState(
                "operations can only be performed on the innermost open transaction",
            ));
        }
        self.ctx.record(op);
        Ok(())
    }

    /// Finalize this unit of work
    ///
    /// Outermost transaction: hands the recorded operations to the context's
    /// history (unless recording is suspended or no operation was recorded).
    /// Nested transaction: merges the operations into the enclosing one.
    pub fn commit(mut self) -> Result<(), HistoryError> {
        self.ctx.commit_frame(self.id)?;
        self.completed = true;
        Ok(())
    }

    /// Undo every recorded operation in reverse order and discard the unit
    pub fn cancel(mut self) -> Result<(), HistoryError> {
        self.ctx.cancel_frame(self.id)?;
        self.completed = true;
        Ok(())
    }

    /// Commit without recording into the context's history
    ///
    /// Returns the committed record for the caller to keep (`None` if the
    /// transaction recorded nothing). Only legal on an outermost transaction;
    /// this is the entry point [`crate::SimpleHistory`] is built on.
    pub fn commit_detached(mut self) -> Result<Option<CommittedTransaction>, HistoryError> {
        let record = self.ctx.commit_frame_detached(self.id)?;
        self.completed = true;
        Ok(record)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.completed {
            self.ctx.cancel_frames_through(self.id);
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("operations", &self.operation_count())
            .finish()
    }
}

/// A finalized transaction owned by a history
///
/// Rollback and replay traverse the recorded operations as a unit: undo in
/// exact reverse order, apply in forward order. The two must strictly
/// alternate, starting with rollback; breaking the alternation means the
/// engine and the document state would disagree, so it fails fast.
pub struct CommittedTransaction {
    id: TransactionId,
    name: String,
    operations: Vec<Operation>,
    rolled_back: bool,
}

impl CommittedTransaction {
    pub(crate) fn new(id: TransactionId, name: String, operations: Vec<Operation>) -> Self {
        Self {
            id,
            name,
            operations,
            rolled_back: false,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Undo every operation, most recent first
    pub fn rollback(&mut self) -> Result<(), HistoryError> {
        if self.rolled_back {
            return Err(HistoryError::InvalidState(
                "transaction is already rolled back",
            ));
        }
        for op in self.operations.iter().rev() {
            op.undo();
        }
        self.rolled_back = true;
        Ok(())
    }

    /// Re-apply every operation in original order
    pub fn replay(&mut self) -> Result<(), HistoryError> {
        if !self.rolled_back {
            return Err(HistoryError::InvalidState(
                "transaction has not been rolled back",
            ));
        }
        for op in &self.operations {
            op.apply();
        }
        self.rolled_back = false;
        Ok(())
    }
}

impl fmt::Debug for CommittedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommittedTransaction")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("operations", &self.operations.len())
            .field("rolled_back", &self.rolled_back)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tracking_op(log: &Rc<RefCell<Vec<String>>>, tag: &str) -> Operation {
        let apply_log = Rc::clone(log);
        let undo_log = Rc::clone(log);
        let apply_tag = format!("apply {tag}");
        let undo_tag = format!("undo {tag}");
        Operation::new(
            move || apply_log.borrow_mut().push(apply_tag.clone()),
            move || undo_log.borrow_mut().push(undo_tag.clone()),
        )
    }

    fn committed_with_ops(log: &Rc<RefCell<Vec<String>>>, tags: &[&str]) -> CommittedTransaction {
        let ops = tags.iter().map(|t| tracking_op(log, t)).collect();
        CommittedTransaction::new(TransactionId::new(), "test".to_string(), ops)
    }

    #[test]
    fn test_rollback_runs_undo_in_reverse_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tx = committed_with_ops(&log, &["o1", "o2", "o3"]);

        tx.rollback().unwrap();

        assert_eq!(*log.borrow(), vec!["undo o3", "undo o2", "undo o1"]);
    }

    #[test]
    fn test_replay_runs_apply_in_forward_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tx = committed_with_ops(&log, &["o1", "o2"]);

        tx.rollback().unwrap();
        log.borrow_mut().clear();
        tx.replay().unwrap();

        assert_eq!(*log.borrow(), vec!["apply o1", "apply o2"]);
    }

    #[test]
    fn test_rollback_replay_must_alternate() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tx = committed_with_ops(&log, &["o1"]);

        // Replay before any rollback is out of order
        assert!(tx.replay().is_err());

        tx.rollback().unwrap();
        assert!(tx.rollback().is_err());

        tx.replay().unwrap();
        assert!(tx.replay().is_err());
        tx.rollback().unwrap();
    }
}
