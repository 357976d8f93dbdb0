// UndoContext - ambient transaction stack + owned history
//
// The context is the one piece of shared state every mutation site needs: it
// knows which transaction is currently accepting operations and owns the
// HistoryManager that undo/redo traverse. It is an explicit, cheaply
// cloneable handle injected into every Transactable/TransactableSequence at
// construction; there is no global or thread-local slot.
//
// Single-threaded: state lives behind Rc<RefCell<..>>, and no
// internal borrow is ever held while a caller-supplied closure (operation or
// observer) runs, so those closures may freely re-enter the public API.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::history::error::HistoryError;
use crate::history::manager::HistoryManager;
use crate::history::operation::Operation;
use crate::history::transaction::{CommittedTransaction, Transaction, TransactionId};

/// One open transaction on the ambient stack
struct Frame {
    id: TransactionId,
    name: String,
    operations: Vec<Operation>,
}

struct ContextInner {
    /// Open transactions, innermost at the top; the top frame is ambient
    frames: RefCell<Vec<Frame>>,
    history: RefCell<HistoryManager>,
}

/// Shared undo/redo context for one document
///
/// Clones are handles to the same context. Typical lifecycle: the editor
/// creates one context per document, binds every transactable value and
/// sequence of the document model to it, wires `undo`/`redo` to menu
/// commands, and calls [`UndoContext::reset`] when a new file is loaded.
#[derive(Clone)]
pub struct UndoContext {
    inner: Rc<ContextInner>,
}

impl UndoContext {
    /// Context with the default history capacity
    pub fn new() -> Self {
        Self::with_capacity(crate::history::manager::DEFAULT_MAX_HISTORY)
    }

    /// Context with a custom history capacity (0 disables recording)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                frames: RefCell::new(Vec::new()),
                history: RefCell::new(HistoryManager::with_capacity(capacity)),
            }),
        }
    }

    /// Open a transaction; it becomes ambient until committed or canceled
    ///
    /// Opening while another transaction is ambient nests: the new
    /// transaction captures subsequent operations, and its commit folds them
    /// into the enclosing transaction.
    pub fn begin(&self, name: impl Into<String>) -> Transaction {
        let id = TransactionId::new();
        let name = name.into();
        debug!(%id, name = %name, depth = self.inner.frames.borrow().len(), "transaction opened");
        self.inner.frames.borrow_mut().push(Frame {
            id,
            name,
            operations: Vec::new(),
        });
        Transaction::new(self.clone(), id)
    }

    /// True while any transaction is open on this context
    pub fn in_transaction(&self) -> bool {
        !self.inner.frames.borrow().is_empty()
    }

    pub(crate) fn is_innermost(&self, id: TransactionId) -> bool {
        self.inner
            .frames
            .borrow()
            .last()
            .is_some_and(|frame| frame.id == id)
    }

    pub(crate) fn frame_name(&self, id: TransactionId) -> Option<String> {
        self.inner
            .frames
            .borrow()
            .iter()
            .find(|frame| frame.id == id)
            .map(|frame| frame.name.clone())
    }

    pub(crate) fn frame_operation_count(&self, id: TransactionId) -> Option<usize> {
        self.inner
            .frames
            .borrow()
            .iter()
            .find(|frame| frame.id == id)
            .map(|frame| frame.operations.len())
    }

    /// Apply an operation and append it to the ambient transaction
    ///
    /// The apply side effect happens now, not at commit. The target frame is
    /// resolved before applying, so observers reacting to the mutation cannot
    /// redirect where the operation is recorded.
    pub(crate) fn record(&self, op: Operation) {
        let target = self.inner.frames.borrow().last().map(|frame| frame.id);
        let Some(target) = target else {
            // No ambient transaction: apply without capturing
            op.apply();
            return;
        };
        op.apply();
        let mut frames = self.inner.frames.borrow_mut();
        match frames.iter_mut().rev().find(|frame| frame.id == target) {
            Some(frame) => frame.operations.push(op),
            None => warn!(id = %target, "transaction closed while recording; operation not captured"),
        }
    }

    pub(crate) fn commit_frame(&self, id: TransactionId) -> Result<(), HistoryError> {
        let record = self.close_frame(id)?;
        let Some((frame_id, name, operations)) = record else {
            // Nested commit, operations merged into the parent
            return Ok(());
        };
        if operations.is_empty() {
            debug!(id = %frame_id, name = %name, "empty transaction committed, nothing to record");
            return Ok(());
        }
        let tx = CommittedTransaction::new(frame_id, name, operations);
        self.inner.history.borrow_mut().record(tx);
        Ok(())
    }

    pub(crate) fn commit_frame_detached(
        &self,
        id: TransactionId,
    ) -> Result<Option<CommittedTransaction>, HistoryError> {
        if self.inner.frames.borrow().len() > 1 {
            return Err(HistoryError::InvalidState(
                "detached commit requires an outermost transaction",
            ));
        }
        let record = self.close_frame(id)?;
        Ok(record.and_then(|(frame_id, name, operations)| {
            if operations.is_empty() {
                None
            } else {
                Some(CommittedTransaction::new(frame_id, name, operations))
            }
        }))
    }

    /// Pop the innermost frame, merging into the parent when nested
    ///
    /// Returns the frame contents only for an outermost commit.
    #[allow(clippy::type_complexity)]
    fn close_frame(
        &self,
        id: TransactionId,
    ) -> Result<Option<(TransactionId, String, Vec<Operation>)>, HistoryError> {
        let mut frames = self.inner.frames.borrow_mut();
        if !frames.last().is_some_and(|frame| frame.id == id) {
            return Err(HistoryError::InvalidState(
                "transaction is not the innermost open one",
            ));
        }
        let frame = frames.pop().expect("frame checked above");
        if let Some(parent) = frames.last_mut() {
            debug!(
                id = %frame.id,
                name = %frame.name,
                operations = frame.operations.len(),
                parent = %parent.id,
                "nested transaction merged into parent"
            );
            parent.operations.extend(frame.operations);
            return Ok(None);
        }
        debug!(id = %frame.id, name = %frame.name, operations = frame.operations.len(), "transaction committed");
        Ok(Some((frame.id, frame.name, frame.operations)))
    }

    pub(crate) fn cancel_frame(&self, id: TransactionId) -> Result<(), HistoryError> {
        let frame = {
            let mut frames = self.inner.frames.borrow_mut();
            if !frames.last().is_some_and(|frame| frame.id == id) {
                return Err(HistoryError::InvalidState(
                    "transaction is not the innermost open one",
                ));
            }
            frames.pop().expect("frame checked above")
        };
        debug!(id = %frame.id, name = %frame.name, operations = frame.operations.len(), "transaction canceled");
        for op in frame.operations.iter().rev() {
            op.undo();
        }
        Ok(())
    }

    /// Cancel frames from the innermost up to and including `id`
    ///
    /// Drop path of the transaction guard. With well-scoped guards only the
    /// innermost frame can be dropped uncommitted, but a guard dropped out of
    /// order still unwinds everything it encloses.
    pub(crate) fn cancel_frames_through(&self, id: TransactionId) {
        loop {
            let frame = self.inner.frames.borrow_mut().pop();
            let Some(frame) = frame else {
                return;
            };
            if frame.id != id {
                warn!(
                    id = %frame.id,
                    name = %frame.name,
                    "canceling transaction left open inside a dropped enclosing transaction"
                );
            }
            debug!(id = %frame.id, name = %frame.name, operations = frame.operations.len(), "transaction canceled");
            for op in frame.operations.iter().rev() {
                op.undo();
            }
            if frame.id == id {
                return;
            }
        }
    }

    /// Roll back the most recent transaction
    ///
    /// Returns the name of the transaction undone, or `None` when there is
    /// nothing to undo. Recording is suspended for the duration so observer
    /// reactions to the replayed notifications cannot re-record history.
    pub fn undo(&self) -> Result<Option<String>, HistoryError> {
        let _recording = self.suspend_scope();
        self.undo_step()
    }

    /// Roll back every transaction down to and including `target`
    ///
    /// The jump is atomic: an id that is not in the performed list fails
    /// without rolling anything back. Returns the number of transactions
    /// undone.
    pub fn undo_to(&self, target: TransactionId) -> Result<usize, HistoryError> {
        if !self.inner.history.borrow().performed_contains(target) {
            return Err(HistoryError::UnknownTransaction(target));
        }
        let _recording = self.suspend_scope();
        let mut count = 0;
        loop {
            let Some(undone) = self.undo_step_id()? else {
                break;
            };
            count += 1;
            if undone == target {
                break;
            }
        }
        Ok(count)
    }

    /// Replay the most recent rolled-back transaction
    pub fn redo(&self) -> Result<Option<String>, HistoryError> {
        let _recording = self.suspend_scope();
        self.redo_step()
    }

    /// Replay every rolled-back transaction up to and including `target`
    pub fn redo_to(&self, target: TransactionId) -> Result<usize, HistoryError> {
        if !self.inner.history.borrow().rolled_back_contains(target) {
            return Err(HistoryError::UnknownTransaction(target));
        }
        let _recording = self.suspend_scope();
        let mut count = 0;
        loop {
            let Some(redone) = self.redo_step_id()? else {
                break;
            };
            count += 1;
            if redone == target {
                break;
            }
        }
        Ok(count)
    }

    fn undo_step(&self) -> Result<Option<String>, HistoryError> {
        let Some(mut tx) = self.inner.history.borrow_mut().pop_performed() else {
            return Ok(None);
        };
        debug!(id = %tx.id(), name = tx.name(), "undo");
        tx.rollback()?;
        let name = tx.name().to_string();
        self.inner.history.borrow_mut().stash_rolled_back(tx);
        Ok(Some(name))
    }

    fn undo_step_id(&self) -> Result<Option<TransactionId>, HistoryError> {
        let Some(mut tx) = self.inner.history.borrow_mut().pop_performed() else {
            return Ok(None);
        };
        debug!(id = %tx.id(), name = tx.name(), "undo");
        tx.rollback()?;
        let id = tx.id();
        self.inner.history.borrow_mut().stash_rolled_back(tx);
        Ok(Some(id))
    }

    fn redo_step(&self) -> Result<Option<String>, HistoryError> {
        let Some(mut tx) = self.inner.history.borrow_mut().pop_rolled_back() else {
            return Ok(None);
        };
        debug!(id = %tx.id(), name = tx.name(), "redo");
        tx.replay()?;
        let name = tx.name().to_string();
        self.inner.history.borrow_mut().stash_performed(tx);
        Ok(Some(name))
    }

    fn redo_step_id(&self) -> Result<Option<TransactionId>, HistoryError> {
        let Some(mut tx) = self.inner.history.borrow_mut().pop_rolled_back() else {
            return Ok(None);
        };
        debug!(id = %tx.id(), name = tx.name(), "redo");
        tx.replay()?;
        let id = tx.id();
        self.inner.history.borrow_mut().stash_performed(tx);
        Ok(Some(id))
    }

    /// Disable history recording until the matching resume()
    ///
    /// Calls nest; every suspend must be balanced by exactly one resume.
    pub fn suspend(&self) {
        self.inner.history.borrow_mut().suspend();
    }

    pub fn resume(&self) -> Result<(), HistoryError> {
        self.inner.history.borrow_mut().resume()
    }

    pub fn is_suspended(&self) -> bool {
        self.inner.history.borrow().is_suspended()
    }

    fn suspend_scope(&self) -> SuspendScope<'_> {
        self.suspend();
        SuspendScope { ctx: self }
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.borrow().can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.inner.history.borrow().undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.inner.history.borrow().redo_count()
    }

    /// Label for the Edit > Undo menu entry
    pub fn undo_description(&self) -> Option<String> {
        self.inner
            .history
            .borrow()
            .undo_description()
            .map(str::to_string)
    }

    /// Label for the Edit > Redo menu entry
    pub fn redo_description(&self) -> Option<String> {
        self.inner
            .history
            .borrow()
            .redo_description()
            .map(str::to_string)
    }

    pub fn capacity(&self) -> usize {
        self.inner.history.borrow().capacity()
    }

    /// Forget all history, e.g. on loading a new document
    pub fn reset(&self) {
        self.inner.history.borrow_mut().reset();
    }
}

impl Default for UndoContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Balanced suspension held across an undo/redo traversal
struct SuspendScope<'a> {
    ctx: &'a UndoContext,
}

impl Drop for SuspendScope<'_> {
    fn drop(&mut self) {
        if self.ctx.resume().is_err() {
            warn!("suspend counter underflow while leaving undo/redo traversal");
        }
    }
}
