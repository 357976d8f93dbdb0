// MolViz undo engine - library exports
//
// Transactional undo/redo for the MolViz editor. Mutations to transactable
// values and sequences are grouped into named, nestable transactions; a
// bounded history replays or rolls back whole transactions as a unit.

pub mod history;
pub mod observable;

// Re-export commonly used types for convenience
pub use history::context::UndoContext;
pub use history::error::HistoryError;
pub use history::manager::HistoryManager;
pub use history::operation::Operation;
pub use history::simple::SimpleHistory;
pub use history::transaction::{CommittedTransaction, Transaction, TransactionId};
pub use observable::sequence::{SequenceChange, TransactableSequence};
pub use observable::subscribers::SubscriberId;
pub use observable::value::{Transactable, ValueChange};
