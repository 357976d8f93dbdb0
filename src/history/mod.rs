// Transactional undo/redo engine
//
// Architecture:
// - Operation: forward/inverse closure pair for one atomic mutation
// - Transaction: named, nestable unit of work accumulating operations
// - UndoContext: ambient transaction stack + owned HistoryManager
// - HistoryManager: bounded performed / rolled-back lists behind undo/redo
// - SimpleHistory: single-object stack pair without the shared context
//
// Mutation sites (see crate::observable) register an Operation per change
// while a transaction is ambient; undo/redo replay whole transactions.

pub mod context;
pub mod error;
pub mod manager;
pub mod operation;
pub mod simple;
pub mod transaction;

pub use context::UndoContext;
pub use error::HistoryError;
pub use manager::{DEFAULT_MAX_HISTORY, HistoryManager};
pub use operation::Operation;
pub use simple::SimpleHistory;
pub use transaction::{CommittedTransaction, Transaction, TransactionId};
