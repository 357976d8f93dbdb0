// Error types for the undo engine

use crate::history::transaction::TransactionId;

/// Errors surfaced by the undo engine
///
/// Every variant is a programming-contract violation at the call site, not a
/// recoverable runtime condition. Undoing or redoing with an empty history is
/// deliberately *not* an error; those calls are no-ops.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Invalid transaction state: {0}")]
    InvalidState(&'static str),

    #[error("resume() called without a matching suspend()")]
    UnbalancedSuspend,

    #[error("Transaction {0} is not present in the traversed history")]
    UnknownTransaction(TransactionId),
}
