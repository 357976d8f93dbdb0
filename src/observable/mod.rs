// Observable transactable containers
//
// The mutation sites of the document model: a single typed value and an
// ordered collection, both bound to an UndoContext. While a transaction is
// open they capture every change as a reversible Operation; at all times
// they notify subscribers synchronously, which is what the UI data-binding
// layer listens to.

pub mod sequence;
pub mod subscribers;
pub mod value;

pub use sequence::{SequenceChange, TransactableSequence};
pub use subscribers::SubscriberId;
pub use value::{Transactable, ValueChange};
