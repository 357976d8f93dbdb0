// Operation - forward/inverse action pair for one atomic mutation

use std::fmt;

/// A reversible unit of mutation.
///
/// An operation pairs two zero-argument actions: `apply` performs the
/// mutation, `undo` restores the exact prior state. Mutation sites build the
/// pair at the moment the change is requested, capturing whatever state the
/// inverse needs (previous value, removed items, indexes).
///
/// Both actions must be infallible and repeatable: history replay invokes
/// `apply` again after every undo, so the closures own (or clone) the values
/// they re-apply rather than borrowing them from the container.
pub struct Operation {
    apply: Box<dyn Fn()>,
    undo: Box<dyn Fn()>,
}

impl Operation {
    /// Create an operation from a forward action and its exact inverse
    pub fn new(apply: impl Fn() + 'static, undo: impl Fn() + 'static) -> Self {
        Self {
            apply: Box::new(apply),
            undo: Box::new(undo),
        }
    }

    /// Perform the forward action
    pub fn apply(&self) {
        (self.apply)();
    }

    /// Perform the inverse action
    pub fn undo(&self) {
        (self.undo)();
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operation")
    }
}
