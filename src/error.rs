//! Error taxonomy for the analysis core.
//!
//! Analyses are total on valid IR and never fail; the errors here are all
//! "invalid operation" style misuse of an API with preconditions (asking for
//! [`crate::loop_info::LoopInfo`] on a loop that is not uniquely shaped,
//! re-using a traversal that has already been consumed, and so on). Absence
//! is modeled separately via `Option`/`Result` on the `try_*` entry points,
//! never by this type.

use thiserror::Error;

/// Errors raised by the analysis core's infallible-looking APIs when given
/// input that violates a documented precondition.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A loop does not have the unique header/entry/exit/breaker/back-edge
    /// shape required to derive [`crate::loop_info::LoopInfo`] from it.
    #[error("loop is not uniquely shaped: {reason}")]
    IrregularLoop { reason: &'static str },

    /// A block passed to an API does not belong to the collection/CFG it was
    /// queried against.
    #[error("block is not a member of this collection")]
    BlockNotInCollection,

    /// An operation that requires a non-empty working set was given one.
    #[error("{what} is empty")]
    Empty { what: &'static str },

    /// Catch-all for a caller-supplied invalid input, carrying a message
    /// produced by the IR's own `format_error`, mirroring how diagnostics are
    /// surfaced elsewhere in this lineage.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl AnalysisError {
    /// Construct an [`AnalysisError::InvalidOperation`] from a message
    /// produced by [`crate::ir::Block::format_error`] or similar.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}
