//! Error types for the execution substrate.

use revq_ir::{IrError, SinkError};
use thiserror::Error;

/// Errors raised while emitting and transforming operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A structural error in an IR value.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// An invariant violation raised by the backend.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// A scope was exited that is not the innermost open scope.
    #[error("scope {expected} exited out of order (innermost open scope: {got:?})")]
    ScopeMismatch {
        /// The scope the caller tried to exit.
        expected: u64,
        /// The scope actually on top of the stack, if any.
        got: Option<u64>,
    },

    /// A value-returning measurement was issued inside a capturing scope.
    /// Measurements produce results at emission time and cannot be
    /// deferred and replayed.
    #[error("'{op}' cannot be deferred by a capturing scope")]
    DeferredMeasurement {
        /// Description of the offending operation.
        op: String,
    },

    /// Only whole named registers can be released.
    #[error("cannot release register view {qureg}")]
    NotReleasable {
        /// Description of the offending register view.
        qureg: String,
    },
}

/// Result type for substrate operations.
pub type CoreResult<T> = Result<T, CoreError>;
