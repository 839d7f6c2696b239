//! Interception lenses.
//!
//! A lens sits between emitted operations and the backend. Each operation
//! passes through every open lens, innermost first; a lens may pass it
//! through, rewrite it, expand it, or drop it. Trace and diagram exporters
//! are transparent lenses: they return the operation unchanged.
//!
//! Capture, controlled-region replay, and inverted-region replay are not
//! lenses in this sense; they are frames managed directly by
//! [`Context`](crate::Context), because their replay step needs the
//! captured buffer back at scope exit.

use revq_ir::Op;

use crate::error::CoreResult;

/// A composable interceptor over the operation stream.
pub trait Lens {
    /// Name of this lens, for diagnostics.
    fn name(&self) -> &str;

    /// Transform one operation into zero or more replacement operations.
    ///
    /// Returning the operation unchanged makes the lens a transparent
    /// observer; returning an empty vector drops it from the stream.
    fn modify(&mut self, op: Op) -> CoreResult<Vec<Op>>;

    /// Called for value-returning measurements, which bypass `modify`
    /// because their results cannot be deferred. Default: ignore.
    fn observe_measurement(&mut self, _op: &Op) {}
}
