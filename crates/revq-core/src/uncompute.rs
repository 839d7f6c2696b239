//! Measurement-based uncomputation.
//!
//! Uncomputing a register by running the inverse of the circuit that
//! computed it can be expensive. The alternative is to X-measure the
//! register: that forces it to zero and yields a random result word, at
//! the cost of a phase kickback that the caller must cancel with phase
//! flips conditioned on the captured result.
//!
//! The protocol is two-phase: `start` performs the measurement and hands
//! the result to the body, the body applies the corrections, `end` closes
//! the bookkeeping. Whether the corrections are *complete* is the
//! caller's burden; nothing here can check it. The reference simulator's
//! phase accumulator returning to zero is the observable evidence.

use revq_ir::Qureg;

use crate::context::Context;
use crate::error::CoreResult;

/// Uncompute `qureg` by X-measurement, running `body` with the captured
/// result to apply the phase corrections it owes.
pub fn measurement_based_uncomputation<T>(
    ctx: &mut Context<'_>,
    qureg: &Qureg,
    body: impl FnOnce(&mut Context<'_>, u64) -> CoreResult<T>,
) -> CoreResult<T> {
    let result = ctx.start_uncompute(qureg)?;
    let value = body(ctx, result)?;
    ctx.end_uncompute(qureg, result)?;
    Ok(value)
}
