//! The backend contract consumed by the execution pipeline.

use thiserror::Error;

use crate::control::ControlSet;
use crate::handle::{Qubit, RegId};
use crate::qureg::Qureg;

/// A backend that executes primitive reversible effects.
///
/// The reference implementation is the classical simulator in `revq-sim`;
/// hardware or trace backends implement the same surface. Every method is
/// reached only after control lowering, so conditions passed here are
/// never statically `NEVER`.
pub trait Sink {
    /// Create register `id` with `len` zeroed bits, or uniformly random
    /// bits when `x_basis` is set.
    fn allocate(&mut self, id: &RegId, len: u32, x_basis: bool) -> SinkResult<()>;

    /// Destroy register `id`. Unless `dirty` is set, every bit must read
    /// zero (the reversibility invariant).
    fn release(&mut self, id: &RegId, len: u32, dirty: bool) -> SinkResult<()>;

    /// Flip every bit of `targets` iff `controls` currently holds.
    fn toggle(&mut self, targets: &Qureg, controls: &ControlSet) -> SinkResult<()>;

    /// Flip the global phase iff `controls` currently holds.
    fn phase_flip(&mut self, controls: &ControlSet) -> SinkResult<()>;

    /// Read the current value of `qureg`; zero it afterwards when `reset`
    /// is set.
    fn measure(&mut self, qureg: &Qureg, reset: bool) -> SinkResult<u64>;

    /// X-basis measurement opening a measurement-based uncomputation:
    /// returns the captured result word and zeroes the register. The
    /// caller owes the matching phase corrections before calling
    /// [`Sink::end_uncompute`].
    fn start_uncompute(&mut self, qureg: &Qureg) -> SinkResult<u64>;

    /// Close a measurement-based uncomputation opened by
    /// [`Sink::start_uncompute`] with the result it captured.
    fn end_uncompute(&mut self, qureg: &Qureg, result: u64) -> SinkResult<()>;
}

/// Invariant violations raised by backends and by control lowering.
///
/// All of these are programming errors in the circuit under construction;
/// nothing catches and retries them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// A register was allocated under an identity that already exists.
    #[error("register {id} is already allocated")]
    DoubleAllocation {
        /// The colliding identity.
        id: RegId,
    },

    /// An effect referenced a register that is not allocated.
    #[error("register {id} is not allocated")]
    UnknownRegister {
        /// The missing identity.
        id: RegId,
    },

    /// A register was released while holding a non-zero value without
    /// being marked dirty.
    #[error("register {id} released while holding {value:#x} (garbage must be uncomputed)")]
    ReleasedNonZero {
        /// The offending register.
        id: RegId,
        /// The value it still held.
        value: u64,
    },

    /// Release length disagrees with the allocation.
    #[error("register {id} released with length {got}, allocated with {expected}")]
    LengthMismatch {
        /// The offending register.
        id: RegId,
        /// Length at allocation.
        expected: u32,
        /// Length at release.
        got: u32,
    },

    /// A toggle listed one of its own controls as a target.
    #[error("toggle target {qubit} is also one of its controls")]
    SelfControlledToggle {
        /// The qubit appearing on both sides.
        qubit: Qubit,
    },

    /// A bit reference fell outside its register.
    #[error("bit {qubit} out of range for register of length {len}")]
    BitOutOfRange {
        /// The offending reference.
        qubit: Qubit,
        /// The register length.
        len: u32,
    },

    /// Registers wider than 64 bits cannot be allocated or measured.
    #[error("register {id} of length {len} exceeds the 64-bit cap")]
    WidthOverflow {
        /// The offending register.
        id: RegId,
        /// The requested length.
        len: u32,
    },

    /// A measurement-family operation carried a non-trivial condition.
    #[error("operation '{op}' cannot be conditioned on qubits")]
    ConditionedMeasurement {
        /// Name of the offending operation.
        op: String,
    },

    /// An end-uncomputation had no matching start, or disagreed with it.
    #[error("unmatched measurement-based uncomputation on register {id}")]
    UnmatchedUncompute {
        /// The offending register.
        id: RegId,
    },
}

/// Result type for backend operations.
pub type SinkResult<T> = Result<T, SinkError>;
