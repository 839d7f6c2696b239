//! The operation model: effect descriptors with control composition,
//! structural inversion, and recursive control lowering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::control::ControlSet;
use crate::error::{IrError, IrResult};
use crate::handle::RegId;
use crate::qureg::Qureg;
use crate::sink::{Sink, SinkError, SinkResult};

/// A reversible effect descriptor.
///
/// Operations have value semantics: equality and hashing are over the
/// variant data. The three contracts of the operation model are
/// [`Op::controlled_by`] (condition composition), [`Op::inverse`]
/// (structural inversion), and [`Op::apply`] (recursive control lowering
/// into a backend; the backend side is [`Sink`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// Flip every target bit.
    Toggle {
        /// The bits to flip.
        targets: Qureg,
    },
    /// Flip the global phase.
    PhaseFlip,
    /// Read a register, optionally zeroing it.
    Measure {
        /// The register to read.
        qureg: Qureg,
        /// Zero the register after reading.
        reset: bool,
    },
    /// Open a measurement-based uncomputation (X-basis measure and zero).
    StartUncompute {
        /// The register being uncomputed.
        qureg: Qureg,
    },
    /// Close a measurement-based uncomputation.
    EndUncompute {
        /// The register being uncomputed.
        qureg: Qureg,
        /// The result captured by the matching start.
        result: u64,
    },
    /// Create a register.
    Alloc {
        /// Identity of the new register.
        id: RegId,
        /// Number of bits.
        len: u32,
        /// Fill with uniformly random bits instead of zeros.
        x_basis: bool,
    },
    /// Destroy a register.
    Release {
        /// Identity of the register.
        id: RegId,
        /// Number of bits, for cross-checking against the allocation.
        len: u32,
        /// Skip the all-zero check (explicitly discarded garbage).
        dirty: bool,
    },
    /// An operation gated by an additional condition.
    Controlled {
        /// The gating condition.
        cond: ControlSet,
        /// The gated operation.
        op: Box<Op>,
    },
}

impl Op {
    /// Short name of the operation variant.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Toggle { .. } => "toggle",
            Op::PhaseFlip => "phase_flip",
            Op::Measure { .. } => "measure",
            Op::StartUncompute { .. } => "start_uncompute",
            Op::EndUncompute { .. } => "end_uncompute",
            Op::Alloc { .. } => "alloc",
            Op::Release { .. } => "release",
            Op::Controlled { .. } => "controlled",
        }
    }

    /// Gate this operation with an additional condition.
    ///
    /// `ALWAYS` is the identity; wrapping a wrapper merges the conditions.
    /// Allocation and release pass through unchanged: creating a register
    /// is unconditional, and a temporary that is cleanly uncomputed reads
    /// zero at release whether or not the surrounding condition held.
    pub fn controlled_by(self, cond: &ControlSet) -> Op {
        if cond.is_always() {
            return self;
        }
        match self {
            Op::Alloc { .. } | Op::Release { .. } => self,
            Op::Controlled { cond: inner, op } => Op::Controlled {
                cond: inner.and(cond),
                op,
            },
            other => Op::Controlled {
                cond: cond.clone(),
                op: Box::new(other),
            },
        }
    }

    /// The operation undoing this one.
    ///
    /// Toggles and phase flips are self-inverse; clean allocation and
    /// release invert into each other; a controlled operation inverts its
    /// payload under the same condition. Measurements, X-basis allocation,
    /// and dirty release have no inverse.
    pub fn inverse(&self) -> IrResult<Op> {
        match self {
            Op::Toggle { .. } | Op::PhaseFlip => Ok(self.clone()),
            Op::Alloc {
                id,
                len,
                x_basis: false,
            } => Ok(Op::Release {
                id: id.clone(),
                len: *len,
                dirty: false,
            }),
            Op::Release {
                id,
                len,
                dirty: false,
            } => Ok(Op::Alloc {
                id: id.clone(),
                len: *len,
                x_basis: false,
            }),
            Op::Controlled { cond, op } => Ok(Op::Controlled {
                cond: cond.clone(),
                op: Box::new(op.inverse()?),
            }),
            _ => Err(IrError::NotInvertible {
                op: self.name().to_string(),
            }),
        }
    }

    /// Lower this operation into primitive backend calls under an ambient
    /// condition.
    ///
    /// A statically-false condition returns without visiting the backend.
    /// Replayed measurements discard their results; the value-returning
    /// measurement path lives on the execution context, which calls the
    /// backend directly.
    pub fn apply(&self, controls: &ControlSet, sink: &mut dyn Sink) -> SinkResult<()> {
        if controls.is_never() {
            return Ok(());
        }
        match self {
            Op::Controlled { cond, op } => op.apply(&controls.and(cond), sink),
            Op::Toggle { targets } => sink.toggle(targets, controls),
            Op::PhaseFlip => sink.phase_flip(controls),
            Op::Alloc { id, len, x_basis } => sink.allocate(id, *len, *x_basis),
            Op::Release { id, len, dirty } => sink.release(id, *len, *dirty),
            Op::Measure { qureg, reset } => {
                self.ensure_unconditioned(controls)?;
                sink.measure(qureg, *reset).map(|_| ())
            }
            Op::StartUncompute { qureg } => {
                self.ensure_unconditioned(controls)?;
                sink.start_uncompute(qureg).map(|_| ())
            }
            Op::EndUncompute { qureg, result } => {
                self.ensure_unconditioned(controls)?;
                sink.end_uncompute(qureg, *result)
            }
        }
    }

    fn ensure_unconditioned(&self, controls: &ControlSet) -> SinkResult<()> {
        if controls.is_always() {
            Ok(())
        } else {
            Err(SinkError::ConditionedMeasurement {
                op: self.name().to_string(),
            })
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Toggle { targets } => write!(f, "toggle {targets}"),
            Op::PhaseFlip => write!(f, "phase_flip"),
            Op::Measure { qureg, reset } => {
                write!(f, "measure {qureg}{}", if *reset { " (reset)" } else { "" })
            }
            Op::StartUncompute { qureg } => write!(f, "start_uncompute {qureg}"),
            Op::EndUncompute { qureg, result } => {
                write!(f, "end_uncompute {qureg} = {result:#x}")
            }
            Op::Alloc { id, len, x_basis } => {
                write!(f, "alloc {id}[{len}]{}", if *x_basis { " (x)" } else { "" })
            }
            Op::Release { id, len, dirty } => {
                write!(f, "release {id}[{len}]{}", if *dirty { " (dirty)" } else { "" })
            }
            Op::Controlled { cond, op } => write!(f, "{op} if {cond}"),
        }
    }
}
