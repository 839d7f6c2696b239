//! Registers and register views.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::handle::{Qubit, RegId};

/// A group of addressable bits.
///
/// A qureg's length is fixed at construction. Slicing produces a *view*:
/// the resulting qureg addresses the same backing registers, so effects
/// applied through the view are effects on the original bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qureg {
    /// An explicit ordered list of bits, possibly drawn from several
    /// registers. Also the result of concatenation.
    Raw(Vec<Qubit>),
    /// A whole named register of `len` bits.
    Named {
        /// The backing register.
        id: RegId,
        /// Number of bits.
        len: u32,
    },
    /// A contiguous sub-range view of another qureg.
    Range {
        /// The viewed register.
        base: Box<Qureg>,
        /// First bit of the view, as an offset into `base`.
        start: u32,
        /// Number of bits in the view.
        len: u32,
    },
}

impl Qureg {
    /// A whole named register.
    pub fn named(id: RegId, len: u32) -> Self {
        Qureg::Named { id, len }
    }

    /// An explicit list of bits.
    pub fn raw(qubits: Vec<Qubit>) -> Self {
        Qureg::Raw(qubits)
    }

    /// Number of bits.
    pub fn len(&self) -> u32 {
        match self {
            Qureg::Raw(qubits) => qubits.len() as u32,
            Qureg::Named { len, .. } | Qureg::Range { len, .. } => *len,
        }
    }

    /// Whether the register has no bits.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve bit `index` to a concrete [`Qubit`].
    ///
    /// The sole bit of a length-1 named register resolves to a bare qubit,
    /// so it compares equal to the qubit of a 1-bit allocation.
    pub fn qubit(&self, index: u32) -> IrResult<Qubit> {
        let len = self.len();
        if index >= len {
            return Err(IrError::IndexOutOfRange { index, len });
        }
        match self {
            Qureg::Raw(qubits) => Ok(qubits[index as usize].clone()),
            Qureg::Named { id, len } => {
                if *len == 1 {
                    Ok(Qubit::bare(id.clone()))
                } else {
                    Ok(Qubit::indexed(id.clone(), index))
                }
            }
            Qureg::Range { base, start, .. } => base.qubit(start + index),
        }
    }

    /// Iterate over the concrete bits of this register.
    pub fn iter(&self) -> impl Iterator<Item = Qubit> + '_ {
        (0..self.len()).map(move |i| self.qubit(i).expect("index < len"))
    }

    /// A sub-range view of `len` bits starting at `start`.
    ///
    /// The identity range collapses to the base register rather than
    /// wrapping it.
    pub fn slice(&self, start: u32, len: u32) -> IrResult<Qureg> {
        let base_len = self.len();
        if start.checked_add(len).is_none_or(|end| end > base_len) {
            return Err(IrError::RangeOutOfRange {
                start,
                len,
                base_len,
            });
        }
        if start == 0 && len == base_len {
            return Ok(self.clone());
        }
        match self {
            Qureg::Raw(qubits) => Ok(Qureg::Raw(
                qubits[start as usize..(start + len) as usize].to_vec(),
            )),
            Qureg::Named { .. } => Ok(Qureg::Range {
                base: Box::new(self.clone()),
                start,
                len,
            }),
            // Collapse nested ranges to a single view of the innermost base.
            Qureg::Range {
                base,
                start: base_start,
                ..
            } => Ok(Qureg::Range {
                base: base.clone(),
                start: base_start + start,
                len,
            }),
        }
    }

    /// Concatenate registers into one ordered bit list.
    pub fn concat(parts: impl IntoIterator<Item = Qureg>) -> Qureg {
        let mut qubits = Vec::new();
        for part in parts {
            qubits.extend(part.iter());
        }
        Qureg::Raw(qubits)
    }
}

impl fmt::Display for Qureg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qureg::Named { id, len } => write!(f, "{id}[0..{len}]"),
            Qureg::Range { base, start, len } => write!(f, "{base}[{start}..{}]", start + len),
            Qureg::Raw(qubits) => {
                write!(f, "[")?;
                for (i, q) in qubits.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{q}")?;
                }
                write!(f, "]")
            }
        }
    }
}
