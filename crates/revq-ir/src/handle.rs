//! Register handles and single-bit references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identity of an allocated register.
///
/// A register is identified by its allocation name plus a sequence number,
/// so two allocations under the same name at different times never collide.
/// Sequence numbers are issued monotonically per name by the execution
/// context and are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegId {
    /// The allocation name.
    pub name: String,
    /// Disambiguates same-named registers across time.
    pub seq: u64,
}

impl RegId {
    /// Create a register id from a name and sequence number.
    pub fn new(name: impl Into<String>, seq: u64) -> Self {
        Self {
            name: name.into(),
            seq,
        }
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.seq)
    }
}

/// A reference to a single bit of an allocated register.
///
/// A qubit with no index denotes the sole bit of a length-1 register.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qubit {
    /// The register this bit belongs to.
    pub reg: RegId,
    /// The bit offset within the register, or `None` for a bare
    /// length-1 register.
    pub index: Option<u32>,
}

impl Qubit {
    /// Reference the sole bit of a length-1 register.
    pub fn bare(reg: RegId) -> Self {
        Self { reg, index: None }
    }

    /// Reference bit `index` of a register.
    pub fn indexed(reg: RegId, index: u32) -> Self {
        Self {
            reg,
            index: Some(index),
        }
    }

    /// The bit offset inside the backing register.
    pub fn offset(&self) -> u32 {
        self.index.unwrap_or(0)
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{i}]", self.reg),
            None => write!(f, "{}", self.reg),
        }
    }
}
