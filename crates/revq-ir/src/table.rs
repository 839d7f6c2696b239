//! Classical lookup tables for quantum-ROM reads.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// Number of address bits needed to select one of `n` entries.
///
/// Smallest `k` with `2^k >= n`; zero for `n <= 1`.
pub fn ceil_lg2(n: u64) -> u32 {
    match n {
        0 | 1 => 0,
        _ => 64 - (n - 1).leading_zeros(),
    }
}

/// Position of the highest set bit of `n`; zero for `n == 0`.
pub fn floor_lg2(n: u64) -> u32 {
    match n {
        0 => 0,
        _ => 63 - n.leading_zeros(),
    }
}

/// An immutable ordered table of classical words, addressable by a
/// register-valued index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupTable {
    entries: Vec<u64>,
    /// Bits needed to hold the widest entry.
    output_width: u32,
}

impl LookupTable {
    /// Build a table from its entries. Tables must be non-empty.
    pub fn new(entries: Vec<u64>) -> IrResult<Self> {
        if entries.is_empty() {
            return Err(IrError::EmptyTable);
        }
        let output_width = entries
            .iter()
            .map(|&e| 64 - e.leading_zeros())
            .max()
            .unwrap_or(0);
        Ok(Self {
            entries,
            output_width,
        })
    }

    /// Build a table by evaluating `f` over every address in `0..len`.
    pub fn from_fn(len: u64, f: impl FnMut(u64) -> u64) -> IrResult<Self> {
        Self::new((0..len).map(f).collect())
    }

    /// Number of entries.
    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Tables are never empty; kept for the usual pairing with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The entries, in address order.
    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    /// Entry at `address`, if in range.
    pub fn entry(&self, address: u64) -> Option<u64> {
        self.entries.get(address as usize).copied()
    }

    /// Bits needed to hold the widest entry.
    pub fn output_width(&self) -> u32 {
        self.output_width
    }

    /// Number of address bits needed to select any entry.
    pub fn address_width(&self) -> u32 {
        ceil_lg2(self.len())
    }

    /// Whether every entry holds the same word.
    pub fn all_same(&self) -> bool {
        self.entries.windows(2).all(|w| w[0] == w[1])
    }
}
