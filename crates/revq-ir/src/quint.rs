//! Integer-valued register views.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::handle::Qubit;
use crate::qureg::Qureg;
use crate::table::ceil_lg2;

/// An unsigned integer held in a register, LSB at bit 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quint {
    qureg: Qureg,
}

impl Quint {
    /// Wrap a register as an unsigned integer.
    pub fn new(qureg: Qureg) -> Self {
        Self { qureg }
    }

    /// Bit width.
    pub fn len(&self) -> u32 {
        self.qureg.len()
    }

    /// Whether the register has no bits.
    pub fn is_empty(&self) -> bool {
        self.qureg.is_empty()
    }

    /// The underlying register.
    pub fn qureg(&self) -> &Qureg {
        &self.qureg
    }

    /// The qubit holding bit `index` of the value.
    pub fn bit(&self, index: u32) -> IrResult<Qubit> {
        self.qureg.qubit(index)
    }

    /// The largest value this register can hold.
    pub fn max_value(&self) -> u64 {
        match self.len() {
            0 => 0,
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        }
    }

    /// A view of the low `len` bits.
    pub fn low(&self, len: u32) -> IrResult<Quint> {
        Ok(Quint::new(self.qureg.slice(0, len)?))
    }

    /// A view of the bits above the low `split` bits.
    pub fn high(&self, split: u32) -> IrResult<Quint> {
        let len = self
            .len()
            .checked_sub(split)
            .ok_or(IrError::IndexOutOfRange {
                index: split,
                len: self.len(),
            })?;
        Ok(Quint::new(self.qureg.slice(split, len)?))
    }
}

impl From<Qureg> for Quint {
    fn from(qureg: Qureg) -> Self {
        Quint::new(qureg)
    }
}

/// An unsigned integer with a fixed modulus.
///
/// The register length must be exactly `ceil(log2(modulus))` bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuintMod {
    quint: Quint,
    modulus: u64,
}

impl QuintMod {
    /// Wrap a register as an integer modulo `modulus`.
    pub fn new(qureg: Qureg, modulus: u64) -> IrResult<Self> {
        let expected = ceil_lg2(modulus);
        if qureg.len() != expected {
            return Err(IrError::WidthMismatch {
                expected,
                got: qureg.len(),
            });
        }
        Ok(Self {
            quint: Quint::new(qureg),
            modulus,
        })
    }

    /// The modulus.
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// The underlying unsigned view.
    pub fn quint(&self) -> &Quint {
        &self.quint
    }

    /// The underlying register.
    pub fn qureg(&self) -> &Qureg {
        self.quint.qureg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RegId;

    fn reg(name: &str, len: u32) -> Qureg {
        Qureg::named(RegId::new(name, 0), len)
    }

    #[test]
    fn test_quint_bits() {
        let q = Quint::new(reg("a", 4));
        assert_eq!(q.len(), 4);
        assert_eq!(q.max_value(), 15);
        assert_eq!(q.bit(0).unwrap(), Qubit::indexed(RegId::new("a", 0), 0));
    }

    #[test]
    fn test_quint_split_views() {
        let q = Quint::new(reg("a", 6));
        assert_eq!(q.low(2).unwrap().len(), 2);
        let hi = q.high(2).unwrap();
        assert_eq!(hi.len(), 4);
        // Bit 0 of the high view is bit 2 of the backing register.
        assert_eq!(
            hi.bit(0).unwrap(),
            Qubit::indexed(RegId::new("a", 0), 2)
        );
    }

    #[test]
    fn test_high_split_past_end_is_an_error() {
        let q = Quint::new(reg("a", 6));
        assert!(matches!(
            q.high(7),
            Err(IrError::IndexOutOfRange { index: 7, len: 6 })
        ));
        // Splitting at the full width leaves an empty high view.
        assert!(q.high(6).unwrap().is_empty());
    }

    #[test]
    fn test_quint_mod_width() {
        // modulus 12 needs exactly 4 bits
        assert!(QuintMod::new(reg("m", 4), 12).is_ok());
        assert!(matches!(
            QuintMod::new(reg("m", 5), 12),
            Err(IrError::WidthMismatch {
                expected: 4,
                got: 5
            })
        ));
    }
}
