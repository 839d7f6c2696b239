//! Control conditions: the AND of a set of qubits and a static bit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::handle::Qubit;

/// The logical AND of a set of distinct qubits and a static bit.
///
/// Every emitted effect is gated by one of these. The algebra is
/// commutative and idempotent; ANDing with a concrete `false` collapses to
/// [`ControlSet::NEVER`] without inspecting qubits.
///
/// Canonical form: the qubit list is sorted and deduplicated, and is empty
/// whenever the static bit is false. Derived equality is therefore set
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlSet {
    qubits: Vec<Qubit>,
    bit: bool,
}

impl ControlSet {
    /// The trivially-true condition.
    pub const ALWAYS: ControlSet = ControlSet {
        qubits: Vec::new(),
        bit: true,
    };

    /// The trivially-false condition. An operation controlled by `NEVER`
    /// is a provable no-op and never reaches a backend.
    pub const NEVER: ControlSet = ControlSet {
        qubits: Vec::new(),
        bit: false,
    };

    /// A condition on a single qubit reading true.
    pub fn single(qubit: Qubit) -> Self {
        Self {
            qubits: vec![qubit],
            bit: true,
        }
    }

    /// A condition on every listed qubit reading true.
    pub fn from_qubits(qubits: impl IntoIterator<Item = Qubit>) -> Self {
        let mut qubits: Vec<Qubit> = qubits.into_iter().collect();
        qubits.sort();
        qubits.dedup();
        Self { qubits, bit: true }
    }

    /// Whether this is the trivially-true condition.
    pub fn is_always(&self) -> bool {
        self.bit && self.qubits.is_empty()
    }

    /// Whether this is the trivially-false condition.
    pub fn is_never(&self) -> bool {
        !self.bit
    }

    /// The qubits whose conjunction this condition requires.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// AND of two conditions: union of qubit sets, AND of static bits.
    pub fn and(&self, other: &ControlSet) -> ControlSet {
        if self.is_never() || other.is_never() {
            return ControlSet::NEVER;
        }
        let mut qubits = self.qubits.clone();
        qubits.extend(other.qubits.iter().cloned());
        qubits.sort();
        qubits.dedup();
        ControlSet { qubits, bit: true }
    }

    /// AND with a static bit; `false` collapses to `NEVER` in O(1).
    pub fn and_bit(&self, bit: bool) -> ControlSet {
        if bit { self.clone() } else { ControlSet::NEVER }
    }

    /// AND with one more qubit.
    pub fn and_qubit(&self, qubit: Qubit) -> ControlSet {
        self.and(&ControlSet::single(qubit))
    }
}

impl From<Qubit> for ControlSet {
    fn from(qubit: Qubit) -> Self {
        ControlSet::single(qubit)
    }
}

impl fmt::Display for ControlSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            return write!(f, "never");
        }
        if self.is_always() {
            return write!(f, "always");
        }
        for (i, q) in self.qubits.iter().enumerate() {
            if i > 0 {
                write!(f, " & ")?;
            }
            write!(f, "{q}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RegId;
    use proptest::prelude::*;

    fn q(name: &str, seq: u64) -> Qubit {
        Qubit::bare(RegId::new(name, seq))
    }

    #[test]
    fn test_never_collapses() {
        let c = ControlSet::single(q("a", 0));
        assert_eq!(c.and(&ControlSet::NEVER), ControlSet::NEVER);
        assert_eq!(c.and_bit(false), ControlSet::NEVER);
        assert!(ControlSet::NEVER.and(&c).qubits().is_empty());
    }

    #[test]
    fn test_and_is_idempotent() {
        let c = ControlSet::single(q("a", 0));
        assert_eq!(c.and(&c), c);
        assert_eq!(c.and(&ControlSet::ALWAYS), c);
    }

    #[test]
    fn test_equality_is_set_equality() {
        let ab = ControlSet::from_qubits([q("a", 0), q("b", 0)]);
        let ba = ControlSet::from_qubits([q("b", 0), q("a", 0), q("a", 0)]);
        assert_eq!(ab, ba);
        assert_ne!(ab, ControlSet::single(q("a", 0)));
    }

    proptest! {
        #[test]
        fn prop_and_commutes(xs in prop::collection::vec(0u64..6, 0..5),
                             ys in prop::collection::vec(0u64..6, 0..5)) {
            let a = ControlSet::from_qubits(xs.iter().map(|&s| q("r", s)));
            let b = ControlSet::from_qubits(ys.iter().map(|&s| q("r", s)));
            prop_assert_eq!(a.and(&b), b.and(&a));
        }

        #[test]
        fn prop_and_associates(xs in prop::collection::vec(0u64..6, 0..4),
                               ys in prop::collection::vec(0u64..6, 0..4),
                               zs in prop::collection::vec(0u64..6, 0..4)) {
            let a = ControlSet::from_qubits(xs.iter().map(|&s| q("r", s)));
            let b = ControlSet::from_qubits(ys.iter().map(|&s| q("r", s)));
            let c = ControlSet::from_qubits(zs.iter().map(|&s| q("r", s)));
            prop_assert_eq!(a.and(&b).and(&c), a.and(&b.and(&c)));
        }
    }
}
