//! The classical reference backend.
//!
//! Tracks every allocated register as a bit vector and executes toggles
//! exactly, so circuit bugs surface as hard errors instead of noisy
//! amplitudes. X-basis outcomes (X-basis allocation and the measurements
//! opened by uncomputation) are the only nondeterminism; they draw from a
//! seedable generator and can be pinned to a fixed outcome for tests.
//!
//! Phase is modelled as a single global angle in degrees. A phase flip
//! whose condition holds adds 180, and the X-measurement opening an
//! uncomputation kicks back 180 when the captured result and the stored
//! value share an odd number of set bits. A correctly fixed-up circuit
//! therefore finishes with the phase back at zero.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::debug;

use revq_ir::{ControlSet, Qubit, Qureg, RegId, Sink, SinkError, SinkResult};

/// Exact classical simulator implementing the backend contract.
pub struct ClassicalSim {
    regs: FxHashMap<RegId, Vec<bool>>,
    /// Open measurement-based uncomputations, keyed by the measured bits.
    open: FxHashMap<Vec<Qubit>, u64>,
    phase_degrees: u32,
    rng: StdRng,
    x_bias: Option<bool>,
}

impl ClassicalSim {
    /// A simulator drawing X-basis outcomes from an entropy-seeded
    /// generator.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// A simulator with deterministic X-basis outcomes.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            regs: FxHashMap::default(),
            open: FxHashMap::default(),
            phase_degrees: 0,
            rng,
            x_bias: None,
        }
    }

    /// Pin every X-basis outcome to `bias` instead of sampling.
    ///
    /// Fixup circuitry is only exercised on one of the two outcomes, so
    /// tests should run once with each bias in addition to sampled runs.
    pub fn with_x_bias(mut self, bias: bool) -> Self {
        self.x_bias = Some(bias);
        self
    }

    /// The accumulated global phase, in degrees modulo 360.
    pub fn phase_degrees(&self) -> u32 {
        self.phase_degrees
    }

    /// Number of currently allocated registers.
    pub fn live_registers(&self) -> usize {
        self.regs.len()
    }

    /// Whether every register has been released.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// Number of uncomputations opened but not yet closed.
    pub fn open_uncomputes(&self) -> usize {
        self.open.len()
    }

    /// Peek at the current value of a register without disturbing it.
    pub fn read(&self, qureg: &Qureg) -> SinkResult<u64> {
        let qubits: Vec<Qubit> = qureg.iter().collect();
        self.read_word(&qubits)
    }

    fn x_outcome(&mut self) -> bool {
        match self.x_bias {
            Some(bias) => bias,
            None => self.rng.gen_bool(0.5),
        }
    }

    fn bit(&self, qubit: &Qubit) -> SinkResult<bool> {
        let bits = self
            .regs
            .get(&qubit.reg)
            .ok_or_else(|| SinkError::UnknownRegister {
                id: qubit.reg.clone(),
            })?;
        let offset = qubit.offset() as usize;
        if offset >= bits.len() {
            return Err(SinkError::BitOutOfRange {
                qubit: qubit.clone(),
                len: bits.len() as u32,
            });
        }
        Ok(bits[offset])
    }

    fn set_bit(&mut self, qubit: &Qubit, value: bool) -> SinkResult<()> {
        let bits = self
            .regs
            .get_mut(&qubit.reg)
            .ok_or_else(|| SinkError::UnknownRegister {
                id: qubit.reg.clone(),
            })?;
        let offset = qubit.offset() as usize;
        if offset >= bits.len() {
            return Err(SinkError::BitOutOfRange {
                qubit: qubit.clone(),
                len: bits.len() as u32,
            });
        }
        bits[offset] = value;
        Ok(())
    }

    fn holds(&self, controls: &ControlSet) -> SinkResult<bool> {
        if controls.is_never() {
            return Ok(false);
        }
        for qubit in controls.qubits() {
            if !self.bit(qubit)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn read_word(&self, qubits: &[Qubit]) -> SinkResult<u64> {
        if qubits.len() > 64 {
            return Err(SinkError::WidthOverflow {
                id: owner(qubits),
                len: qubits.len() as u32,
            });
        }
        let mut word = 0u64;
        for (i, qubit) in qubits.iter().enumerate() {
            if self.bit(qubit)? {
                word |= 1 << i;
            }
        }
        Ok(word)
    }

    fn zero_word(&mut self, qubits: &[Qubit]) -> SinkResult<()> {
        for qubit in qubits {
            self.set_bit(qubit, false)?;
        }
        Ok(())
    }

    fn flip_phase(&mut self) {
        self.phase_degrees = (self.phase_degrees + 180) % 360;
    }
}

impl Default for ClassicalSim {
    fn default() -> Self {
        Self::new()
    }
}

/// Register carrying the first bit, for error attribution on multi-register
/// views.
fn owner(qubits: &[Qubit]) -> RegId {
    qubits
        .first()
        .map(|q| q.reg.clone())
        .unwrap_or_else(|| RegId::new("", 0))
}

impl Sink for ClassicalSim {
    fn allocate(&mut self, id: &RegId, len: u32, x_basis: bool) -> SinkResult<()> {
        if len > 64 {
            return Err(SinkError::WidthOverflow {
                id: id.clone(),
                len,
            });
        }
        if self.regs.contains_key(id) {
            return Err(SinkError::DoubleAllocation { id: id.clone() });
        }
        let bits = (0..len).map(|_| x_basis && self.x_outcome()).collect();
        self.regs.insert(id.clone(), bits);
        Ok(())
    }

    fn release(&mut self, id: &RegId, len: u32, dirty: bool) -> SinkResult<()> {
        let bits = self
            .regs
            .get(id)
            .ok_or_else(|| SinkError::UnknownRegister { id: id.clone() })?;
        if bits.len() as u32 != len {
            return Err(SinkError::LengthMismatch {
                id: id.clone(),
                expected: bits.len() as u32,
                got: len,
            });
        }
        if !dirty {
            let mut value = 0u64;
            for (i, &b) in bits.iter().enumerate() {
                if b {
                    value |= 1 << i;
                }
            }
            if value != 0 {
                return Err(SinkError::ReleasedNonZero {
                    id: id.clone(),
                    value,
                });
            }
        }
        self.regs.remove(id);
        Ok(())
    }

    fn toggle(&mut self, targets: &Qureg, controls: &ControlSet) -> SinkResult<()> {
        let targets: Vec<Qubit> = targets.iter().collect();
        for qubit in &targets {
            // Validates existence and range even when the controls are off.
            self.bit(qubit)?;
            if controls.qubits().contains(qubit) {
                return Err(SinkError::SelfControlledToggle {
                    qubit: qubit.clone(),
                });
            }
        }
        if !self.holds(controls)? {
            return Ok(());
        }
        for qubit in &targets {
            let current = self.bit(qubit)?;
            self.set_bit(qubit, !current)?;
        }
        Ok(())
    }

    fn phase_flip(&mut self, controls: &ControlSet) -> SinkResult<()> {
        if self.holds(controls)? {
            self.flip_phase();
        }
        Ok(())
    }

    fn measure(&mut self, qureg: &Qureg, reset: bool) -> SinkResult<u64> {
        let qubits: Vec<Qubit> = qureg.iter().collect();
        let value = self.read_word(&qubits)?;
        if reset {
            self.zero_word(&qubits)?;
        }
        Ok(value)
    }

    fn start_uncompute(&mut self, qureg: &Qureg) -> SinkResult<u64> {
        let qubits: Vec<Qubit> = qureg.iter().collect();
        if self.open.contains_key(&qubits) {
            return Err(SinkError::UnmatchedUncompute { id: owner(&qubits) });
        }
        let value = self.read_word(&qubits)?;
        let mut result = 0u64;
        for i in 0..qubits.len() {
            if self.x_outcome() {
                result |= 1 << i;
            }
        }
        // X-measuring |v> projects onto a phase state: the outcome r kicks
        // back (-1)^(popcount(r & v)).
        if (result & value).count_ones() % 2 == 1 {
            self.flip_phase();
        }
        self.zero_word(&qubits)?;
        debug!(%qureg, result, kickback = (result & value).count_ones() % 2 == 1,
            "opened measurement-based uncomputation");
        self.open.insert(qubits, result);
        Ok(result)
    }

    fn end_uncompute(&mut self, qureg: &Qureg, result: u64) -> SinkResult<()> {
        let qubits: Vec<Qubit> = qureg.iter().collect();
        match self.open.get(&qubits) {
            Some(&started) if started == result => {
                self.open.remove(&qubits);
                Ok(())
            }
            _ => Err(SinkError::UnmatchedUncompute { id: owner(&qubits) }),
        }
    }
}
