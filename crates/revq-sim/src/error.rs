//! Error types for the reference backend and the consistency harness.

use thiserror::Error;

use revq_core::CoreError;

/// Simulation and consistency-checking failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// An error raised while executing the circuit under test.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A gate disagreed with its classical reference function.
    #[error(
        "gate '{gate}' case {case} (control={control}, inputs={inputs:?}): \
         register {register} expected {expected:#x}, got {got:#x}"
    )]
    ConsistencyMismatch {
        /// Name of the gate under test.
        gate: String,
        /// Which random case failed.
        case: u32,
        /// Whether the gate's control bit was set.
        control: bool,
        /// The sampled input values.
        inputs: Vec<u64>,
        /// Index of the disagreeing register.
        register: usize,
        /// Value the classical reference computed.
        expected: u64,
        /// Value the gate left in the register.
        got: u64,
    },

    /// A gate flipped its own control bit.
    #[error("gate '{gate}' case {case}: control bit was disturbed")]
    ControlDisturbed {
        /// Name of the gate under test.
        gate: String,
        /// Which random case failed.
        case: u32,
    },

    /// A gate finished with registers still allocated or a non-trivial
    /// global phase.
    #[error("gate '{gate}' finished unclean: {live} live registers, phase {phase} degrees")]
    UncleanFinish {
        /// Name of the gate under test.
        gate: String,
        /// Registers still allocated afterwards.
        live: usize,
        /// Residual global phase.
        phase: u32,
    },
}

/// Result type for simulation and consistency checking.
pub type SimResult<T> = Result<T, SimError>;
