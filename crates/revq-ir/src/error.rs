//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur when building IR values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Bit index out of range for a register.
    #[error("bit index {index} out of range for register of length {len}")]
    IndexOutOfRange {
        /// The requested bit index.
        index: u32,
        /// The register length.
        len: u32,
    },

    /// Sub-range does not fit inside the base register.
    #[error("range [{start}, {start}+{len}) out of range for register of length {base_len}")]
    RangeOutOfRange {
        /// Start of the requested range.
        start: u32,
        /// Length of the requested range.
        len: u32,
        /// Length of the base register.
        base_len: u32,
    },

    /// Register width does not match the width required by a type.
    #[error("register of length {got} does not match required width {expected}")]
    WidthMismatch {
        /// The required width in bits.
        expected: u32,
        /// The actual register length.
        got: u32,
    },

    /// Register width exceeds the 64-bit cap on measurable registers.
    #[error("register length {len} exceeds the 64-bit register cap")]
    WidthOverflow {
        /// The requested length.
        len: u32,
    },

    /// Classical value does not fit in the register.
    #[error("value {value} does not fit in {len} bits")]
    ValueOverflow {
        /// The classical value.
        value: u64,
        /// The register length.
        len: u32,
    },

    /// Lookup tables must have at least one entry.
    #[error("lookup table must not be empty")]
    EmptyTable,

    /// The operation has no structural inverse.
    #[error("operation '{op}' is not invertible")]
    NotInvertible {
        /// Name of the offending operation.
        op: String,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
