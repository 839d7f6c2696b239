//! revq execution substrate
//!
//! Everything between client circuit code and a backend lives here: the
//! execution [`Context`] (register namespace + interception frames + the
//! backend reference), the [`Lens`] seam for stream observers, the
//! [`RValue`]/`hold` scoped-storage protocol, measurement-based
//! uncomputation, and the quantum-ROM lookup algorithm.
//!
//! # Example
//!
//! ```ignore
//! use revq_core::{Context, LookupRValue};
//! use revq_ir::{ControlSet, LookupTable, Quint};
//!
//! let mut sim = revq_sim::ClassicalSim::with_seed(7);
//! let mut ctx = Context::new(&mut sim);
//!
//! let addr = ctx.alloc_quint("addr", 4)?;
//! ctx.xor_const(addr.qureg(), 5, &ControlSet::ALWAYS)?;
//!
//! let table = LookupTable::from_fn(16, |a| a + 1)?;
//! let entry = LookupRValue::new(table, addr.clone());
//! ctx.hold(&entry, "entry", &ControlSet::ALWAYS, |ctx, value| {
//!     ctx.measure(value, false) // reads 6
//! })?;
//! // `value` has been uncomputed and freed; `addr` still reads 5.
//! ```

pub mod context;
pub mod error;
pub mod lens;
pub mod lookup;
pub mod rvalue;
pub mod uncompute;

pub use context::Context;
pub use error::{CoreError, CoreResult};
pub use lens::Lens;
pub use lookup::{LookupRValue, del_lookup, xor_lookup};
pub use rvalue::{RValue, UintOperand};
pub use uncompute::measurement_based_uncomputation;
