//! Classical reference backend for revq circuits.
//!
//! [`ClassicalSim`] executes the full backend contract on exact classical
//! bit state, catching reversibility violations (non-zero releases,
//! self-controlled toggles, unmatched uncomputations) as hard errors.
//! [`check_consistent`] drives a gate against a plain classical function
//! across random inputs and both control values.
//!
//! # Example
//!
//! ```
//! use revq_core::Context;
//! use revq_ir::ControlSet;
//! use revq_sim::ClassicalSim;
//!
//! let mut sim = ClassicalSim::with_seed(1);
//! let mut ctx = Context::new(&mut sim);
//! let q = ctx.alloc("q", 4)?;
//! ctx.xor_const(&q, 0b1010, &ControlSet::ALWAYS)?;
//! assert_eq!(ctx.measure(&q, true)?, 0b1010);
//! ctx.free(q)?;
//! # Ok::<(), revq_core::CoreError>(())
//! ```

pub mod error;
pub mod harness;
pub mod sim;

pub use error::{SimError, SimResult};
pub use harness::check_consistent;
pub use sim::ClassicalSim;
