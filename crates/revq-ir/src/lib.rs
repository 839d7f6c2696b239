//! revq register, control, and operation types
//!
//! This crate provides the value types shared by the revq stack: register
//! identities and views, the control-condition algebra, the operation
//! model, lookup tables, and the backend contract every execution target
//! implements.
//!
//! # Overview
//!
//! revq circuits are reversible classical circuits: every effect must be
//! invertible, and temporary registers must be driven back to zero before
//! release. The types here are the vocabulary of that discipline:
//!
//! - **Identity**: [`RegId`] names an allocation, [`Qubit`] one bit of it
//! - **Registers**: [`Qureg`] (whole, ranged, or concatenated views),
//!   [`Quint`]/[`QuintMod`] integer views
//! - **Conditions**: [`ControlSet`], the AND of qubits plus a static bit
//! - **Effects**: [`Op`], with control composition, structural inversion,
//!   and recursive lowering into a [`Sink`]
//! - **Tables**: [`LookupTable`] for quantum-ROM reads
//!
//! # Example
//!
//! ```rust
//! use revq_ir::{ControlSet, Op, Qubit, Qureg, RegId};
//!
//! let data = Qureg::named(RegId::new("data", 0), 4);
//! let flag = Qubit::bare(RegId::new("flag", 0));
//!
//! // Flip the low two bits of `data` when `flag` reads true.
//! let op = Op::Toggle {
//!     targets: data.slice(0, 2).unwrap(),
//! }
//! .controlled_by(&ControlSet::single(flag));
//!
//! // Operations invert structurally; toggles are self-inverse.
//! assert_eq!(op.inverse().unwrap(), op);
//! ```

pub mod control;
pub mod error;
pub mod handle;
pub mod op;
pub mod quint;
pub mod qureg;
pub mod sink;
pub mod table;

pub use control::ControlSet;
pub use error::{IrError, IrResult};
pub use handle::{Qubit, RegId};
pub use op::Op;
pub use quint::{Quint, QuintMod};
pub use qureg::Qureg;
pub use sink::{Sink, SinkError, SinkResult};
pub use table::{LookupTable, ceil_lg2, floor_lg2};
