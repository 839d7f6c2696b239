//! Lazy values and scoped storage.
//!
//! An [`RValue`] is a value that can be computed into a register: it
//! either already has storage, or knows how to allocate storage, compute
//! itself into it, and later erase itself back to zero. [`Context::hold`]
//! turns that contract into a guaranteed-balanced acquire/release scope.

use revq_ir::{ControlSet, Quint, Qureg};

use crate::context::Context;
use crate::error::CoreResult;
use crate::uncompute::measurement_based_uncomputation;

/// A value that can be computed into a register and later uncomputed.
///
/// `del_storage` must have the same logical effect as the inverse of
/// `init_storage`, though it may be implemented differently (typically by
/// measurement-based uncomputation).
pub trait RValue {
    /// Storage this value already lives in, if any. A value with existing
    /// storage is never initialized or deleted by `hold`.
    fn existing_storage(&self) -> Option<Qureg> {
        None
    }

    /// Allocate fresh, uninitialized storage for this value.
    fn make_storage(&self, ctx: &mut Context<'_>, name: &str) -> CoreResult<Qureg>;

    /// Compute this value into `loc`, gated by `controls`.
    fn init_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()>;

    /// Erase this value from `loc` back to all-zero, gated by `controls`.
    fn del_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()>;
}

impl Context<'_> {
    /// Hold `rvalue` in a register for the extent of `body`.
    ///
    /// A value with existing storage is passed through untouched. A value
    /// without gets storage allocated and initialized on entry; on
    /// successful exit it is uncomputed and the storage freed. If `body`
    /// returns an error the uncomputation is skipped and the storage is
    /// deliberately leaked: there is no way to erase a half-built value,
    /// and the error is already fatal to the construction.
    pub fn hold<T>(
        &mut self,
        rvalue: &dyn RValue,
        name: &str,
        controls: &ControlSet,
        body: impl FnOnce(&mut Self, &Qureg) -> CoreResult<T>,
    ) -> CoreResult<T> {
        if let Some(loc) = rvalue.existing_storage() {
            return body(self, &loc);
        }
        let loc = rvalue.make_storage(self, name)?;
        rvalue.init_storage(self, &loc, controls)?;
        let value = body(self, &loc)?;
        rvalue.del_storage(self, &loc, controls)?;
        self.free(loc)?;
        Ok(value)
    }
}

/// A register is the degenerate lazy value: its own storage.
impl RValue for Qureg {
    fn existing_storage(&self) -> Option<Qureg> {
        Some(self.clone())
    }

    // Never reached through `hold`; kept total so partial applications of
    // the contract stay harmless.
    fn make_storage(&self, _ctx: &mut Context<'_>, _name: &str) -> CoreResult<Qureg> {
        Ok(self.clone())
    }

    fn init_storage(
        &self,
        _ctx: &mut Context<'_>,
        _loc: &Qureg,
        _controls: &ControlSet,
    ) -> CoreResult<()> {
        Ok(())
    }

    fn del_storage(
        &self,
        _ctx: &mut Context<'_>,
        _loc: &Qureg,
        _controls: &ControlSet,
    ) -> CoreResult<()> {
        Ok(())
    }
}

impl RValue for Quint {
    fn existing_storage(&self) -> Option<Qureg> {
        Some(self.qureg().clone())
    }

    fn make_storage(&self, ctx: &mut Context<'_>, name: &str) -> CoreResult<Qureg> {
        self.qureg().make_storage(ctx, name)
    }

    fn init_storage(
        &self,
        _ctx: &mut Context<'_>,
        _loc: &Qureg,
        _controls: &ControlSet,
    ) -> CoreResult<()> {
        Ok(())
    }

    fn del_storage(
        &self,
        _ctx: &mut Context<'_>,
        _loc: &Qureg,
        _controls: &ControlSet,
    ) -> CoreResult<()> {
        Ok(())
    }
}

/// The AND of a control condition, held in a one-bit ancilla.
///
/// Init is a single multi-controlled toggle. Deletion is the textbook
/// single-qubit measurement-based uncomputation: X-measure the ancilla
/// and, when the captured bit is 1, flip the phase under the same
/// condition that computed it.
impl RValue for ControlSet {
    fn make_storage(&self, ctx: &mut Context<'_>, name: &str) -> CoreResult<Qureg> {
        ctx.alloc(name, 1)
    }

    fn init_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()> {
        ctx.toggle(loc, &self.and(controls))
    }

    fn del_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()> {
        measurement_based_uncomputation(ctx, loc, |ctx, result| {
            if result & 1 == 1 {
                ctx.phase_flip(&self.and(controls))?;
            }
            Ok(())
        })
    }
}

/// A closed operand type for gate parameters: a classical literal, a live
/// register, or a lazy expression. Resolving any of the three through the
/// [`RValue`] surface replaces the original design's call-time dispatch on
/// runtime type hints.
pub enum UintOperand {
    /// A classical constant.
    Literal(u64),
    /// A live register.
    Register(Quint),
    /// A lazy expression computed on demand.
    Lazy(Box<dyn RValue>),
}

impl UintOperand {
    /// Bits of storage a literal needs.
    fn literal_width(value: u64) -> u32 {
        (64 - value.leading_zeros()).max(1)
    }
}

impl RValue for UintOperand {
    fn existing_storage(&self) -> Option<Qureg> {
        match self {
            UintOperand::Literal(_) => None,
            UintOperand::Register(q) => Some(q.qureg().clone()),
            UintOperand::Lazy(inner) => inner.existing_storage(),
        }
    }

    fn make_storage(&self, ctx: &mut Context<'_>, name: &str) -> CoreResult<Qureg> {
        match self {
            UintOperand::Literal(value) => ctx.alloc(name, Self::literal_width(*value)),
            UintOperand::Register(q) => Ok(q.qureg().clone()),
            UintOperand::Lazy(inner) => inner.make_storage(ctx, name),
        }
    }

    fn init_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()> {
        match self {
            UintOperand::Literal(value) => ctx.xor_const(loc, *value, controls),
            UintOperand::Register(_) => Ok(()),
            UintOperand::Lazy(inner) => inner.init_storage(ctx, loc, controls),
        }
    }

    fn del_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()> {
        match self {
            // XOR of a constant is self-inverse.
            UintOperand::Literal(value) => ctx.xor_const(loc, *value, controls),
            UintOperand::Register(_) => Ok(()),
            UintOperand::Lazy(inner) => inner.del_storage(ctx, loc, controls),
        }
    }
}
