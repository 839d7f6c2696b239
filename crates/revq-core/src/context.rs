//! The execution context: register namespace, interception frames, and
//! the path from emitted operations to the backend.

use rustc_hash::FxHashMap;
use tracing::debug;

use revq_ir::{ControlSet, IrError, Op, Qubit, Quint, Qureg, RegId, Sink};

use crate::error::{CoreError, CoreResult};
use crate::lens::Lens;

/// One open interception scope.
enum Frame {
    /// Buffers every passing operation and removes it from the stream.
    Capture { scope: u64, ops: Vec<Op> },
    /// A user lens through which the stream flows.
    Observer { scope: u64, lens: Box<dyn Lens> },
}

impl Frame {
    fn scope(&self) -> u64 {
        match self {
            Frame::Capture { scope, .. } | Frame::Observer { scope, .. } => *scope,
        }
    }
}

/// The single-owner execution context.
///
/// A context owns the register namespace, the stack of open interception
/// frames, and a mutable reference to the backend. All emission flows
/// through it; there is no global state. Execution is single-threaded and
/// synchronous; nesting scopes on one context is the only composition.
///
/// Scopes are closure-based (`with_control`, `with_inverted`, `capture`,
/// `observe`), so exiting out of order is unrepresentable in safe use;
/// the scope-id check on every pop keeps the discipline verified anyway.
pub struct Context<'a> {
    sink: &'a mut dyn Sink,
    frames: Vec<Frame>,
    next_scope: u64,
    seq_counters: FxHashMap<String, u64>,
}

impl<'a> Context<'a> {
    /// Create a context emitting into the given backend.
    pub fn new(sink: &'a mut dyn Sink) -> Self {
        Self {
            sink,
            frames: Vec::new(),
            next_scope: 0,
            seq_counters: FxHashMap::default(),
        }
    }

    // -----------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------

    /// Push one operation through every open frame, innermost first, and
    /// lower the survivors into the backend.
    pub fn emit(&mut self, op: Op) -> CoreResult<()> {
        let mut stream = vec![op];
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::Capture { ops, .. } => {
                    ops.append(&mut stream);
                    return Ok(());
                }
                Frame::Observer { lens, .. } => {
                    let mut next = Vec::new();
                    for op in stream {
                        next.extend(lens.modify(op)?);
                    }
                    if next.is_empty() {
                        debug!(lens = lens.name(), "lens emptied the stream");
                        return Ok(());
                    }
                    stream = next;
                }
            }
        }
        for op in stream {
            op.apply(&ControlSet::ALWAYS, self.sink)?;
        }
        Ok(())
    }

    /// Emit a toggle of `targets` gated by `controls`.
    pub fn toggle(&mut self, targets: &Qureg, controls: &ControlSet) -> CoreResult<()> {
        self.emit(
            Op::Toggle {
                targets: targets.clone(),
            }
            .controlled_by(controls),
        )
    }

    /// Emit a global phase flip gated by `controls`.
    pub fn phase_flip(&mut self, controls: &ControlSet) -> CoreResult<()> {
        self.emit(Op::PhaseFlip.controlled_by(controls))
    }

    /// XOR a classical constant into a register, gated by `controls`.
    pub fn xor_const(&mut self, dst: &Qureg, value: u64, controls: &ControlSet) -> CoreResult<()> {
        if dst.len() < 64 && value >> dst.len() != 0 {
            return Err(IrError::ValueOverflow {
                value,
                len: dst.len(),
            }
            .into());
        }
        let targets: Vec<Qubit> = (0..dst.len())
            .filter(|&b| value >> b & 1 == 1)
            .map(|b| dst.qubit(b))
            .collect::<Result<_, _>>()?;
        if targets.is_empty() {
            return Ok(());
        }
        self.toggle(&Qureg::raw(targets), controls)
    }

    // -----------------------------------------------------------------
    // Register namespace
    // -----------------------------------------------------------------

    /// Allocate a fresh zeroed register under `name`.
    ///
    /// Names are a namespace, not an identity: repeated allocations under
    /// one name receive increasing sequence numbers and never collide.
    pub fn alloc(&mut self, name: &str, len: u32) -> CoreResult<Qureg> {
        self.alloc_inner(name, len, false)
    }

    /// Allocate a fresh register filled with uniformly random bits
    /// (X-basis allocation).
    pub fn alloc_x(&mut self, name: &str, len: u32) -> CoreResult<Qureg> {
        self.alloc_inner(name, len, true)
    }

    /// Allocate a fresh zeroed register and view it as an unsigned integer.
    pub fn alloc_quint(&mut self, name: &str, len: u32) -> CoreResult<Quint> {
        Ok(Quint::new(self.alloc(name, len)?))
    }

    fn alloc_inner(&mut self, name: &str, len: u32, x_basis: bool) -> CoreResult<Qureg> {
        if len > 64 {
            return Err(IrError::WidthOverflow { len }.into());
        }
        let seq = self.seq_counters.entry(name.to_string()).or_insert(0);
        let id = RegId::new(name, *seq);
        *seq += 1;
        debug!(%id, len, x_basis, "allocating register");
        self.emit(Op::Alloc {
            id: id.clone(),
            len,
            x_basis,
        })?;
        Ok(Qureg::named(id, len))
    }

    /// Release a register. Its bits must all read zero.
    pub fn free(&mut self, qureg: Qureg) -> CoreResult<()> {
        self.free_inner(qureg, false)
    }

    /// Release a register without the all-zero check, explicitly
    /// discarding its contents as garbage.
    pub fn free_dirty(&mut self, qureg: Qureg) -> CoreResult<()> {
        self.free_inner(qureg, true)
    }

    fn free_inner(&mut self, qureg: Qureg, dirty: bool) -> CoreResult<()> {
        match qureg {
            Qureg::Named { id, len } => {
                debug!(%id, len, dirty, "releasing register");
                self.emit(Op::Release { id, len, dirty })
            }
            other => Err(CoreError::NotReleasable {
                qureg: other.to_string(),
            }),
        }
    }

    // -----------------------------------------------------------------
    // Value-returning measurements
    // -----------------------------------------------------------------

    /// Read the current value of a register, optionally zeroing it.
    ///
    /// Measurements produce their result at emission time, so they cannot
    /// pass through a capturing scope; observer lenses are notified.
    pub fn measure(&mut self, qureg: &Qureg, reset: bool) -> CoreResult<u64> {
        let op = Op::Measure {
            qureg: qureg.clone(),
            reset,
        };
        self.notify_measurement(&op)?;
        Ok(self.sink.measure(qureg, reset)?)
    }

    /// Open a measurement-based uncomputation: X-measure the register,
    /// zero it, and return the captured result word. The caller owes the
    /// matching phase corrections; prefer the scoped helper in
    /// [`crate::uncompute`].
    pub fn start_uncompute(&mut self, qureg: &Qureg) -> CoreResult<u64> {
        let op = Op::StartUncompute {
            qureg: qureg.clone(),
        };
        self.notify_measurement(&op)?;
        Ok(self.sink.start_uncompute(qureg)?)
    }

    /// Close a measurement-based uncomputation with the result captured
    /// by the matching [`Context::start_uncompute`].
    pub fn end_uncompute(&mut self, qureg: &Qureg, result: u64) -> CoreResult<()> {
        let op = Op::EndUncompute {
            qureg: qureg.clone(),
            result,
        };
        self.notify_measurement(&op)?;
        Ok(self.sink.end_uncompute(qureg, result)?)
    }

    fn notify_measurement(&mut self, op: &Op) -> CoreResult<()> {
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::Capture { .. } => {
                    return Err(CoreError::DeferredMeasurement { op: op.to_string() });
                }
                Frame::Observer { lens, .. } => lens.observe_measurement(op),
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Scoped regions
    // -----------------------------------------------------------------

    /// Run `body` with every operation it emits gated by `cond`.
    ///
    /// The body's operations are captured and, on success, replayed with
    /// the extra condition, or none at all when `cond` is statically
    /// `NEVER`. On error nothing is replayed: a controlled region is
    /// all-or-nothing.
    pub fn with_control<T>(
        &mut self,
        cond: &ControlSet,
        body: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let scope = self.push_capture();
        let result = body(self);
        let ops = self.pop_capture(scope)?;
        let value = result?;
        if cond.is_never() {
            debug!(count = ops.len(), "dropping operations gated by never");
            return Ok(value);
        }
        debug!(count = ops.len(), %cond, "replaying controlled region");
        for op in ops {
            let op = op.controlled_by(cond);
            self.emit(op)?;
        }
        Ok(value)
    }

    /// Run `body` and, on success, emit the inverse of everything it
    /// emitted, in reverse order.
    pub fn with_inverted<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let scope = self.push_capture();
        let result = body(self);
        let ops = self.pop_capture(scope)?;
        let value = result?;
        debug!(count = ops.len(), "replaying inverted region");
        for op in ops.into_iter().rev() {
            let inv = op.inverse()?;
            self.emit(inv)?;
        }
        Ok(value)
    }

    /// Run `body` and return the operations it emitted without executing
    /// them.
    pub fn capture<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<(T, Vec<Op>)> {
        let scope = self.push_capture();
        let result = body(self);
        let ops = self.pop_capture(scope)?;
        Ok((result?, ops))
    }

    /// Run `body` with `lens` interposed on the stream, returning the
    /// lens afterwards (trace exporters read their output back out of it).
    pub fn observe<T>(
        &mut self,
        lens: Box<dyn Lens>,
        body: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<(T, Box<dyn Lens>)> {
        let scope = self.fresh_scope();
        self.frames.push(Frame::Observer { scope, lens });
        let result = body(self);
        let frame = self.pop_frame(scope)?;
        let lens = match frame {
            Frame::Observer { lens, .. } => lens,
            Frame::Capture { .. } => unreachable!("scope ids are unique"),
        };
        Ok((result?, lens))
    }

    fn fresh_scope(&mut self) -> u64 {
        let scope = self.next_scope;
        self.next_scope += 1;
        scope
    }

    fn push_capture(&mut self) -> u64 {
        let scope = self.fresh_scope();
        self.frames.push(Frame::Capture {
            scope,
            ops: Vec::new(),
        });
        scope
    }

    fn pop_capture(&mut self, scope: u64) -> CoreResult<Vec<Op>> {
        match self.pop_frame(scope)? {
            Frame::Capture { ops, .. } => Ok(ops),
            Frame::Observer { .. } => unreachable!("scope ids are unique"),
        }
    }

    fn pop_frame(&mut self, scope: u64) -> CoreResult<Frame> {
        let top = self.frames.last().map(Frame::scope);
        if top != Some(scope) {
            return Err(CoreError::ScopeMismatch {
                expected: scope,
                got: top,
            });
        }
        Ok(self.frames.pop().expect("frame stack verified non-empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revq_ir::{SinkError, SinkResult};

    /// Records every primitive that reaches the backend.
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }

    impl Sink for RecordingSink {
        fn allocate(&mut self, id: &RegId, len: u32, _x_basis: bool) -> SinkResult<()> {
            self.calls.push(format!("alloc {id}[{len}]"));
            Ok(())
        }

        fn release(&mut self, id: &RegId, len: u32, _dirty: bool) -> SinkResult<()> {
            self.calls.push(format!("release {id}[{len}]"));
            Ok(())
        }

        fn toggle(&mut self, targets: &Qureg, controls: &ControlSet) -> SinkResult<()> {
            self.calls.push(format!("toggle {targets} if {controls}"));
            Ok(())
        }

        fn phase_flip(&mut self, controls: &ControlSet) -> SinkResult<()> {
            self.calls.push(format!("phase_flip if {controls}"));
            Ok(())
        }

        fn measure(&mut self, qureg: &Qureg, _reset: bool) -> SinkResult<u64> {
            self.calls.push(format!("measure {qureg}"));
            Ok(0)
        }

        fn start_uncompute(&mut self, qureg: &Qureg) -> SinkResult<u64> {
            self.calls.push(format!("start_uncompute {qureg}"));
            Ok(0)
        }

        fn end_uncompute(&mut self, qureg: &Qureg, _result: u64) -> SinkResult<()> {
            self.calls.push(format!("end_uncompute {qureg}"));
            Ok(())
        }
    }

    fn boom() -> CoreError {
        SinkError::UnmatchedUncompute {
            id: RegId::new("boom", 0),
        }
        .into()
    }

    #[test]
    fn test_emit_reaches_sink() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        let q = ctx.alloc("a", 2).unwrap();
        ctx.toggle(&q, &ControlSet::ALWAYS).unwrap();
        ctx.free_dirty(q).unwrap();
        assert_eq!(sink.calls.len(), 3);
        assert_eq!(sink.calls[0], "alloc a#0[2]");
    }

    #[test]
    fn test_never_controlled_region_emits_nothing() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        let q = ctx.alloc("a", 1).unwrap();
        ctx.with_control(&ControlSet::NEVER, |ctx| ctx.toggle(&q, &ControlSet::ALWAYS))
            .unwrap();
        assert_eq!(sink.calls.len(), 1); // just the alloc
    }

    #[test]
    fn test_controlled_region_wraps_ops() {
        let mut sink = RecordingSink::default();
        {
            let mut ctx = Context::new(&mut sink);
            let q = ctx.alloc("a", 1).unwrap();
            let c = ctx.alloc("c", 1).unwrap();
            let cond = ControlSet::single(c.qubit(0).unwrap());
            ctx.with_control(&cond, |ctx| ctx.toggle(&q, &ControlSet::ALWAYS))
                .unwrap();
        }
        assert_eq!(sink.calls[2], "toggle a#0[0..1] if c#0");
    }

    #[test]
    fn test_controlled_region_is_all_or_nothing() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        let q = ctx.alloc("a", 1).unwrap();
        let err = ctx.with_control(&ControlSet::ALWAYS, |ctx| {
            ctx.toggle(&q, &ControlSet::ALWAYS)?;
            Err::<(), _>(boom())
        });
        assert!(err.is_err());
        // The captured toggle was discarded, not replayed.
        assert_eq!(sink.calls.len(), 1);
    }

    #[test]
    fn test_inverted_region_reverses_and_inverts() {
        let mut sink = RecordingSink::default();
        {
            let mut ctx = Context::new(&mut sink);
            ctx.with_inverted(|ctx| {
                let q = ctx.alloc("t", 1)?;
                ctx.toggle(&q, &ControlSet::ALWAYS)?;
                ctx.free(q)
            })
            .unwrap();
        }
        // alloc; toggle; release  →  alloc; toggle; release (reversed, inverted)
        assert_eq!(
            sink.calls,
            vec!["alloc t#0[1]", "toggle t#0[0..1] if always", "release t#0[1]"]
        );
    }

    #[test]
    fn test_capture_swallows_ops() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        let q = ctx.alloc("a", 1).unwrap();
        let ((), ops) = ctx
            .capture(|ctx| ctx.toggle(&q, &ControlSet::ALWAYS))
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(sink.calls.len(), 1); // alloc only
    }

    #[test]
    fn test_measurement_cannot_be_captured() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        let q = ctx.alloc("a", 1).unwrap();
        let err = ctx.capture(|ctx| ctx.measure(&q, false));
        assert!(matches!(
            err,
            Err(CoreError::DeferredMeasurement { .. })
        ));
    }

    #[test]
    fn test_sequences_increase_per_name() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        let a0 = ctx.alloc("a", 1).unwrap();
        let a1 = ctx.alloc("a", 1).unwrap();
        let b0 = ctx.alloc("b", 1).unwrap();
        assert_ne!(a0, a1);
        assert_eq!(a1, Qureg::named(RegId::new("a", 1), 1));
        assert_eq!(b0, Qureg::named(RegId::new("b", 0), 1));
    }

    #[test]
    fn test_width_cap_enforced() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        assert!(matches!(
            ctx.alloc("wide", 65),
            Err(CoreError::Ir(IrError::WidthOverflow { len: 65 }))
        ));
    }

    #[test]
    fn test_xor_const_overflow_rejected() {
        let mut sink = RecordingSink::default();
        let mut ctx = Context::new(&mut sink);
        let q = ctx.alloc("a", 2).unwrap();
        assert!(ctx.xor_const(&q, 4, &ControlSet::ALWAYS).is_err());
        assert!(ctx.xor_const(&q, 3, &ControlSet::ALWAYS).is_ok());
    }
}
