//! End-to-end tests of context scopes against the reference backend.

use std::cell::Cell;
use std::rc::Rc;

use revq_core::{Context, CoreResult, Lens};
use revq_ir::{ControlSet, Op, Qureg};
use revq_sim::ClassicalSim;

// ---------------------------------------------------------------------------
// Control lowering
// ---------------------------------------------------------------------------

#[test]
fn never_region_leaves_state_untouched() {
    let mut sim = ClassicalSim::with_seed(0);
    {
        let mut ctx = Context::new(&mut sim);
        let q = ctx.alloc("q", 4).unwrap();
        ctx.xor_const(&q, 0b1001, &ControlSet::ALWAYS).unwrap();
        ctx.with_control(&ControlSet::NEVER, |ctx| {
            ctx.xor_const(&q, 0b1111, &ControlSet::ALWAYS)
        })
        .unwrap();
        assert_eq!(ctx.measure(&q, true).unwrap(), 0b1001);
        ctx.free(q).unwrap();
    }
    assert!(sim.is_empty());
}

#[test]
fn controlled_region_gates_at_runtime() {
    let mut sim = ClassicalSim::with_seed(0);
    let mut ctx = Context::new(&mut sim);
    let c = ctx.alloc("c", 1).unwrap();
    let t = ctx.alloc("t", 2).unwrap();
    let cond = ControlSet::single(c.qubit(0).unwrap());

    ctx.with_control(&cond, |ctx| ctx.xor_const(&t, 0b11, &ControlSet::ALWAYS))
        .unwrap();
    assert_eq!(ctx.measure(&t, false).unwrap(), 0); // control off

    ctx.toggle(&c, &ControlSet::ALWAYS).unwrap();
    ctx.with_control(&cond, |ctx| ctx.xor_const(&t, 0b11, &ControlSet::ALWAYS))
        .unwrap();
    assert_eq!(ctx.measure(&t, false).unwrap(), 0b11); // control on
}

// ---------------------------------------------------------------------------
// Inversion
// ---------------------------------------------------------------------------

fn stairs(ctx: &mut Context<'_>, q: &Qureg) -> CoreResult<()> {
    ctx.xor_const(q, 0b101, &ControlSet::ALWAYS)?;
    ctx.toggle(
        &q.slice(1, 1)?,
        &ControlSet::single(q.qubit(0)?),
    )
}

#[test]
fn inverted_region_restores_state() {
    let mut sim = ClassicalSim::with_seed(0);
    let mut ctx = Context::new(&mut sim);
    let q = ctx.alloc("q", 3).unwrap();

    stairs(&mut ctx, &q).unwrap();
    assert_eq!(ctx.measure(&q, false).unwrap(), 0b111);

    ctx.with_inverted(|ctx| stairs(ctx, &q)).unwrap();
    assert_eq!(ctx.measure(&q, true).unwrap(), 0);
    ctx.free(q).unwrap();
}

#[test]
fn op_followed_by_its_inverse_is_identity() {
    let mut sim = ClassicalSim::with_seed(0);
    let mut ctx = Context::new(&mut sim);
    let c = ctx.alloc("c", 1).unwrap();
    let t = ctx.alloc("t", 2).unwrap();
    ctx.toggle(&c, &ControlSet::ALWAYS).unwrap();

    let op = Op::Toggle { targets: t.clone() }
        .controlled_by(&ControlSet::single(c.qubit(0).unwrap()));
    ctx.emit(op.clone()).unwrap();
    assert_eq!(ctx.measure(&t, false).unwrap(), 0b11);
    ctx.emit(op.inverse().unwrap()).unwrap();
    assert_eq!(ctx.measure(&t, false).unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Capture and observation
// ---------------------------------------------------------------------------

#[test]
fn captured_ops_run_only_when_replayed() {
    let mut sim = ClassicalSim::with_seed(0);
    let mut ctx = Context::new(&mut sim);
    let q = ctx.alloc("q", 2).unwrap();

    let ((), ops) = ctx
        .capture(|ctx| ctx.xor_const(&q, 0b10, &ControlSet::ALWAYS))
        .unwrap();
    assert_eq!(ctx.measure(&q, false).unwrap(), 0);

    for op in ops {
        ctx.emit(op).unwrap();
    }
    assert_eq!(ctx.measure(&q, false).unwrap(), 0b10);
}

struct CountingLens {
    ops: Rc<Cell<usize>>,
    measurements: Rc<Cell<usize>>,
}

impl Lens for CountingLens {
    fn name(&self) -> &str {
        "counting"
    }

    fn modify(&mut self, op: Op) -> CoreResult<Vec<Op>> {
        self.ops.set(self.ops.get() + 1);
        Ok(vec![op])
    }

    fn observe_measurement(&mut self, _op: &Op) {
        self.measurements.set(self.measurements.get() + 1);
    }
}

#[test]
fn observer_lens_sees_ops_and_measurements() {
    let ops = Rc::new(Cell::new(0));
    let measurements = Rc::new(Cell::new(0));

    let mut sim = ClassicalSim::with_seed(0);
    let mut ctx = Context::new(&mut sim);
    let q = ctx.alloc("q", 2).unwrap();

    let lens = CountingLens {
        ops: Rc::clone(&ops),
        measurements: Rc::clone(&measurements),
    };
    let ((), _lens) = ctx
        .observe(Box::new(lens), |ctx| {
            ctx.xor_const(&q, 0b01, &ControlSet::ALWAYS)?;
            let v = ctx.measure(&q, false)?;
            assert_eq!(v, 0b01); // the lens observes, it does not divert
            Ok(())
        })
        .unwrap();

    assert_eq!(ops.get(), 1);
    assert_eq!(measurements.get(), 1);
}
