//! Gate-versus-reference consistency checking.
//!
//! A reversible gate over classical-state registers must act, on every
//! computational basis state, exactly like some permutation of classical
//! words. `check_consistent` drives a gate with random inputs on the
//! reference simulator and compares the measured outputs against a plain
//! classical function, with the gate's control bit both off and on.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use revq_core::{Context, CoreError, CoreResult};
use revq_ir::{ControlSet, Quint};

use crate::error::{SimError, SimResult};
use crate::sim::ClassicalSim;

/// Check a gate against its classical reference function.
///
/// For each of `cases` random input tuples (one value per entry of
/// `widths`) and for both control values, the gate is applied to freshly
/// allocated registers holding the inputs, gated by a one-bit control
/// register. The classical function receives the same inputs and the
/// control value and mutates them to the expected outputs. Every register
/// must match, the control bit must be undisturbed, and the simulator must
/// finish with no live registers and zero global phase.
pub fn check_consistent(
    gate: &str,
    widths: &[u32],
    cases: u32,
    seed: u64,
    apply_gate: impl Fn(&mut Context<'_>, &[Quint], &ControlSet) -> CoreResult<()>,
    reference: impl Fn(&mut [u64], bool),
) -> SimResult<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    for case in 0..cases {
        let inputs: Vec<u64> = widths.iter().map(|&w| rng.next_u64() & mask(w)).collect();
        for control_on in [false, true] {
            debug!(gate, case, control_on, ?inputs, "consistency case");
            check_case(
                gate,
                case,
                widths,
                &inputs,
                control_on,
                rng.next_u64(),
                &apply_gate,
                &reference,
            )?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn check_case(
    gate: &str,
    case: u32,
    widths: &[u32],
    inputs: &[u64],
    control_on: bool,
    sim_seed: u64,
    apply_gate: &impl Fn(&mut Context<'_>, &[Quint], &ControlSet) -> CoreResult<()>,
    reference: &impl Fn(&mut [u64], bool),
) -> SimResult<()> {
    let mut sim = ClassicalSim::with_seed(sim_seed);
    {
        let mut ctx = Context::new(&mut sim);

        let mut regs = Vec::with_capacity(widths.len());
        for (i, (&width, &value)) in widths.iter().zip(inputs).enumerate() {
            let quint = ctx.alloc_quint(&format!("in{i}"), width)?;
            ctx.xor_const(quint.qureg(), value, &ControlSet::ALWAYS)?;
            regs.push(quint);
        }
        let control = ctx.alloc("control", 1)?;
        if control_on {
            ctx.toggle(&control, &ControlSet::ALWAYS)?;
        }
        let cond = ControlSet::single(control.qubit(0).map_err(CoreError::from)?);

        apply_gate(&mut ctx, &regs, &cond)?;

        let mut expected = inputs.to_vec();
        reference(&mut expected, control_on);

        for (register, (quint, &want)) in regs.iter().zip(&expected).enumerate() {
            let got = ctx.measure(quint.qureg(), true)?;
            if got != want {
                return Err(SimError::ConsistencyMismatch {
                    gate: gate.to_string(),
                    case,
                    control: control_on,
                    inputs: inputs.to_vec(),
                    register,
                    expected: want,
                    got,
                });
            }
        }
        let control_after = ctx.measure(&control, true)?;
        if (control_after == 1) != control_on {
            return Err(SimError::ControlDisturbed {
                gate: gate.to_string(),
                case,
            });
        }

        for quint in regs {
            let qureg = quint.qureg().clone();
            ctx.free(qureg)?;
        }
        ctx.free(control)?;
    }
    if !sim.is_empty() || sim.phase_degrees() != 0 {
        return Err(SimError::UncleanFinish {
            gate: gate.to_string(),
            live: sim.live_registers(),
            phase: sim.phase_degrees(),
        });
    }
    Ok(())
}

fn mask(width: u32) -> u64 {
    match width {
        0 => 0,
        64 => u64::MAX,
        w => (1u64 << w) - 1,
    }
}
