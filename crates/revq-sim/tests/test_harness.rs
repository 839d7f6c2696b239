//! Tests for the classical/quantum consistency harness.

use revq_core::xor_lookup;
use revq_ir::{ControlSet, LookupTable, Qureg};
use revq_sim::{SimError, check_consistent};

// ---------------------------------------------------------------------------
// Consistent gates
// ---------------------------------------------------------------------------

#[test]
fn xor_const_gate_is_consistent() {
    check_consistent(
        "xor_const_21",
        &[6],
        128,
        11,
        |ctx, regs, cond| ctx.xor_const(regs[0].qureg(), 21, cond),
        |vals, on| {
            if on {
                vals[0] ^= 21;
            }
        },
    )
    .unwrap();
}

#[test]
fn xor_register_gate_is_consistent() {
    check_consistent(
        "xor_reg_into_reg",
        &[5, 5],
        128,
        12,
        |ctx, regs, cond| {
            for i in 0..5 {
                ctx.toggle(
                    &regs[1].qureg().slice(i, 1)?,
                    &cond.and_qubit(regs[0].bit(i)?),
                )?;
            }
            Ok(())
        },
        |vals, on| {
            if on {
                vals[1] ^= vals[0];
            }
        },
    )
    .unwrap();
}

#[test]
fn lookup_gate_is_consistent() {
    let table = LookupTable::from_fn(8, |a| (7 * a + 3) & 0xf).unwrap();
    let reference = table.clone();
    check_consistent(
        "table_read",
        &[3, 4],
        128,
        13,
        move |ctx, regs, cond| xor_lookup(ctx, regs[1].qureg(), &regs[0], &table, cond),
        move |vals, on| {
            if on {
                vals[1] ^= reference.entry(vals[0]).unwrap();
            }
        },
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// Detected failures
// ---------------------------------------------------------------------------

#[test]
fn wrong_gate_is_reported() {
    let result = check_consistent(
        "claims_5_applies_3",
        &[4],
        8,
        14,
        |ctx, regs, cond| ctx.xor_const(regs[0].qureg(), 3, cond),
        |vals, on| {
            if on {
                vals[0] ^= 5;
            }
        },
    );
    assert!(matches!(
        result,
        Err(SimError::ConsistencyMismatch { control: true, .. })
    ));
}

#[test]
fn control_disturbance_is_reported() {
    let result = check_consistent(
        "flips_own_control",
        &[2],
        4,
        15,
        |ctx, _regs, cond| {
            let control_bit = Qureg::raw(vec![cond.qubits()[0].clone()]);
            ctx.toggle(&control_bit, &ControlSet::ALWAYS)
        },
        |_vals, _on| {},
    );
    assert!(matches!(result, Err(SimError::ControlDisturbed { .. })));
}

#[test]
fn leaked_register_is_reported() {
    let result = check_consistent(
        "leaks_an_ancilla",
        &[2],
        4,
        16,
        |ctx, _regs, _cond| {
            ctx.alloc("leak", 1)?;
            Ok(())
        },
        |_vals, _on| {},
    );
    assert!(matches!(result, Err(SimError::UncleanFinish { live: 1, .. })));
}
