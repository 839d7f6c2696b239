//! Quantum-ROM table lookup.
//!
//! `xor_lookup` XORs a classically-known table entry, selected by a
//! register-valued address, into a destination register:
//!
//!   lvalue ^= table[address]
//!
//! The synthesis is recursive divide-and-conquer on the address bits:
//! one ancilla per level holds `(ambient condition) AND (top address
//! bit)` and gates the two half-table recursions, giving O(log n)
//! recursion depth and O(n) primitive toggles for an n-entry table with
//! no equal adjacent entries.
//!
//! `del_lookup` uncomputes a looked-up value given only its address,
//! trading the full reverse recursion for one eager X-measurement of the
//! destination plus a smaller phase-fixup lookup: the whole-register
//! application of measurement-based uncomputation.

use tracing::debug;

use revq_ir::{ControlSet, IrError, LookupTable, Qubit, Quint, Qureg, floor_lg2};

use crate::context::Context;
use crate::error::CoreResult;
use crate::rvalue::RValue;

/// A table entry selected by a register-valued address, as a lazy value:
/// `hold` computes `table[address]` into fresh storage and uncomputes it
/// on exit via `del_lookup`.
#[derive(Debug, Clone)]
pub struct LookupRValue {
    table: LookupTable,
    address: Quint,
}

impl LookupRValue {
    /// A lazy read of `table[address]`.
    pub fn new(table: LookupTable, address: Quint) -> Self {
        Self { table, address }
    }

    /// The table being read.
    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    /// The address register.
    pub fn address(&self) -> &Quint {
        &self.address
    }
}

impl RValue for LookupRValue {
    fn make_storage(&self, ctx: &mut Context<'_>, name: &str) -> CoreResult<Qureg> {
        ctx.alloc(name, self.table.output_width().max(1))
    }

    fn init_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()> {
        xor_lookup(ctx, loc, &self.address, &self.table, controls)
    }

    fn del_storage(
        &self,
        ctx: &mut Context<'_>,
        loc: &Qureg,
        controls: &ControlSet,
    ) -> CoreResult<()> {
        del_lookup(ctx, loc, &self.address, &self.table, controls)
    }
}

/// XOR `table[address]` into `lvalue`, gated by `controls`.
///
/// Address bits beyond the width needed to select an entry are ignored;
/// entries beyond the reach of the address register are unreachable and
/// dropped from the synthesis.
pub fn xor_lookup(
    ctx: &mut Context<'_>,
    lvalue: &Qureg,
    address: &Quint,
    table: &LookupTable,
    controls: &ControlSet,
) -> CoreResult<()> {
    if lvalue.len() < table.output_width() {
        return Err(IrError::WidthMismatch {
            expected: table.output_width(),
            got: lvalue.len(),
        }
        .into());
    }
    let (entries, bits) = addressable(table, address)?;
    debug!(
        entries = entries.len(),
        address_bits = bits.len(),
        "synthesising xor lookup"
    );
    recurse(ctx, &Payload::XorInto(lvalue), entries, &bits, controls)
}

/// Uncompute `lvalue`, known to hold `table[address]` (gated by
/// `controls`), by eager X-measurement plus a phase-fixup lookup.
///
/// The address is split at `k = min(address_bits / 2,
/// floor(lg(output_width)))`: one fixup word per high-address value
/// accumulates which low addresses owe a phase flip for the measured
/// result, the low address is unary-encoded into a `2^k`-bit scratch
/// register, and a single phase-payload lookup over the high bits cancels
/// the kickback.
pub fn del_lookup(
    ctx: &mut Context<'_>,
    lvalue: &Qureg,
    address: &Quint,
    table: &LookupTable,
    controls: &ControlSet,
) -> CoreResult<()> {
    let (entries, bits) = addressable(table, address)?;
    let n = bits.len() as u32;
    let address_count = entries.len() as u64;
    let k = (n / 2).min(floor_lg2(u64::from(table.output_width().max(1))));
    debug!(
        entries = address_count,
        address_bits = n,
        low_bits = k,
        "synthesising lookup deletion"
    );

    // One-shot X measurement of the whole destination; everything after
    // this exists to cancel the kickback it causes.
    let measured = ctx.start_uncompute(lvalue)?;

    // fixups[h] bit l is set iff address (h << k) | l owes a phase flip.
    let low_count = 1u64 << k;
    let high_count = address_count.div_ceil(low_count).max(1);
    let fixups = LookupTable::from_fn(high_count, |h| {
        let mut word = 0u64;
        for l in 0..low_count {
            let a = (h << k) | l;
            if a < address_count && (entries[a as usize] & measured).count_ones() % 2 == 1 {
                word |= 1 << l;
            }
        }
        word
    })?;

    // Unary-encode the low address: scratch[l] = (low == l).
    let scratch = ctx.alloc("lookup_unary", low_count as u32)?;
    ctx.toggle(&scratch.slice(0, 1)?, &ControlSet::ALWAYS)?;
    for i in 0..k {
        for j in 0..(1u32 << i) {
            let step = 1u32 << i;
            ctx.toggle(
                &scratch.slice(j + step, 1)?,
                &ControlSet::from_qubits([scratch.qubit(j)?, address.bit(i)?]),
            )?;
            ctx.toggle(
                &scratch.slice(j, 1)?,
                &ControlSet::single(scratch.qubit(j + step)?),
            )?;
        }
    }

    // Phase fixup: one lookup over the high address bits, with a
    // phase-flip payload fanned out over the unary lines.
    recurse(
        ctx,
        &Payload::PhaseFlipUnary(&scratch),
        fixups.entries(),
        &bits[k as usize..],
        controls,
    )?;
    ctx.end_uncompute(lvalue, measured)?;

    // Uncompute the unary scratch (toggles are self-inverse; reverse order).
    for i in (0..k).rev() {
        for j in (0..(1u32 << i)).rev() {
            let step = 1u32 << i;
            ctx.toggle(
                &scratch.slice(j, 1)?,
                &ControlSet::single(scratch.qubit(j + step)?),
            )?;
            ctx.toggle(
                &scratch.slice(j + step, 1)?,
                &ControlSet::from_qubits([scratch.qubit(j)?, address.bit(i)?]),
            )?;
        }
    }
    ctx.toggle(&scratch.slice(0, 1)?, &ControlSet::ALWAYS)?;
    ctx.free(scratch)?;
    Ok(())
}

/// The entries an address register can actually select, plus the address
/// bits that matter.
fn addressable<'t>(
    table: &'t LookupTable,
    address: &Quint,
) -> CoreResult<(&'t [u64], Vec<Qubit>)> {
    let n = table.address_width().min(address.len());
    let count = table.len().min(1u64 << n) as usize;
    let bits = (0..n).map(|i| address.bit(i)).collect::<Result<_, _>>()?;
    Ok((&table.entries()[..count], bits))
}

/// What the base case of the lookup recursion applies.
enum Payload<'a> {
    /// XOR the selected word into a destination register.
    XorInto(&'a Qureg),
    /// Flip the phase once per set bit, each gated by the matching line
    /// of a unary-encoded register.
    PhaseFlipUnary(&'a Qureg),
}

fn recurse(
    ctx: &mut Context<'_>,
    payload: &Payload<'_>,
    entries: &[u64],
    address: &[Qubit],
    controls: &ControlSet,
) -> CoreResult<()> {
    if entries.is_empty() {
        return Ok(());
    }
    if address.is_empty() || entries.windows(2).all(|w| w[0] == w[1]) {
        return apply_payload(ctx, payload, entries[0], controls);
    }

    let top = address.len() - 1;
    let split = (1usize << top).min(entries.len());
    let (low, high) = entries.split_at(split);
    let rest = &address[..top];

    // One ancilla holding (controls AND top bit) gates the high half; a
    // XOR by the ambient condition complements it to gate the low half.
    // Held as an rvalue, so its release is measurement-based.
    let branch = ControlSet::single(address[top].clone());
    ctx.hold(&branch, "lookup_branch", controls, |ctx, anc| {
        let gate = ControlSet::single(anc.qubit(0)?);
        recurse(ctx, payload, high, rest, &gate)?;
        ctx.toggle(anc, controls)?;
        recurse(ctx, payload, low, rest, &gate)?;
        // Restore to (controls AND top bit) before the hold uncomputes.
        ctx.toggle(anc, controls)
    })
}

fn apply_payload(
    ctx: &mut Context<'_>,
    payload: &Payload<'_>,
    word: u64,
    controls: &ControlSet,
) -> CoreResult<()> {
    match payload {
        Payload::XorInto(dst) => ctx.xor_const(dst, word, controls),
        Payload::PhaseFlipUnary(unary) => {
            for l in 0..unary.len() {
                if word >> l & 1 == 1 {
                    ctx.phase_flip(&controls.and_qubit(unary.qubit(l)?))?;
                }
            }
            Ok(())
        }
    }
}
