//! Benchmarks for quantum-ROM lookup synthesis
//!
//! Run with: cargo bench -p revq-core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use revq_core::{Context, xor_lookup};
use revq_ir::{ControlSet, LookupTable, Quint, Qureg, RegId, Sink, SinkResult};

/// Accepts every primitive and counts toggles; stands in for a backend so
/// the benchmark measures synthesis cost, not simulation cost.
#[derive(Default)]
struct CountingSink {
    toggles: u64,
}

impl Sink for CountingSink {
    fn allocate(&mut self, _id: &RegId, _len: u32, _x_basis: bool) -> SinkResult<()> {
        Ok(())
    }

    fn release(&mut self, _id: &RegId, _len: u32, _dirty: bool) -> SinkResult<()> {
        Ok(())
    }

    fn toggle(&mut self, _targets: &Qureg, _controls: &ControlSet) -> SinkResult<()> {
        self.toggles += 1;
        Ok(())
    }

    fn phase_flip(&mut self, _controls: &ControlSet) -> SinkResult<()> {
        Ok(())
    }

    fn measure(&mut self, _qureg: &Qureg, _reset: bool) -> SinkResult<u64> {
        Ok(0)
    }

    fn start_uncompute(&mut self, _qureg: &Qureg) -> SinkResult<u64> {
        Ok(0)
    }

    fn end_uncompute(&mut self, _qureg: &Qureg, _result: u64) -> SinkResult<()> {
        Ok(())
    }
}

fn bench_xor_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("xor_lookup");

    for address_bits in &[4u32, 6, 8, 10] {
        let entries = 1u64 << address_bits;
        // Worst case for the recursion: no two adjacent entries equal.
        let table = LookupTable::from_fn(entries, |a| a).unwrap();

        group.bench_with_input(
            BenchmarkId::new("synthesise", address_bits),
            address_bits,
            |b, &n| {
                b.iter(|| {
                    let mut sink = CountingSink::default();
                    let mut ctx = Context::new(&mut sink);
                    let address = Quint::new(ctx.alloc("addr", n).unwrap());
                    let dst = ctx.alloc("dst", table.output_width()).unwrap();
                    xor_lookup(
                        &mut ctx,
                        black_box(&dst),
                        black_box(&address),
                        black_box(&table),
                        &ControlSet::ALWAYS,
                    )
                    .unwrap();
                    black_box(sink.toggles)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_xor_lookup);
criterion_main!(benches);
