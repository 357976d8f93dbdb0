use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use molviz_undo::{Transactable, TransactableSequence, UndoContext};

/// Benchmark commit throughput (every editor gesture lands here)
fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");

    for ops in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(ops), &ops, |b, &ops| {
            let ctx = UndoContext::new();
            let value = Transactable::new(&ctx, 0u64);
            let mut next = 0u64;

            b.iter(|| {
                let tx = ctx.begin("bench");
                for _ in 0..ops {
                    next += 1;
                    value.set(next);
                }
                tx.commit().unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark a full undo/redo round trip over a committed transaction
fn bench_undo_redo_round_trip(c: &mut Criterion) {
    c.bench_function("undo_redo_round_trip", |b| {
        let ctx = UndoContext::new();
        let value = Transactable::new(&ctx, 0u64);

        let tx = ctx.begin("bench");
        for i in 1..=64u64 {
            value.set(i);
        }
        tx.commit().unwrap();

        b.iter(|| {
            ctx.undo().unwrap();
            ctx.redo().unwrap();
            black_box(value.get())
        });
    });
}

/// Benchmark structural mutation capture on a sequence
fn bench_sequence_capture(c: &mut Criterion) {
    c.bench_function("sequence_insert_remove_captured", |b| {
        let ctx = UndoContext::new();
        let seq = TransactableSequence::with_items(&ctx, (0..128i32).collect());

        b.iter(|| {
            let tx = ctx.begin("bench");
            seq.insert(64, -1);
            seq.remove_at(64);
            tx.commit().unwrap();
            black_box(seq.len())
        });
    });
}

/// Baseline: the same mutations without an open transaction
fn bench_sequence_direct(c: &mut Criterion) {
    c.bench_function("sequence_insert_remove_direct", |b| {
        let ctx = UndoContext::new();
        let seq = TransactableSequence::with_items(&ctx, (0..128i32).collect());

        b.iter(|| {
            seq.insert(64, -1);
            seq.remove_at(64);
            black_box(seq.len())
        });
    });
}

criterion_group!(
    benches,
    bench_commit,
    bench_undo_redo_round_trip,
    bench_sequence_capture,
    bench_sequence_direct
);
criterion_main!(benches);
