// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for loopseq
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Pending store insert and due-event extraction
//! - Input queue batch draining
//! - Sequence expansion on restart
//! - A full scheduler tick
//! - Generator throughput

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use loopseq::generators::{arpeggiate, ArpSettings, ChordProgression};
use loopseq::midi::{self, MemoryOutput};
use loopseq::sequencer::{
    Event, InputQueue, NoopObserver, Note, PendingStore, Sequence, SequenceRegistry, TickEngine,
};
use loopseq::timing::TickClock;

const PPQN: u32 = 480;

fn events(count: usize) -> Vec<Event> {
    (0..count)
        .map(|i| Event::new((i as u64 * 37) % 1920, midi::note_on(0, (i % 128) as u8, 100)))
        .collect()
}

/// A one-bar sequence with `notes` evenly spaced sixteenths
fn busy_sequence(notes: usize) -> Sequence {
    let step = 1.0 / notes as f64;
    Sequence::new(0, 1).unwrap().with_notes(
        (0..notes).map(|i| Note::new(36 + (i % 48) as u8, i as f64 * step, step, 100).unwrap()),
    )
}

/// Benchmark tick clock arithmetic
fn bench_tick_clock(c: &mut Criterion) {
    let clock = TickClock::new(120.0, PPQN);

    c.bench_function("deadline_for", |b| {
        b.iter(|| black_box(clock.deadline_for(black_box(123_456))))
    });
}

/// Benchmark the pending store (scheduler core)
fn bench_pending_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("pending_store");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("insert", size), size, |b, &size| {
            b.iter_batched(
                || events(size),
                |events| {
                    let mut store = PendingStore::new();
                    for event in events {
                        store.insert(event);
                    }
                    black_box(store.len())
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("pop_due", size), size, |b, &size| {
            b.iter_batched(
                || {
                    let mut store = PendingStore::new();
                    for event in events(size) {
                        store.insert(event);
                    }
                    store
                },
                |mut store| {
                    let mut total = 0;
                    for tick in (0..1920).step_by(120) {
                        total += store.pop_due(tick).len();
                    }
                    black_box(total)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark draining the input queue in batches
fn bench_input_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_queue");

    for batch in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("drain_batch", batch), batch, |b, &batch| {
            b.iter_batched(
                || {
                    let queue = InputQueue::new();
                    queue.push_all(events(1000));
                    queue
                },
                |queue| {
                    while !queue.is_empty() {
                        black_box(queue.drain_batch(batch));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark expanding sequences at a restart
fn bench_sequence_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequence_expand");

    for notes in [4, 16, 64].iter() {
        let sequence = busy_sequence(*notes);
        group.bench_with_input(BenchmarkId::from_parameter(notes), notes, |b, _| {
            b.iter(|| black_box(sequence.expand(black_box(1920), PPQN)))
        });
    }

    group.finish();
}

/// Benchmark a full bar of scheduler ticks with restarts and dispatch
fn bench_process_tick(c: &mut Criterion) {
    let registry = SequenceRegistry::new();
    registry.insert(busy_sequence(16), None);
    registry.insert(busy_sequence(64), None);

    c.bench_function("process_bar", |b| {
        b.iter_batched(
            || (TickEngine::new(PPQN, 100), InputQueue::new(), MemoryOutput::new()),
            |(mut engine, input, mut output)| {
                for tick in 0..(4 * PPQN as u64) {
                    black_box(engine.process_tick(
                        tick,
                        &input,
                        &registry,
                        &mut output,
                        &NoopObserver,
                    ));
                }
                black_box(output.len())
            },
            BatchSize::SmallInput,
        )
    });
}

/// Benchmark note generation
fn bench_generators(c: &mut Criterion) {
    let progression = ChordProgression::new("Cm Ab Bb Gm", 4).unwrap();
    let settings = ArpSettings::default();

    c.bench_function("progression_notes", |b| {
        b.iter(|| black_box(progression.quick_notes().unwrap()))
    });

    c.bench_function("arpeggiate_bar", |b| {
        b.iter(|| black_box(arpeggiate(black_box(&[60, 63, 67, 70]), 1.0, 0.0, &settings).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_tick_clock,
    bench_pending_store,
    bench_input_queue,
    bench_sequence_expand,
    bench_process_tick,
    bench_generators,
);
criterion_main!(benches);
