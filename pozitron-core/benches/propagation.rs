//! Propagation and reconciliation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pozitron_core::list::{For, MemoryNode};
use pozitron_core::reactive::{batch, memo, signal, subscribe, Memo, SubscribeOptions};

/// A chain of `depth` memos ending in one subscription.
fn bench_memo_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("memo_chain");

    for depth in [10, 100, 1_000] {
        let (source, set_source) = signal(0u64);
        let mut tail: Memo<u64> = memo({
            let source = source.clone();
            move || source.get() + 1
        });
        for _ in 1..depth {
            let previous = tail.clone();
            tail = memo(move || previous.get() + 1);
        }
        let _dispose = subscribe(
            tail,
            |value| {
                black_box(value);
            },
            SubscribeOptions::default(),
        );

        let mut next = 0;
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                next += 1;
                set_source.set(next);
            })
        });
    }

    group.finish();
}

/// Many signals feeding one subscription, written inside one batch.
fn bench_batch_fan_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_fan_in");

    for width in [10, 100, 1_000] {
        let signals: Vec<_> = (0..width).map(|_| signal(0u64)).collect();
        let readers: Vec<_> = signals.iter().map(|(read, _)| read.clone()).collect();
        let _dispose = subscribe(
            readers,
            |values: Vec<u64>| {
                black_box(values.len());
            },
            SubscribeOptions::default(),
        );

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                batch(|| {
                    for (_, write) in &signals {
                        write.update(|v| v + 1);
                    }
                })
            })
        });
    }

    group.finish();
}

/// Keyed list updates: reverse, swap two rows, replace every row.
fn bench_keyed_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_list");
    let rows = 1_000u32;

    let forward: Vec<u32> = (0..rows).collect();
    let reversed: Vec<u32> = forward.iter().rev().copied().collect();
    let mut swapped = forward.clone();
    swapped.swap(1, rows as usize - 2);
    let replaced: Vec<u32> = (rows..rows * 2).collect();

    for (name, next) in [("reverse", reversed), ("swap", swapped), ("replace", replaced)] {
        let root = MemoryNode::element("tbody");
        let (items, set_items) = signal(forward.clone());
        let _list = For::new(items, |id: &u32| MemoryNode::element(id.to_string()))
            .mount(&root)
            .expect("unique keys");

        let mut flip = false;
        group.bench_function(name, |b| {
            b.iter(|| {
                flip = !flip;
                set_items.set(if flip { next.clone() } else { forward.clone() });
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_memo_chain, bench_batch_fan_in, bench_keyed_list);
criterion_main!(benches);
