use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::tempdir;
use tree::{Tree, TreeOptions, Value};

const N_KEYS: usize = 100;
const VALUE_SIZE: usize = 100;

fn filled_tree(dir: &std::path::Path) -> Tree {
    let mut tree = Tree::open(dir).unwrap();
    let value = "x".repeat(VALUE_SIZE);
    for i in 0..N_KEYS {
        tree.put(format!("key{:06}", i).as_str(), value.as_str())
            .unwrap();
    }
    tree.flush().unwrap();
    tree
}

fn put_benchmark(c: &mut Criterion) {
    c.bench_function("tree_put_100", |b| {
        b.iter_batched(
            || tempdir().unwrap(),
            |dir| {
                let mut tree = Tree::open_with(
                    dir.path(),
                    TreeOptions {
                        flush_threshold: usize::MAX,
                    },
                )
                .unwrap();
                let value = "x".repeat(VALUE_SIZE);
                for i in 0..N_KEYS {
                    tree.put(format!("key{:06}", i).as_str(), value.as_str())
                        .unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn fetch_hit_benchmark(c: &mut Criterion) {
    c.bench_function("tree_fetch_hit_100", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let tree = filled_tree(dir.path());
                (dir, tree)
            },
            |(_dir, tree)| {
                for i in 0..N_KEYS {
                    let v = tree.fetch(format!("key{:06}", i).as_str()).unwrap();
                    assert!(matches!(v, Some(Value::Bytes(_))));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn fetch_miss_benchmark(c: &mut Criterion) {
    c.bench_function("tree_fetch_miss_100", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let tree = filled_tree(dir.path());
                (dir, tree)
            },
            |(_dir, tree)| {
                // Mostly bloom-gated misses: no segment scan for true negatives.
                for i in 0..N_KEYS {
                    let v = tree.fetch(format!("missing{:06}", i).as_str()).unwrap();
                    assert!(v.is_none());
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    put_benchmark,
    fetch_hit_benchmark,
    fetch_miss_benchmark
);
criterion_main!(benches);
