//! Throughput Benchmark for ShelfKV
//!
//! This benchmark measures the collection library and the dispatcher
//! under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shelfkv::commands::CommandHandler;
use shelfkv::storage::{HashTable, Queue, Stack};
use std::thread;
use std::time::Duration;

/// Benchmark hash table inserts and overwrites
fn bench_hashtable_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashtable_add");
    group.throughput(Throughput::Elements(1));

    group.bench_function("overwrite_same_key", |b| {
        let mut table = HashTable::new("bench");
        b.iter(|| {
            table.add("key", "value").unwrap();
        });
    });

    group.bench_function("fill_half_table", |b| {
        b.iter(|| {
            let mut table = HashTable::new("bench");
            for i in 0..256 {
                table.add(format!("key:{}", i), "value").unwrap();
            }
            black_box(table.len());
        });
    });

    group.finish();
}

/// Benchmark lookups at different load factors
fn bench_hashtable_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashtable_get");
    group.throughput(Throughput::Elements(1));

    for load in [64usize, 256, 480] {
        let mut table = HashTable::new("bench");
        for i in 0..load {
            table.add(format!("key:{}", i), format!("value:{}", i)).unwrap();
        }

        group.bench_function(format!("existing_load_{}", load), |b| {
            let mut i = 0usize;
            b.iter(|| {
                let key = format!("key:{}", i % load);
                black_box(table.get(&key).ok());
                i += 1;
            });
        });

        group.bench_function(format!("missing_load_{}", load), |b| {
            let mut i = 0usize;
            b.iter(|| {
                let key = format!("missing:{}", i);
                black_box(table.get(&key).ok());
                i += 1;
            });
        });
    }

    group.finish();
}

/// Benchmark stack and queue push/pop pairs
fn bench_linear(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear");
    group.throughput(Throughput::Elements(1));

    group.bench_function("stack_push_pop", |b| {
        let mut stack = Stack::new("bench");
        b.iter(|| {
            stack.push("value");
            black_box(stack.pop().ok());
        });
    });

    group.bench_function("queue_push_pop", |b| {
        let mut queue = Queue::new("bench");
        b.iter(|| {
            queue.push("value");
            black_box(queue.pop().ok());
        });
    });

    group.finish();
}

/// Benchmark parse + lock + dispatch for single messages
fn bench_dispatch(c: &mut Criterion) {
    let handler = CommandHandler::with_table_capacity(512);
    handler.execute(b"x db \"HSET t key value\"");

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hget", |b| {
        b.iter(|| {
            black_box(handler.execute(b"x db \"HGET t key\""));
        });
    });

    group.bench_function("hset", |b| {
        b.iter(|| {
            black_box(handler.execute(b"x db \"HSET t key value\""));
        });
    });

    group.bench_function("malformed", |b| {
        b.iter(|| {
            black_box(handler.execute(b"x db \"HSET t\""));
        });
    });

    group.finish();
}

/// Benchmark contention on the global lock
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let handler = CommandHandler::with_table_capacity(512);
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let handler = handler.clone();
                    thread::spawn(move || {
                        for i in 0..1_000 {
                            let set = format!("x db \"HSET t{} k{} v\"", t, i % 100);
                            let get = format!("x db \"HGET t{} k{}\"", t, i % 100);
                            handler.execute(set.as_bytes());
                            handler.execute(get.as_bytes());
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(handler.registry().lock().len());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_hashtable_add,
    bench_hashtable_get,
    bench_linear,
    bench_dispatch,
    bench_concurrent,
);

criterion_main!(benches);
