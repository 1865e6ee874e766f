// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::semicolon_if_nothing_returned)] // Benchmark code formatting
#![allow(clippy::cast_possible_truncation)] // Test parameters

//! Container benchmarks
//!
//! - Array append across growth boundaries
//! - Set insertion (linear duplicate scan)
//! - Cursor traversal, index vs link capability

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sat::collections::{Array, Cursor, Growth, LinkedList, Set};

fn bench_array_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_add");
    for amount in [16usize, 256, 4096] {
        group.throughput(Throughput::Elements(amount as u64));
        group.bench_with_input(BenchmarkId::new("dynamic_from_1", amount), &amount, |b, &n| {
            b.iter(|| {
                let mut array = Array::new(1, Growth::Dynamic).expect("array");
                for value in 0..n {
                    array.add(black_box(value)).expect("add");
                }
                array
            })
        });
        group.bench_with_input(BenchmarkId::new("static_presized", amount), &amount, |b, &n| {
            b.iter(|| {
                let mut array = Array::new(n, Growth::Static).expect("array");
                for value in 0..n {
                    array.add(black_box(value)).expect("add");
                }
                array
            })
        });
    }
    group.finish();
}

fn bench_set_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_add");
    for amount in [16usize, 128, 512] {
        group.throughput(Throughput::Elements(amount as u64));
        group.bench_with_input(BenchmarkId::from_parameter(amount), &amount, |b, &n| {
            b.iter(|| {
                let mut set =
                    Set::new(8, |a: &u32, b: &u32| a == b, Growth::Dynamic).expect("set");
                for value in 0..n as u32 {
                    let _ = set.add(black_box(value));
                }
                set
            })
        });
    }
    group.finish();
}

fn bench_cursor(c: &mut Criterion) {
    let amount = 1024u64;
    let mut array = Array::new(amount as usize, Growth::Static).expect("array");
    let mut list = LinkedList::new();
    for value in 0..amount {
        array.add(value).expect("add");
        list.push_back(value);
    }

    let mut group = c.benchmark_group("cursor");
    group.throughput(Throughput::Elements(amount));
    group.bench_function("index", |b| {
        b.iter(|| Cursor::open(&array).expect("cursor").sum::<u64>())
    });
    group.bench_function("link", |b| {
        b.iter(|| Cursor::open(&list).expect("cursor").sum::<u64>())
    });
    group.bench_function("slice_baseline", |b| b.iter(|| array.iter().sum::<u64>()));
    group.finish();
}

criterion_group!(benches, bench_array_add, bench_set_add, bench_cursor);
criterion_main!(benches);
