// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::unreadable_literal)] // Large test constants
#![allow(clippy::missing_panics_doc)] // Benches panic on failure
#![allow(clippy::cast_possible_truncation)] // Bench parameters

//! Codec throughput benchmarks
//!
//! Measures the hot paths of monitor traffic:
//! - descriptor tree encode/decode (with and without the type cache)
//! - full value encode/decode
//! - valid-bitmap (partial) encode/decode

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hpva::desc::wire as introspect;
use hpva::value::wire as codec;
use hpva::{ReadBuf, TypeCode, TypeDef, TypeStore, Value, WriteBuf};

/// NTScalar-shaped type: the most common monitor payload.
fn scalar_record() -> Value {
    let descs = TypeDef::structure(
        "epics:nt/NTScalar:1.0",
        [
            ("value", TypeDef::scalar(TypeCode::Float64)),
            (
                "alarm",
                TypeDef::structure(
                    "alarm_t",
                    [
                        ("severity", TypeDef::scalar(TypeCode::Int32)),
                        ("status", TypeDef::scalar(TypeCode::Int32)),
                        ("message", TypeDef::scalar(TypeCode::String)),
                    ],
                ),
            ),
            (
                "timeStamp",
                TypeDef::structure(
                    "time_t",
                    [
                        ("secondsPastEpoch", TypeDef::scalar(TypeCode::Int64)),
                        ("nanoseconds", TypeDef::scalar(TypeCode::Int32)),
                        ("userTag", TypeDef::scalar(TypeCode::Int32)),
                    ],
                ),
            ),
        ],
    )
    .build();

    let mut val = Value::new(descs);
    val.set("value", 42.5f64).expect("value");
    val.set("alarm.severity", 1i32).expect("severity");
    val.set("alarm.message", "HIGH").expect("message");
    val.set("timeStamp.secondsPastEpoch", 1_700_000_000i64)
        .expect("seconds");
    val
}

fn bench_introspection(c: &mut Criterion) {
    let val = scalar_record();
    let mut encoded = WriteBuf::le();
    introspect::to_wire(&mut encoded, val.descs(), 0);
    let bytes = encoded.into_inner();

    let mut group = c.benchmark_group("introspection");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut w = WriteBuf::le();
            introspect::to_wire(&mut w, black_box(val.descs()), 0);
            black_box(w.offset())
        });
    });

    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut cache = TypeStore::new();
            let mut r = ReadBuf::le(black_box(&bytes));
            let mut descs = Vec::new();
            introspect::from_wire(&mut r, &mut descs, &mut cache, 0);
            assert!(r.good());
            black_box(descs.len())
        });
    });

    // cached form: one u16 key lookup instead of the whole tree
    let mut cached = WriteBuf::le();
    introspect::to_wire_cache_def(&mut cached, 1, val.descs(), 0);
    introspect::to_wire_cache_ref(&mut cached, 1);
    let cached = cached.into_inner();
    group.bench_function("decode_cached", |b| {
        b.iter(|| {
            let mut cache = TypeStore::new();
            let mut r = ReadBuf::le(black_box(&cached));
            let mut first = Vec::new();
            introspect::from_wire(&mut r, &mut first, &mut cache, 0);
            let mut second = Vec::new();
            introspect::from_wire(&mut r, &mut second, &mut cache, 0);
            assert!(r.good());
            black_box(second.len())
        });
    });

    group.finish();
}

fn bench_value_full(c: &mut Criterion) {
    let val = scalar_record();
    let mut encoded = WriteBuf::le();
    codec::to_wire_full(&mut encoded, &val);
    let bytes = encoded.into_inner();

    let mut group = c.benchmark_group("value_full");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut w = WriteBuf::le();
            codec::to_wire_full(&mut w, black_box(&val));
            black_box(w.offset())
        });
    });

    group.bench_function("decode", |b| {
        let mut target = Value::new(val.descs().clone());
        b.iter(|| {
            let mut cache = TypeStore::new();
            let mut r = ReadBuf::le(black_box(&bytes));
            codec::from_wire_full(&mut r, &mut cache, &mut target);
            assert!(r.good());
        });
    });

    group.finish();
}

fn bench_value_valid(c: &mut Criterion) {
    // typical monitor delta: value + timestamp changed
    let mut val = scalar_record();
    val.unmark_all();
    val.mark("value").expect("value");
    val.mark("timeStamp.secondsPastEpoch").expect("seconds");
    val.mark("timeStamp.nanoseconds").expect("nanos");

    let mut encoded = WriteBuf::le();
    codec::to_wire_valid(&mut encoded, &val);
    let bytes = encoded.into_inner();

    let mut group = c.benchmark_group("value_valid");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut w = WriteBuf::le();
            codec::to_wire_valid(&mut w, black_box(&val));
            black_box(w.offset())
        });
    });

    group.bench_function("decode", |b| {
        let mut target = Value::new(val.descs().clone());
        b.iter(|| {
            let mut cache = TypeStore::new();
            let mut r = ReadBuf::le(black_box(&bytes));
            codec::from_wire_valid(&mut r, &mut cache, &mut target);
            assert!(r.good());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_introspection,
    bench_value_full,
    bench_value_valid
);
criterion_main!(benches);
