// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for ISBN validation in the whir-core crate.
//
// The validator runs on every decoded EAN-13 frame while the book scanner is
// armed, so it sits on the per-frame hot path.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use whir_core::isbn::{is_valid, isbn13_check_digit};

/// Benchmark validation over a mix of accepted and rejected payloads.
fn bench_is_valid(c: &mut Criterion) {
    let payloads = [
        "9783161484100",
        "9780312204280",
        "5901234123457",
        "1234567891234",
        "0012345678905",
        "Unrelated",
        "",
    ];

    c.bench_function("is_valid (mixed payloads)", |b| {
        b.iter(|| {
            for payload in payloads {
                black_box(is_valid(black_box(payload)));
            }
        });
    });
}

/// Benchmark check digit computation on a twelve-digit body.
fn bench_check_digit(c: &mut Criterion) {
    c.bench_function("isbn13_check_digit", |b| {
        b.iter(|| black_box(isbn13_check_digit(black_box("978194287853"))));
    });
}

criterion_group!(benches, bench_is_valid, bench_check_digit);
criterion_main!(benches);
