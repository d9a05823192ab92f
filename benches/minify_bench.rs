//! Benchmarks for whole-document minification.
//!
//! Measures throughput per mode across content shapes:
//!
//! - **Integers**: whitespace-heavy numeric array (best case for stripping)
//! - **Objects**: realistic nested objects with string values
//! - **Strings**: string-dominated documents (exercises the bulk copy path)
//! - **Dense**: already-minified input (worst case: nothing to remove)
//!
//! Sizes run from 64 KiB to 16 MiB to show where the parallel threshold and
//! chunk dispatch start paying off.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jsonmin::{minify, JsonMinifier, Mode};

fn integer_array(size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size + 32);
    out.extend_from_slice(b"[\n");
    let mut i = 0u64;
    while out.len() < size {
        if i > 0 {
            out.extend_from_slice(b" ,\r\n\t ");
        }
        out.extend_from_slice(i.wrapping_mul(2654435761).to_string().as_bytes());
        i += 1;
    }
    out.extend_from_slice(b"\n]");
    out
}

fn object_soup(size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size + 64);
    out.extend_from_slice(b"{\n");
    let mut i = 0;
    while out.len() < size {
        if i > 0 {
            out.extend_from_slice(b",\n");
        }
        out.extend_from_slice(
            format!(
                "  \"record {i}\" : {{ \"name\" : \"user number {i}\" , \"score\" : {} , \"tags\" : [ \"a\" , \"b\" ] }}",
                i * 97
            )
            .as_bytes(),
        );
        i += 1;
    }
    out.extend_from_slice(b"\n}");
    out
}

fn string_heavy(size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size + 32);
    out.extend_from_slice(b"[ ");
    let mut i = 0;
    while out.len() < size {
        if i > 0 {
            out.extend_from_slice(b" , ");
        }
        out.extend_from_slice(
            format!(
                "\"long string value number {i} with plenty of interior content, escapes like \\n and \\t, and trailing text\""
            )
            .as_bytes(),
        );
        i += 1;
    }
    out.extend_from_slice(b" ]");
    out
}

fn dense(size: usize) -> Vec<u8> {
    minify(&integer_array(size * 2), Mode::Eco).unwrap()
}

fn bench_modes(c: &mut Criterion) {
    let shapes: [(&str, fn(usize) -> Vec<u8>); 4] = [
        ("integers", integer_array),
        ("objects", object_soup),
        ("strings", string_heavy),
        ("dense", dense),
    ];
    let sizes = [64 * 1024, 1024 * 1024, 16 * 1024 * 1024];

    for (shape, generate) in shapes {
        let mut group = c.benchmark_group(format!("minify/{shape}"));
        for size in sizes {
            let input = generate(size);
            group.throughput(Throughput::Bytes(input.len() as u64));
            for mode in [Mode::Eco, Mode::Sport, Mode::Turbo] {
                let mut minifier = JsonMinifier::new();
                if !minifier.is_supported(mode) {
                    continue;
                }
                group.bench_with_input(
                    BenchmarkId::new(mode.to_string(), size),
                    &input,
                    |b, input| {
                        b.iter(|| {
                            black_box(minifier.minify_bytes(mode, black_box(input)).unwrap())
                        })
                    },
                );
            }
        }
        group.finish();
    }
}

fn bench_validate(c: &mut Criterion) {
    let input = object_soup(1024 * 1024);
    let mut group = c.benchmark_group("validate");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("scalar", |b| {
        let mut minifier = JsonMinifier::new();
        b.iter(|| minifier.validate(black_box(&input)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_modes, bench_validate);
criterion_main!(benches);
