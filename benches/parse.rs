//! Parse benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use iri_ladder::types::Ri;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse generic http", |b| {
        b.iter(|| {
            Ri::new(black_box(
                "http://user@example.com:8042/over/there?name=ferret#nose",
            ))
        })
    });
    c.bench_function("parse and normalize", |b| {
        b.iter(|| Ri::new(black_box("HTTP://Example.COM:80/%7euser/a/../b")))
    });
    c.bench_function("parse common", |b| {
        b.iter(|| Ri::common(black_box("mailto:user@example.com")))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
