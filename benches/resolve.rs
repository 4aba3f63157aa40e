//! Resolution benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use iri_ladder::types::Ri;

fn bench_resolve(c: &mut Criterion) {
    let base = Ri::new("http://a/b/c/d;p?q").expect("base");
    c.bench_function("resolve relative", |b| {
        let reference = Ri::new("../../g").expect("reference");
        b.iter(|| black_box(&reference).abs(black_box(&base)))
    });
    c.bench_function("resolve same document", |b| {
        let reference = Ri::new("#frag").expect("reference");
        b.iter(|| black_box(&reference).abs(black_box(&base)))
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
