use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use hwlink::code::{derive_code, simple_hash};

fn bench_derive(c: &mut Criterion) {
    c.bench_function("simple_hash", |b| {
        b.iter(|| simple_hash(black_box("slaparena|someplayer|8d51ff7ae9ceee41b23e6b14913bd71e13dcc9a3477e34ae7dee25466de7b73b")))
    });

    c.bench_function("derive_code", |b| {
        b.iter(|| {
            derive_code(
                black_box("slaparena"),
                black_box("someplayer"),
                black_box("8d51ff7ae9ceee41b23e6b14913bd71e13dcc9a3477e34ae7dee25466de7b73b"),
            )
        })
    });
}

criterion_group!(benches, bench_derive);
criterion_main!(benches);
