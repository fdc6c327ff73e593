use criterion::{criterion_group, criterion_main, Criterion};
use cw_core::RngHandle;
use cw_forms::{random_curvature, random_skew_curvature, FormMatrix};

fn bench_reductions(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(2024);
    let curvature = random_curvature(4, 8, &mut rng).expect("curvature");
    let shifted = FormMatrix::identity(4, 8)
        .add(&curvature)
        .expect("shifted");
    let skew = random_skew_curvature(6, 12, &mut rng).expect("skew");

    c.bench_function("determinant_rank4_dim8", |b| {
        b.iter(|| shifted.determinant().expect("det"));
    });
    c.bench_function("pfaffian_rank6_dim12", |b| {
        b.iter(|| skew.pfaffian().expect("pf"));
    });
}

criterion_group!(benches, bench_reductions);
criterion_main!(benches);
