use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use fpsearch::knn::{knn_l2, top_k};
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn bench_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("KNN");
    let mut rng = rand::rng();
    let (n, d) = (1 << 16, 128);

    let base: Vec<f32> = (0..n * d).map(|_| rng.random()).collect();
    let base = Array2::from_shape_vec((n, d), base).unwrap();
    let query: Array1<f32> = Array1::from_iter((0..d).map(|_| rng.random::<f32>()));

    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("knn_l2", |b| b.iter(|| knn_l2(query.view(), base.view(), 16)));
    group.finish();

    let mut group = c.benchmark_group("TopK");
    let distances: Vec<f32> = (0..n).map(|_| rng.random()).collect();
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("top_k", |b| b.iter(|| top_k(&distances, 16)));
    group.finish();
}

criterion_group!(benches, bench_knn);
criterion_main!(benches);
