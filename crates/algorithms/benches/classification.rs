//! Benchmarks for the clustering classifiers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rsgis_algorithms::classification::{IsodataClassifier, IsodataParams, KMeansClassifier, KMeansParams};
use rsgis_core::{GeoTransform, MultiBandRaster};

fn create_image(size: usize, bands: usize) -> MultiBandRaster<f32> {
    let mut image = MultiBandRaster::new(bands, size, size);
    image.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    for band in 0..bands {
        for row in 0..size {
            for col in 0..size {
                let v = ((row * 7 + col * 13 + band * 29) % 200) as f32;
                image.set(band, row, col, v).unwrap();
            }
        }
    }
    image
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification/kmeans");
    group.sample_size(10);
    for size in [128, 256, 512] {
        let image = create_image(size, 4);
        let params = KMeansParams { max_iterations: 5, ..KMeansParams::default() };
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut kmeans = KMeansClassifier::new(black_box(&image)).unwrap();
                kmeans.init_cluster_centres_random(8, 42).unwrap();
                kmeans.calc_cluster_centres(&params).unwrap();
                kmeans.generate_output_image().unwrap()
            })
        });
    }
    group.finish();
}

fn bench_isodata(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification/isodata");
    group.sample_size(10);
    for size in [128, 256] {
        let image = create_image(size, 4);
        let params = IsodataParams { max_iterations: 5, ..IsodataParams::default() };
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut iso = IsodataClassifier::new(black_box(&image)).unwrap();
                iso.init_cluster_centres_random(8, 42).unwrap();
                iso.calc_cluster_centres(&params).unwrap();
                iso.generate_output_image().unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kmeans, bench_isodata);
criterion_main!(benches);
