//! Benchmarks for single pixel elimination

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rsgis_algorithms::filter::{Connectivity, SinglePixelEliminator};
use rsgis_core::Raster;

/// Blocky labels with roughly one speckle pixel in fifty
fn create_labels(size: usize) -> Raster<u32> {
    let mut r = Raster::new(size, size);
    for row in 0..size {
        for col in 0..size {
            let mut v = ((row / 16) * 3 + col / 16) as u32 % 6;
            if (row * 31 + col * 17) % 53 == 0 {
                v = 9;
            }
            r.set(row, col, v).unwrap();
        }
    }
    r
}

fn bench_eliminate(c: &mut Criterion) {
    for connectivity in [Connectivity::Four, Connectivity::Eight] {
        let mut group = c.benchmark_group(format!("filter/eliminate_{}", connectivity));
        for size in [256, 512, 1024] {
            let labels = create_labels(size);
            let eliminator = SinglePixelEliminator::new(connectivity);
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| {
                    let mut raster = labels.clone();
                    eliminator.eliminate_in_memory(black_box(&mut raster)).unwrap()
                })
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_eliminate);
criterion_main!(benches);
