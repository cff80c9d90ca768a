//! Warp Emulator Benchmarks
//!
//! Measures the cost of dispatching warp intrinsics through the façade into
//! the CPU emulator, for single shuffles and full warp reductions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use warpcall_core::{WarpConfig, FULL_MASK};
use warpcall_cpu::{CpuWarp, Lanes};

/// Benchmark a single shuffle of each mode.
fn bench_single_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp/shuffle");
    let cpu = CpuWarp::new();
    let warp = cpu.warp().unwrap();
    let mask = cpu.mask_lanes(FULL_MASK);
    let values = Lanes::lane_ids(32);
    let offset = Lanes::splat_i32(32, 1);

    group.bench_function("idx", |b| {
        b.iter(|| {
            let out = warp
                .shfl_sync_i32(mask.clone(), values.clone(), offset.clone())
                .unwrap();
            black_box(out);
        });
    });

    group.bench_function("down", |b| {
        b.iter(|| {
            let out = warp
                .shfl_down_i32(mask.clone(), values.clone(), offset.clone())
                .unwrap();
            black_box(out);
        });
    });

    group.bench_function("xor", |b| {
        b.iter(|| {
            let out = warp
                .shfl_xor_i32(mask.clone(), values.clone(), offset.clone())
                .unwrap();
            black_box(out);
        });
    });

    group.finish();
}

/// Benchmark a butterfly sum across warp widths.
fn bench_warp_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp/reduce");

    for width in [8u32, 16, 32] {
        let cpu = CpuWarp::with_config(WarpConfig::new().with_warp_size(width)).unwrap();
        let warp = cpu.warp().unwrap();
        let mask = cpu.mask_lanes(FULL_MASK);

        group.bench_with_input(BenchmarkId::new("xor_sum", width), &width, |b, &width| {
            b.iter(|| {
                let mut acc = Lanes::lane_ids(width as usize);
                let mut delta = width / 2;
                while delta > 0 {
                    let other = warp
                        .shfl_xor_i32(
                            mask.clone(),
                            acc.clone(),
                            Lanes::splat_i32(width as usize, delta as i32),
                        )
                        .unwrap();
                    let (Some(a), Some(o)) = (acc.as_i32(), other.as_i32()) else {
                        unreachable!()
                    };
                    acc = Lanes::I32(a.iter().zip(o).map(|(x, y)| x + y).collect());
                    delta /= 2;
                }
                black_box(acc);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_shuffle, bench_warp_reduce);
criterion_main!(benches);
