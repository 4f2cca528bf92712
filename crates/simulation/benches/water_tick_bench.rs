//! Criterion benchmark: water tick on the default 256x256 grid.
//!
//! Measures each solver phase in isolation and the full `FixedUpdate`
//! schedule through the `TestMap` harness, on rolling terrain with a few
//! lakes so every phase has real work to do.
//!
//! Run with: cargo bench -p simulation --bench water_tick_bench --features bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use simulation::config::{GRID_HEIGHT, GRID_WIDTH};
use simulation::heightfield_water::boundary::copy_edges;
use simulation::heightfield_water::conserve::conserve_volume;
use simulation::heightfield_water::flow::compute_flows;
use simulation::heightfield_water::integrate::integrate_heights;
use simulation::heightfield_water::{BasicUpdater, HeightFieldGrid, WaterParams, WaterUpdater};
use simulation::test_harness::TestMap;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rolling_terrain() -> Vec<f32> {
    (0..GRID_WIDTH * GRID_HEIGHT)
        .map(|i| {
            let x = (i % GRID_WIDTH) as f32;
            let y = (i / GRID_WIDTH) as f32;
            (x * 0.05).sin() * 8.0 + (y * 0.07).cos() * 6.0
        })
        .collect()
}

/// Rolling terrain with four square lakes, warmed up for a few ticks so the
/// flow accumulators are non-trivial.
fn wet_grid() -> HeightFieldGrid {
    let mut grid = match HeightFieldGrid::with_terrain(GRID_WIDTH, GRID_HEIGHT, rolling_terrain()) {
        Ok(g) => g,
        Err(e) => panic!("benchmark grid: {e}"),
    };
    for (cx, cy) in [(64, 64), (192, 64), (64, 192), (192, 192)] {
        for y in cy - 16..cy + 16 {
            for x in cx - 16..cx + 16 {
                grid.set_water(x, y, 4.0);
            }
        }
    }
    let params = WaterParams::default();
    for _ in 0..10 {
        BasicUpdater.run_tick(&mut grid, &params);
    }
    grid
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_phases(c: &mut Criterion) {
    let params = WaterParams::default();
    let base = wet_grid();
    let volume = base.total_volume();

    let mut group = c.benchmark_group("water_phases_256");
    group.sample_size(50);

    group.bench_function("compute_flows", |b| {
        let mut grid = base.clone();
        b.iter(|| compute_flows(black_box(&mut grid), params.attenuation));
    });
    group.bench_function("integrate_heights", |b| {
        let mut grid = base.clone();
        b.iter(|| integrate_heights(black_box(&mut grid), params.noise_threshold));
    });
    group.bench_function("conserve_volume", |b| {
        let mut grid = base.clone();
        b.iter(|| conserve_volume(black_box(&mut grid), volume, &params));
    });
    group.bench_function("copy_edges", |b| {
        let mut grid = base.clone();
        b.iter(|| copy_edges(black_box(grid.water_mut()), GRID_WIDTH, GRID_HEIGHT));
    });
    group.bench_function("basic_updater_tick", |b| {
        let mut grid = base.clone();
        b.iter(|| BasicUpdater.run_tick(black_box(&mut grid), &params));
    });

    group.finish();
}

fn bench_schedule(c: &mut Criterion) {
    let mut map = TestMap::from_grid(wet_grid());

    let mut group = c.benchmark_group("water_schedule_256");
    group.sample_size(50);
    group.bench_function("fixed_update_tick", |b| b.iter(|| map.tick(1)));
    group.finish();
}

criterion_group!(benches, bench_phases, bench_schedule);
criterion_main!(benches);
