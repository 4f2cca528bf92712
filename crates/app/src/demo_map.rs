//! Host-side demo map: procedural terrain plus a handful of springs.
//!
//! The engine never builds terrain itself. This module plays the map role:
//! it authors a height field with fBm noise, seeds spring positions with a
//! deterministic RNG and feeds water into the grid every tick in `PreSim`.

use bevy::prelude::*;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use simulation::heightfield_water::{GridError, HeightFieldGrid, WaterSimState};
use simulation::state_hash::WaterStateHash;
use simulation::{SimulationSet, TickCounter};

/// Terrain height range: noise in [-1, 1] maps to [-TERRAIN_RELIEF, TERRAIN_RELIEF].
const TERRAIN_RELIEF: f32 = 24.0;
const TERRAIN_FREQUENCY: f32 = 0.012;
const TERRAIN_OCTAVES: i32 = 5;
const SPRING_COUNT: usize = 6;
const SPRING_RATE: f32 = 0.5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Run configuration, read from the environment unless given explicitly.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub seed: u64,
    pub size: usize,
    /// Stop after this many fixed ticks.
    pub ticks: u64,
    /// Log a progress line every this many ticks.
    pub report_every: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            size: simulation::config::GRID_WIDTH,
            ticks: 600,
            report_every: 60,
        }
    }
}

impl DemoConfig {
    /// Overlay values from a `key -> value` lookup (normally `std::env::var`).
    /// Unparseable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        parse_into(&lookup, "WATERFLOW_SEED", &mut config.seed);
        parse_into(&lookup, "WATERFLOW_SIZE", &mut config.size);
        parse_into(&lookup, "WATERFLOW_TICKS", &mut config.ticks);
        parse_into(&lookup, "WATERFLOW_REPORT_EVERY", &mut config.report_every);
        config.report_every = config.report_every.max(1);
        config
    }
}

fn parse_into<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(v) => *slot = v,
        Err(_) => warn!("{}: cannot parse {:?}, keeping default", key, raw),
    }
}

// ---------------------------------------------------------------------------
// Terrain and springs
// ---------------------------------------------------------------------------

/// Row-major fBm terrain in `[-TERRAIN_RELIEF, TERRAIN_RELIEF]`.
pub fn generate_terrain(size: usize, seed: u64) -> Vec<f32> {
    let mut noise = FastNoiseLite::with_seed(seed as i32);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(TERRAIN_FREQUENCY));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(TERRAIN_OCTAVES));

    let mut terrain = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let raw = noise.get_noise_2d(x as f32, y as f32).clamp(-1.0, 1.0);
            terrain.push(raw * TERRAIN_RELIEF);
        }
    }
    terrain
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub x: usize,
    pub y: usize,
    /// Depth added per tick.
    pub rate: f32,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Springs(pub Vec<Spring>);

/// Pick spring cells strictly inside the wall ring. Springs prefer high
/// ground: of two random candidates the higher one wins.
pub fn place_springs(grid: &HeightFieldGrid, count: usize, seed: u64) -> Vec<Spring> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let xs = grid.interior_x();
    let ys = grid.interior_y();
    (0..count)
        .map(|_| {
            let a = (rng.gen_range(xs.clone()), rng.gen_range(ys.clone()));
            let b = (rng.gen_range(xs.clone()), rng.gen_range(ys.clone()));
            let (x, y) = if grid.get_terrain(a.0, a.1) >= grid.get_terrain(b.0, b.1) {
                a
            } else {
                b
            };
            Spring {
                x,
                y,
                rate: SPRING_RATE,
            }
        })
        .collect()
}

/// Build the demo grid for `config`.
pub fn build_grid(config: &DemoConfig) -> Result<HeightFieldGrid, GridError> {
    HeightFieldGrid::with_terrain(
        config.size,
        config.size,
        generate_terrain(config.size, config.seed),
    )
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn apply_springs(springs: Res<Springs>, mut grid: ResMut<HeightFieldGrid>) {
    for spring in &springs.0 {
        grid.add_water(spring.x, spring.y, spring.rate);
    }
}

pub fn report_progress(
    config: Res<DemoConfig>,
    tick: Res<TickCounter>,
    stats: Res<WaterSimState>,
    hash: Res<WaterStateHash>,
) {
    if tick.0 == 0 || tick.0 % config.report_every != 0 {
        return;
    }
    info!(
        "tick {:>5}: volume {:>10.2}  wet cells {:>6}  max depth {:>7.3}  nonconverged {}  hash {:016x}",
        tick.0,
        stats.last_volume,
        stats.active_cells,
        stats.max_depth,
        stats.nonconvergence_count,
        hash.hash
    );
}

pub fn exit_after_ticks(
    config: Res<DemoConfig>,
    tick: Res<TickCounter>,
    stats: Res<WaterSimState>,
    mut exit: EventWriter<AppExit>,
) {
    if tick.0 < config.ticks {
        return;
    }
    info!(
        "Finished {} ticks ({} stepped, {} skipped), final volume {:.2}",
        tick.0, stats.ticks_stepped, stats.ticks_skipped, stats.last_volume
    );
    exit.send(AppExit::Success);
}

pub struct DemoMapPlugin {
    /// `None` reads `WATERFLOW_*` environment variables during `build`, after
    /// logging is up, so parse warnings are visible.
    pub config: Option<DemoConfig>,
}

impl DemoMapPlugin {
    pub fn from_env() -> Self {
        Self { config: None }
    }
}

impl Plugin for DemoMapPlugin {
    fn build(&self, app: &mut App) {
        let config = self
            .config
            .clone()
            .unwrap_or_else(|| DemoConfig::from_lookup(|key| std::env::var(key).ok()));
        let grid = match build_grid(&config) {
            Ok(grid) => grid,
            Err(e) => {
                error!("Cannot build demo map: {}", e);
                app.insert_resource(config);
                app.add_systems(Startup, |mut exit: EventWriter<AppExit>| {
                    exit.send(AppExit::from_code(2));
                });
                return;
            }
        };
        let springs = place_springs(&grid, SPRING_COUNT, config.seed);
        for s in &springs {
            debug!(
                "Spring at ({}, {}), terrain {:.2}",
                s.x,
                s.y,
                grid.get_terrain(s.x, s.y)
            );
        }
        info!(
            "Demo map {}x{} (seed {}), {} springs",
            grid.width(),
            grid.height(),
            config.seed,
            springs.len()
        );

        app.insert_resource(config)
            .insert_resource(grid)
            .insert_resource(Springs(springs))
            .add_systems(FixedUpdate, apply_springs.in_set(SimulationSet::PreSim))
            .add_systems(
                FixedUpdate,
                (report_progress, exit_after_ticks.after(report_progress))
                    .in_set(SimulationSet::PostSim),
            );
    }
}
