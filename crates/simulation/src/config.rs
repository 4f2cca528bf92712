pub const GRID_WIDTH: usize = 256;
pub const GRID_HEIGHT: usize = 256;

/// Smallest grid that still has an interior cell surrounded by the wall ring.
pub const MIN_GRID_DIM: usize = 3;

/// Per-cell depth below which water is treated as numerical noise and zeroed.
pub const NOISE_THRESHOLD: f32 = 0.2;

/// Total volume below which a tick is skipped entirely.
pub const DRY_VOLUME_THRESHOLD: f32 = 0.2;

/// Per-tick multiplicative damping applied to both flow accumulators.
pub const FLOW_ATTENUATION: f32 = 0.99;

/// Relative volume error the conservation pass tries to get under.
pub const VOLUME_TOLERANCE: f32 = 0.01;

/// Hard cap on conservation passes per tick.
pub const MAX_REDISTRIBUTION_ITERATIONS: u32 = 10;

/// Depth at which a renderer starts drawing a water surface over a cell.
pub const VISIBLE_WATER_THRESHOLD: f32 = 0.001;
