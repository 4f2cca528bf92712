//! Movement-speed modifiers for water-bound units.
//!
//! Read-only consumers of the water grid: a unit needing `min_depth` of water
//! can only move where the simulated depth provides it. Terrain height 0 is
//! sea level; cells at or above it are land regardless of water depth.

use crate::heightfield_water::HeightFieldGrid;

/// 0.0 when the water is shallower than the unit needs, 1.0 otherwise.
pub fn ship_speed_mod(min_depth: f32, water_depth: f32) -> f32 {
    if water_depth < min_depth {
        0.0
    } else {
        1.0
    }
}

/// Directional variant. A unit heading downhill (`dir_slope_mod < 0`) may
/// keep moving through shallows so it can reach deeper water; heading uphill
/// or along the flat it needs full depth. Land is always impassable.
pub fn ship_speed_mod_dir(
    min_depth: f32,
    terrain_height: f32,
    water_depth: f32,
    dir_slope_mod: f32,
) -> f32 {
    if terrain_height >= 0.0 || (dir_slope_mod >= 0.0 && water_depth < min_depth) {
        0.0
    } else {
        1.0
    }
}

/// [`ship_speed_mod`] sampled from the grid. Out-of-bounds cells are
/// impassable.
pub fn ship_speed_mod_at(grid: &HeightFieldGrid, x: usize, y: usize, min_depth: f32) -> f32 {
    if !grid.in_bounds(x, y) {
        return 0.0;
    }
    ship_speed_mod(min_depth, grid.get_water(x, y))
}
