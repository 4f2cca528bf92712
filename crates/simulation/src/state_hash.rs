//! Deterministic state hashing for replay verification.
//!
//! Computes a 64-bit hash of the water state every tick, stored in the
//! `WaterStateHash` resource. The upper 32 bits are an xxHash32 of the grid
//! dimensions and water depths; the lower 32 bits hash both flow layers,
//! seeded with the upper half. Floats are hashed by bit pattern, so `-0.0`
//! and `0.0` differ and any NaN that slipped in changes the hash.
//!
//! Terrain is not hashed: it never changes once the grid is built.

use bevy::prelude::*;
use xxhash_rust::xxh32::Xxh32;

use crate::heightfield_water::HeightFieldGrid;
use crate::SimulationSet;
use crate::TickCounter;

/// Stores the deterministic hash computed at the end of each simulation tick.
#[derive(Resource, Default, Clone, Debug)]
pub struct WaterStateHash {
    /// The tick at which this hash was computed.
    pub tick: u64,
    pub hash: u64,
}

fn hash_layer(hasher: &mut Xxh32, layer: &[f32]) {
    for v in layer {
        hasher.update(&v.to_bits().to_le_bytes());
    }
}

/// Compute a deterministic hash of the water and flow layers.
///
/// Can be called from tests or replay tooling without the ECS system having
/// run.
pub fn water_state_hash(grid: &HeightFieldGrid) -> u64 {
    let mut depth = Xxh32::new(0);
    depth.update(&(grid.width() as u64).to_le_bytes());
    depth.update(&(grid.height() as u64).to_le_bytes());
    hash_layer(&mut depth, grid.water());
    let hi = depth.digest();

    let mut flow = Xxh32::new(hi);
    hash_layer(&mut flow, grid.flow_x());
    hash_layer(&mut flow, grid.flow_y());
    let lo = flow.digest();

    ((hi as u64) << 32) | lo as u64
}

fn update_water_state_hash(
    tick: Res<TickCounter>,
    grid: Res<HeightFieldGrid>,
    mut state_hash: ResMut<WaterStateHash>,
) {
    state_hash.tick = tick.0;
    state_hash.hash = water_state_hash(&grid);
}

pub struct StateHashPlugin;

impl Plugin for StateHashPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WaterStateHash>().add_systems(
            FixedUpdate,
            update_water_state_hash.in_set(SimulationSet::PostSim),
        );
    }
}
