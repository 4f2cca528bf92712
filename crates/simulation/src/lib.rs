//! Height-field water flow simulation engine.
//!
//! Everything is wired through [`SimulationPlugin`]: the water grid and
//! solver (`heightfield_water`), the deterministic state hash and the
//! `Saveable` registry hosts use to persist engine resources. Hosts own the
//! map: they insert a [`heightfield_water::HeightFieldGrid`] built from their
//! terrain and add or remove water between ticks.

use bevy::prelude::*;
use std::collections::BTreeMap;

pub mod config;
pub mod heightfield_water;
pub mod simulation_sets;
pub mod state_hash;
pub mod traversal;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use simulation_sets::SimulationSet;

// ---------------------------------------------------------------------------
// Saveable: resources persisted into the host's save file
// ---------------------------------------------------------------------------

/// A resource the host persists as one entry of a keyed extension map.
///
/// Engine plugins register their saveable resources once in `build()`; a host
/// save system then walks [`SaveableRegistry`] without knowing the types.
pub trait Saveable: Resource + Default + Send + Sync + 'static {
    /// Stable key of this resource in the extension map.
    const SAVE_KEY: &'static str;

    /// Encode the resource, or `None` to leave it out of the save
    /// (typically when it still equals its default).
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// `bitcode::decode`, falling back to `T::default()` with a warning when the
/// bytes are corrupt or from an incompatible layout.
pub fn decode_or_warn<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    match bitcode::decode(bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!(
                "Saveable {}: failed to decode {} bytes, falling back to default: {}",
                key,
                bytes.len(),
                e
            );
            T::default()
        }
    }
}

pub type SaveFn = Box<dyn Fn(&World) -> Option<Vec<u8>> + Send + Sync>;
pub type LoadFn = Box<dyn Fn(&mut World, &[u8]) + Send + Sync>;
pub type ResetFn = Box<dyn Fn(&mut World) + Send + Sync>;

/// Type-erased operations for one registered resource.
pub struct SaveableEntry {
    pub key: String,
    pub save_fn: SaveFn,
    pub load_fn: LoadFn,
    pub reset_fn: ResetFn,
}

/// Every saveable resource, in registration order.
#[derive(Resource, Default)]
pub struct SaveableRegistry {
    pub entries: Vec<SaveableEntry>,
}

impl SaveableRegistry {
    /// Add `T` to the registry. A second registration of the same key is
    /// ignored with a warning, and panics in debug builds.
    pub fn register<T: Saveable>(&mut self) {
        let key = T::SAVE_KEY;
        if self.entries.iter().any(|e| e.key == key) {
            warn!("SaveableRegistry: duplicate key '{}', ignoring", key);
            debug_assert!(false, "SaveableRegistry: duplicate key '{}'", key);
            return;
        }
        self.entries.push(SaveableEntry {
            key: key.to_string(),
            save_fn: Box::new(|world: &World| world.get_resource::<T>()?.save_to_bytes()),
            load_fn: Box::new(|world: &mut World, bytes: &[u8]| {
                world.insert_resource(T::load_from_bytes(bytes));
            }),
            reset_fn: Box::new(|world: &mut World| world.insert_resource(T::default())),
        });
    }

    /// Collect every resource that wants to be saved, keyed by `SAVE_KEY`.
    pub fn save_all(&self, world: &World) -> BTreeMap<String, Vec<u8>> {
        self.entries
            .iter()
            .filter_map(|entry| Some((entry.key.clone(), (entry.save_fn)(world)?)))
            .collect()
    }

    /// Restore resources present in `extensions`. Missing keys leave the
    /// current resource alone; unknown keys are ignored.
    pub fn load_all(&self, world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) {
        for entry in &self.entries {
            if let Some(bytes) = extensions.get(&entry.key) {
                (entry.load_fn)(world, bytes);
            }
        }
    }

    /// Put every registered resource back to its default, e.g. before the
    /// host loads a different map.
    pub fn reset_all(&self, world: &mut World) {
        for entry in &self.entries {
            (entry.reset_fn)(world);
        }
    }
}

/// One-line registration from a plugin's `build()`.
pub trait SaveableAppExt {
    fn register_saveable<T: Saveable>(&mut self) -> &mut Self;
}

impl SaveableAppExt for App {
    fn register_saveable<T: Saveable>(&mut self) -> &mut Self {
        self.init_resource::<SaveableRegistry>();
        self.world_mut()
            .resource_mut::<SaveableRegistry>()
            .register::<T>();
        self
    }
}

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global tick counter incremented each FixedUpdate.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<SaveableRegistry>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::PreSim,
                    SimulationSet::Simulation,
                    SimulationSet::PostSim,
                )
                    .chain(),
            )
            .add_systems(FixedUpdate, tick_counter.in_set(SimulationSet::PreSim));

        app.add_plugins((
            heightfield_water::HeightFieldWaterPlugin,
            state_hash::StateHashPlugin,
        ));
    }
}

pub fn tick_counter(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}
