//! # TestMap: headless integration test harness
//!
//! Wraps `bevy::app::App` + `SimulationPlugin` so water behaviour can be
//! driven tick by tick without a window or renderer.

use bevy::app::App;
use bevy::prelude::*;

use crate::heightfield_water::{
    HeightFieldGrid, LastTickReport, TickReport, WaterParams, WaterSimState,
};
use crate::state_hash::water_state_hash;
use crate::SimulationPlugin;

/// A headless Bevy App wrapping `SimulationPlugin`.
///
/// Use the builder methods to shape terrain and water, then `tick()` and
/// assert on the resulting resources.
pub struct TestMap {
    app: App,
}

impl TestMap {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// A flat, dry `width` x `height` map with default parameters.
    pub fn new(width: usize, height: usize) -> Self {
        let grid = match HeightFieldGrid::new(width, height) {
            Ok(g) => g,
            Err(e) => panic!("TestMap::new: {e}"),
        };
        Self::from_grid(grid)
    }

    /// A map over the given row-major terrain.
    pub fn with_terrain(width: usize, height: usize, terrain: Vec<f32>) -> Self {
        let grid = match HeightFieldGrid::with_terrain(width, height, terrain) {
            Ok(g) => g,
            Err(e) => panic!("TestMap::with_terrain: {e}"),
        };
        Self::from_grid(grid)
    }

    pub fn from_grid(grid: HeightFieldGrid) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SimulationPlugin);
        app.insert_resource(grid);
        // Plugin finish/cleanup normally happens in `App::run`.
        app.finish();
        app.cleanup();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // World setup (builder pattern: consumes and returns Self)
    // -----------------------------------------------------------------------

    /// Set the water depth of a single cell.
    pub fn with_water(mut self, x: usize, y: usize, depth: f32) -> Self {
        self.grid_mut().set_water(x, y, depth);
        self
    }

    /// Fill a rectangle (inclusive) with the given depth.
    pub fn with_water_rect(
        mut self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        depth: f32,
    ) -> Self {
        let mut grid = self.grid_mut();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if grid.in_bounds(x, y) {
                    grid.set_water(x, y, depth);
                }
            }
        }
        self
    }

    pub fn with_params(mut self, params: WaterParams) -> Self {
        self.app.insert_resource(params);
        self
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks by executing the `FixedUpdate` schedule
    /// directly, bypassing Bevy's time system.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn grid(&self) -> &HeightFieldGrid {
        self.resource::<HeightFieldGrid>()
    }

    pub fn grid_mut(&mut self) -> Mut<'_, HeightFieldGrid> {
        self.app.world_mut().resource_mut::<HeightFieldGrid>()
    }

    pub fn params_mut(&mut self) -> Mut<'_, WaterParams> {
        self.app.world_mut().resource_mut::<WaterParams>()
    }

    pub fn stats(&self) -> &WaterSimState {
        self.resource::<WaterSimState>()
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.resource::<LastTickReport>().0.as_ref()
    }

    pub fn total_volume(&self) -> f64 {
        self.grid().total_volume()
    }

    pub fn state_hash(&self) -> u64 {
        water_state_hash(self.grid())
    }
}
