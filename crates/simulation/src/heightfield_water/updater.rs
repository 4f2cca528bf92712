//! Water tick orchestration.
//!
//! [`WaterUpdater`] is the seam for alternative solvers (threaded, GPU, ...).
//! The active one is picked when [`ActiveUpdater`] is constructed and called
//! through a trait object; [`update`] adds the per-tick enable and parameter
//! checks in front of it.

use bevy::prelude::*;

use super::boundary::copy_edges;
use super::conserve::{conserve_volume, relative_error, Convergence};
use super::flow::compute_flows;
use super::grid::HeightFieldGrid;
use super::integrate::integrate_heights;
use super::params::{ParamsError, WaterParams};

// =============================================================================
// TickReport
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The feature toggle is off.
    Disabled,
    /// Total volume is below the dry threshold.
    Dry,
    /// Parameters failed validation.
    InvalidParams(ParamsError),
}

/// What one call to the water update did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// The grid was left untouched.
    Skipped(SkipReason),
    /// All four phases ran.
    Stepped {
        volume_before: f64,
        /// Volume after conservation, before the edge copy.
        volume_after: f64,
        relative_error: f64,
        convergence: Convergence,
    },
}

impl TickReport {
    pub fn stepped(&self) -> bool {
        matches!(self, TickReport::Stepped { .. })
    }

    pub fn convergence(&self) -> Option<Convergence> {
        match self {
            TickReport::Stepped { convergence, .. } => Some(*convergence),
            TickReport::Skipped(_) => None,
        }
    }
}

// =============================================================================
// Updater trait and the basic solver
// =============================================================================

/// A strategy that advances the water grid by one tick.
pub trait WaterUpdater: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Advance `grid` by one tick. Never fails: a degraded result is reported
    /// through the returned [`TickReport`].
    fn run_tick(&self, grid: &mut HeightFieldGrid, params: &WaterParams) -> TickReport;
}

/// Single-threaded CPU solver: flow, integrate, conserve, copy edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicUpdater;

impl WaterUpdater for BasicUpdater {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn run_tick(&self, grid: &mut HeightFieldGrid, params: &WaterParams) -> TickReport {
        let volume_before = grid.total_volume();
        if volume_before < params.dry_volume_threshold as f64 {
            return TickReport::Skipped(SkipReason::Dry);
        }

        compute_flows(grid, params.attenuation);
        integrate_heights(grid, params.noise_threshold);
        let convergence = conserve_volume(grid, volume_before, params);
        let volume_after = grid.total_volume();

        let (width, height) = (grid.width(), grid.height());
        copy_edges(grid.water_mut(), width, height);

        TickReport::Stepped {
            volume_before,
            volume_after,
            relative_error: relative_error(volume_before - volume_after, volume_before),
            convergence,
        }
    }
}

/// The updater chosen for this map.
#[derive(Resource)]
pub struct ActiveUpdater(Box<dyn WaterUpdater>);

impl Default for ActiveUpdater {
    fn default() -> Self {
        Self::new(BasicUpdater)
    }
}

impl ActiveUpdater {
    pub fn new(updater: impl WaterUpdater) -> Self {
        Self(Box::new(updater))
    }

    pub fn get(&self) -> &dyn WaterUpdater {
        self.0.as_ref()
    }
}

/// Run one tick if the feature is enabled and the parameters are valid.
pub fn update(
    updater: &dyn WaterUpdater,
    grid: &mut HeightFieldGrid,
    params: &WaterParams,
) -> TickReport {
    if !params.enabled {
        return TickReport::Skipped(SkipReason::Disabled);
    }
    if let Err(e) = params.validate() {
        return TickReport::Skipped(SkipReason::InvalidParams(e));
    }
    updater.run_tick(grid, params)
}

/// Most recent report, for stats and diagnostics systems.
#[derive(Resource, Default, Debug, Clone)]
pub struct LastTickReport(pub Option<TickReport>);
