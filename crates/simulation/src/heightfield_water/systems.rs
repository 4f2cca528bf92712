//! ECS systems and plugin for the height-field water simulation.
//!
//! Per fixed tick, inside `SimulationSet::Simulation`:
//!   1. `handle_water_toggle` notices enable/disable transitions
//!   2. `update_heightfield_water` advances the grid through the active updater
//!
//! and in `SimulationSet::PostSim`, `record_water_stats` folds the tick report
//! into `WaterSimState`.

use bevy::prelude::*;

use super::conserve::ConvergenceStatus;
use super::grid::HeightFieldGrid;
use super::params::{ParamsError, WaterParams};
use super::state::WaterSimState;
use super::updater::{update, ActiveUpdater, LastTickReport, SkipReason, TickReport};
use crate::{SaveableAppExt, SimulationSet};

// =============================================================================
// Systems
// =============================================================================

/// Track the feature toggle. On a disabled -> enabled transition the flow
/// accumulators are cleared when `reset_flow_on_resume` is set.
pub fn handle_water_toggle(
    params: Res<WaterParams>,
    mut grid: ResMut<HeightFieldGrid>,
    mut was_enabled: Local<Option<bool>>,
) {
    let enabled = params.enabled;
    match *was_enabled {
        Some(prev) if prev == enabled => return,
        Some(false) => {
            if params.reset_flow_on_resume {
                grid.reset_flow();
                info!("Height-field water resumed, flow inertia cleared");
            } else {
                info!("Height-field water resumed");
            }
        }
        Some(true) => info!("Height-field water paused"),
        None => {}
    }
    *was_enabled = Some(enabled);
}

/// Advance the water grid by one tick.
pub fn update_heightfield_water(
    updater: Res<ActiveUpdater>,
    params: Res<WaterParams>,
    mut grid: ResMut<HeightFieldGrid>,
    mut last: ResMut<LastTickReport>,
    mut last_invalid: Local<Option<ParamsError>>,
) {
    let report = update(updater.get(), &mut grid, &params);

    match &report {
        TickReport::Skipped(SkipReason::InvalidParams(e)) => {
            if last_invalid.as_ref() != Some(e) {
                warn!("Height-field water skipped: invalid parameters: {}", e);
                *last_invalid = Some(e.clone());
            }
        }
        TickReport::Skipped(SkipReason::Dry) => {
            trace!("Height-field water skipped: grid is dry");
        }
        TickReport::Skipped(SkipReason::Disabled) => {}
        TickReport::Stepped {
            volume_before,
            volume_after,
            relative_error,
            convergence,
        } => match convergence.status {
            ConvergenceStatus::IterationCapReached => warn!(
                "Height-field water: volume not conserved after {} passes ({:.3} -> {:.3}, error {:.4})",
                convergence.iterations, volume_before, volume_after, relative_error
            ),
            ConvergenceStatus::NoActiveCells => debug!(
                "Height-field water: no active cells left to redistribute {:.3} units into",
                volume_before - volume_after
            ),
            ConvergenceStatus::Converged => {}
        },
    }
    if !matches!(report, TickReport::Skipped(SkipReason::InvalidParams(_))) {
        *last_invalid = None;
    }

    last.0 = Some(report);
}

/// Fold the last tick report into the aggregate statistics.
pub fn record_water_stats(
    last: Res<LastTickReport>,
    grid: Res<HeightFieldGrid>,
    params: Res<WaterParams>,
    mut state: ResMut<WaterSimState>,
) {
    let Some(report) = &last.0 else {
        return;
    };
    match report {
        TickReport::Skipped(_) => state.ticks_skipped += 1,
        TickReport::Stepped { convergence, .. } => {
            state.ticks_stepped += 1;
            state.last_volume = grid.total_volume();
            state.active_cells = grid.active_cells(params.noise_threshold) as u32;
            state.max_depth = grid.max_depth();
            state.last_iterations = convergence.iterations;
            state.last_convergence = Some(convergence.status);
            if convergence.status == ConvergenceStatus::IterationCapReached {
                state.nonconvergence_count += 1;
            }
        }
    }
}

// =============================================================================
// Plugin
// =============================================================================

pub struct HeightFieldWaterPlugin;

impl Plugin for HeightFieldWaterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HeightFieldGrid>()
            .init_resource::<WaterParams>()
            .init_resource::<WaterSimState>()
            .init_resource::<ActiveUpdater>()
            .init_resource::<LastTickReport>()
            .add_systems(
                FixedUpdate,
                (
                    handle_water_toggle,
                    update_heightfield_water.after(handle_water_toggle),
                )
                    .in_set(SimulationSet::Simulation),
            )
            .add_systems(
                FixedUpdate,
                record_water_stats.in_set(SimulationSet::PostSim),
            )
            .register_saveable::<WaterParams>()
            .register_saveable::<WaterSimState>();
    }
}
