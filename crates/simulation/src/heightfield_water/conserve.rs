//! Volume conservation phase.
//!
//! Noise zeroing and clamping during integration lose (or, through overshoot,
//! create) water. This phase measures the discrepancy against the volume at the
//! start of the tick and spreads it evenly over the cells that still hold
//! water, repeating until the relative error is within tolerance or the
//! iteration cap is hit.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::grid::{count_active, sum_volume, GridLayers, HeightFieldGrid};
use super::params::WaterParams;

// =============================================================================
// Bounded iteration
// =============================================================================

/// Result of one step of a bounded iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The exit condition holds; stop.
    Converged,
    /// Not there yet; run another step if the cap allows.
    Continue,
    /// Nothing left to act on; stop without converging.
    NoTarget,
}

/// How a bounded iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    Converged,
    NoActiveCells,
    IterationCapReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convergence {
    /// Steps actually run, including the one that stopped the loop.
    pub iterations: u32,
    pub status: ConvergenceStatus,
}

impl Convergence {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Run `step` up to `max_iterations` times, stopping on the first outcome
/// other than [`StepOutcome::Continue`]. `step` receives the zero-based
/// iteration index.
pub fn run_bounded<F>(max_iterations: u32, mut step: F) -> Convergence
where
    F: FnMut(u32) -> StepOutcome,
{
    for iteration in 0..max_iterations {
        let status = match step(iteration) {
            StepOutcome::Continue => continue,
            StepOutcome::Converged => ConvergenceStatus::Converged,
            StepOutcome::NoTarget => ConvergenceStatus::NoActiveCells,
        };
        return Convergence {
            iterations: iteration + 1,
            status,
        };
    }
    Convergence {
        iterations: max_iterations,
        status: ConvergenceStatus::IterationCapReached,
    }
}

// =============================================================================
// Redistribution
// =============================================================================

/// `|deficit| / volume_before`, or the absolute deficit when there was no
/// volume to compare against.
#[inline]
pub fn relative_error(deficit: f64, volume_before: f64) -> f64 {
    if volume_before > 0.0 {
        (deficit / volume_before).abs()
    } else {
        deficit.abs()
    }
}

/// One redistribution pass.
///
/// Measures the volume and active-cell count over the whole grid, then adds
/// `deficit / active` to every active interior cell, clamping at zero.
/// Returns the deficit measured before redistributing, or `None` when no cell
/// holds more than the noise threshold.
pub fn redistribute_once(
    grid: &mut HeightFieldGrid,
    volume_before: f64,
    noise_threshold: f32,
) -> Option<f64> {
    let xs = grid.interior_x();
    let ys = grid.interior_y();
    let GridLayers { width, water, .. } = grid.layers_mut();

    let active = count_active(water, noise_threshold);
    if active == 0 {
        return None;
    }
    let deficit = volume_before - sum_volume(water);
    let share = (deficit / active as f64) as f32;

    for y in ys {
        for x in xs.clone() {
            let idx = y * width + x;
            if water[idx] > noise_threshold {
                water[idx] = (water[idx] + share).max(0.0);
            }
        }
    }
    Some(deficit)
}

/// Push the grid's total volume back toward `volume_before`.
pub fn conserve_volume(
    grid: &mut HeightFieldGrid,
    volume_before: f64,
    params: &WaterParams,
) -> Convergence {
    let tolerance = params.volume_tolerance as f64;
    run_bounded(params.max_redistribution_iterations, |_| {
        match redistribute_once(grid, volume_before, params.noise_threshold) {
            None => StepOutcome::NoTarget,
            Some(deficit) if relative_error(deficit, volume_before) <= tolerance => {
                StepOutcome::Converged
            }
            Some(_) => StepOutcome::Continue,
        }
    })
}
