//! Runtime-tunable water simulation parameters.
//!
//! Defaults come from [`crate::config`]. The resource is saved through the
//! `Saveable` registry so overrides (including the on/off toggle) survive a
//! save/load cycle.

use std::fmt;

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::{
    DRY_VOLUME_THRESHOLD, FLOW_ATTENUATION, MAX_REDISTRIBUTION_ITERATIONS, NOISE_THRESHOLD,
    VOLUME_TOLERANCE,
};

// =============================================================================
// ParamsError
// =============================================================================

/// A parameter set the solver refuses to run with.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsError {
    /// Attenuation must lie in `(0, 1]`.
    AttenuationOutOfRange(f32),
    /// Thresholds are depths/volumes and cannot be negative (or NaN).
    NegativeThreshold { name: &'static str, value: f32 },
    /// Tolerance must be strictly positive.
    NonPositiveTolerance(f32),
    /// At least one conservation pass is required.
    ZeroIterationCap,
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::AttenuationOutOfRange(v) => {
                write!(f, "Flow attenuation {v} outside (0, 1]")
            }
            ParamsError::NegativeThreshold { name, value } => {
                write!(f, "Threshold `{name}` must be non-negative, got {value}")
            }
            ParamsError::NonPositiveTolerance(v) => {
                write!(f, "Volume tolerance must be positive, got {v}")
            }
            ParamsError::ZeroIterationCap => {
                write!(f, "Redistribution iteration cap must be at least 1")
            }
        }
    }
}

impl std::error::Error for ParamsError {}

// =============================================================================
// WaterParams resource
// =============================================================================

/// Tunables for the height-field water solver.
#[derive(Resource, Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct WaterParams {
    /// Feature toggle, re-read every tick. When false the grid is not touched.
    pub enabled: bool,
    /// Per-cell depth below which water is zeroed after integration and
    /// ignored by volume redistribution.
    pub noise_threshold: f32,
    /// Total grid volume below which the tick is skipped.
    pub dry_volume_threshold: f32,
    /// Multiplier applied to both flow accumulators every tick.
    pub attenuation: f32,
    /// Relative volume error accepted after redistribution.
    pub volume_tolerance: f32,
    pub max_redistribution_iterations: u32,
    /// Clear flow inertia when the simulation is re-enabled after a pause.
    pub reset_flow_on_resume: bool,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_threshold: NOISE_THRESHOLD,
            dry_volume_threshold: DRY_VOLUME_THRESHOLD,
            attenuation: FLOW_ATTENUATION,
            volume_tolerance: VOLUME_TOLERANCE,
            max_redistribution_iterations: MAX_REDISTRIBUTION_ITERATIONS,
            reset_flow_on_resume: false,
        }
    }
}

impl WaterParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.attenuation.is_nan() || self.attenuation <= 0.0 || self.attenuation > 1.0 {
            return Err(ParamsError::AttenuationOutOfRange(self.attenuation));
        }
        for (name, value) in [
            ("noise_threshold", self.noise_threshold),
            ("dry_volume_threshold", self.dry_volume_threshold),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ParamsError::NegativeThreshold { name, value });
            }
        }
        if self.volume_tolerance.is_nan() || self.volume_tolerance <= 0.0 {
            return Err(ParamsError::NonPositiveTolerance(self.volume_tolerance));
        }
        if self.max_redistribution_iterations == 0 {
            return Err(ParamsError::ZeroIterationCap);
        }
        Ok(())
    }
}

impl crate::Saveable for WaterParams {
    const SAVE_KEY: &'static str = "heightfield_water_params";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if *self == Self::default() {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_or_warn(Self::SAVE_KEY, bytes)
    }
}

// =============================================================================
// Tests
// =============================================================================
