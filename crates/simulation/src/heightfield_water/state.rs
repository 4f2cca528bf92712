use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::conserve::ConvergenceStatus;

/// Aggregate statistics about the water simulation, refreshed every tick in
/// `PostSim`.
#[derive(Resource, Debug, Clone, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct WaterSimState {
    pub ticks_stepped: u64,
    pub ticks_skipped: u64,
    /// Total volume after the last stepped tick (edge ring included).
    pub last_volume: f64,
    /// Cells holding more than the noise threshold.
    pub active_cells: u32,
    pub max_depth: f32,
    /// Stepped ticks whose redistribution hit the iteration cap.
    pub nonconvergence_count: u64,
    pub last_iterations: u32,
    pub last_convergence: Option<ConvergenceStatus>,
}

impl crate::Saveable for WaterSimState {
    const SAVE_KEY: &'static str = "heightfield_water_state";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.ticks_stepped == 0 && self.ticks_skipped == 0 {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_or_warn(Self::SAVE_KEY, bytes)
    }
}
