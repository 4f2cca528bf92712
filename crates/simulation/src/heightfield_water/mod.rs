//! Height-field water flow simulation.
//!
//! Water sits on a static terrain height field. Each fixed tick moves it
//! between 4-connected neighbours through persistent, attenuated face flows,
//! then corrects the volume that numerical noise removed or created.
//!
//! One tick runs four phases in order:
//!   1. `flow`: update the west/south face flow accumulators of interior cells
//!   2. `integrate`: apply the net outflow to each interior cell's depth
//!   3. `conserve`: spread the volume discrepancy over the wet cells
//!   4. `boundary`: copy interior depths onto the unsimulated edge ring
//!
//! The tick is skipped entirely when the feature is disabled, the parameters
//! are invalid or the grid holds less than the dry threshold of water.

pub mod boundary;
pub mod conserve;
pub mod flow;
pub mod grid;
pub mod integrate;
pub mod params;
pub mod state;
pub mod systems;
pub mod updater;


pub use conserve::{Convergence, ConvergenceStatus};
pub use grid::{GridError, HeightFieldGrid};
pub use params::{ParamsError, WaterParams};
pub use state::WaterSimState;
pub use systems::{
    handle_water_toggle, record_water_stats, update_heightfield_water, HeightFieldWaterPlugin,
};
pub use updater::{
    update, ActiveUpdater, BasicUpdater, LastTickReport, SkipReason, TickReport, WaterUpdater,
};
