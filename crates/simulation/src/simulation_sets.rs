//! Deterministic simulation ordering via `SystemSet` phases.
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Tick counter and any host-side per-tick setup (water
//!   sources, terrain edits) that the solver should see this tick.
//! * **Simulation** – The water toggle handler and the solver itself.
//! * **PostSim** – Aggregation: water statistics and the state hash. These
//!   only *read* simulation state, so a host consuming them on the next frame
//!   always sees a finished tick.
//!
//! Host plugins place their systems with `.in_set(SimulationSet::X)` and add
//! finer `.before()` / `.after()` constraints inside a phase where needed.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain by `SimulationPlugin`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Tick counter, host-side inputs.
    PreSim,
    /// Water toggle and solver.
    Simulation,
    /// Statistics and state hash.
    PostSim,
}
