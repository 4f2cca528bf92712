//! Headless demo host for the height-field water engine.
//!
//! Builds a procedural map, runs the fixed-step simulation for a set number
//! of ticks and logs aggregate water statistics.
//!
//! Environment:
//!   WATERFLOW_SEED          terrain and spring seed (default 42)
//!   WATERFLOW_SIZE          map edge length in cells (default 256)
//!   WATERFLOW_TICKS         ticks to run before exiting (default 600)
//!   WATERFLOW_REPORT_EVERY  ticks between progress lines (default 60)
//!   RUST_LOG                log filter, e.g. `info,simulation=debug`

mod demo_map;

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use demo_map::DemoMapPlugin;

/// Fixed simulation rate.
const TICK_HZ: f64 = 30.0;

fn main() -> AppExit {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / TICK_HZ,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
        .add_plugins(simulation::SimulationPlugin)
        .add_plugins(DemoMapPlugin::from_env())
        .run()
}
