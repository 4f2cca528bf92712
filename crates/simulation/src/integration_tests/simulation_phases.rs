use crate::heightfield_water::TickReport;
use crate::state_hash::{water_state_hash, WaterStateHash};
use crate::test_harness::TestMap;
use crate::TickCounter;

// ---------------------------------------------------------------------------
// SimulationSet phase ordering
// ---------------------------------------------------------------------------

/// If the set chain were broken Bevy would panic building the schedule, or
/// the PostSim readers would observe a half-finished tick.
#[test]
fn test_simulation_set_phases_configured() {
    let mut map = TestMap::new(8, 8).with_water(3, 3, 5.0);
    map.tick(3);
    assert_eq!(map.resource::<TickCounter>().0, 3);
}

/// The state hash is taken in PostSim, after the solver ran this tick.
#[test]
fn test_state_hash_reflects_finished_tick() {
    let mut map = TestMap::new(8, 8).with_water(3, 3, 5.0);
    map.tick(4);
    let stored = map.resource::<WaterStateHash>();
    assert_eq!(stored.tick, 4);
    assert_eq!(stored.hash, water_state_hash(map.grid()));
}

/// Stats are recorded in PostSim from the report of the same tick.
#[test]
fn test_stats_follow_solver_within_tick() {
    let mut map = TestMap::new(8, 8).with_water(3, 3, 5.0);
    map.tick(1);
    assert!(matches!(map.last_report(), Some(TickReport::Stepped { .. })));
    assert_eq!(map.stats().ticks_stepped, 1);
    assert!((map.stats().last_volume - map.total_volume()).abs() < 1e-9);
}

/// A host system in PreSim adding water is seen by the solver the same tick.
#[test]
fn test_presim_host_input_is_visible_to_solver() {
    use crate::heightfield_water::HeightFieldGrid;
    use crate::SimulationSet;
    use bevy::prelude::*;

    fn rain(mut grid: ResMut<HeightFieldGrid>) {
        grid.add_water(4, 4, 1.0);
    }

    let mut map = TestMap::new(8, 8);
    map.world_mut()
        .schedule_scope(FixedUpdate, |_world, schedule| {
            schedule.add_systems(rain.in_set(SimulationSet::PreSim));
        });
    map.tick(1);
    assert!(
        map.last_report().is_some_and(|r| r.stepped()),
        "1.0 of rain is above the dry threshold: {:?}",
        map.last_report()
    );
}
