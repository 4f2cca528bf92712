//! Drives the engine the way an embedding host does: build a grid from its
//! own terrain, edit water between ticks, call the updater, read results.

use simulation::heightfield_water::{
    update, ActiveUpdater, GridError, HeightFieldGrid, SkipReason, TickReport, WaterParams,
};
use simulation::state_hash::water_state_hash;
use simulation::traversal::{ship_speed_mod_at, ship_speed_mod_dir};

fn basin(size: usize) -> HeightFieldGrid {
    // Bowl: terrain rises with distance from the centre, sea level at r = 6.
    let c = (size / 2) as f32;
    let terrain = (0..size * size)
        .map(|i| {
            let dx = (i % size) as f32 - c;
            let dy = (i / size) as f32 - c;
            (dx * dx + dy * dy).sqrt() - 6.0
        })
        .collect();
    HeightFieldGrid::with_terrain(size, size, terrain).unwrap()
}

#[test]
fn rejects_inconsistent_host_terrain() {
    assert_eq!(
        HeightFieldGrid::with_terrain(4, 4, vec![0.0; 15]).unwrap_err(),
        GridError::LengthMismatch {
            expected: 16,
            found: 15
        }
    );
    assert!(matches!(
        HeightFieldGrid::new(2, 8),
        Err(GridError::TooSmall { .. })
    ));
}

#[test]
fn water_poured_on_a_rim_collects_in_the_basin() {
    let mut grid = basin(24);
    let params = WaterParams::default();
    let active = ActiveUpdater::default();

    for tick in 0..120 {
        if tick < 20 {
            grid.add_water(12, 4, 1.0);
        }
        let report = update(active.get(), &mut grid, &params);
        assert!(report.stepped(), "tick {tick}: {report:?}");
    }

    assert!(grid.water().iter().all(|d| d.is_finite() && *d >= 0.0));
    assert!(
        grid.get_water(12, 12) > grid.get_water(12, 4),
        "centre {} rim {}",
        grid.get_water(12, 12),
        grid.get_water(12, 4)
    );
    assert!(grid.has_visible_water(12, 12));
}

#[test]
fn dry_host_grid_is_left_alone() {
    let mut grid = basin(16);
    let before = water_state_hash(&grid);
    let report = update(ActiveUpdater::default().get(), &mut grid, &WaterParams::default());
    assert_eq!(report, TickReport::Skipped(SkipReason::Dry));
    assert_eq!(water_state_hash(&grid), before);
}

#[test]
fn ships_need_depth_and_open_water() {
    let mut grid = basin(16);
    grid.set_water(8, 8, 3.0);
    assert_eq!(ship_speed_mod_at(&grid, 8, 8, 2.0), 1.0);
    assert_eq!(ship_speed_mod_at(&grid, 8, 8, 4.0), 0.0);

    let (x, y) = (8, 8);
    let terrain = grid.get_terrain(x, y);
    assert!(terrain < 0.0);
    assert_eq!(ship_speed_mod_dir(4.0, terrain, grid.get_water(x, y), -1.0), 1.0);
    assert_eq!(ship_speed_mod_dir(4.0, terrain, grid.get_water(x, y), 1.0), 0.0);
}
