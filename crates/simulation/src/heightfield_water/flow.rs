//! Flow phase: update the west/south face flow accumulators.
//!
//! For every interior cell the water shared with its west (X axis) and south
//! (Y axis) neighbour is re-split by [`flow_adjust`]. The difference between
//! that split and what the cell currently holds is folded into the persistent
//! accumulator, which is then damped by the attenuation factor.

use super::grid::{GridLayers, HeightFieldGrid};

/// Terrain difference used for the wall side of cells next to the map edge.
///
/// `flow_adjust(WALL_HEIGHT_DIFF, own)` always returns `own`, so the edge ring
/// never induces any flow.
pub const WALL_HEIGHT_DIFF: f32 = f32::INFINITY;

/// Water the current cell should hold after sharing `combined` with a
/// neighbour whose terrain is `diff` higher than the current cell's.
pub fn flow_adjust(diff: f32, combined: f32) -> f32 {
    if diff > 0.0 {
        // Neighbour is higher: water runs toward the current cell.
        if diff >= combined {
            combined
        } else {
            (combined - diff) / 2.0 + diff
        }
    } else if -diff >= combined {
        // Neighbour is lower by more than all the water: it drains away.
        0.0
    } else {
        (combined + diff) / 2.0
    }
}

/// Target water for cell `idx` when paired with `neighbor` (or the wall).
#[inline]
fn pair_target(terrain: &[f32], water: &[f32], idx: usize, neighbor: Option<usize>) -> f32 {
    match neighbor {
        Some(n) => flow_adjust(terrain[n] - terrain[idx], water[n] + water[idx]),
        None => flow_adjust(WALL_HEIGHT_DIFF, water[idx]),
    }
}

/// Run the flow phase over the interior of `grid`.
///
/// Water heights are only read here, so the visiting order does not matter.
pub fn compute_flows(grid: &mut HeightFieldGrid, attenuation: f32) {
    let xs = grid.interior_x();
    let ys = grid.interior_y();
    let GridLayers {
        width,
        terrain,
        water,
        flow_x,
        flow_y,
        ..
    } = grid.layers_mut();

    for y in ys {
        for x in xs.clone() {
            let idx = y * width + x;
            let own = water[idx];

            let west = (x > 1).then_some(idx - 1);
            flow_x[idx] += pair_target(terrain, water, idx, west) - own;
            flow_x[idx] *= attenuation;

            let south = (y > 1).then_some(idx - width);
            flow_y[idx] += pair_target(terrain, water, idx, south) - own;
            flow_y[idx] *= attenuation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // flow_adjust
    // -------------------------------------------------------------------------

    #[test]
    fn test_flow_adjust_flat_splits_evenly() {
        assert!((flow_adjust(0.0, 10.0) - 5.0).abs() < f32::EPSILON);
        assert_eq!(flow_adjust(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_flow_adjust_higher_neighbor_partial() {
        // (4 - 2) / 2 + 2 = 3
        assert!((flow_adjust(2.0, 4.0) - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_flow_adjust_much_higher_neighbor_takes_all() {
        assert_eq!(flow_adjust(5.0, 4.0), 4.0);
        assert_eq!(flow_adjust(4.0, 4.0), 4.0);
    }

    #[test]
    fn test_flow_adjust_lower_neighbor_partial() {
        // (4 - 2) / 2 = 1
        assert!((flow_adjust(-2.0, 4.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_flow_adjust_much_lower_neighbor_drains_all() {
        assert_eq!(flow_adjust(-5.0, 4.0), 0.0);
        assert_eq!(flow_adjust(-4.0, 4.0), 0.0);
    }

    #[test]
    fn test_flow_adjust_wall_keeps_own_water() {
        for own in [0.0_f32, 0.3, 7.0, 1.0e6] {
            assert_eq!(flow_adjust(WALL_HEIGHT_DIFF, own), own);
        }
    }

    #[test]
    fn test_flow_adjust_is_bounded_by_combined() {
        for diff in [-3.0_f32, -0.5, 0.0, 0.5, 3.0] {
            for combined in [0.0_f32, 0.25, 1.0, 6.0] {
                let r = flow_adjust(diff, combined);
                assert!(
                    (0.0..=combined).contains(&r),
                    "flow_adjust({diff}, {combined}) = {r} outside [0, {combined}]"
                );
            }
        }
    }

    // -------------------------------------------------------------------------
    // compute_flows
    // -------------------------------------------------------------------------

    #[test]
    fn test_compute_flows_center_source() {
        let mut g = HeightFieldGrid::new(5, 5).unwrap();
        g.set_water(2, 2, 10.0);
        compute_flows(&mut g, 0.99);

        // Centre pairs with a dry west/south neighbour: target 5, delta -5.
        assert!((g.get_flow_x(2, 2) + 4.95).abs() < 1e-5);
        assert!((g.get_flow_y(2, 2) + 4.95).abs() < 1e-5);
        // East/north neighbours pair with the wet centre: target 5, delta +5.
        assert!((g.get_flow_x(3, 2) - 4.95).abs() < 1e-5);
        assert!((g.get_flow_y(2, 3) - 4.95).abs() < 1e-5);
        // Unrelated cells see nothing.
        assert_eq!(g.get_flow_x(1, 1), 0.0);
        assert_eq!(g.get_flow_y(3, 3), 0.0);
    }

    #[test]
    fn test_compute_flows_never_touches_edge_ring() {
        let terrain: Vec<f32> = (0..36).map(|i| (i % 7) as f32).collect();
        let mut g = HeightFieldGrid::with_terrain(6, 6, terrain).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                g.set_water(x, y, 1.0 + (x + y) as f32);
            }
        }
        compute_flows(&mut g, 0.99);

        for y in 0..6 {
            for x in 0..6 {
                if g.is_edge(x, y) {
                    assert_eq!(g.get_flow_x(x, y), 0.0, "flow_x at edge ({x},{y})");
                    assert_eq!(g.get_flow_y(x, y), 0.0, "flow_y at edge ({x},{y})");
                }
            }
        }
        // Cells against the wall get no flow across the wall face.
        for y in 1..5 {
            assert_eq!(g.get_flow_x(1, y), 0.0, "west wall face at y={y}");
        }
        for x in 1..5 {
            assert_eq!(g.get_flow_y(x, 1), 0.0, "south wall face at x={x}");
        }
    }

    #[test]
    fn test_compute_flows_downhill_direction() {
        // Terrain rises toward +x: water at (2,2) should drain west into (1,2).
        let terrain: Vec<f32> = (0..25).map(|i| (i % 5) as f32 * 2.0).collect();
        let mut g = HeightFieldGrid::with_terrain(5, 5, terrain).unwrap();
        g.set_water(2, 2, 1.0);
        compute_flows(&mut g, 1.0);

        // West neighbour is 2 lower with 1 unit combined: all drains away.
        assert!((g.get_flow_x(2, 2) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_attenuation_decays_flow_geometrically() {
        // Flat, dry terrain: no forcing, so only attenuation acts.
        let mut g = HeightFieldGrid::new(6, 6).unwrap();
        {
            let layers = g.layers_mut();
            layers.flow_x[2 * 6 + 3] = 8.0;
            layers.flow_y[3 * 6 + 2] = -4.0;
        }
        let attenuation = 0.98_f32;
        for tick in 1..=50 {
            compute_flows(&mut g, attenuation);
            let expected = attenuation.powi(tick);
            assert!(
                (g.get_flow_x(3, 2) - 8.0 * expected).abs() < 1e-4,
                "tick {tick}: flow_x {} expected {}",
                g.get_flow_x(3, 2),
                8.0 * expected
            );
            assert!((g.get_flow_y(2, 3) + 4.0 * expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_uniform_flat_water_induces_no_flow() {
        let mut g = HeightFieldGrid::new(6, 6).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                g.set_water(x, y, 2.0);
            }
        }
        compute_flows(&mut g, 0.99);
        assert!(g.flow_x().iter().all(|&f| f == 0.0));
        assert!(g.flow_y().iter().all(|&f| f == 0.0));
    }
}
