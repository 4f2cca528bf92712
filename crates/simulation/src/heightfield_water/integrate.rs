//! Integration phase: apply the divergence of the flow field to water depth.

use super::grid::{GridLayers, HeightFieldGrid};

/// Subtract each interior cell's net outflow from its depth.
///
/// A cell gains its own west/south face flow and loses the flow on its east
/// neighbour's west face and its north neighbour's south face. Results below
/// `noise_threshold` (negatives included) become exactly zero; that loss is
/// what the conservation phase later puts back.
pub fn integrate_heights(grid: &mut HeightFieldGrid, noise_threshold: f32) {
    let xs = grid.interior_x();
    let ys = grid.interior_y();
    let GridLayers {
        width,
        water,
        flow_x,
        flow_y,
        ..
    } = grid.layers_mut();

    for y in ys {
        for x in xs.clone() {
            let idx = y * width + x;
            let net_out = flow_x[idx + 1] + flow_y[idx + width] - flow_x[idx] - flow_y[idx];
            let depth = water[idx] - net_out;
            water[idx] = if depth < noise_threshold { 0.0 } else { depth };
        }
    }
}
