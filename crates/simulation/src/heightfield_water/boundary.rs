//! Edge ring copy for display continuity.
//!
//! The outermost ring is never simulated. After the rest of the tick it takes
//! the depth of its nearest interior neighbour so anything sampling the edges
//! sees a continuous surface. Rows are copied first, then columns, so each
//! corner ends up with its diagonal interior neighbour's depth.

pub fn copy_edges(water: &mut [f32], width: usize, height: usize) {
    if width < 2 || height < 2 {
        return;
    }
    debug_assert_eq!(water.len(), width * height);

    let last_row = (height - 1) * width;
    let inner_last_row = (height - 2) * width;
    water.copy_within(width..2 * width, 0);
    water.copy_within(inner_last_row..inner_last_row + width, last_row);

    for row in water.chunks_exact_mut(width) {
        row[0] = row[1];
        row[width - 1] = row[width - 2];
    }
}
