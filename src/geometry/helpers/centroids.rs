//! Element centroids.

use num_traits::Float;

use crate::algs::cancel::CancelToken;
use crate::geometry::MeshIndexType;
use crate::geometry::helpers::{lit, validate_connectivity};
use crate::structure_error::StructureError;

/// Mean of each cell's vertex coordinates, `3` values per cell.
///
/// Each spatial dimension is accumulated in its own pass over the cells.
pub fn find_element_centroids<F: Float>(
    vertices: &[F],
    connectivity: &[MeshIndexType],
    vertices_per_cell: usize,
    cancel: &CancelToken,
) -> Result<Vec<F>, StructureError> {
    let num_cells = validate_connectivity(connectivity, vertices_per_cell, vertices.len() / 3)?;
    let mut out = vec![F::zero(); num_cells * 3];
    let denom: F = lit(vertices_per_cell as f64);
    for dim in 0..3 {
        for cell in 0..num_cells {
            cancel.check()?;
            let verts = &connectivity[cell * vertices_per_cell..(cell + 1) * vertices_per_cell];
            let sum = verts
                .iter()
                .fold(F::zero(), |acc, &v| acc + vertices[v as usize * 3 + dim]);
            out[cell * 3 + dim] = sum / denom;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_centroid() {
        let verts = [0.0f32, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 3.0, 3.0];
        let c = find_element_centroids(&verts, &[0, 1, 2], 3, &CancelToken::new()).unwrap();
        assert_eq!(c, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn point_cloud_centroids_are_the_points() {
        let verts = [1.0f64, 2.0, 3.0, -1.0, -2.0, -3.0];
        let c = find_element_centroids(&verts, &[0, 1], 1, &CancelToken::new()).unwrap();
        assert_eq!(c, verts.to_vec());
    }
}
