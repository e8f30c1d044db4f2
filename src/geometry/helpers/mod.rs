//! Connectivity and topology algorithms over raw mesh arrays.
//!
//! Every helper takes the flat vertex coordinates (`x, y, z` per vertex), the
//! flat connectivity (`vertices_per_cell` indices per cell) and, where the
//! result depends on it, the cell topology. Cells are visited in index order,
//! so outputs are reproducible run to run.

pub mod centroids;
pub mod connectivity;
pub mod sizes;
pub mod sub_entities;

pub use centroids::find_element_centroids;
pub use connectivity::{find_element_neighbors, find_elements_containing_vert};
pub use sizes::{
    find_2d_element_areas, find_edge_lengths, find_hex_volumes, find_tet_volumes, hex_volume,
    polygon_area, tet_volume,
};
pub use sub_entities::{SubEntityList, find_sub_entities, find_unshared_sub_entities};

use num_traits::Float;

use crate::geometry::MeshIndexType;
use crate::structure_error::StructureError;

/// Checks that `connectivity` holds whole cells referencing only existing vertices.
pub fn validate_connectivity(
    connectivity: &[MeshIndexType],
    vertices_per_cell: usize,
    num_vertices: usize,
) -> Result<usize, StructureError> {
    if vertices_per_cell == 0 || connectivity.len() % vertices_per_cell != 0 {
        return Err(StructureError::ShapeMismatch {
            expected: vertices_per_cell,
            found: connectivity.len(),
        });
    }
    for (i, &v) in connectivity.iter().enumerate() {
        if v as usize >= num_vertices {
            return Err(StructureError::VertexIndexOutOfRange {
                cell: i / vertices_per_cell,
                vertex: v,
                num_vertices,
            });
        }
    }
    Ok(connectivity.len() / vertices_per_cell)
}

pub(crate) fn lit<F: Float>(v: f64) -> F {
    F::from(v).unwrap_or_else(F::nan)
}

#[inline]
pub(crate) fn point<F: Float>(vertices: &[F], v: MeshIndexType) -> [F; 3] {
    let i = v as usize * 3;
    [vertices[i], vertices[i + 1], vertices[i + 2]]
}

#[inline]
pub(crate) fn sub<F: Float>(a: [F; 3], b: [F; 3]) -> [F; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub(crate) fn dot<F: Float>(a: [F; 3], b: [F; 3]) -> F {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub(crate) fn cross<F: Float>(a: [F; 3], b: [F; 3]) -> [F; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn norm<F: Float>(a: [F; 3]) -> F {
    dot(a, a).sqrt()
}
