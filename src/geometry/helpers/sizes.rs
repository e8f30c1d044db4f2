//! Element lengths, areas and volumes.
//!
//! Tetrahedron and hexahedron volumes are signed: an inverted cell yields a
//! negative volume. Polygon areas are absolute.

use num_traits::Float;

use crate::algs::cancel::CancelToken;
use crate::geometry::MeshIndexType;
use crate::geometry::helpers::{cross, dot, lit, norm, point, sub, validate_connectivity};
use crate::structure_error::StructureError;

/// Local corner quadruples splitting a hexahedron into five tetrahedra.
pub const HEX_TETS: [[usize; 4]; 5] = [
    [0, 1, 3, 4],
    [1, 2, 3, 6],
    [1, 3, 4, 6],
    [1, 4, 5, 6],
    [3, 4, 6, 7],
];

/// Signed volume `(b - a) · ((c - a) × (d - a)) / 6`.
pub fn tet_volume<F: Float>(a: [F; 3], b: [F; 3], c: [F; 3], d: [F; 3]) -> F {
    dot(sub(b, a), cross(sub(c, a), sub(d, a))) / lit(6.0)
}

/// Signed volume of a hexahedron in VTK corner order.
pub fn hex_volume<F: Float>(corners: &[[F; 3]; 8]) -> F {
    HEX_TETS.iter().fold(F::zero(), |acc, t| {
        acc + tet_volume(corners[t[0]], corners[t[1]], corners[t[2]], corners[t[3]])
    })
}

/// Area of a planar polygon embedded in 3D.
///
/// Uses the Newell normal to pick the dominant projection axis, applies the
/// shoelace sum in the remaining two coordinates and rescales by the normal.
pub fn polygon_area<F: Float>(points: &[[F; 3]]) -> F {
    let n = points.len();
    if n < 3 {
        return F::zero();
    }
    let mut normal = [F::zero(); 3];
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        normal[0] = normal[0] + (p[1] - q[1]) * (p[2] + q[2]);
        normal[1] = normal[1] + (p[2] - q[2]) * (p[0] + q[0]);
        normal[2] = normal[2] + (p[0] - q[0]) * (p[1] + q[1]);
    }
    let abs = [normal[0].abs(), normal[1].abs(), normal[2].abs()];
    let axis = if abs[0] > abs[1] && abs[0] > abs[2] {
        0
    } else if abs[1] > abs[2] {
        1
    } else {
        2
    };
    if abs[axis] == F::zero() {
        return F::zero();
    }
    let (u, w) = match axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let mut sum = F::zero();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let next = points[(i + 1) % n];
        sum = sum + points[i][u] * (next[w] - prev[w]);
    }
    let area = sum * norm(normal) / (lit::<F>(2.0) * normal[axis]);
    area.abs()
}

fn cell_points<F: Float, const N: usize>(vertices: &[F], cell: &[MeshIndexType]) -> [[F; 3]; N] {
    let mut pts = [[F::zero(); 3]; N];
    for (p, &v) in pts.iter_mut().zip(cell) {
        *p = point(vertices, v);
    }
    pts
}

/// Length of each edge.
pub fn find_edge_lengths<F: Float>(
    vertices: &[F],
    connectivity: &[MeshIndexType],
    cancel: &CancelToken,
) -> Result<Vec<F>, StructureError> {
    validate_connectivity(connectivity, 2, vertices.len() / 3)?;
    connectivity
        .chunks_exact(2)
        .map(|e| {
            cancel.check()?;
            Ok(norm(sub(point(vertices, e[1]), point(vertices, e[0]))))
        })
        .collect()
}

/// Area of each triangle (`vertices_per_cell == 3`) or quad (`4`).
pub fn find_2d_element_areas<F: Float>(
    vertices: &[F],
    connectivity: &[MeshIndexType],
    vertices_per_cell: usize,
    cancel: &CancelToken,
) -> Result<Vec<F>, StructureError> {
    validate_connectivity(connectivity, vertices_per_cell, vertices.len() / 3)?;
    let mut pts = Vec::with_capacity(vertices_per_cell);
    connectivity
        .chunks_exact(vertices_per_cell)
        .map(|cell| {
            cancel.check()?;
            pts.clear();
            pts.extend(cell.iter().map(|&v| point(vertices, v)));
            Ok(polygon_area(&pts))
        })
        .collect()
}

/// Signed volume of each tetrahedron.
pub fn find_tet_volumes<F: Float>(
    vertices: &[F],
    connectivity: &[MeshIndexType],
    cancel: &CancelToken,
) -> Result<Vec<F>, StructureError> {
    validate_connectivity(connectivity, 4, vertices.len() / 3)?;
    let out: Vec<F> = connectivity
        .chunks_exact(4)
        .map(|cell| {
            cancel.check()?;
            let [a, b, c, d] = cell_points::<F, 4>(vertices, cell);
            Ok(tet_volume(a, b, c, d))
        })
        .collect::<Result<_, StructureError>>()?;
    warn_non_positive("tetrahedra", &out);
    Ok(out)
}

/// Signed volume of each hexahedron.
pub fn find_hex_volumes<F: Float>(
    vertices: &[F],
    connectivity: &[MeshIndexType],
    cancel: &CancelToken,
) -> Result<Vec<F>, StructureError> {
    validate_connectivity(connectivity, 8, vertices.len() / 3)?;
    let out: Vec<F> = connectivity
        .chunks_exact(8)
        .map(|cell| {
            cancel.check()?;
            Ok(hex_volume(&cell_points::<F, 8>(vertices, cell)))
        })
        .collect::<Result<_, StructureError>>()?;
    warn_non_positive("hexahedra", &out);
    Ok(out)
}

fn warn_non_positive<F: Float>(kind: &str, volumes: &[F]) {
    let bad = volumes.iter().filter(|v| **v <= F::zero()).count();
    if bad > 0 {
        log::warn!("{bad} of {} {kind} have non-positive volume", volumes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: [[f64; 3]; 8] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];

    #[test]
    fn unit_cube_volume() {
        assert!((hex_volume(&CUBE) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scaled_box_volume() {
        let scaled = CUBE.map(|p| [p[0] * 2.0, p[1] * 3.0, p[2] * 0.5]);
        assert!((hex_volume(&scaled) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn inverted_tet_is_negative() {
        let (a, b, c, d) = (CUBE[0], CUBE[1], CUBE[3], CUBE[4]);
        assert!((tet_volume(a, b, c, d) - 1.0 / 6.0).abs() < 1e-12);
        assert!((tet_volume(a, c, b, d) + 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn polygon_area_any_orientation() {
        let quad = [[0.0f64, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        assert!((polygon_area(&quad) - 1.0).abs() < 1e-12);
        let mut rev = quad;
        rev.reverse();
        assert!((polygon_area(&rev) - 1.0).abs() < 1e-12);
        // tilted into the x = z plane
        let tilted = quad.map(|p| [p[0], p[1], p[0]]);
        assert!((polygon_area(&tilted) - 2f64.sqrt()).abs() < 1e-12);
        let tri = [[0.0f64, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]];
        assert!((polygon_area(&tri) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_polygon_has_zero_area() {
        let line = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert_eq!(polygon_area(&line), 0.0);
    }

    #[test]
    fn edge_lengths() {
        let verts = [0.0f32, 0.0, 0.0, 3.0, 4.0, 0.0];
        let l = find_edge_lengths(&verts, &[0, 1], &CancelToken::new()).unwrap();
        assert_eq!(l, vec![5.0]);
    }
}
