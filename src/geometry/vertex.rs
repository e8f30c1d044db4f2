//! Point cloud: a vertex list with no connectivity.

use crate::geometry::node_geometry::declare_node_geometry;

declare_node_geometry!(
    /// Unconnected points; every vertex counts as one cell.
    VertexGeom,
    crate::geometry::topology::VERTEX
);
