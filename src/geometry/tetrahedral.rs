//! Tetrahedral volume meshes.

use crate::geometry::node_geometry::declare_node_geometry;

declare_node_geometry!(
    /// Four-vertex volume cells.
    TetrahedralGeom,
    crate::geometry::topology::TETRAHEDRAL
);
