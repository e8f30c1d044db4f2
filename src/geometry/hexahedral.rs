//! Hexahedral volume meshes.

use crate::geometry::node_geometry::declare_node_geometry;

declare_node_geometry!(
    /// Eight-vertex volume cells: bottom loop `0..4`, top loop `4..8`.
    HexahedralGeom,
    crate::geometry::topology::HEXAHEDRAL
);
