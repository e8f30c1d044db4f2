//! Polyline networks made of two-vertex segments.

use crate::geometry::node_geometry::declare_node_geometry;

declare_node_geometry!(
    /// Line segments sharing a vertex list.
    EdgeGeom,
    crate::geometry::topology::EDGE
);
