//! Fixed per-topology tables for node-based geometries.
//!
//! Vertex ordering follows the VTK convention. For the hexahedron:
//!
//! ```text
//!        7-------6
//!       /|      /|
//!      4-------5 |
//!      | 3-----|-2
//!      |/      |/
//!      0-------1
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::GeometryType;
use crate::structure::id::IdType;

/// Name of the deduplicated edge list of a 2D/3D mesh.
pub const SHARED_EDGE_LIST: &str = "Shared Edge List";
/// Name of the boundary-only edge list.
pub const UNSHARED_EDGE_LIST: &str = "Unshared Edge List";
/// Name of the deduplicated face list of a 3D mesh.
pub const SHARED_FACE_LIST: &str = "Shared Face List";
/// Name of the boundary-only face list.
pub const UNSHARED_FACE_LIST: &str = "Unshared Face List";

/// Stable names of the arrays a geometry type owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedNames {
    pub vertex_list: &'static str,
    pub cell_list: &'static str,
    pub elements_containing_vert: &'static str,
    pub element_neighbors: &'static str,
    pub element_centroids: &'static str,
    pub element_sizes: &'static str,
}

/// Static description of a cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellTopology {
    pub geometry_type: GeometryType,
    /// Topological dimension of the cells (0 for a point cloud).
    pub dimension: usize,
    pub vertices_per_cell: usize,
    /// Vertices two cells must share to be neighbours; `0` when undefined.
    pub shared_vertices: usize,
    /// Local vertex pairs of each cell edge.
    pub edges: &'static [[usize; 2]],
    /// Local vertex loops of each cell face.
    pub faces: &'static [&'static [usize]],
    pub vertices_per_face: usize,
    pub names: DerivedNames,
}

pub const VERTEX: CellTopology = CellTopology {
    geometry_type: GeometryType::Vertex,
    dimension: 0,
    vertices_per_cell: 1,
    shared_vertices: 0,
    edges: &[],
    faces: &[],
    vertices_per_face: 0,
    names: DerivedNames {
        vertex_list: "SharedVertexList",
        cell_list: "",
        elements_containing_vert: "",
        element_neighbors: "",
        element_centroids: "Vertex Centroids",
        element_sizes: "Vertex Sizes",
    },
};

pub const EDGE: CellTopology = CellTopology {
    geometry_type: GeometryType::Edge,
    dimension: 1,
    vertices_per_cell: 2,
    shared_vertices: 1,
    edges: &[[0, 1]],
    faces: &[],
    vertices_per_face: 0,
    names: DerivedNames {
        vertex_list: "SharedVertexList",
        cell_list: "SharedEdgeList",
        elements_containing_vert: "Edges Containing Vert",
        element_neighbors: "Edge Neighbors",
        element_centroids: "Edge Centroids",
        element_sizes: "Edge Lengths",
    },
};

pub const TRIANGLE: CellTopology = CellTopology {
    geometry_type: GeometryType::Triangle,
    dimension: 2,
    vertices_per_cell: 3,
    shared_vertices: 2,
    edges: &[[0, 1], [1, 2], [2, 0]],
    faces: &[&[0, 1, 2]],
    vertices_per_face: 3,
    names: DerivedNames {
        vertex_list: "SharedVertexList",
        cell_list: "SharedTriList",
        elements_containing_vert: "Triangles Containing Vert",
        element_neighbors: "Triangle Neighbors",
        element_centroids: "Triangle Centroids",
        element_sizes: "Triangle Areas",
    },
};

pub const QUAD: CellTopology = CellTopology {
    geometry_type: GeometryType::Quad,
    dimension: 2,
    vertices_per_cell: 4,
    shared_vertices: 2,
    edges: &[[0, 1], [1, 2], [2, 3], [3, 0]],
    faces: &[&[0, 1, 2, 3]],
    vertices_per_face: 4,
    names: DerivedNames {
        vertex_list: "SharedVertexList",
        cell_list: "SharedQuadList",
        elements_containing_vert: "Quads Containing Vert",
        element_neighbors: "Quad Neighbors",
        element_centroids: "Quad Centroids",
        element_sizes: "Quad Areas",
    },
};

pub const TETRAHEDRAL: CellTopology = CellTopology {
    geometry_type: GeometryType::Tetrahedral,
    dimension: 3,
    vertices_per_cell: 4,
    shared_vertices: 3,
    edges: &[[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]],
    faces: &[&[0, 1, 2], &[0, 1, 3], &[1, 2, 3], &[0, 2, 3]],
    vertices_per_face: 3,
    names: DerivedNames {
        vertex_list: "SharedVertexList",
        cell_list: "SharedTetList",
        elements_containing_vert: "Tets Containing Vert",
        element_neighbors: "Tet Neighbors",
        element_centroids: "Tet Centroids",
        element_sizes: "Tet Volumes",
    },
};

pub const HEXAHEDRAL: CellTopology = CellTopology {
    geometry_type: GeometryType::Hexahedral,
    dimension: 3,
    vertices_per_cell: 8,
    shared_vertices: 4,
    edges: &[
        [0, 1],
        [1, 2],
        [2, 3],
        [3, 0],
        [4, 5],
        [5, 6],
        [6, 7],
        [7, 4],
        [0, 4],
        [1, 5],
        [2, 6],
        [3, 7],
    ],
    faces: &[
        &[0, 1, 2, 3],
        &[4, 5, 6, 7],
        &[0, 1, 5, 4],
        &[1, 2, 6, 5],
        &[2, 3, 7, 6],
        &[3, 0, 4, 7],
    ],
    vertices_per_face: 4,
    names: DerivedNames {
        vertex_list: "SharedVertexList",
        cell_list: "SharedHexList",
        elements_containing_vert: "Hexas Containing Vert",
        element_neighbors: "Hex Neighbors",
        element_centroids: "Hex Centroids",
        element_sizes: "Hex Volumes",
    },
};

/// Kinds of lazily computed arrays a node geometry may track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DerivedArray {
    ElementSizes,
    ElementCentroids,
    ElementsContainingVert,
    ElementNeighbors,
    Edges,
    UnsharedEdges,
    Faces,
    UnsharedFaces,
}

impl DerivedArray {
    pub const ALL: [DerivedArray; 8] = [
        DerivedArray::ElementSizes,
        DerivedArray::ElementCentroids,
        DerivedArray::ElementsContainingVert,
        DerivedArray::ElementNeighbors,
        DerivedArray::Edges,
        DerivedArray::UnsharedEdges,
        DerivedArray::Faces,
        DerivedArray::UnsharedFaces,
    ];

    /// Persisted attribute key.
    pub fn as_str(self) -> &'static str {
        match self {
            DerivedArray::ElementSizes => "ElementSizes",
            DerivedArray::ElementCentroids => "ElementCentroids",
            DerivedArray::ElementsContainingVert => "ElementsContainingVert",
            DerivedArray::ElementNeighbors => "ElementNeighbors",
            DerivedArray::Edges => "Edges",
            DerivedArray::UnsharedEdges => "UnsharedEdges",
            DerivedArray::Faces => "Faces",
            DerivedArray::UnsharedFaces => "UnsharedFaces",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == tag)
    }

    /// Object name of this array for a given topology.
    pub fn array_name(self, topology: &CellTopology) -> &'static str {
        match self {
            DerivedArray::ElementSizes => topology.names.element_sizes,
            DerivedArray::ElementCentroids => topology.names.element_centroids,
            DerivedArray::ElementsContainingVert => topology.names.elements_containing_vert,
            DerivedArray::ElementNeighbors => topology.names.element_neighbors,
            DerivedArray::Edges => SHARED_EDGE_LIST,
            DerivedArray::UnsharedEdges => UNSHARED_EDGE_LIST,
            DerivedArray::Faces => SHARED_FACE_LIST,
            DerivedArray::UnsharedFaces => UNSHARED_FACE_LIST,
        }
    }

    /// Operation name used in unsupported-geometry errors.
    pub fn operation(self) -> &'static str {
        match self {
            DerivedArray::ElementSizes => "find_element_sizes",
            DerivedArray::ElementCentroids => "find_element_centroids",
            DerivedArray::ElementsContainingVert => "find_elements_containing_vert",
            DerivedArray::ElementNeighbors => "find_element_neighbors",
            DerivedArray::Edges => "find_edges",
            DerivedArray::UnsharedEdges => "find_unshared_edges",
            DerivedArray::Faces => "find_faces",
            DerivedArray::UnsharedFaces => "find_unshared_faces",
        }
    }

    /// Whether `topology` defines this array.
    pub fn supported_by(self, topology: &CellTopology) -> bool {
        match self {
            DerivedArray::ElementSizes | DerivedArray::ElementCentroids => true,
            DerivedArray::ElementsContainingVert | DerivedArray::ElementNeighbors => {
                topology.shared_vertices > 0
            }
            DerivedArray::Edges | DerivedArray::UnsharedEdges => topology.dimension >= 2,
            DerivedArray::Faces | DerivedArray::UnsharedFaces => topology.dimension == 3,
        }
    }
}

/// A tracked derived array and the source generations it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedEntry {
    pub id: IdType,
    pub sources: Vec<(IdType, u64)>,
}
