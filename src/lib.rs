#![cfg_attr(docsrs, feature(doc_cfg))]
//! # dream-structure
//!
//! dream-structure is the data core of a materials-science processing
//! pipeline: a hierarchical, typed, in-memory data graph together with mesh
//! geometries, their connectivity algorithms and HDF5-layout persistence.
//!
//! ## Features
//! - [`DataStructure`](structure::DataStructure): an arena of data objects
//!   addressed by [`IdType`](structure::IdType) or [`DataPath`](structure::DataPath),
//!   forming a DAG in which one object may have several parents
//! - Typed [`DataArray`](data::DataArray)s over a closed primitive set, with
//!   tuple and component shapes, pluggable stores and generic type dispatch
//! - Ragged [`DynamicListArray`](data::DynamicListArray)s for adjacency
//! - Image, rectilinear-grid, vertex, edge, triangle, quad, tetrahedral and
//!   hexahedral geometries with lazily computed, generation-checked derived
//!   arrays (sizes, centroids, adjacency, shared and boundary edges/faces)
//! - Parallel per-array transfer for image crop/resample (`rayon` feature)
//! - Cooperative cancellation for every long-running operation
//!
//! ## Determinism
//!
//! Connectivity outputs depend only on cell order: adjacency lists follow
//! cell traversal order and edge/face lists follow sorted vertex tuples, so
//! repeated runs are byte-identical.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! dream-structure = "0.3"
//! # features = ["strict-invariants"]
//! ```

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod geometry;
pub mod io;
pub mod structure;
pub mod structure_error;

pub use debug_invariants::DebugInvariants;
pub use structure_error::StructureError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::cancel::CancelToken;
    pub use crate::algs::crop::{CropRegion, crop_image_geometry, resample_image_geometry};
    pub use crate::algs::parallel::{ParallelOptions, run_tasks};
    pub use crate::data::{
        AnyDataArray, ArrayElement, ArrayFunction, ComparisonOptions, DataArray, DataType,
        DynamicListArray, compare_arrays,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::{
        DerivedArray, EdgeGeom, FindOptions, Geometry, GeometryType, HexahedralGeom, ImageGeom,
        LengthUnit, MeshIndexType, QuadGeom, RectGridGeom, TetrahedralGeom, TriangleGeom,
        VertexGeom,
    };
    pub use crate::io::{
        H5File, Hdf5ReadOptions, Hdf5Reader, Hdf5WriteOptions, Hdf5Writer, StructureReader,
        StructureWriter,
    };
    pub use crate::structure::{
        AttributeMatrix, DataGroup, DataObject, DataPath, DataStructure, IdType, ObjectData,
        StringArray,
    };
    pub use crate::structure_error::StructureError;
}
