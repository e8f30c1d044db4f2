//! StructureError: Unified error type for dream-structure public APIs
//!
//! Every structural mutation and every geometry `find_*` operation returns
//! `Result<_, StructureError>`. Lookups never fail with an error; they return
//! `Option` instead. Each variant maps to a stable negative status code via
//! [`StructureError::code`] so that callers driving pipelines can forward it.

use thiserror::Error;

use crate::data::data_type::DataType;
use crate::structure::id::IdType;

/// Unified error type for dream-structure operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructureError {
    /// Generic insertion failure with a reason.
    #[error("Insertion error: {0}")]
    InsertionError(String),
    /// A sibling with the same name already exists under the parent.
    #[error("Name collision: `{name}` already exists under parent {parent:?}")]
    NameCollision { name: String, parent: Option<IdType> },
    /// Object names may not be empty or contain the path separator.
    #[error("Invalid object name `{0}`")]
    InvalidName(String),
    /// The requested parent id is not live in this structure.
    #[error("Parent {0} does not exist")]
    MissingParent(IdType),
    /// The parent object cannot hold children (e.g. a data array).
    #[error("Object {0} cannot hold child objects")]
    NotAContainer(IdType),
    /// The requested object id is not live in this structure.
    #[error("Object {0} does not exist")]
    MissingObject(IdType),
    /// A path segment did not resolve.
    #[error("Path `{0}` could not be resolved")]
    PathNotFound(String),
    /// The destination path of a copy/insert already exists.
    #[error("Path `{0}` already exists")]
    PathExists(String),
    /// Object exists but is not of the requested kind.
    #[error("Object {id} is a {found}, expected {expected}")]
    TypeMismatch {
        id: IdType,
        expected: &'static str,
        found: &'static str,
    },
    /// Adding a parent link would introduce a cycle.
    #[error("Graph error: linking {child} under {parent} would create a cycle")]
    CycleDetected { parent: IdType, child: IdType },
    /// The object is not a child of the given parent.
    #[error("Object {child} is not a child of {parent}")]
    NotAChild { parent: IdType, child: IdType },
    /// Array tuple count does not match the owning attribute matrix.
    #[error("Tuple count mismatch: expected {expected}, found {found}")]
    TupleCountMismatch { expected: usize, found: usize },
    /// Generic array or buffer shape mismatch.
    #[error("Shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    /// Component shape differs where it must be identical.
    #[error("Component shape mismatch: expected {expected:?}, found {found:?}")]
    ComponentShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    /// Linear or (tuple, component) index outside the buffer.
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// The store only carries shape metadata (preflight) and has no values.
    #[error("Data store holds no values (read in preflight mode)")]
    NotMaterialized,
    /// Reserving memory for a new array failed.
    #[error("Allocation of {0} elements failed")]
    AllocationFailed(usize),
    /// The operation is not defined for this geometry type.
    #[error("Topology error: operation `{operation}` is unsupported for {geometry}")]
    UnsupportedGeometry {
        geometry: &'static str,
        operation: &'static str,
    },
    /// The geometry has no cell connectivity array assigned.
    #[error("Topology error: geometry {0} has no connectivity array")]
    MissingConnectivity(IdType),
    /// The geometry has no shared vertex list assigned.
    #[error("Topology error: geometry {0} has no vertex list")]
    MissingVertices(IdType),
    /// A prerequisite derived array could not be found or computed.
    #[error("Topology error: geometry {geometry} is missing derived array `{array}`")]
    MissingDerivedArray { geometry: IdType, array: &'static str },
    /// A connectivity entry references a vertex outside the vertex list.
    #[error("Topology error: cell {cell} references vertex {vertex} but only {num_vertices} exist")]
    VertexIndexOutOfRange {
        cell: usize,
        vertex: u64,
        num_vertices: usize,
    },
    /// Grid spacing must be strictly positive.
    #[error("Invalid spacing {0:?}: all components must be > 0")]
    InvalidSpacing([f32; 3]),
    /// Rectilinear grid bounds must be strictly increasing.
    #[error("Invalid bounds along axis {axis}: values must be strictly increasing")]
    InvalidBounds { axis: usize },
    /// Grid dimensions must be non-zero.
    #[error("Invalid grid dimensions {0:?}")]
    InvalidDimensions([usize; 3]),
    /// A cooperative cancellation request was observed.
    #[error("Operation cancelled")]
    Cancelled,
    /// Two arrays of different primitive types were compared.
    #[error("Cannot compare arrays of different types: {left} vs {right}")]
    MixedTypeComparison { left: DataType, right: DataType },
    /// The requested primitive type does not match the stored one.
    #[error("Data type mismatch: expected {expected}, found {found}")]
    DataTypeMismatch { expected: DataType, found: DataType },
    /// Malformed or unsupported persisted content.
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl StructureError {
    /// Stable negative status code for this error.
    ///
    /// Topology failures of the `find_*` family always report `-1`.
    pub fn code(&self) -> i32 {
        match self {
            StructureError::UnsupportedGeometry { .. }
            | StructureError::MissingConnectivity(_)
            | StructureError::MissingVertices(_)
            | StructureError::MissingDerivedArray { .. }
            | StructureError::VertexIndexOutOfRange { .. }
            | StructureError::AllocationFailed(_)
            | StructureError::Cancelled => -1,
            StructureError::InsertionError(_) => -200,
            StructureError::NameCollision { .. } => -201,
            StructureError::InvalidName(_) => -202,
            StructureError::MissingParent(_) => -203,
            StructureError::NotAContainer(_) => -204,
            StructureError::CycleDetected { .. } => -205,
            StructureError::NotAChild { .. } => -206,
            StructureError::MissingObject(_) => -300,
            StructureError::PathNotFound(_) => -301,
            StructureError::PathExists(_) => -302,
            StructureError::TypeMismatch { .. } => -303,
            StructureError::TupleCountMismatch { .. } => -400,
            StructureError::ShapeMismatch { .. } => -401,
            StructureError::ComponentShapeMismatch { .. } => -402,
            StructureError::IndexOutOfBounds { .. } => -403,
            StructureError::NotMaterialized => -404,
            StructureError::DataTypeMismatch { .. } => -405,
            StructureError::MixedTypeComparison { .. } => -406,
            StructureError::InvalidSpacing(_) => -410,
            StructureError::InvalidBounds { .. } => -411,
            StructureError::InvalidDimensions(_) => -412,
            StructureError::Persistence(_) => -500,
            StructureError::Io(_) => -501,
        }
    }
}

impl From<std::io::Error> for StructureError {
    fn from(e: std::io::Error) -> Self {
        StructureError::Io(e.to_string())
    }
}

impl From<bincode::Error> for StructureError {
    fn from(e: bincode::Error) -> Self {
        StructureError::Persistence(e.to_string())
    }
}
