//! The identity and ownership graph.
//!
//! [`DataStructure`] owns every [`DataObject`] in an arena keyed by
//! [`IdType`]. Objects are addressed either by id or by [`DataPath`].

pub mod data_object;
pub mod data_path;
pub mod data_structure;
pub mod deep_copy;
pub mod id;

pub use data_object::{
    AttributeMatrix, DataGroup, DataObject, FromDataObject, ObjectData, StringArray,
};
pub use data_path::DataPath;
pub use data_structure::DataStructure;
pub use id::IdType;
