//! Data objects: the nodes owned by a [`DataStructure`](super::DataStructure).
//!
//! A [`DataObject`] couples graph bookkeeping (id, name, parent and child
//! ids) with an [`ObjectData`] payload. Only containers (groups, attribute
//! matrices and geometries) may hold children.

use std::collections::BTreeSet;

use crate::data::any_array::AnyDataArray;
use crate::data::data_array::DataArray;
use crate::data::dynamic_list::DynamicListArray;
use crate::data::element::ArrayElement;
use crate::geometry::{
    EdgeGeom, Geometry, HexahedralGeom, ImageGeom, MeshIndexType, QuadGeom, RectGridGeom,
    TetrahedralGeom, TriangleGeom, VertexGeom,
};
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

/// Plain named container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataGroup;

/// Container whose members all share one tuple shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMatrix {
    tuple_shape: Vec<usize>,
}

impl AttributeMatrix {
    pub fn new(tuple_shape: Vec<usize>) -> Self {
        Self { tuple_shape }
    }

    pub fn tuple_shape(&self) -> &[usize] {
        &self.tuple_shape
    }

    pub fn number_of_tuples(&self) -> usize {
        self.tuple_shape.iter().product()
    }

    pub(crate) fn set_tuple_shape(&mut self, tuple_shape: Vec<usize>) {
        self.tuple_shape = tuple_shape;
    }
}

/// One string per tuple.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringArray {
    values: Vec<String>,
}

impl StringArray {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Vec<String> {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Payload of a data object.
#[derive(Clone, Debug)]
pub enum ObjectData {
    Group(DataGroup),
    AttributeMatrix(AttributeMatrix),
    Array(AnyDataArray),
    DynamicList(DynamicListArray<MeshIndexType>),
    StringArray(StringArray),
    Geometry(Geometry),
}

impl ObjectData {
    /// Stable type name, also used as the persisted object-type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectData::Group(_) => "DataGroup",
            ObjectData::AttributeMatrix(_) => "AttributeMatrix",
            ObjectData::Array(_) => "DataArray",
            ObjectData::DynamicList(_) => "DynamicListArray",
            ObjectData::StringArray(_) => "StringArray",
            ObjectData::Geometry(g) => g.type_name(),
        }
    }

    /// Groups, attribute matrices and geometries may own children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ObjectData::Group(_) | ObjectData::AttributeMatrix(_) | ObjectData::Geometry(_)
        )
    }

    /// Tuple count for array-like payloads.
    pub fn tuple_count(&self) -> Option<usize> {
        match self {
            ObjectData::Array(a) => Some(a.number_of_tuples()),
            ObjectData::DynamicList(d) => Some(d.number_of_lists()),
            ObjectData::StringArray(s) => Some(s.len()),
            _ => None,
        }
    }
}

impl From<DataGroup> for ObjectData {
    fn from(g: DataGroup) -> Self {
        ObjectData::Group(g)
    }
}

impl From<AttributeMatrix> for ObjectData {
    fn from(m: AttributeMatrix) -> Self {
        ObjectData::AttributeMatrix(m)
    }
}

impl From<AnyDataArray> for ObjectData {
    fn from(a: AnyDataArray) -> Self {
        ObjectData::Array(a)
    }
}

impl<T: ArrayElement> From<DataArray<T>> for ObjectData {
    fn from(a: DataArray<T>) -> Self {
        ObjectData::Array(T::wrap(a))
    }
}

impl From<DynamicListArray<MeshIndexType>> for ObjectData {
    fn from(d: DynamicListArray<MeshIndexType>) -> Self {
        ObjectData::DynamicList(d)
    }
}

impl From<StringArray> for ObjectData {
    fn from(s: StringArray) -> Self {
        ObjectData::StringArray(s)
    }
}

impl From<Geometry> for ObjectData {
    fn from(g: Geometry) -> Self {
        ObjectData::Geometry(g)
    }
}

/// A node of the data graph.
#[derive(Clone, Debug)]
pub struct DataObject {
    pub(crate) id: IdType,
    pub(crate) name: String,
    pub(crate) parents: BTreeSet<IdType>,
    pub(crate) children: Vec<IdType>,
    pub(crate) data: ObjectData,
}

impl DataObject {
    pub fn id(&self) -> IdType {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent ids; empty for top-level objects.
    pub fn parents(&self) -> &BTreeSet<IdType> {
        &self.parents
    }

    /// Child ids in insertion order.
    pub fn children(&self) -> &[IdType] {
        &self.children
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut ObjectData {
        &mut self.data
    }

    pub fn type_name(&self) -> &'static str {
        self.data.type_name()
    }

    /// Typed view of the payload.
    pub fn as_type<T: FromDataObject + ?Sized>(&self) -> Option<&T> {
        T::from_object(&self.data)
    }

    /// Typed mutable view of the payload.
    pub fn as_type_mut<T: FromDataObject + ?Sized>(&mut self) -> Option<&mut T> {
        T::from_object_mut(&mut self.data)
    }

    /// Typed view, reporting a [`StructureError::TypeMismatch`] on failure.
    pub fn try_as<T: FromDataObject + ?Sized>(&self) -> Result<&T, StructureError> {
        let found = self.type_name();
        T::from_object(&self.data).ok_or(StructureError::TypeMismatch {
            id: self.id,
            expected: T::TYPE_NAME,
            found,
        })
    }
}

/// Types that can be borrowed out of an [`ObjectData`] payload.
pub trait FromDataObject {
    /// Human-readable name used in type-mismatch errors.
    const TYPE_NAME: &'static str;

    fn from_object(data: &ObjectData) -> Option<&Self>;
    fn from_object_mut(data: &mut ObjectData) -> Option<&mut Self>;
}

macro_rules! impl_from_object {
    ($t:ty, $name:expr, $pat:ident) => {
        impl FromDataObject for $t {
            const TYPE_NAME: &'static str = $name;

            fn from_object(data: &ObjectData) -> Option<&Self> {
                if let ObjectData::$pat(v) = data { Some(v) } else { None }
            }

            fn from_object_mut(data: &mut ObjectData) -> Option<&mut Self> {
                if let ObjectData::$pat(v) = data { Some(v) } else { None }
            }
        }
    };
}

impl_from_object!(DataGroup, "DataGroup", Group);
impl_from_object!(AttributeMatrix, "AttributeMatrix", AttributeMatrix);
impl_from_object!(AnyDataArray, "DataArray", Array);
impl_from_object!(DynamicListArray<MeshIndexType>, "DynamicListArray", DynamicList);
impl_from_object!(StringArray, "StringArray", StringArray);
impl_from_object!(Geometry, "Geometry", Geometry);

impl<T: ArrayElement> FromDataObject for DataArray<T> {
    const TYPE_NAME: &'static str = "DataArray";

    fn from_object(data: &ObjectData) -> Option<&Self> {
        match data {
            ObjectData::Array(a) => T::unwrap(a),
            _ => None,
        }
    }

    fn from_object_mut(data: &mut ObjectData) -> Option<&mut Self> {
        match data {
            ObjectData::Array(a) => T::unwrap_mut(a),
            _ => None,
        }
    }
}

macro_rules! impl_from_geometry {
    ($t:ty, $name:expr, $variant:ident) => {
        impl FromDataObject for $t {
            const TYPE_NAME: &'static str = $name;

            fn from_object(data: &ObjectData) -> Option<&Self> {
                match data {
                    ObjectData::Geometry(Geometry::$variant(g)) => Some(g),
                    _ => None,
                }
            }

            fn from_object_mut(data: &mut ObjectData) -> Option<&mut Self> {
                match data {
                    ObjectData::Geometry(Geometry::$variant(g)) => Some(g),
                    _ => None,
                }
            }
        }
    };
}

impl_from_geometry!(ImageGeom, "ImageGeom", Image);
impl_from_geometry!(RectGridGeom, "RectGridGeom", RectGrid);
impl_from_geometry!(VertexGeom, "VertexGeom", Vertex);
impl_from_geometry!(EdgeGeom, "EdgeGeom", Edge);
impl_from_geometry!(TriangleGeom, "TriangleGeom", Triangle);
impl_from_geometry!(QuadGeom, "QuadGeom", Quad);
impl_from_geometry!(TetrahedralGeom, "TetrahedralGeom", Tetrahedral);
impl_from_geometry!(HexahedralGeom, "HexahedralGeom", Hexahedral);
