//! HDF5-layout persistence of data objects.
//!
//! Every object kind implements [`Hdf5Object`]: containers (groups,
//! attribute matrices, geometries) become groups, arrays become datasets.
//! Each written object carries `ObjectType`, `ObjectId` and `Importable`
//! attributes. An object with several parents is written in full the first
//! time it is reached and as a [`H5Node::Link`] everywhere else; reading in
//! the same order restores the links and the original ids.
//!
//! A preflight read restores names, types and shapes but leaves every
//! array unmaterialised; streamed or opened preflight reads never touch the
//! payload section.

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::any_array::AnyDataArray;
use crate::data::data_type::DataType;
use crate::data::dynamic_list::DynamicListArray;
use crate::data::element::ArrayElement;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::node_geometry::new_node_geometry;
use crate::geometry::topology::{DerivedArray, DerivedEntry};
use crate::geometry::{
    Geometry, GeometryType, ImageGeom, LengthUnit, MeshIndexType, RectGridGeom,
};
use crate::io::{
    AttributeValue, Attributes, H5Dataset, H5File, H5Group, H5Node, StructureReader,
    StructureWriter, attr_f64_list, attr_text, attr_u64, attr_u64_list,
};
use crate::structure::data_object::{AttributeMatrix, DataGroup, DataObject, ObjectData, StringArray};
use crate::structure::data_path::validate_name;
use crate::structure::data_structure::DataStructure;
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

pub const FILE_VERSION: &str = "7.0";

const FILE_VERSION_KEY: &str = "FileVersion";
const NEXT_OBJECT_ID: &str = "NextObjectId";
const OBJECT_TYPE: &str = "ObjectType";
const OBJECT_ID: &str = "ObjectId";
const IMPORTABLE: &str = "Importable";
const DATA_TYPE: &str = "DataType";
const TUPLE_DIMS: &str = "TupleDimensions";
const COMPONENT_DIMS: &str = "ComponentDimensions";
const OFFSETS: &str = "Offsets";
const UNITS: &str = "Units";
const DIMENSIONS: &str = "Dimensions";
const SPACING: &str = "Spacing";
const ORIGIN: &str = "Origin";
const VERTEX_LIST_ID: &str = "VertexListId";
const CELL_LIST_ID: &str = "CellListId";
const VERTEX_DATA_ID: &str = "VertexDataId";
const CELL_DATA_ID: &str = "CellDataId";
const BOUNDS_IDS: [&str; 3] = ["XBoundsId", "YBoundsId", "ZBoundsId"];
const DERIVED_PREFIX: &str = "Derived:";

/// Options of a read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hdf5ReadOptions {
    /// Read structure, types and shapes only; arrays stay unmaterialised.
    pub preflight: bool,
}

impl Hdf5ReadOptions {
    pub fn preflight() -> Self {
        Self { preflight: true }
    }
}

/// Options of a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hdf5WriteOptions {
    /// Value of the `Importable` attribute; non-importable objects are
    /// skipped by readers.
    pub importable: bool,
}

impl Default for Hdf5WriteOptions {
    fn default() -> Self {
        Self { importable: true }
    }
}

/// Per-kind persistence.
pub trait Hdf5Object: Sized {
    /// This object's own node. Containers return an empty group; the
    /// structure writer adds their children.
    fn write_hdf5(&self, options: &Hdf5WriteOptions) -> Result<H5Node, StructureError>;

    fn read_hdf5(node: &H5Node, options: &Hdf5ReadOptions) -> Result<Self, StructureError>;
}

fn as_group(node: &H5Node) -> Result<&H5Group, StructureError> {
    match node {
        H5Node::Group(g) => Ok(g),
        _ => Err(StructureError::Persistence("expected a group".into())),
    }
}

fn as_dataset(node: &H5Node) -> Result<&H5Dataset, StructureError> {
    match node {
        H5Node::Dataset(d) => Ok(d),
        _ => Err(StructureError::Persistence("expected a dataset".into())),
    }
}

fn to_u64s(values: &[usize]) -> Vec<u64> {
    values.iter().map(|&v| v as u64).collect()
}

fn to_usizes(values: &[u64]) -> Result<Vec<usize>, StructureError> {
    values
        .iter()
        .map(|&v| {
            usize::try_from(v)
                .map_err(|_| StructureError::Persistence(format!("extent {v} does not fit usize")))
        })
        .collect()
}

fn dims3<T: Copy + Default>(values: &[T], key: &str) -> Result<[T; 3], StructureError> {
    <[T; 3]>::try_from(values)
        .map_err(|_| StructureError::Persistence(format!("`{key}` must have three values")))
}

fn put_ref(attrs: &mut Attributes, key: &str, id: Option<IdType>) {
    if let Some(id) = id {
        attrs.insert(key.to_string(), AttributeValue::UInt(id.get()));
    }
}

fn get_ref(attrs: &Attributes, key: &str) -> Option<IdType> {
    match attrs.get(key) {
        Some(AttributeValue::UInt(v)) => IdType::try_new(*v),
        _ => None,
    }
}

impl Hdf5Object for DataGroup {
    fn write_hdf5(&self, _options: &Hdf5WriteOptions) -> Result<H5Node, StructureError> {
        Ok(H5Node::Group(H5Group::new()))
    }

    fn read_hdf5(node: &H5Node, _options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        as_group(node)?;
        Ok(DataGroup)
    }
}

impl Hdf5Object for AttributeMatrix {
    fn write_hdf5(&self, _options: &Hdf5WriteOptions) -> Result<H5Node, StructureError> {
        let mut g = H5Group::new();
        g.attributes.insert(
            TUPLE_DIMS.into(),
            AttributeValue::UIntList(to_u64s(self.tuple_shape())),
        );
        Ok(H5Node::Group(g))
    }

    fn read_hdf5(node: &H5Node, _options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        let g = as_group(node)?;
        Ok(AttributeMatrix::new(to_usizes(attr_u64_list(&g.attributes, TUPLE_DIMS)?)?))
    }
}

impl Hdf5Object for AnyDataArray {
    fn write_hdf5(&self, _options: &Hdf5WriteOptions) -> Result<H5Node, StructureError> {
        let mut d = H5Dataset {
            shape: vec![self.number_of_tuples(), self.number_of_components()],
            payload: self.to_bytes()?,
            ..H5Dataset::default()
        };
        d.attributes.insert(
            DATA_TYPE.into(),
            AttributeValue::Text(self.data_type().as_str().into()),
        );
        d.attributes.insert(
            TUPLE_DIMS.into(),
            AttributeValue::UIntList(to_u64s(self.tuple_shape())),
        );
        d.attributes.insert(
            COMPONENT_DIMS.into(),
            AttributeValue::UIntList(to_u64s(self.component_shape())),
        );
        Ok(H5Node::Dataset(d))
    }

    fn read_hdf5(node: &H5Node, options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        let d = as_dataset(node)?;
        let tag = attr_text(&d.attributes, DATA_TYPE)?;
        let data_type = DataType::parse(tag)
            .ok_or_else(|| StructureError::Persistence(format!("unknown data type `{tag}`")))?;
        let tuple_shape = to_usizes(attr_u64_list(&d.attributes, TUPLE_DIMS)?)?;
        let component_shape = to_usizes(attr_u64_list(&d.attributes, COMPONENT_DIMS)?)?;
        if options.preflight {
            return Ok(AnyDataArray::empty(data_type, tuple_shape, component_shape));
        }
        AnyDataArray::from_bytes(data_type, tuple_shape, component_shape, &d.payload)
    }
}

impl Hdf5Object for DynamicListArray<MeshIndexType> {
    fn write_hdf5(&self, _options: &Hdf5WriteOptions) -> Result<H5Node, StructureError> {
        let (offsets, values) = self.to_parts();
        let mut payload = Vec::with_capacity(values.len() * 8);
        MeshIndexType::extend_bytes(&values, &mut payload);
        let mut d = H5Dataset {
            shape: vec![self.number_of_lists()],
            payload,
            ..H5Dataset::default()
        };
        d.attributes
            .insert(OFFSETS.into(), AttributeValue::UIntList(to_u64s(&offsets)));
        Ok(H5Node::Dataset(d))
    }

    fn read_hdf5(node: &H5Node, options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        let d = as_dataset(node)?;
        let lists = d.shape.first().copied().unwrap_or(0);
        if options.preflight {
            return DynamicListArray::from_parts(vec![0; lists + 1], Vec::new());
        }
        let offsets = to_usizes(attr_u64_list(&d.attributes, OFFSETS)?)?;
        if offsets.len() != lists + 1 {
            return Err(StructureError::ShapeMismatch {
                expected: lists + 1,
                found: offsets.len(),
            });
        }
        DynamicListArray::from_parts(offsets, MeshIndexType::from_bytes(&d.payload)?)
    }
}

impl Hdf5Object for StringArray {
    fn write_hdf5(&self, _options: &Hdf5WriteOptions) -> Result<H5Node, StructureError> {
        Ok(H5Node::Dataset(H5Dataset {
            shape: vec![self.len()],
            payload: bincode::serialize(self.values())?,
            ..H5Dataset::default()
        }))
    }

    fn read_hdf5(node: &H5Node, options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        let d = as_dataset(node)?;
        let n = d.shape.first().copied().unwrap_or(0);
        if options.preflight {
            return Ok(StringArray::new(vec![String::new(); n]));
        }
        let values: Vec<String> = bincode::deserialize(&d.payload)?;
        if values.len() != n {
            return Err(StructureError::ShapeMismatch {
                expected: n,
                found: values.len(),
            });
        }
        Ok(StringArray::new(values))
    }
}

impl Hdf5Object for Geometry {
    fn write_hdf5(&self, _options: &Hdf5WriteOptions) -> Result<H5Node, StructureError> {
        let mut g = H5Group::new();
        let a = &mut g.attributes;
        a.insert(OBJECT_TYPE.into(), AttributeValue::Text(self.type_name().into()));
        a.insert(UNITS.into(), AttributeValue::Text(self.units().as_str().into()));
        put_ref(a, CELL_DATA_ID, self.cell_data_id());
        match self {
            Geometry::Image(img) => {
                a.insert(DIMENSIONS.into(), AttributeValue::UIntList(to_u64s(&img.dimensions())));
                a.insert(
                    SPACING.into(),
                    AttributeValue::FloatList(img.spacing().map(f64::from).to_vec()),
                );
                a.insert(
                    ORIGIN.into(),
                    AttributeValue::FloatList(img.origin().map(f64::from).to_vec()),
                );
            }
            Geometry::RectGrid(grid) => {
                a.insert(DIMENSIONS.into(), AttributeValue::UIntList(to_u64s(&grid.dimensions())));
                for (key, id) in BOUNDS_IDS.iter().zip(grid.bounds_ids()) {
                    put_ref(a, key, id);
                }
            }
            other => {
                if let Some(n) = other.as_node() {
                    put_ref(a, VERTEX_LIST_ID, n.vertices_id());
                    put_ref(a, CELL_LIST_ID, n.cells_id());
                    put_ref(a, VERTEX_DATA_ID, n.vertex_data_id());
                }
            }
        }
        for (kind, entry) in self.derived() {
            put_ref(a, &format!("{DERIVED_PREFIX}{}", kind.as_str()), Some(entry.id));
        }
        Ok(H5Node::Group(g))
    }

    fn read_hdf5(node: &H5Node, _options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        let a = &as_group(node)?.attributes;
        let tag = attr_text(a, OBJECT_TYPE)?;
        let geometry_type = GeometryType::parse(tag)
            .ok_or_else(|| StructureError::Persistence(format!("unknown geometry `{tag}`")))?;
        let units = match a.get(UNITS) {
            Some(AttributeValue::Text(u)) => LengthUnit::parse(u)
                .ok_or_else(|| StructureError::Persistence(format!("unknown unit `{u}`")))?,
            _ => LengthUnit::default(),
        };

        let mut geometry = match geometry_type {
            GeometryType::Image => {
                let dims = dims3(&to_usizes(attr_u64_list(a, DIMENSIONS)?)?, DIMENSIONS)?;
                let spacing = dims3(attr_f64_list(a, SPACING)?, SPACING)?.map(|v| v as f32);
                let origin = dims3(attr_f64_list(a, ORIGIN)?, ORIGIN)?.map(|v| v as f32);
                Geometry::Image(ImageGeom::new(dims, spacing, origin)?)
            }
            GeometryType::RectGrid => {
                let dims = dims3(&to_usizes(attr_u64_list(a, DIMENSIONS)?)?, DIMENSIONS)?;
                let bounds = BOUNDS_IDS.map(|key| get_ref(a, key));
                Geometry::RectGrid(RectGridGeom::from_parts(dims, bounds, None))
            }
            node_type => {
                let mut g = new_node_geometry(node_type)?;
                if let Some(n) = g.as_node_mut() {
                    n.set_vertices_id(get_ref(a, VERTEX_LIST_ID));
                    n.set_cells_id(get_ref(a, CELL_LIST_ID));
                    n.set_vertex_data_id(get_ref(a, VERTEX_DATA_ID));
                }
                g
            }
        };
        geometry.set_units(units);
        geometry.set_cell_data_id(get_ref(a, CELL_DATA_ID));
        for kind in DerivedArray::ALL {
            if let Some(id) = get_ref(a, &format!("{DERIVED_PREFIX}{}", kind.as_str())) {
                geometry.derived_mut().insert(
                    kind,
                    DerivedEntry {
                        id,
                        sources: Vec::new(),
                    },
                );
            }
        }
        Ok(geometry)
    }
}

impl Hdf5Object for ObjectData {
    fn write_hdf5(&self, options: &Hdf5WriteOptions) -> Result<H5Node, StructureError> {
        let mut node = match self {
            ObjectData::Group(g) => g.write_hdf5(options)?,
            ObjectData::AttributeMatrix(am) => am.write_hdf5(options)?,
            ObjectData::Array(a) => a.write_hdf5(options)?,
            ObjectData::DynamicList(d) => d.write_hdf5(options)?,
            ObjectData::StringArray(s) => s.write_hdf5(options)?,
            ObjectData::Geometry(g) => g.write_hdf5(options)?,
        };
        if let Some(attrs) = node.attributes_mut() {
            attrs.insert(OBJECT_TYPE.into(), AttributeValue::Text(self.type_name().into()));
        }
        Ok(node)
    }

    fn read_hdf5(node: &H5Node, options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        let attrs = node
            .attributes()
            .ok_or_else(|| StructureError::Persistence("a link is not an object".into()))?;
        Ok(match attr_text(attrs, OBJECT_TYPE)? {
            "DataGroup" => DataGroup::read_hdf5(node, options)?.into(),
            "AttributeMatrix" => AttributeMatrix::read_hdf5(node, options)?.into(),
            "DataArray" => AnyDataArray::read_hdf5(node, options)?.into(),
            "DynamicListArray" => DynamicListArray::read_hdf5(node, options)?.into(),
            "StringArray" => StringArray::read_hdf5(node, options)?.into(),
            _ => Geometry::read_hdf5(node, options)?.into(),
        })
    }
}

/// Builds the file image of `ds`.
///
/// Derived-array entries are written only while current, so a reader never
/// adopts a stale cache.
pub fn write_data_structure(
    ds: &DataStructure,
    options: &Hdf5WriteOptions,
) -> Result<H5File, StructureError> {
    let mut file = H5File::default();
    file.root.attributes.insert(
        FILE_VERSION_KEY.into(),
        AttributeValue::Text(FILE_VERSION.into()),
    );
    file.root.attributes.insert(
        NEXT_OBJECT_ID.into(),
        AttributeValue::UInt(ds.peek_next_id().get()),
    );
    let mut written = BTreeSet::new();
    let mut links = 0usize;
    for &id in ds.top_level_ids() {
        write_object(ds, id, &mut file.root, &mut written, &mut links, options)?;
    }
    log::info!(
        "wrote {} objects and {links} links",
        written.len()
    );
    Ok(file)
}

fn write_object(
    ds: &DataStructure,
    id: IdType,
    group: &mut H5Group,
    written: &mut BTreeSet<IdType>,
    links: &mut usize,
    options: &Hdf5WriteOptions,
) -> Result<(), StructureError> {
    let obj = ds.get_data(id).ok_or(StructureError::MissingObject(id))?;
    if !written.insert(id) {
        *links += 1;
        return group.insert(obj.name(), H5Node::Link(id.get()));
    }
    let mut node = match obj.data() {
        ObjectData::Geometry(g) => {
            let mut g = g.clone();
            g.derived_mut().retain(|kind, _| ds.is_derived_current(id, *kind));
            ObjectData::Geometry(g).write_hdf5(options)?
        }
        data => data.write_hdf5(options)?,
    };
    if let Some(attrs) = node.attributes_mut() {
        attrs.insert(OBJECT_ID.into(), AttributeValue::UInt(id.get()));
        attrs.insert(
            IMPORTABLE.into(),
            AttributeValue::UInt(u64::from(options.importable)),
        );
    }
    if let H5Node::Group(g) = &mut node {
        for &child in obj.children() {
            write_object(ds, child, g, written, links, options)?;
        }
    }
    group.insert(obj.name(), node)
}

struct ReadContext<'a> {
    options: &'a Hdf5ReadOptions,
    skipped: BTreeSet<u64>,
}

/// Rebuilds a structure from a file image, keeping the persisted ids.
pub fn read_data_structure(
    file: &H5File,
    options: &Hdf5ReadOptions,
) -> Result<DataStructure, StructureError> {
    let version = attr_text(&file.root.attributes, FILE_VERSION_KEY)?;
    if version != FILE_VERSION {
        log::warn!("reading file version {version}, expected {FILE_VERSION}");
    }
    let mut ds = DataStructure::new();
    let mut ctx = ReadContext {
        options,
        skipped: BTreeSet::new(),
    };
    for (name, node) in file.root.members() {
        read_object(&mut ds, None, name, node, &mut ctx)?;
    }
    if let Ok(next) = attr_u64(&file.root.attributes, NEXT_OBJECT_ID) {
        ds.reserve_ids(next.saturating_sub(1));
    }
    restore_geometry_links(&mut ds);
    ds.validate_invariants()?;
    log::info!(
        "read {} objects{} ({} skipped)",
        ds.len(),
        if options.preflight { " in preflight" } else { "" },
        ctx.skipped.len()
    );
    Ok(ds)
}

fn read_object(
    ds: &mut DataStructure,
    parent: Option<IdType>,
    name: &str,
    node: &H5Node,
    ctx: &mut ReadContext<'_>,
) -> Result<(), StructureError> {
    let attrs = match node {
        H5Node::Link(raw) => {
            if ctx.skipped.contains(raw) {
                return Ok(());
            }
            let id = IdType::try_new(*raw)
                .filter(|id| ds.contains(*id))
                .ok_or_else(|| StructureError::Persistence(format!("dangling link to {raw}")))?;
            return ds.attach(parent, id);
        }
        H5Node::Group(g) => &g.attributes,
        H5Node::Dataset(d) => &d.attributes,
    };
    let raw = attr_u64(attrs, OBJECT_ID)?;
    if matches!(attrs.get(IMPORTABLE), Some(AttributeValue::UInt(0))) {
        log::debug!("skipping non-importable `{name}`");
        mark_skipped(node, raw, &mut ctx.skipped);
        return Ok(());
    }
    let id = IdType::try_new(raw)
        .ok_or_else(|| StructureError::Persistence(format!("invalid object id for `{name}`")))?;
    if ds.contains(id) {
        return Err(StructureError::Persistence(format!("duplicate object id {id}")));
    }
    validate_name(name)?;
    let data = ObjectData::read_hdf5(node, ctx.options)?;
    ds.insert_raw(
        DataObject {
            id,
            name: name.to_string(),
            parents: BTreeSet::new(),
            children: Vec::new(),
            data,
        },
        parent.is_none(),
    );
    if parent.is_some() {
        ds.attach(parent, id)?;
    }
    if let H5Node::Group(g) = node {
        for (child_name, child) in g.members() {
            read_object(ds, Some(id), child_name, child, ctx)?;
        }
    }
    Ok(())
}

/// Records `raw` and every object written beneath it.
fn mark_skipped(node: &H5Node, raw: u64, skipped: &mut BTreeSet<u64>) {
    skipped.insert(raw);
    if let H5Node::Group(g) = node {
        for (_, child) in g.members() {
            if let Some(id) = child
                .attributes()
                .and_then(|a| attr_u64(a, OBJECT_ID).ok())
            {
                mark_skipped(child, id, skipped);
            }
        }
    }
}

/// Drops references to objects that were not read and re-stamps derived
/// entries against the restored source arrays.
fn restore_geometry_links(ds: &mut DataStructure) {
    let geometries: Vec<IdType> = ds
        .iter()
        .filter(|o| matches!(o.data(), ObjectData::Geometry(_)))
        .map(DataObject::id)
        .collect();
    for geom in geometries {
        let missing: Vec<IdType> = ds
            .get_data_as::<Geometry>(geom)
            .map(|g| g.referenced_ids())
            .unwrap_or_default()
            .into_iter()
            .filter(|id| !ds.contains(*id))
            .collect();
        let sources = ds.derived_sources(geom).ok();
        if let Some(g) = ds.get_data_as_mut::<Geometry>(geom) {
            for id in missing {
                g.clear_reference(id);
            }
            match sources {
                Some(sources) => {
                    for entry in g.derived_mut().values_mut() {
                        entry.sources = sources.clone();
                    }
                }
                None => g.derived_mut().clear(),
            }
        }
    }
}

impl DataStructure {
    /// File image of this structure; see [`write_data_structure`].
    pub fn write_hdf5(&self, options: &Hdf5WriteOptions) -> Result<H5File, StructureError> {
        write_data_structure(self, options)
    }

    /// Structure stored in `file`; see [`read_data_structure`].
    pub fn read_hdf5(file: &H5File, options: &Hdf5ReadOptions) -> Result<Self, StructureError> {
        read_data_structure(file, options)
    }

    pub fn save_hdf5<P: AsRef<Path>>(
        &self,
        path: P,
        options: &Hdf5WriteOptions,
    ) -> Result<(), StructureError> {
        self.write_hdf5(options)?.save(path)
    }

    pub fn open_hdf5<P: AsRef<Path>>(
        path: P,
        options: &Hdf5ReadOptions,
    ) -> Result<Self, StructureError> {
        let file = if options.preflight {
            H5File::open_layout(path)?
        } else {
            H5File::open(path)?
        };
        Self::read_hdf5(&file, options)
    }
}

/// [`StructureReader`] over the bincode file image.
#[derive(Debug, Default, Clone)]
pub struct Hdf5Reader {
    pub options: Hdf5ReadOptions,
}

impl StructureReader for Hdf5Reader {
    fn read<R: Read>(&self, reader: R) -> Result<DataStructure, StructureError> {
        let file = if self.options.preflight {
            H5File::read_layout_from(reader)?
        } else {
            H5File::read_from(reader)?
        };
        read_data_structure(&file, &self.options)
    }
}

/// [`StructureWriter`] producing the bincode file image.
#[derive(Debug, Default, Clone)]
pub struct Hdf5Writer {
    pub options: Hdf5WriteOptions,
}

impl StructureWriter for Hdf5Writer {
    fn write<W: Write>(&self, writer: W, ds: &DataStructure) -> Result<(), StructureError> {
        write_data_structure(ds, &self.options)?.write_to(writer)
    }
}
