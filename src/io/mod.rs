//! Persistence of a `DataStructure`.
//!
//! Files follow the HDF5 layout: a tree of groups and datasets, each
//! carrying named attributes. The tree is modelled in process by
//! [`H5File`]; [`hdf5`] maps every data object kind onto it.
//!
//! On disk a file is a signature, a length-prefixed `bincode` metadata
//! section (the tree without payloads plus a table of payload extents) and
//! then the raw payloads in tree order. A layout read stops after the
//! metadata section.

pub mod hdf5;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::structure::data_structure::DataStructure;
use crate::structure_error::StructureError;

pub use hdf5::{Hdf5ReadOptions, Hdf5Reader, Hdf5WriteOptions, Hdf5Writer};

/// Value of a group or dataset attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    UInt(u64),
    Int(i64),
    Float(f64),
    Text(String),
    UIntList(Vec<u64>),
    FloatList(Vec<f64>),
}

/// Named attributes, sorted by name as HDF5 lists them.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Bulk payload plus metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct H5Dataset {
    pub attributes: Attributes,
    /// Logical extent of the payload.
    pub shape: Vec<usize>,
    /// Native-endian bytes; stored in the data section, empty after a
    /// layout read.
    #[serde(skip)]
    pub payload: Vec<u8>,
}

/// Member of a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum H5Node {
    Group(H5Group),
    Dataset(H5Dataset),
    /// Hard link to an object written elsewhere, by persisted object id.
    Link(u64),
}

impl H5Node {
    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            H5Node::Group(g) => Some(&g.attributes),
            H5Node::Dataset(d) => Some(&d.attributes),
            H5Node::Link(_) => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut Attributes> {
        match self {
            H5Node::Group(g) => Some(&mut g.attributes),
            H5Node::Dataset(d) => Some(&mut d.attributes),
            H5Node::Link(_) => None,
        }
    }
}

/// Group with attributes and members in creation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct H5Group {
    pub attributes: Attributes,
    members: Vec<(String, H5Node)>,
}

impl H5Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member; names are unique within a group.
    pub fn insert(&mut self, name: &str, node: H5Node) -> Result<(), StructureError> {
        if self.member(name).is_some() {
            return Err(StructureError::Persistence(format!(
                "duplicate member `{name}`"
            )));
        }
        self.members.push((name.to_string(), node));
        Ok(())
    }

    pub fn member(&self, name: &str) -> Option<&H5Node> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn member_mut(&mut self, name: &str) -> Option<&mut H5Node> {
        self.members
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    pub fn group(&self, name: &str) -> Option<&H5Group> {
        match self.member(name)? {
            H5Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn dataset(&self, name: &str) -> Option<&H5Dataset> {
        match self.member(name)? {
            H5Node::Dataset(d) => Some(d),
            _ => None,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &H5Node)> {
        self.members.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A whole file: the root group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct H5File {
    pub root: H5Group,
}

/// Leading bytes of every file.
pub const FILE_SIGNATURE: [u8; 8] = *b"\x89D3D\r\n\x1a\n";

/// Position of one payload inside the data section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadExtent {
    pub offset: u64,
    pub len: u64,
}

#[derive(Serialize)]
struct MetadataRef<'a> {
    root: &'a H5Group,
    extents: Vec<PayloadExtent>,
}

#[derive(Deserialize)]
struct Metadata {
    root: H5Group,
    extents: Vec<PayloadExtent>,
}

/// Datasets in the order their payloads are stored.
fn datasets<'a>(group: &'a H5Group, out: &mut Vec<&'a H5Dataset>) {
    for (_, node) in group.members() {
        match node {
            H5Node::Group(g) => datasets(g, out),
            H5Node::Dataset(d) => out.push(d),
            H5Node::Link(_) => {}
        }
    }
}

fn datasets_mut<'a>(group: &'a mut H5Group, out: &mut Vec<&'a mut H5Dataset>) {
    for (_, node) in group.members.iter_mut() {
        match node {
            H5Node::Group(g) => datasets_mut(g, out),
            H5Node::Dataset(d) => out.push(d),
            H5Node::Link(_) => {}
        }
    }
}

impl H5File {
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), StructureError> {
        let mut stored = Vec::new();
        datasets(&self.root, &mut stored);
        let mut offset = 0u64;
        let extents = stored
            .iter()
            .map(|d| {
                let len = d.payload.len() as u64;
                let extent = PayloadExtent { offset, len };
                offset += len;
                extent
            })
            .collect();
        let metadata = bincode::serialize(&MetadataRef {
            root: &self.root,
            extents,
        })?;
        writer.write_all(&FILE_SIGNATURE)?;
        writer.write_all(&(metadata.len() as u64).to_le_bytes())?;
        writer.write_all(&metadata)?;
        for d in stored {
            writer.write_all(&d.payload)?;
        }
        Ok(())
    }

    /// Full read: metadata and every payload.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, StructureError> {
        Self::read_with(reader, true)
    }

    /// Metadata only; no payload byte is read and every dataset's payload
    /// is left empty.
    pub fn read_layout_from<R: Read>(reader: R) -> Result<Self, StructureError> {
        Self::read_with(reader, false)
    }

    fn read_with<R: Read>(mut reader: R, payloads: bool) -> Result<Self, StructureError> {
        let mut signature = [0u8; 8];
        reader.read_exact(&mut signature)?;
        if signature != FILE_SIGNATURE {
            return Err(StructureError::Persistence("not a structure file".into()));
        }
        let mut len = [0u8; 8];
        reader.read_exact(&mut len)?;
        let len = u64::from_le_bytes(len);
        let mut metadata = Vec::new();
        (&mut reader).take(len).read_to_end(&mut metadata)?;
        if metadata.len() as u64 != len {
            return Err(StructureError::Persistence(format!(
                "metadata section truncated: {} of {len} bytes",
                metadata.len()
            )));
        }
        let Metadata { root, extents } = bincode::deserialize(&metadata)?;
        let mut file = H5File { root };
        if !payloads {
            return Ok(file);
        }

        let mut stored = Vec::new();
        datasets_mut(&mut file.root, &mut stored);
        if stored.len() != extents.len() {
            return Err(StructureError::Persistence(format!(
                "{} datasets but {} payload extents",
                stored.len(),
                extents.len()
            )));
        }
        let mut cursor = 0u64;
        for (d, extent) in stored.into_iter().zip(extents) {
            if extent.offset != cursor {
                return Err(StructureError::Persistence(format!(
                    "payload at offset {} out of order, expected {cursor}",
                    extent.offset
                )));
            }
            (&mut reader).take(extent.len).read_to_end(&mut d.payload)?;
            if d.payload.len() as u64 != extent.len {
                return Err(StructureError::Persistence(format!(
                    "payload truncated: {} of {} bytes",
                    d.payload.len(),
                    extent.len
                )));
            }
            cursor += extent.len;
        }
        Ok(file)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StructureError> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StructureError> {
        Self::read_from(BufReader::new(File::open(path)?))
    }

    pub fn open_layout<P: AsRef<Path>>(path: P) -> Result<Self, StructureError> {
        Self::read_layout_from(File::open(path)?)
    }
}

/// Reader producing a `DataStructure` from a byte stream.
pub trait StructureReader {
    fn read<R: Read>(&self, reader: R) -> Result<DataStructure, StructureError>;
}

/// Writer serialising a `DataStructure` to a byte stream.
pub trait StructureWriter {
    fn write<W: Write>(&self, writer: W, ds: &DataStructure) -> Result<(), StructureError>;
}

pub(crate) fn attr_u64(attrs: &Attributes, key: &str) -> Result<u64, StructureError> {
    match attrs.get(key) {
        Some(AttributeValue::UInt(v)) => Ok(*v),
        _ => Err(missing_attr(key)),
    }
}

pub(crate) fn attr_text<'a>(attrs: &'a Attributes, key: &str) -> Result<&'a str, StructureError> {
    match attrs.get(key) {
        Some(AttributeValue::Text(v)) => Ok(v),
        _ => Err(missing_attr(key)),
    }
}

pub(crate) fn attr_u64_list<'a>(attrs: &'a Attributes, key: &str) -> Result<&'a [u64], StructureError> {
    match attrs.get(key) {
        Some(AttributeValue::UIntList(v)) => Ok(v),
        _ => Err(missing_attr(key)),
    }
}

pub(crate) fn attr_f64_list<'a>(attrs: &'a Attributes, key: &str) -> Result<&'a [f64], StructureError> {
    match attrs.get(key) {
        Some(AttributeValue::FloatList(v)) => Ok(v),
        _ => Err(missing_attr(key)),
    }
}

fn missing_attr(key: &str) -> StructureError {
    StructureError::Persistence(format!("missing or mistyped attribute `{key}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_roundtrips_through_bytes() {
        let mut file = H5File::default();
        file.root
            .attributes
            .insert("FileVersion".into(), AttributeValue::Text("7.0".into()));
        let mut g = H5Group::new();
        g.insert(
            "Data",
            H5Node::Dataset(H5Dataset {
                shape: vec![2],
                payload: vec![1, 2],
                ..H5Dataset::default()
            }),
        )
        .unwrap();
        file.root.insert("G", H5Node::Group(g)).unwrap();
        assert!(file.root.insert("G", H5Node::Link(1)).is_err());

        let mut bytes = Vec::new();
        file.write_to(&mut bytes).unwrap();
        let back = H5File::read_from(bytes.as_slice()).unwrap();
        assert_eq!(back, file);
        assert_eq!(back.root.group("G").unwrap().dataset("Data").unwrap().payload, [1, 2]);
    }

    #[test]
    fn layout_read_stops_before_payloads() {
        let mut file = H5File::default();
        file.root
            .insert(
                "Big",
                H5Node::Dataset(H5Dataset {
                    shape: vec![4096],
                    payload: vec![7; 4096],
                    ..H5Dataset::default()
                }),
            )
            .unwrap();
        let mut bytes = Vec::new();
        file.write_to(&mut bytes).unwrap();

        let mut rest = bytes.as_slice();
        let layout = H5File::read_layout_from(&mut rest).unwrap();
        assert_eq!(rest.len(), 4096);
        let d = layout.root.dataset("Big").unwrap();
        assert_eq!(d.shape, [4096]);
        assert!(d.payload.is_empty());

        assert!(H5File::read_from(&bytes[..bytes.len() - 1]).is_err());
        assert!(H5File::read_from(&b"not a file at all"[..]).is_err());
    }

    #[test]
    fn attribute_accessors_check_kind() {
        let mut a = Attributes::new();
        a.insert("n".into(), AttributeValue::UInt(3));
        assert_eq!(attr_u64(&a, "n").unwrap(), 3);
        assert!(attr_text(&a, "n").is_err());
        assert!(attr_u64(&a, "missing").is_err());
    }
}
