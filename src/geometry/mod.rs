//! Geometry abstractions.
//!
//! A geometry is a container object that refers, by id, to arrays owned by
//! the same [`DataStructure`](crate::structure::DataStructure): vertex
//! coordinates, cell connectivity, attribute matrices and lazily computed
//! derived arrays. Structured grids ([`ImageGeom`], [`RectGridGeom`]) describe
//! their cells implicitly; node geometries ([`VertexGeom`] through
//! [`HexahedralGeom`]) carry explicit vertex and cell lists.
//!
//! Derived arrays are computed by the `find_*` operations on
//! `DataStructure` (see [`find`]) and remember the generations of the arrays
//! they were computed from, so a stale cache entry is never served.

pub mod edge;
pub mod find;
pub mod helpers;
pub mod hexahedral;
pub mod image;
pub mod node_geometry;
pub mod quad;
pub mod rect_grid;
pub mod tetrahedral;
pub mod topology;
pub mod triangle;
pub mod vertex;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::structure::id::IdType;
use crate::structure::data_object::ObjectData;

pub use edge::EdgeGeom;
pub use find::FindOptions;
pub use hexahedral::HexahedralGeom;
pub use image::ImageGeom;
pub use node_geometry::NodeGeometry;
pub use quad::QuadGeom;
pub use rect_grid::RectGridGeom;
pub use tetrahedral::TetrahedralGeom;
pub use topology::{CellTopology, DerivedArray, DerivedEntry};
pub use triangle::TriangleGeom;
pub use vertex::VertexGeom;

/// Integer type of connectivity entries and adjacency lists.
pub type MeshIndexType = u64;

/// Derived-array bookkeeping shared by every geometry.
pub type DerivedCache = BTreeMap<DerivedArray, DerivedEntry>;

/// Closed set of geometry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryType {
    Image,
    RectGrid,
    Vertex,
    Edge,
    Triangle,
    Quad,
    Tetrahedral,
    Hexahedral,
}

impl GeometryType {
    pub const ALL: [GeometryType; 8] = [
        GeometryType::Image,
        GeometryType::RectGrid,
        GeometryType::Vertex,
        GeometryType::Edge,
        GeometryType::Triangle,
        GeometryType::Quad,
        GeometryType::Tetrahedral,
        GeometryType::Hexahedral,
    ];

    /// Stable type name, also the persisted object-type tag.
    pub fn type_name(self) -> &'static str {
        match self {
            GeometryType::Image => "ImageGeom",
            GeometryType::RectGrid => "RectGridGeom",
            GeometryType::Vertex => "VertexGeom",
            GeometryType::Edge => "EdgeGeom",
            GeometryType::Triangle => "TriangleGeom",
            GeometryType::Quad => "QuadGeom",
            GeometryType::Tetrahedral => "TetrahedralGeom",
            GeometryType::Hexahedral => "HexahedralGeom",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.type_name() == tag)
    }

    /// Cell topology of node geometries; `None` for structured grids.
    pub fn topology(self) -> Option<&'static CellTopology> {
        match self {
            GeometryType::Image | GeometryType::RectGrid => None,
            GeometryType::Vertex => Some(&topology::VERTEX),
            GeometryType::Edge => Some(&topology::EDGE),
            GeometryType::Triangle => Some(&topology::TRIANGLE),
            GeometryType::Quad => Some(&topology::QUAD),
            GeometryType::Tetrahedral => Some(&topology::TETRAHEDRAL),
            GeometryType::Hexahedral => Some(&topology::HEXAHEDRAL),
        }
    }
}

/// Physical length unit attached to a geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    Yoctometer,
    Zeptometer,
    Attometer,
    Femtometer,
    Picometer,
    Nanometer,
    #[default]
    Micrometer,
    Millimeter,
    Centimeter,
    Decimeter,
    Meter,
    Inch,
    Foot,
    Mile,
    Angstrom,
    Unspecified,
    Unknown,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 17] = [
        LengthUnit::Yoctometer,
        LengthUnit::Zeptometer,
        LengthUnit::Attometer,
        LengthUnit::Femtometer,
        LengthUnit::Picometer,
        LengthUnit::Nanometer,
        LengthUnit::Micrometer,
        LengthUnit::Millimeter,
        LengthUnit::Centimeter,
        LengthUnit::Decimeter,
        LengthUnit::Meter,
        LengthUnit::Inch,
        LengthUnit::Foot,
        LengthUnit::Mile,
        LengthUnit::Angstrom,
        LengthUnit::Unspecified,
        LengthUnit::Unknown,
    ];

    /// Persisted label.
    pub fn as_str(self) -> &'static str {
        match self {
            LengthUnit::Yoctometer => "Yoctometer",
            LengthUnit::Zeptometer => "Zeptometer",
            LengthUnit::Attometer => "Attometer",
            LengthUnit::Femtometer => "Femtometer",
            LengthUnit::Picometer => "Picometer",
            LengthUnit::Nanometer => "Nanometer",
            LengthUnit::Micrometer => "Micrometer",
            LengthUnit::Millimeter => "Millimeter",
            LengthUnit::Centimeter => "Centimeter",
            LengthUnit::Decimeter => "Decimeter",
            LengthUnit::Meter => "Meter",
            LengthUnit::Inch => "Inch",
            LengthUnit::Foot => "Foot",
            LengthUnit::Mile => "Mile",
            LengthUnit::Angstrom => "Angstrom",
            LengthUnit::Unspecified => "Unspecified",
            LengthUnit::Unknown => "Unknown",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == tag)
    }
}

/// Any geometry object.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Image(ImageGeom),
    RectGrid(RectGridGeom),
    Vertex(VertexGeom),
    Edge(EdgeGeom),
    Triangle(TriangleGeom),
    Quad(QuadGeom),
    Tetrahedral(TetrahedralGeom),
    Hexahedral(HexahedralGeom),
}

macro_rules! node_arms {
    ($self:expr, $g:ident => $body:expr, $grid:pat => $other:expr) => {
        match $self {
            Geometry::Vertex($g) => $body,
            Geometry::Edge($g) => $body,
            Geometry::Triangle($g) => $body,
            Geometry::Quad($g) => $body,
            Geometry::Tetrahedral($g) => $body,
            Geometry::Hexahedral($g) => $body,
            $grid => $other,
        }
    };
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Image(_) => GeometryType::Image,
            Geometry::RectGrid(_) => GeometryType::RectGrid,
            Geometry::Vertex(_) => GeometryType::Vertex,
            Geometry::Edge(_) => GeometryType::Edge,
            Geometry::Triangle(_) => GeometryType::Triangle,
            Geometry::Quad(_) => GeometryType::Quad,
            Geometry::Tetrahedral(_) => GeometryType::Tetrahedral,
            Geometry::Hexahedral(_) => GeometryType::Hexahedral,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.geometry_type().type_name()
    }

    /// Shared node-geometry state, `None` for structured grids.
    pub fn as_node(&self) -> Option<&NodeGeometry> {
        node_arms!(self, g => Some(&**g), _ => None)
    }

    pub fn as_node_mut(&mut self) -> Option<&mut NodeGeometry> {
        node_arms!(self, g => Some(&mut **g), _ => None)
    }

    pub fn units(&self) -> LengthUnit {
        match self {
            Geometry::Image(g) => g.units(),
            Geometry::RectGrid(g) => g.units(),
            other => other.as_node().map_or(LengthUnit::default(), NodeGeometry::units),
        }
    }

    pub fn set_units(&mut self, units: LengthUnit) {
        match self {
            Geometry::Image(g) => g.set_units(units),
            Geometry::RectGrid(g) => g.set_units(units),
            other => {
                if let Some(n) = other.as_node_mut() {
                    n.set_units(units);
                }
            }
        }
    }

    /// Id of the attribute matrix holding per-cell data.
    pub fn cell_data_id(&self) -> Option<IdType> {
        match self {
            Geometry::Image(g) => g.cell_data_id(),
            Geometry::RectGrid(g) => g.cell_data_id(),
            other => other.as_node().and_then(NodeGeometry::cell_data_id),
        }
    }

    pub fn set_cell_data_id(&mut self, id: Option<IdType>) {
        match self {
            Geometry::Image(g) => g.set_cell_data_id(id),
            Geometry::RectGrid(g) => g.set_cell_data_id(id),
            other => {
                if let Some(n) = other.as_node_mut() {
                    n.set_cell_data_id(id);
                }
            }
        }
    }

    pub fn derived(&self) -> &DerivedCache {
        match self {
            Geometry::Image(g) => &g.derived,
            Geometry::RectGrid(g) => &g.derived,
            Geometry::Vertex(g) => &g.derived,
            Geometry::Edge(g) => &g.derived,
            Geometry::Triangle(g) => &g.derived,
            Geometry::Quad(g) => &g.derived,
            Geometry::Tetrahedral(g) => &g.derived,
            Geometry::Hexahedral(g) => &g.derived,
        }
    }

    pub(crate) fn derived_mut(&mut self) -> &mut DerivedCache {
        match self {
            Geometry::Image(g) => &mut g.derived,
            Geometry::RectGrid(g) => &mut g.derived,
            Geometry::Vertex(g) => &mut g.derived,
            Geometry::Edge(g) => &mut g.derived,
            Geometry::Triangle(g) => &mut g.derived,
            Geometry::Quad(g) => &mut g.derived,
            Geometry::Tetrahedral(g) => &mut g.derived,
            Geometry::Hexahedral(g) => &mut g.derived,
        }
    }

    /// Every id this geometry refers to.
    pub fn referenced_ids(&self) -> Vec<IdType> {
        let mut ids: Vec<IdType> = self.slots().into_iter().flatten().collect();
        ids.extend(self.derived().values().map(|e| e.id));
        ids
    }

    /// Drops every reference to `id`.
    pub fn clear_reference(&mut self, id: IdType) {
        for slot in self.slots_mut() {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.derived_mut().retain(|_, e| e.id != id);
    }

    /// Rewrites references through `map`; unmapped ids are kept.
    pub fn remap_ids(&mut self, map: &BTreeMap<IdType, IdType>) {
        for slot in self.slots_mut() {
            if let Some(new) = slot.and_then(|old| map.get(&old).copied()) {
                *slot = Some(new);
            }
        }
        for entry in self.derived_mut().values_mut() {
            if let Some(&new) = map.get(&entry.id) {
                entry.id = new;
            }
            for (src, _) in &mut entry.sources {
                if let Some(&new) = map.get(src) {
                    *src = new;
                }
            }
        }
    }

    fn slots(&self) -> Vec<Option<IdType>> {
        match self {
            Geometry::Image(g) => vec![g.cell_data_id()],
            Geometry::RectGrid(g) => {
                let [x, y, z] = g.bounds_ids();
                vec![x, y, z, g.cell_data_id()]
            }
            other => other.as_node().map_or_else(Vec::new, |n| {
                vec![
                    n.vertices_id(),
                    n.cells_id(),
                    n.vertex_data_id(),
                    n.cell_data_id(),
                ]
            }),
        }
    }

    fn slots_mut(&mut self) -> Vec<&mut Option<IdType>> {
        match self {
            Geometry::Image(g) => vec![&mut g.cell_data],
            Geometry::RectGrid(g) => {
                let [x, y, z] = &mut g.bounds;
                vec![x, y, z, &mut g.cell_data]
            }
            other => match other.as_node_mut() {
                Some(n) => vec![
                    &mut n.vertices,
                    &mut n.cells,
                    &mut n.vertex_data,
                    &mut n.cell_data,
                ],
                None => Vec::new(),
            },
        }
    }
}

macro_rules! impl_geometry_from {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Geometry {
            fn from(g: $t) -> Self {
                Geometry::$variant(g)
            }
        }

        impl From<$t> for ObjectData {
            fn from(g: $t) -> Self {
                ObjectData::Geometry(Geometry::$variant(g))
            }
        }
    };
}

impl_geometry_from!(ImageGeom, Image);
impl_geometry_from!(RectGridGeom, RectGrid);
impl_geometry_from!(VertexGeom, Vertex);
impl_geometry_from!(EdgeGeom, Edge);
impl_geometry_from!(TriangleGeom, Triangle);
impl_geometry_from!(QuadGeom, Quad);
impl_geometry_from!(TetrahedralGeom, Tetrahedral);
impl_geometry_from!(HexahedralGeom, Hexahedral);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_roundtrip() {
        for t in GeometryType::ALL {
            assert_eq!(GeometryType::parse(t.type_name()), Some(t));
        }
        assert!(GeometryType::Image.topology().is_none());
        assert_eq!(GeometryType::Hexahedral.topology().unwrap().vertices_per_cell, 8);
        for u in LengthUnit::ALL {
            assert_eq!(LengthUnit::parse(u.as_str()), Some(u));
        }
    }

    #[test]
    fn clearing_and_remapping_references() {
        let mut tri = TriangleGeom::new();
        tri.set_vertices_id(Some(IdType::new(2)));
        tri.set_cells_id(Some(IdType::new(3)));
        let mut g = Geometry::from(tri);
        assert_eq!(g.referenced_ids(), vec![IdType::new(2), IdType::new(3)]);

        let map = BTreeMap::from([(IdType::new(2), IdType::new(20))]);
        g.remap_ids(&map);
        assert_eq!(g.as_node().unwrap().vertices_id(), Some(IdType::new(20)));
        assert_eq!(g.as_node().unwrap().cells_id(), Some(IdType::new(3)));

        g.clear_reference(IdType::new(3));
        assert_eq!(g.as_node().unwrap().cells_id(), None);
    }
}
