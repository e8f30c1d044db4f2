//! State shared by the vertex-based geometries, and the `DataStructure`
//! operations that read and edit their vertex and cell lists.
//!
//! Vertex coordinates are a `DataArray<f32>` shaped `N × 3`. Connectivity is
//! a `DataArray<MeshIndexType>` shaped `C × vertices_per_cell`; a point cloud
//! has none and treats every vertex as a cell.

use crate::data::data_array::DataArray;
use crate::geometry::topology::CellTopology;
use crate::geometry::{DerivedCache, Geometry, GeometryType, LengthUnit, MeshIndexType};
use crate::structure::data_object::AttributeMatrix;
use crate::structure::data_structure::DataStructure;
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

/// Default name of the per-vertex attribute matrix.
pub const VERTEX_DATA: &str = "Vertex Data";
/// Default name of the per-cell attribute matrix.
pub const CELL_DATA: &str = "Cell Data";

/// Array references of a node geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeGeometry {
    pub(crate) topology: &'static CellTopology,
    pub(crate) vertices: Option<IdType>,
    pub(crate) cells: Option<IdType>,
    pub(crate) vertex_data: Option<IdType>,
    pub(crate) cell_data: Option<IdType>,
    pub(crate) derived: DerivedCache,
    pub(crate) units: LengthUnit,
}

impl NodeGeometry {
    pub(crate) fn new(topology: &'static CellTopology) -> Self {
        Self {
            topology,
            vertices: None,
            cells: None,
            vertex_data: None,
            cell_data: None,
            derived: DerivedCache::new(),
            units: LengthUnit::default(),
        }
    }

    pub fn topology(&self) -> &'static CellTopology {
        self.topology
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.topology.geometry_type
    }

    /// Whether cells are stored explicitly (everything but point clouds).
    pub fn has_cell_list(&self) -> bool {
        self.topology.dimension > 0
    }

    pub fn vertices_id(&self) -> Option<IdType> {
        self.vertices
    }

    pub fn set_vertices_id(&mut self, id: Option<IdType>) {
        self.vertices = id;
    }

    pub fn cells_id(&self) -> Option<IdType> {
        self.cells
    }

    pub fn set_cells_id(&mut self, id: Option<IdType>) {
        self.cells = id;
    }

    pub fn vertex_data_id(&self) -> Option<IdType> {
        self.vertex_data
    }

    pub fn set_vertex_data_id(&mut self, id: Option<IdType>) {
        self.vertex_data = id;
    }

    pub fn cell_data_id(&self) -> Option<IdType> {
        self.cell_data
    }

    pub fn set_cell_data_id(&mut self, id: Option<IdType>) {
        self.cell_data = id;
    }

    pub fn units(&self) -> LengthUnit {
        self.units
    }

    pub fn set_units(&mut self, units: LengthUnit) {
        self.units = units;
    }
}

/// Declares a concrete node geometry wrapping [`NodeGeometry`].
macro_rules! declare_node_geometry {
    ($(#[$meta:meta])* $name:ident, $topology:path) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            base: $crate::geometry::node_geometry::NodeGeometry,
        }

        impl $name {
            pub const TOPOLOGY: &'static $crate::geometry::topology::CellTopology = &$topology;

            /// A geometry with no arrays assigned yet.
            pub fn new() -> Self {
                Self {
                    base: $crate::geometry::node_geometry::NodeGeometry::new(Self::TOPOLOGY),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::geometry::node_geometry::NodeGeometry;

            fn deref(&self) -> &Self::Target {
                &self.base
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.base
            }
        }
    };
}

pub(crate) use declare_node_geometry;

/// A blank geometry of a node type.
pub fn new_node_geometry(geometry_type: GeometryType) -> Result<Geometry, StructureError> {
    use crate::geometry::*;
    Ok(match geometry_type {
        GeometryType::Vertex => VertexGeom::new().into(),
        GeometryType::Edge => EdgeGeom::new().into(),
        GeometryType::Triangle => TriangleGeom::new().into(),
        GeometryType::Quad => QuadGeom::new().into(),
        GeometryType::Tetrahedral => TetrahedralGeom::new().into(),
        GeometryType::Hexahedral => HexahedralGeom::new().into(),
        GeometryType::Image | GeometryType::RectGrid => {
            return Err(StructureError::UnsupportedGeometry {
                geometry: geometry_type.type_name(),
                operation: "new_node_geometry",
            });
        }
    })
}

impl DataStructure {
    /// Node-geometry view of object `geom`.
    pub fn node_geometry(&self, geom: IdType) -> Result<&NodeGeometry, StructureError> {
        let g = self.try_get_data_as::<Geometry>(geom)?;
        g.as_node().ok_or(StructureError::UnsupportedGeometry {
            geometry: g.type_name(),
            operation: "node_geometry",
        })
    }

    fn node_geometry_mut(&mut self, geom: IdType) -> Result<&mut NodeGeometry, StructureError> {
        let g = self
            .get_data_as_mut::<Geometry>(geom)
            .ok_or(StructureError::MissingObject(geom))?;
        let name = g.type_name();
        g.as_node_mut().ok_or(StructureError::UnsupportedGeometry {
            geometry: name,
            operation: "node_geometry",
        })
    }

    /// Creates a node geometry with its vertex list and, for cell types,
    /// its connectivity, both stored as children of the geometry.
    ///
    /// `vertices` holds `x, y, z` per vertex. `cells` holds
    /// `vertices_per_cell` indices per cell and must be empty for a point cloud.
    /// Nothing is inserted unless every input is valid.
    pub fn create_node_geometry(
        &mut self,
        geometry_type: GeometryType,
        name: &str,
        parent: Option<IdType>,
        vertices: Vec<f32>,
        cells: Vec<MeshIndexType>,
    ) -> Result<IdType, StructureError> {
        let geometry = new_node_geometry(geometry_type)?;
        let Some(topology) = geometry_type.topology() else {
            return Err(StructureError::UnsupportedGeometry {
                geometry: geometry_type.type_name(),
                operation: "create_node_geometry",
            });
        };
        if vertices.len() % 3 != 0 {
            return Err(StructureError::ShapeMismatch {
                expected: vertices.len() / 3 * 3,
                found: vertices.len(),
            });
        }
        let num_vertices = vertices.len() / 3;
        let vertex_array = DataArray::from_vec(vec![num_vertices], vec![3], vertices)?;
        let cell_array = if topology.dimension > 0 {
            let k = topology.vertices_per_cell;
            let num_cells =
                crate::geometry::helpers::validate_connectivity(&cells, k, num_vertices)?;
            Some(DataArray::from_vec(vec![num_cells], vec![k], cells)?)
        } else if !cells.is_empty() {
            return Err(StructureError::ShapeMismatch {
                expected: 0,
                found: cells.len(),
            });
        } else {
            None
        };

        let geom = self.insert(geometry, name, parent)?;
        let vid = self.insert(vertex_array, topology.names.vertex_list, Some(geom))?;
        let cid = match cell_array {
            Some(a) => Some(self.insert(a, topology.names.cell_list, Some(geom))?),
            None => None,
        };
        let node = self.node_geometry_mut(geom)?;
        node.set_vertices_id(Some(vid));
        node.set_cells_id(cid);
        log::debug!(
            "created {} `{name}` with {num_vertices} vertices",
            geometry_type.type_name()
        );
        Ok(geom)
    }

    /// Assigns an existing `N × 3` float array as the vertex list.
    pub fn set_vertices(&mut self, geom: IdType, vertices: IdType) -> Result<(), StructureError> {
        let array = self.try_get_data_as::<DataArray<f32>>(vertices)?;
        if array.number_of_components() != 3 {
            return Err(StructureError::ComponentShapeMismatch {
                expected: vec![3],
                found: array.component_shape().to_vec(),
            });
        }
        self.node_geometry_mut(geom)?.set_vertices_id(Some(vertices));
        Ok(())
    }

    /// Assigns an existing connectivity array as the cell list.
    pub fn set_cells(&mut self, geom: IdType, cells: IdType) -> Result<(), StructureError> {
        let k = self.node_geometry(geom)?.topology().vertices_per_cell;
        let array = self.try_get_data_as::<DataArray<MeshIndexType>>(cells)?;
        if array.number_of_components() != k {
            return Err(StructureError::ComponentShapeMismatch {
                expected: vec![k],
                found: array.component_shape().to_vec(),
            });
        }
        self.node_geometry_mut(geom)?.set_cells_id(Some(cells));
        Ok(())
    }

    pub fn vertex_coordinates(&self, geom: IdType) -> Option<&DataArray<f32>> {
        let id = self.node_geometry(geom).ok()?.vertices_id()?;
        self.get_data_as::<DataArray<f32>>(id)
    }

    pub(crate) fn vertex_coordinates_mut(&mut self, geom: IdType) -> Option<&mut DataArray<f32>> {
        let id = self.node_geometry(geom).ok()?.vertices_id()?;
        self.get_data_as_mut::<DataArray<f32>>(id)
    }

    pub fn cell_connectivity(&self, geom: IdType) -> Option<&DataArray<MeshIndexType>> {
        let id = self.node_geometry(geom).ok()?.cells_id()?;
        self.get_data_as::<DataArray<MeshIndexType>>(id)
    }

    pub(crate) fn cell_connectivity_mut(&mut self, geom: IdType) -> Option<&mut DataArray<MeshIndexType>> {
        let id = self.node_geometry(geom).ok()?.cells_id()?;
        self.get_data_as_mut::<DataArray<MeshIndexType>>(id)
    }

    pub fn number_of_vertices(&self, geom: IdType) -> usize {
        self.vertex_coordinates(geom)
            .map_or(0, DataArray::number_of_tuples)
    }

    /// Cell count; for a point cloud this is the vertex count, for grids the voxel count.
    pub fn number_of_cells(&self, geom: IdType) -> usize {
        match self.get_data_as::<Geometry>(geom) {
            Some(Geometry::Image(g)) => g.number_of_cells(),
            Some(Geometry::RectGrid(g)) => g.number_of_cells(),
            Some(Geometry::Vertex(_)) => self.number_of_vertices(geom),
            Some(_) => self
                .cell_connectivity(geom)
                .map_or(0, DataArray::number_of_tuples),
            None => 0,
        }
    }

    pub fn vertex(&self, geom: IdType, index: usize) -> Option<[f32; 3]> {
        let t = self.vertex_coordinates(geom)?.tuple(index).ok()?;
        Some([t[0], t[1], t[2]])
    }

    pub fn set_vertex(
        &mut self,
        geom: IdType,
        index: usize,
        coords: [f32; 3],
    ) -> Result<(), StructureError> {
        self.vertex_coordinates_mut(geom)
            .ok_or(StructureError::MissingVertices(geom))?
            .set_tuple(index, &coords)
    }

    /// Vertex indices of one cell.
    pub fn cell_vertex_indices(&self, geom: IdType, cell: usize) -> Option<&[MeshIndexType]> {
        self.cell_connectivity(geom)?.tuple(cell).ok()
    }

    /// Corner coordinates of one cell.
    pub fn cell_coordinates(&self, geom: IdType, cell: usize) -> Option<Vec<[f32; 3]>> {
        if matches!(self.get_data_as::<Geometry>(geom)?, Geometry::Vertex(_)) {
            return self.vertex(geom, cell).map(|p| vec![p]);
        }
        self.cell_vertex_indices(geom, cell)?
            .iter()
            .map(|&v| self.vertex(geom, v as usize))
            .collect()
    }

    /// Axis-aligned `(min, max)` over all vertices; `None` when there are none.
    pub fn vertex_bounding_box(&self, geom: IdType) -> Option<([f32; 3], [f32; 3])> {
        let coords = self.vertex_coordinates(geom)?.as_slice().ok()?;
        let mut chunks = coords.chunks_exact(3);
        let first = chunks.next()?;
        let mut min = [first[0], first[1], first[2]];
        let mut max = min;
        for p in chunks {
            for d in 0..3 {
                min[d] = min[d].min(p[d]);
                max[d] = max[d].max(p[d]);
            }
        }
        Some((min, max))
    }

    /// Creates the per-vertex attribute matrix sized to the vertex count.
    pub fn create_vertex_attribute_matrix(
        &mut self,
        geom: IdType,
        name: &str,
    ) -> Result<IdType, StructureError> {
        let n = self.number_of_vertices(geom);
        let am = self.insert(AttributeMatrix::new(vec![n]), name, Some(geom))?;
        self.node_geometry_mut(geom)?.set_vertex_data_id(Some(am));
        Ok(am)
    }

    /// Creates the per-cell attribute matrix sized to the cell count.
    pub fn create_cell_attribute_matrix(
        &mut self,
        geom: IdType,
        name: &str,
    ) -> Result<IdType, StructureError> {
        self.node_geometry(geom)?;
        let n = self.number_of_cells(geom);
        let am = self.insert(AttributeMatrix::new(vec![n]), name, Some(geom))?;
        self.node_geometry_mut(geom)?.set_cell_data_id(Some(am));
        Ok(am)
    }

    /// Resizes the vertex list (and vertex attribute matrix); new vertices are zero.
    pub fn resize_vertex_list(&mut self, geom: IdType, n: usize) -> Result<(), StructureError> {
        let node = self.node_geometry(geom)?;
        let am = node.vertex_data_id();
        let point_cloud_cells = if node.has_cell_list() { None } else { node.cell_data_id() };
        self.vertex_coordinates_mut(geom)
            .ok_or(StructureError::MissingVertices(geom))?
            .resize_tuples(n)?;
        for id in [am, point_cloud_cells].into_iter().flatten() {
            self.resize_attribute_matrix(id, vec![n])?;
        }
        Ok(())
    }

    /// Resizes the cell list (and cell attribute matrix); new cells reference vertex 0.
    pub fn resize_cell_list(&mut self, geom: IdType, n: usize) -> Result<(), StructureError> {
        let node = self.node_geometry(geom)?;
        if !node.has_cell_list() {
            return self.resize_vertex_list(geom, n);
        }
        let am = node.cell_data_id();
        self.cell_connectivity_mut(geom)
            .ok_or(StructureError::MissingConnectivity(geom))?
            .resize_tuples(n)?;
        if let Some(id) = am {
            self.resize_attribute_matrix(id, vec![n])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh(ds: &mut DataStructure) -> IdType {
        ds.create_node_geometry(
            GeometryType::Quad,
            "Quads",
            None,
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn create_registers_arrays_as_children() {
        let mut ds = DataStructure::new();
        let g = quad_mesh(&mut ds);
        assert_eq!(ds.number_of_vertices(g), 4);
        assert_eq!(ds.number_of_cells(g), 1);
        assert_eq!(ds.children(g).len(), 2);
        assert_eq!(ds.cell_vertex_indices(g, 0), Some(&[0u64, 1, 2, 3][..]));
        assert_eq!(ds.cell_coordinates(g, 0).unwrap()[2], [1.0, 1.0, 0.0]);
        assert_eq!(
            ds.vertex_bounding_box(g),
            Some(([0.0, 0.0, 0.0], [1.0, 1.0, 0.0]))
        );
    }

    #[test]
    fn invalid_input_inserts_nothing() {
        let mut ds = DataStructure::new();
        let err = ds
            .create_node_geometry(GeometryType::Triangle, "T", None, vec![0.0; 9], vec![0, 1, 7])
            .unwrap_err();
        assert!(matches!(err, StructureError::VertexIndexOutOfRange { .. }));
        assert!(ds.is_empty());
        assert!(
            ds.create_node_geometry(GeometryType::Image, "I", None, vec![], vec![])
                .is_err()
        );
    }

    #[test]
    fn resize_follows_attribute_matrices() {
        let mut ds = DataStructure::new();
        let g = quad_mesh(&mut ds);
        let am = ds.create_cell_attribute_matrix(g, CELL_DATA).unwrap();
        ds.create_array::<i32>("Ids", vec![1], vec![1], 7, Some(am))
            .unwrap();
        ds.resize_cell_list(g, 3).unwrap();
        assert_eq!(ds.number_of_cells(g), 3);
        assert_eq!(
            ds.get_data_as::<AttributeMatrix>(am).unwrap().number_of_tuples(),
            3
        );
    }

    #[test]
    fn set_cells_checks_width() {
        let mut ds = DataStructure::new();
        let g = quad_mesh(&mut ds);
        let bad = ds
            .create_array::<u64>("Tri", vec![1], vec![3], 0, Some(g))
            .unwrap();
        assert!(matches!(
            ds.set_cells(g, bad),
            Err(StructureError::ComponentShapeMismatch { .. })
        ));
    }
}
