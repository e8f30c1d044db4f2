//! The `find_*` family: lazily computed derived arrays of a geometry.
//!
//! A derived array is computed in full, then the previous array (if any) is
//! unlinked from the geometry, the new array is inserted as a child of the
//! geometry and its id is recorded together with the generations of the
//! arrays it was computed from. When nothing changed since, and the caller
//! did not ask to recalculate, the recorded id is returned as is.
//!
//! On failure the geometry forgets the entry and its previous array, so a
//! getter never returns a value the last `find_*` call did not produce.

use serde::{Deserialize, Serialize};

use crate::algs::cancel::CancelToken;
use crate::data::any_array::AnyDataArray;
use crate::data::data_array::DataArray;
use crate::data::dynamic_list::DynamicListArray;
use crate::geometry::helpers::{self, SubEntityList};
use crate::geometry::image::VOXEL_SIZES;
use crate::geometry::topology::{CellTopology, DerivedArray, DerivedEntry};
use crate::geometry::{Geometry, GeometryType, MeshIndexType};
use crate::structure::data_object::ObjectData;
use crate::structure::data_structure::DataStructure;
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

/// Options of every `find_*` operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FindOptions {
    /// Recompute even when the recorded array is current.
    pub recalculate: bool,
    #[serde(skip)]
    pub cancel: CancelToken,
}

impl FindOptions {
    /// Options forcing recomputation.
    pub fn recalculate() -> Self {
        Self {
            recalculate: true,
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl DataStructure {
    /// Lengths, areas or volumes per cell (`f32`, one component).
    ///
    /// Point clouds yield zeros; grids yield "Voxel Sizes".
    pub fn find_element_sizes(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::ElementSizes, options)
    }

    /// Cell centroids (`f32`, three components).
    pub fn find_element_centroids(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::ElementCentroids, options)
    }

    /// Per-vertex list of the cells that reference it.
    pub fn find_elements_containing_vert(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::ElementsContainingVert, options)
    }

    /// Per-cell list of neighbouring cells. Computes the
    /// elements-containing-vertex list first when it is missing or stale.
    pub fn find_element_neighbors(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::ElementNeighbors, options)
    }

    pub fn find_edges(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::Edges, options)
    }

    pub fn find_unshared_edges(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::UnsharedEdges, options)
    }

    pub fn find_faces(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::Faces, options)
    }

    pub fn find_unshared_faces(
        &mut self,
        geom: IdType,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        self.find_derived(geom, DerivedArray::UnsharedFaces, options)
    }

    /// Computes (or reuses) the derived array `kind` of geometry `geom`.
    pub fn find_derived(
        &mut self,
        geom: IdType,
        kind: DerivedArray,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        let result = self.find_derived_inner(geom, kind, options);
        if let Err(e) = &result {
            log::debug!("{} on geometry {geom} failed: {e}", kind.operation());
            if let Err(cleanup) = self.discard_derived(geom, kind) {
                log::warn!("could not discard {} of geometry {geom}: {cleanup}", kind.as_str());
            }
        }
        result
    }

    /// Recorded id of a derived array, current or not.
    pub fn derived_array_id(&self, geom: IdType, kind: DerivedArray) -> Option<IdType> {
        let g = self.get_data_as::<Geometry>(geom)?;
        let id = g.derived().get(&kind)?.id;
        self.contains(id).then_some(id)
    }

    /// Whether the recorded array of `kind` matches the current sources.
    pub fn is_derived_current(&self, geom: IdType, kind: DerivedArray) -> bool {
        let Some(entry) = self
            .get_data_as::<Geometry>(geom)
            .and_then(|g| g.derived().get(&kind))
        else {
            return false;
        };
        self.contains(entry.id)
            && self
                .derived_sources(geom)
                .is_ok_and(|sources| sources == entry.sources)
    }

    pub fn element_sizes(&self, geom: IdType) -> Option<&DataArray<f32>> {
        self.derived_as(geom, DerivedArray::ElementSizes)
    }

    pub fn element_centroids(&self, geom: IdType) -> Option<&DataArray<f32>> {
        self.derived_as(geom, DerivedArray::ElementCentroids)
    }

    pub fn elements_containing_vert(
        &self,
        geom: IdType,
    ) -> Option<&DynamicListArray<MeshIndexType>> {
        self.derived_as(geom, DerivedArray::ElementsContainingVert)
    }

    pub fn element_neighbors(&self, geom: IdType) -> Option<&DynamicListArray<MeshIndexType>> {
        self.derived_as(geom, DerivedArray::ElementNeighbors)
    }

    pub fn edges(&self, geom: IdType) -> Option<&DataArray<MeshIndexType>> {
        self.derived_as(geom, DerivedArray::Edges)
    }

    pub fn unshared_edges(&self, geom: IdType) -> Option<&DataArray<MeshIndexType>> {
        self.derived_as(geom, DerivedArray::UnsharedEdges)
    }

    pub fn faces(&self, geom: IdType) -> Option<&DataArray<MeshIndexType>> {
        self.derived_as(geom, DerivedArray::Faces)
    }

    pub fn unshared_faces(&self, geom: IdType) -> Option<&DataArray<MeshIndexType>> {
        self.derived_as(geom, DerivedArray::UnsharedFaces)
    }

    /// Forgets the derived array `kind` and unlinks it from the geometry.
    ///
    /// Returns `true` when an array was tracked.
    pub fn delete_derived_array(
        &mut self,
        geom: IdType,
        kind: DerivedArray,
    ) -> Result<bool, StructureError> {
        self.try_get_data_as::<Geometry>(geom)?;
        self.discard_derived(geom, kind)
    }

    /// Forgets every derived array of the geometry.
    pub fn delete_derived_arrays(&mut self, geom: IdType) -> Result<(), StructureError> {
        for kind in DerivedArray::ALL {
            self.delete_derived_array(geom, kind)?;
        }
        Ok(())
    }

    fn derived_as<T: crate::structure::data_object::FromDataObject>(
        &self,
        geom: IdType,
        kind: DerivedArray,
    ) -> Option<&T> {
        self.get_data_as::<T>(self.derived_array_id(geom, kind)?)
    }

    fn find_derived_inner(
        &mut self,
        geom: IdType,
        kind: DerivedArray,
        options: &FindOptions,
    ) -> Result<IdType, StructureError> {
        let g = self.try_get_data_as::<Geometry>(geom)?;
        let name = derived_name(g, kind)?;
        let sources = self.derived_sources(geom)?;

        if !options.recalculate {
            if let Some(entry) = g.derived().get(&kind) {
                if entry.sources == sources && self.contains(entry.id) {
                    log::debug!("reusing `{name}` of geometry {geom}");
                    return Ok(entry.id);
                }
            }
        }

        let containing = if kind == DerivedArray::ElementNeighbors {
            let opts = FindOptions {
                recalculate: false,
                cancel: options.cancel.clone(),
            };
            Some(self.find_derived(geom, DerivedArray::ElementsContainingVert, &opts)?)
        } else {
            None
        };

        let data = self.compute_derived(geom, kind, containing, &options.cancel)?;
        self.discard_derived(geom, kind)?;
        let id = self.insert(data, name, Some(geom))?;
        if let Some(g) = self.get_data_as_mut::<Geometry>(geom) {
            g.derived_mut().insert(kind, DerivedEntry { id, sources });
        }
        log::debug!("computed `{name}` of geometry {geom} as {id}");
        Ok(id)
    }

    /// `(id, generation)` of every array a derived array depends on.
    pub(crate) fn derived_sources(
        &self,
        geom: IdType,
    ) -> Result<Vec<(IdType, u64)>, StructureError> {
        let generation = |id: IdType, missing: StructureError| {
            self.get_data_as::<AnyDataArray>(id)
                .map(|a| (id, a.generation()))
                .ok_or(missing)
        };
        match self.try_get_data_as::<Geometry>(geom)? {
            Geometry::Image(img) => Ok(vec![(geom, img.generation())]),
            Geometry::RectGrid(grid) => grid
                .bounds_ids()
                .into_iter()
                .map(|b| {
                    let id = b.ok_or(StructureError::MissingVertices(geom))?;
                    generation(id, StructureError::MissingVertices(geom))
                })
                .collect(),
            other => {
                let node = other.as_node().ok_or(StructureError::MissingVertices(geom))?;
                let vid = node
                    .vertices_id()
                    .ok_or(StructureError::MissingVertices(geom))?;
                let mut out = vec![generation(vid, StructureError::MissingVertices(geom))?];
                if node.has_cell_list() {
                    let cid = node
                        .cells_id()
                        .ok_or(StructureError::MissingConnectivity(geom))?;
                    out.push(generation(cid, StructureError::MissingConnectivity(geom))?);
                }
                Ok(out)
            }
        }
    }

    fn discard_derived(&mut self, geom: IdType, kind: DerivedArray) -> Result<bool, StructureError> {
        let old = self
            .get_data_as_mut::<Geometry>(geom)
            .and_then(|g| g.derived_mut().remove(&kind));
        let Some(entry) = old else {
            return Ok(false);
        };
        if self
            .get_data(entry.id)
            .is_some_and(|o| o.parents().contains(&geom))
        {
            self.remove_parent(entry.id, Some(geom))?;
        }
        Ok(true)
    }

    fn compute_derived(
        &self,
        geom: IdType,
        kind: DerivedArray,
        containing: Option<IdType>,
        cancel: &CancelToken,
    ) -> Result<ObjectData, StructureError> {
        match self.try_get_data_as::<Geometry>(geom)? {
            Geometry::Image(img) => {
                let n = img.number_of_cells();
                cancel.check()?;
                Ok(DataArray::from_vec(img.cell_tuple_shape(), vec![1], vec![img.voxel_volume(); n])?.into())
            }
            Geometry::RectGrid(grid) => {
                let sizes = self.rect_grid_cell_sizes(geom, cancel)?;
                Ok(DataArray::from_vec(grid.cell_tuple_shape(), vec![1], sizes)?.into())
            }
            other => {
                let topology = other
                    .as_node()
                    .map(|n| n.topology())
                    .ok_or(StructureError::MissingVertices(geom))?;
                self.compute_node_derived(geom, topology, kind, containing, cancel)
            }
        }
    }

    fn compute_node_derived(
        &self,
        geom: IdType,
        topology: &'static CellTopology,
        kind: DerivedArray,
        containing: Option<IdType>,
        cancel: &CancelToken,
    ) -> Result<ObjectData, StructureError> {
        let vertices = self
            .vertex_coordinates(geom)
            .ok_or(StructureError::MissingVertices(geom))?
            .as_slice()?;
        let num_vertices = vertices.len() / 3;

        if topology.dimension == 0 {
            return match kind {
                DerivedArray::ElementSizes => {
                    cancel.check()?;
                    Ok(DataArray::<f32>::new(vec![num_vertices], vec![1], 0.0)?.into())
                }
                DerivedArray::ElementCentroids => {
                    cancel.check()?;
                    Ok(DataArray::from_vec(vec![num_vertices], vec![3], vertices.to_vec())?.into())
                }
                _ => Err(unsupported(topology, kind)),
            };
        }

        let k = topology.vertices_per_cell;
        let connectivity = self
            .cell_connectivity(geom)
            .ok_or(StructureError::MissingConnectivity(geom))?
            .as_slice()?;
        let num_cells = helpers::validate_connectivity(connectivity, k, num_vertices)?;

        match kind {
            DerivedArray::ElementSizes => {
                let sizes = match topology.geometry_type {
                    GeometryType::Edge => helpers::find_edge_lengths(vertices, connectivity, cancel)?,
                    GeometryType::Triangle | GeometryType::Quad => {
                        helpers::find_2d_element_areas(vertices, connectivity, k, cancel)?
                    }
                    GeometryType::Tetrahedral => {
                        helpers::find_tet_volumes(vertices, connectivity, cancel)?
                    }
                    GeometryType::Hexahedral => {
                        helpers::find_hex_volumes(vertices, connectivity, cancel)?
                    }
                    _ => return Err(unsupported(topology, kind)),
                };
                Ok(DataArray::from_vec(vec![num_cells], vec![1], sizes)?.into())
            }
            DerivedArray::ElementCentroids => {
                let c = helpers::find_element_centroids(vertices, connectivity, k, cancel)?;
                Ok(DataArray::from_vec(vec![num_cells], vec![3], c)?.into())
            }
            DerivedArray::ElementsContainingVert => Ok(helpers::find_elements_containing_vert(
                connectivity,
                k,
                num_vertices,
                cancel,
            )?
            .into()),
            DerivedArray::ElementNeighbors => {
                let list = containing
                    .and_then(|id| self.get_data_as::<DynamicListArray<MeshIndexType>>(id))
                    .ok_or(StructureError::MissingDerivedArray {
                        geometry: geom,
                        array: topology.names.elements_containing_vert,
                    })?;
                Ok(helpers::find_element_neighbors(connectivity, topology, list, cancel)?.into())
            }
            DerivedArray::Edges | DerivedArray::UnsharedEdges => {
                if !kind.supported_by(topology) {
                    return Err(unsupported(topology, kind));
                }
                let local: Vec<&[usize]> = topology.edges.iter().map(|e| &e[..]).collect();
                let list = if kind == DerivedArray::Edges {
                    helpers::find_sub_entities(connectivity, k, &local, num_vertices, cancel)?
                } else {
                    helpers::find_unshared_sub_entities(connectivity, k, &local, num_vertices, cancel)?
                };
                sub_entity_array(list)
            }
            DerivedArray::Faces | DerivedArray::UnsharedFaces => {
                if !kind.supported_by(topology) {
                    return Err(unsupported(topology, kind));
                }
                let list = if kind == DerivedArray::Faces {
                    helpers::find_sub_entities(connectivity, k, topology.faces, num_vertices, cancel)?
                } else {
                    helpers::find_unshared_sub_entities(
                        connectivity,
                        k,
                        topology.faces,
                        num_vertices,
                        cancel,
                    )?
                };
                sub_entity_array(list)
            }
        }
    }
}

fn derived_name(g: &Geometry, kind: DerivedArray) -> Result<&'static str, StructureError> {
    match g {
        Geometry::Image(_) | Geometry::RectGrid(_) => {
            if kind == DerivedArray::ElementSizes {
                Ok(VOXEL_SIZES)
            } else {
                Err(StructureError::UnsupportedGeometry {
                    geometry: g.type_name(),
                    operation: kind.operation(),
                })
            }
        }
        other => {
            let topology = other
                .as_node()
                .map(|n| n.topology())
                .ok_or(StructureError::UnsupportedGeometry {
                    geometry: other.type_name(),
                    operation: kind.operation(),
                })?;
            if kind.supported_by(topology) {
                Ok(kind.array_name(topology))
            } else {
                Err(unsupported(topology, kind))
            }
        }
    }
}

fn unsupported(topology: &CellTopology, kind: DerivedArray) -> StructureError {
    StructureError::UnsupportedGeometry {
        geometry: topology.geometry_type.type_name(),
        operation: kind.operation(),
    }
}

fn sub_entity_array(list: SubEntityList) -> Result<ObjectData, StructureError> {
    let n = list.len();
    Ok(DataArray::from_vec(vec![n], vec![list.vertices_per_entity], list.values)?.into())
}
