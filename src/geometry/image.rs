//! Regular voxel grid described by dimensions, spacing and origin.
//!
//! Cells are ordered x fastest, then y, then z, so the cell attribute matrix
//! has tuple shape `[nz, ny, nx]`.

use crate::geometry::node_geometry::CELL_DATA;
use crate::geometry::{DerivedCache, LengthUnit};
use crate::structure::data_object::AttributeMatrix;
use crate::structure::data_structure::DataStructure;
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

/// Name of the per-voxel size array of image and rectilinear grids.
pub const VOXEL_SIZES: &str = "Voxel Sizes";

#[derive(Clone, Debug, PartialEq)]
pub struct ImageGeom {
    dimensions: [usize; 3],
    spacing: [f32; 3],
    origin: [f32; 3],
    units: LengthUnit,
    pub(crate) cell_data: Option<IdType>,
    pub(crate) derived: DerivedCache,
    generation: u64,
}

pub(crate) fn check_spacing(spacing: [f32; 3]) -> Result<(), StructureError> {
    if spacing.iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
        return Err(StructureError::InvalidSpacing(spacing));
    }
    Ok(())
}

pub(crate) fn check_dimensions(dimensions: [usize; 3]) -> Result<(), StructureError> {
    if dimensions.contains(&0) {
        return Err(StructureError::InvalidDimensions(dimensions));
    }
    Ok(())
}

impl ImageGeom {
    /// Fails on a zero dimension or a spacing component `<= 0`.
    pub fn new(
        dimensions: [usize; 3],
        spacing: [f32; 3],
        origin: [f32; 3],
    ) -> Result<Self, StructureError> {
        check_dimensions(dimensions)?;
        check_spacing(spacing)?;
        Ok(Self {
            dimensions,
            spacing,
            origin,
            units: LengthUnit::default(),
            cell_data: None,
            derived: DerivedCache::new(),
            generation: 0,
        })
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn spacing(&self) -> [f32; 3] {
        self.spacing
    }

    pub fn origin(&self) -> [f32; 3] {
        self.origin
    }

    pub(crate) fn set_dimensions(&mut self, dimensions: [usize; 3]) -> Result<(), StructureError> {
        check_dimensions(dimensions)?;
        self.dimensions = dimensions;
        self.generation += 1;
        Ok(())
    }

    pub fn set_spacing(&mut self, spacing: [f32; 3]) -> Result<(), StructureError> {
        check_spacing(spacing)?;
        self.spacing = spacing;
        self.generation += 1;
        Ok(())
    }

    pub fn set_origin(&mut self, origin: [f32; 3]) {
        self.origin = origin;
        self.generation += 1;
    }

    /// Bumped whenever dimensions, spacing or origin change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn units(&self) -> LengthUnit {
        self.units
    }

    pub fn set_units(&mut self, units: LengthUnit) {
        self.units = units;
    }

    pub fn cell_data_id(&self) -> Option<IdType> {
        self.cell_data
    }

    pub fn set_cell_data_id(&mut self, id: Option<IdType>) {
        self.cell_data = id;
    }

    pub fn number_of_cells(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// `[nz, ny, nx]`.
    pub fn cell_tuple_shape(&self) -> Vec<usize> {
        vec![self.dimensions[2], self.dimensions[1], self.dimensions[0]]
    }

    pub fn voxel_volume(&self) -> f32 {
        self.spacing.iter().product()
    }

    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        let [nx, ny, nz] = self.dimensions;
        (i < nx && j < ny && k < nz).then(|| (k * ny + j) * nx + i)
    }

    pub fn cell_ijk(&self, index: usize) -> Option<[usize; 3]> {
        let [nx, ny, _] = self.dimensions;
        (index < self.number_of_cells()).then(|| [index % nx, (index / nx) % ny, index / (nx * ny)])
    }

    pub fn cell_center(&self, index: usize) -> Option<[f32; 3]> {
        let ijk = self.cell_ijk(index)?;
        Some(std::array::from_fn(|d| {
            self.origin[d] + (ijk[d] as f32 + 0.5) * self.spacing[d]
        }))
    }

    /// Cell containing `point`; `None` outside the grid.
    pub fn index_of_point(&self, point: [f32; 3]) -> Option<usize> {
        let mut ijk = [0usize; 3];
        for d in 0..3 {
            let t = (point[d] - self.origin[d]) / self.spacing[d];
            if !(t >= 0.0) || t >= self.dimensions[d] as f32 {
                return None;
            }
            ijk[d] = (t as usize).min(self.dimensions[d] - 1);
        }
        self.cell_index(ijk[0], ijk[1], ijk[2])
    }

    /// `(min, max)` corners.
    pub fn bounding_box(&self) -> ([f32; 3], [f32; 3]) {
        let max = std::array::from_fn(|d| {
            self.origin[d] + self.dimensions[d] as f32 * self.spacing[d]
        });
        (self.origin, max)
    }
}

impl DataStructure {
    /// Creates an image geometry together with an empty "Cell Data" attribute matrix.
    pub fn create_image_geometry(
        &mut self,
        name: &str,
        parent: Option<IdType>,
        dimensions: [usize; 3],
        spacing: [f32; 3],
        origin: [f32; 3],
    ) -> Result<IdType, StructureError> {
        let geometry = ImageGeom::new(dimensions, spacing, origin)?;
        let shape = geometry.cell_tuple_shape();
        let geom = self.insert(geometry, name, parent)?;
        let am = self.insert(AttributeMatrix::new(shape), CELL_DATA, Some(geom))?;
        if let Some(g) = self.get_data_as_mut::<ImageGeom>(geom) {
            g.set_cell_data_id(Some(am));
        }
        Ok(geom)
    }

    /// Changes the grid dimensions and resizes the cell attribute matrix.
    pub fn set_image_dimensions(
        &mut self,
        geom: IdType,
        dimensions: [usize; 3],
    ) -> Result<(), StructureError> {
        check_dimensions(dimensions)?;
        let cell_data = self
            .get_data_as::<ImageGeom>(geom)
            .ok_or(StructureError::MissingObject(geom))?
            .cell_data_id();
        // Cell data first: a failed resize must leave the old dimensions.
        if let Some(am) = cell_data {
            self.resize_attribute_matrix(am, vec![dimensions[2], dimensions[1], dimensions[0]])?;
        }
        self.get_data_as_mut::<ImageGeom>(geom)
            .ok_or(StructureError::MissingObject(geom))?
            .set_dimensions(dimensions)
    }
}
