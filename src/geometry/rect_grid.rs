//! Rectilinear grid: axis-aligned cells whose boundaries are given by three
//! strictly increasing coordinate arrays.
//!
//! With `nx + 1` x-bounds, `ny + 1` y-bounds and `nz + 1` z-bounds the grid
//! has `nx * ny * nz` cells, ordered x fastest like [`ImageGeom`](super::ImageGeom).

use crate::algs::cancel::CancelToken;
use crate::data::data_array::DataArray;
use crate::geometry::node_geometry::CELL_DATA;
use crate::geometry::{DerivedCache, LengthUnit};
use crate::structure::data_object::AttributeMatrix;
use crate::structure::data_structure::DataStructure;
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

/// Names of the three bounds arrays.
pub const BOUNDS_NAMES: [&str; 3] = ["X Bounds", "Y Bounds", "Z Bounds"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RectGridGeom {
    dimensions: [usize; 3],
    pub(crate) bounds: [Option<IdType>; 3],
    units: LengthUnit,
    pub(crate) cell_data: Option<IdType>,
    pub(crate) derived: DerivedCache,
}

/// Fails unless `bounds` has at least two strictly increasing, finite values.
fn check_bounds(axis: usize, bounds: &[f32]) -> Result<(), StructureError> {
    let increasing = bounds.windows(2).all(|w| w[0] < w[1]);
    if bounds.len() < 2 || !increasing || bounds.iter().any(|b| !b.is_finite()) {
        return Err(StructureError::InvalidBounds { axis });
    }
    Ok(())
}

impl RectGridGeom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a grid from persisted state.
    pub(crate) fn from_parts(
        dimensions: [usize; 3],
        bounds: [Option<IdType>; 3],
        cell_data: Option<IdType>,
    ) -> Self {
        Self {
            dimensions,
            bounds,
            cell_data,
            ..Self::default()
        }
    }

    /// Cell counts along x, y and z.
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn bounds_ids(&self) -> [Option<IdType>; 3] {
        self.bounds
    }

    pub fn number_of_cells(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// `[nz, ny, nx]`.
    pub fn cell_tuple_shape(&self) -> Vec<usize> {
        vec![self.dimensions[2], self.dimensions[1], self.dimensions[0]]
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

    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        let [nx, ny, nz] = self.dimensions;
        (i < nx && j < ny && k < nz).then(|| (k * ny + j) * nx + i)
    }

    pub fn cell_ijk(&self, index: usize) -> Option<[usize; 3]> {
        let [nx, ny, _] = self.dimensions;
        (index < self.number_of_cells()).then(|| [index % nx, (index / nx) % ny, index / (nx * ny)])
    }
}

impl DataStructure {
    /// Creates a rectilinear grid with its bounds arrays and an empty
    /// "Cell Data" attribute matrix as children.
    pub fn create_rect_grid_geometry(
        &mut self,
        name: &str,
        parent: Option<IdType>,
        x_bounds: Vec<f32>,
        y_bounds: Vec<f32>,
        z_bounds: Vec<f32>,
    ) -> Result<IdType, StructureError> {
        let axes = [x_bounds, y_bounds, z_bounds];
        for (axis, b) in axes.iter().enumerate() {
            check_bounds(axis, b)?;
        }
        let dimensions = [axes[0].len() - 1, axes[1].len() - 1, axes[2].len() - 1];
        let mut arrays = Vec::with_capacity(3);
        for b in axes {
            let n = b.len();
            arrays.push(DataArray::from_vec(vec![n], vec![1], b)?);
        }

        let grid = RectGridGeom {
            dimensions,
            ..RectGridGeom::default()
        };
        let shape = grid.cell_tuple_shape();
        let geom = self.insert(grid, name, parent)?;
        let mut ids = [None; 3];
        for (axis, array) in arrays.into_iter().enumerate() {
            ids[axis] = Some(self.insert(array, BOUNDS_NAMES[axis], Some(geom))?);
        }
        let am = self.insert(AttributeMatrix::new(shape), CELL_DATA, Some(geom))?;
        if let Some(g) = self.get_data_as_mut::<RectGridGeom>(geom) {
            g.bounds = ids;
            g.cell_data = Some(am);
        }
        log::debug!("created RectGridGeom `{name}` with {dimensions:?} cells");
        Ok(geom)
    }

    /// Assigns existing one-component float arrays as the bounds and
    /// resizes the cell attribute matrix to match.
    pub fn set_rect_grid_bounds(
        &mut self,
        geom: IdType,
        bounds: [IdType; 3],
    ) -> Result<(), StructureError> {
        self.try_get_data_as::<RectGridGeom>(geom)?;
        let mut dimensions = [0; 3];
        for (axis, id) in bounds.into_iter().enumerate() {
            let array = self.try_get_data_as::<DataArray<f32>>(id)?;
            check_bounds(axis, array.as_slice()?)?;
            dimensions[axis] = array.size() - 1;
        }
        let g = self
            .get_data_as_mut::<RectGridGeom>(geom)
            .ok_or(StructureError::MissingObject(geom))?;
        g.bounds = bounds.map(Some);
        g.dimensions = dimensions;
        let shape = g.cell_tuple_shape();
        if let Some(am) = g.cell_data_id() {
            self.resize_attribute_matrix(am, shape)?;
        }
        Ok(())
    }

    /// The x, y and z bounds; `None` if any is unassigned.
    pub fn rect_grid_bounds(&self, geom: IdType) -> Option<[&[f32]; 3]> {
        let grid = self.get_data_as::<RectGridGeom>(geom)?;
        let mut out: [&[f32]; 3] = [&[]; 3];
        for (axis, id) in grid.bounds_ids().into_iter().enumerate() {
            out[axis] = self.get_data_as::<DataArray<f32>>(id?)?.as_slice().ok()?;
        }
        Some(out)
    }

    pub fn rect_grid_cell_center(&self, geom: IdType, index: usize) -> Option<[f32; 3]> {
        let grid = self.get_data_as::<RectGridGeom>(geom)?;
        let ijk = grid.cell_ijk(index)?;
        let bounds = self.rect_grid_bounds(geom)?;
        Some(std::array::from_fn(|d| {
            0.5 * (bounds[d][ijk[d]] + bounds[d][ijk[d] + 1])
        }))
    }

    /// Cell containing `point`; a point on an interior boundary belongs to
    /// the upper cell, and the outer maximum bound is outside.
    pub fn rect_grid_index_of_point(&self, geom: IdType, point: [f32; 3]) -> Option<usize> {
        let grid = self.get_data_as::<RectGridGeom>(geom)?;
        let bounds = self.rect_grid_bounds(geom)?;
        let mut ijk = [0usize; 3];
        for d in 0..3 {
            let b = bounds[d];
            let first = *b.first()?;
            let last = *b.last()?;
            if !(point[d] >= first) || point[d] >= last {
                return None;
            }
            ijk[d] = b.partition_point(|&v| v <= point[d]) - 1;
        }
        grid.cell_index(ijk[0], ijk[1], ijk[2])
    }

    /// Cell volumes, x fastest.
    pub fn rect_grid_cell_sizes(
        &self,
        geom: IdType,
        cancel: &CancelToken,
    ) -> Result<Vec<f32>, StructureError> {
        let [x, y, z] = self
            .rect_grid_bounds(geom)
            .ok_or(StructureError::MissingVertices(geom))?;
        let widths = |b: &[f32]| b.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
        let (dx, dy, dz) = (widths(x), widths(y), widths(z));
        let mut sizes = Vec::with_capacity(dx.len() * dy.len() * dz.len());
        for &h in &dz {
            cancel.check()?;
            for &w in &dy {
                sizes.extend(dx.iter().map(|&l| l * w * h));
            }
        }
        Ok(sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FindOptions;

    fn grid(ds: &mut DataStructure) -> IdType {
        ds.create_rect_grid_geometry(
            "Grid",
            None,
            vec![0.0, 1.0, 3.0],
            vec![0.0, 2.0],
            vec![-1.0, 0.0, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn dimensions_follow_bounds() {
        let mut ds = DataStructure::new();
        let g = grid(&mut ds);
        let rg = ds.get_data_as::<RectGridGeom>(g).unwrap();
        assert_eq!(rg.dimensions(), [2, 1, 2]);
        assert_eq!(ds.number_of_cells(g), 4);
        let am = rg.cell_data_id().unwrap();
        assert_eq!(
            ds.get_data_as::<AttributeMatrix>(am).unwrap().tuple_shape(),
            &[2, 1, 2]
        );
    }

    #[test]
    fn rejects_non_increasing_bounds() {
        let mut ds = DataStructure::new();
        let err = ds
            .create_rect_grid_geometry("G", None, vec![0.0, 1.0], vec![0.0, 0.0], vec![0.0, 1.0])
            .unwrap_err();
        assert_eq!(err, StructureError::InvalidBounds { axis: 1 });
        assert!(
            ds.create_rect_grid_geometry("G", None, vec![0.0], vec![0.0, 1.0], vec![0.0, 1.0])
                .is_err()
        );
        assert!(ds.is_empty());
    }

    #[test]
    fn cell_lookup() {
        let mut ds = DataStructure::new();
        let g = grid(&mut ds);
        assert_eq!(ds.rect_grid_cell_center(g, 1), Some([2.0, 1.0, -0.5]));
        assert_eq!(ds.rect_grid_index_of_point(g, [1.0, 0.5, 0.2]), Some(3));
        assert_eq!(ds.rect_grid_index_of_point(g, [3.0, 0.5, 0.2]), None);
        assert_eq!(ds.rect_grid_index_of_point(g, [0.0, -0.1, 0.2]), None);
    }

    #[test]
    fn voxel_sizes_of_uneven_cells() {
        let mut ds = DataStructure::new();
        let g = grid(&mut ds);
        ds.find_element_sizes(g, &FindOptions::default()).unwrap();
        assert_eq!(
            ds.element_sizes(g).unwrap().as_slice().unwrap(),
            &[2.0, 4.0, 1.0, 2.0]
        );

        let x = ds.get_data_as::<RectGridGeom>(g).unwrap().bounds_ids()[0].unwrap();
        ds.get_data_as_mut::<DataArray<f32>>(x)
            .unwrap()
            .set(2, 2.0)
            .unwrap();
        ds.find_element_sizes(g, &FindOptions::default()).unwrap();
        assert_eq!(
            ds.element_sizes(g).unwrap().as_slice().unwrap(),
            &[2.0, 2.0, 1.0, 1.0]
        );
    }
}
