//! Crop and resample of image geometries.
//!
//! Both operations build a new [`ImageGeom`] and transfer every array of the
//! source cell attribute matrix through a cell index map. Each array is
//! gathered by its own task on the [`run_tasks`] pool into a freshly
//! allocated destination; nothing is inserted into the structure until all
//! tasks have joined, so a failed or cancelled run leaves it unchanged.

use serde::{Deserialize, Serialize};

use crate::algs::cancel::CancelToken;
use crate::algs::parallel::{ParallelOptions, run_tasks};
use crate::data::any_array::AnyDataArray;
use crate::data::data_array::DataArray;
use crate::data::dispatch::{ArrayFunction, execute_array_function};
use crate::data::element::ArrayElement;
use crate::geometry::{ImageGeom, LengthUnit};
use crate::structure::data_structure::DataStructure;
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

/// Inclusive voxel index ranges kept by a crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl CropRegion {
    pub fn dimensions(&self) -> [usize; 3] {
        std::array::from_fn(|d| self.max[d] - self.min[d] + 1)
    }
}

/// Copies the tuples named by `map` into a new array of `tuple_shape`.
struct Gather<'a> {
    map: &'a [usize],
    tuple_shape: Vec<usize>,
    cancel: &'a CancelToken,
}

impl ArrayFunction for Gather<'_> {
    type Output = Result<AnyDataArray, StructureError>;

    fn call<T: ArrayElement>(self, array: &DataArray<T>) -> Self::Output {
        let components = array.component_shape().to_vec();
        if !array.is_materialized() {
            return Ok(T::wrap(DataArray::empty(self.tuple_shape, components)));
        }
        let nc = array.number_of_components();
        let src = array.as_slice()?;
        let mut values = Vec::with_capacity(self.map.len() * nc);
        for (n, &t) in self.map.iter().enumerate() {
            if n % 4096 == 0 {
                self.cancel.check()?;
            }
            let tuple = src
                .get(t * nc..(t + 1) * nc)
                .ok_or(StructureError::IndexOutOfBounds {
                    index: t,
                    len: array.number_of_tuples(),
                })?;
            values.extend_from_slice(tuple);
        }
        DataArray::from_vec(self.tuple_shape, components, values).map(T::wrap)
    }
}

/// Keeps the voxels inside `region` of image geometry `source`.
///
/// The new geometry keeps the spacing, and its origin moves to the first
/// kept voxel. Every array of the source cell attribute matrix is cropped
/// into the new one under the same name.
pub fn crop_image_geometry(
    ds: &mut DataStructure,
    source: IdType,
    name: &str,
    parent: Option<IdType>,
    region: CropRegion,
    options: &ParallelOptions,
    cancel: &CancelToken,
) -> Result<IdType, StructureError> {
    let image = ds.try_get_data_as::<ImageGeom>(source)?.clone();
    let dims = image.dimensions();
    for axis in 0..3 {
        if region.min[axis] > region.max[axis] || region.max[axis] >= dims[axis] {
            return Err(StructureError::InvalidBounds { axis });
        }
    }
    let spacing = image.spacing();
    let origin = image.origin();
    let new_origin = std::array::from_fn(|d| origin[d] + region.min[d] as f32 * spacing[d]);
    let new_dims = region.dimensions();

    let mut map = Vec::with_capacity(new_dims.iter().product());
    for k in region.min[2]..=region.max[2] {
        for j in region.min[1]..=region.max[1] {
            for i in region.min[0]..=region.max[0] {
                map.push((k * dims[1] + j) * dims[0] + i);
            }
        }
    }
    let target = ImageGeom::new(new_dims, spacing, new_origin)?;
    transfer(ds, &image, target, name, parent, &map, options, cancel)
}

/// Resamples image geometry `source` onto `dimensions` cells covering the
/// same extent. Each new cell takes the value of the source cell nearest to
/// its centre.
pub fn resample_image_geometry(
    ds: &mut DataStructure,
    source: IdType,
    name: &str,
    parent: Option<IdType>,
    dimensions: [usize; 3],
    options: &ParallelOptions,
    cancel: &CancelToken,
) -> Result<IdType, StructureError> {
    let image = ds.try_get_data_as::<ImageGeom>(source)?.clone();
    if dimensions.contains(&0) {
        return Err(StructureError::InvalidDimensions(dimensions));
    }
    let dims = image.dimensions();
    let spacing = image.spacing();
    let new_spacing =
        std::array::from_fn(|d| spacing[d] * dims[d] as f32 / dimensions[d] as f32);

    // Source index along one axis for the centre of target cell `i`.
    let nearest = |d: usize, i: usize| ((2 * i + 1) * dims[d] / (2 * dimensions[d])).min(dims[d] - 1);
    let mut map = Vec::with_capacity(dimensions.iter().product());
    for k in 0..dimensions[2] {
        let sk = nearest(2, k);
        for j in 0..dimensions[1] {
            let sj = nearest(1, j);
            for i in 0..dimensions[0] {
                map.push((sk * dims[1] + sj) * dims[0] + nearest(0, i));
            }
        }
    }
    let target = ImageGeom::new(dimensions, new_spacing, image.origin())?;
    transfer(ds, &image, target, name, parent, &map, options, cancel)
}

#[allow(clippy::too_many_arguments)]
fn transfer(
    ds: &mut DataStructure,
    source: &ImageGeom,
    mut target: ImageGeom,
    name: &str,
    parent: Option<IdType>,
    map: &[usize],
    options: &ParallelOptions,
    cancel: &CancelToken,
) -> Result<IdType, StructureError> {
    target.set_units(source.units());
    let tuple_shape = target.cell_tuple_shape();

    let mut inputs: Vec<(String, &AnyDataArray)> = Vec::new();
    if let Some(am) = source.cell_data_id() {
        for &child in ds.children(am) {
            let Some(object) = ds.get_data(child) else {
                continue;
            };
            match object.as_type::<AnyDataArray>() {
                Some(array) => inputs.push((object.name().to_string(), array)),
                None => log::debug!("skipping non-array `{}` during transfer", object.name()),
            }
        }
    }

    let arrays = run_tasks(options, inputs, cancel, |(array_name, array)| {
        let gathered = execute_array_function(
            array,
            Gather {
                map,
                tuple_shape: tuple_shape.clone(),
                cancel,
            },
        )?;
        Ok((array_name, gathered))
    })?;

    let geom = ds.create_image_geometry(
        name,
        parent,
        target.dimensions(),
        target.spacing(),
        target.origin(),
    )?;
    let count = arrays.len();
    populate(ds, geom, target.units(), arrays)?;
    log::debug!(
        "transferred {count} arrays onto {:?} cells of `{name}`",
        target.dimensions()
    );
    Ok(geom)
}

/// Fills the cell data of the freshly created `geom`; on any failure the
/// whole geometry is removed again.
fn populate(
    ds: &mut DataStructure,
    geom: IdType,
    units: LengthUnit,
    arrays: Vec<(String, AnyDataArray)>,
) -> Result<(), StructureError> {
    let result = (|| -> Result<(), StructureError> {
        let g = ds
            .get_data_as_mut::<ImageGeom>(geom)
            .ok_or(StructureError::MissingObject(geom))?;
        g.set_units(units);
        let am = g.cell_data_id().ok_or(StructureError::MissingObject(geom))?;
        for (array_name, array) in arrays {
            ds.insert(array, &array_name, Some(am))?;
        }
        Ok(())
    })();
    if let Err(e) = &result {
        log::warn!("discarding partially built `{geom}`: {e}");
        ds.remove_data(geom)?;
    }
    result
}
