//! `DataArray<T>`: a dense, typed `tuples × components` buffer.
//!
//! The array owns a boxed [`DataStore`] plus two pieces of bookkeeping:
//! the fill value used for newly materialised tuples (the creation fill, or
//! the value of the most recent [`DataArray::fill`]), and a generation counter
//! that increases on every mutable access. Geometries compare generations to
//! decide whether a cached derived array is still valid.

use std::fmt;

use crate::data::data_type::DataType;
use crate::data::element::ArrayElement;
use crate::data::store::{DataStore, EmptyDataStore, StoreFormat, VecDataStore, checked_len};
use crate::debug_invariants::DebugInvariants;
use crate::structure_error::StructureError;

/// Typed, shaped numeric buffer.
pub struct DataArray<T: ArrayElement> {
    store: Box<dyn DataStore<T>>,
    fill_value: T,
    generation: u64,
}

impl<T: ArrayElement> Clone for DataArray<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone_store(),
            fill_value: self.fill_value,
            generation: self.generation,
        }
    }
}

impl<T: ArrayElement> fmt::Debug for DataArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataArray")
            .field("data_type", &T::DATA_TYPE)
            .field("store", &self.store)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T: ArrayElement> DataArray<T> {
    /// Allocate an in-memory array with every value set to `fill`.
    pub fn new(
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        fill: T,
    ) -> Result<Self, StructureError> {
        let store = VecDataStore::with_fill(tuple_shape, component_shape, fill)?;
        Ok(Self::from_store(Box::new(store), fill))
    }

    /// Convenience for a one-dimensional tuple shape.
    pub fn with_tuples(
        num_tuples: usize,
        num_components: usize,
        fill: T,
    ) -> Result<Self, StructureError> {
        Self::new(vec![num_tuples], vec![num_components], fill)
    }

    /// Wrap existing values; `data.len()` must equal the shape's size.
    pub fn from_vec(
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self, StructureError> {
        let store = VecDataStore::from_vec(tuple_shape, component_shape, data)?;
        Ok(Self::from_store(Box::new(store), T::default()))
    }

    /// Shape-only array (preflight).
    pub fn empty(tuple_shape: Vec<usize>, component_shape: Vec<usize>) -> Self {
        Self::from_store(
            Box::new(EmptyDataStore::new(tuple_shape, component_shape)),
            T::default(),
        )
    }

    pub fn from_store(store: Box<dyn DataStore<T>>, fill_value: T) -> Self {
        Self {
            store,
            fill_value,
            generation: 0,
        }
    }

    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    pub fn store_format(&self) -> StoreFormat {
        self.store.format()
    }

    pub fn is_materialized(&self) -> bool {
        self.store.format() != StoreFormat::Empty
    }

    pub fn tuple_shape(&self) -> &[usize] {
        self.store.tuple_shape()
    }

    pub fn component_shape(&self) -> &[usize] {
        self.store.component_shape()
    }

    pub fn number_of_tuples(&self) -> usize {
        self.store.number_of_tuples()
    }

    pub fn number_of_components(&self) -> usize {
        self.store.number_of_components()
    }

    /// Total element count: tuples × components.
    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn fill_value(&self) -> T {
        self.fill_value
    }

    /// Monotonic counter bumped by every mutable access.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn as_slice(&self) -> Result<&[T], StructureError> {
        self.store.as_slice()
    }

    /// Mutable view of all values. Counts as a mutation.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T], StructureError> {
        self.generation += 1;
        self.store.as_mut_slice()
    }

    /// Value at a linear index.
    pub fn at(&self, index: usize) -> Result<T, StructureError> {
        let data = self.as_slice()?;
        data.get(index)
            .copied()
            .ok_or(StructureError::IndexOutOfBounds {
                index,
                len: data.len(),
            })
    }

    /// Value at a linear index, `None` if out of range or not materialised.
    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().ok()?.get(index).copied()
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), StructureError> {
        let data = self.as_mut_slice()?;
        let len = data.len();
        let slot = data
            .get_mut(index)
            .ok_or(StructureError::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Value of component `component` of tuple `tuple`.
    pub fn component(&self, tuple: usize, component: usize) -> Result<T, StructureError> {
        let index = self.linear_index(tuple, component)?;
        self.at(index)
    }

    pub fn set_component(
        &mut self,
        tuple: usize,
        component: usize,
        value: T,
    ) -> Result<(), StructureError> {
        let index = self.linear_index(tuple, component)?;
        self.set(index, value)
    }

    /// All components of one tuple.
    pub fn tuple(&self, tuple: usize) -> Result<&[T], StructureError> {
        let nc = self.number_of_components();
        let nt = self.number_of_tuples();
        if tuple >= nt {
            return Err(StructureError::IndexOutOfBounds {
                index: tuple,
                len: nt,
            });
        }
        Ok(&self.as_slice()?[tuple * nc..(tuple + 1) * nc])
    }

    pub fn set_tuple(&mut self, tuple: usize, values: &[T]) -> Result<(), StructureError> {
        let nc = self.number_of_components();
        let nt = self.number_of_tuples();
        if values.len() != nc {
            return Err(StructureError::ShapeMismatch {
                expected: nc,
                found: values.len(),
            });
        }
        if tuple >= nt {
            return Err(StructureError::IndexOutOfBounds {
                index: tuple,
                len: nt,
            });
        }
        self.as_mut_slice()?[tuple * nc..(tuple + 1) * nc].copy_from_slice(values);
        Ok(())
    }

    /// Set every value to `value`; it becomes the fill for future growth.
    pub fn fill(&mut self, value: T) -> Result<(), StructureError> {
        self.as_mut_slice()?.fill(value);
        self.fill_value = value;
        Ok(())
    }

    /// Grow or shrink along the tuple dimension only (1-D tuple shape result).
    pub fn resize_tuples(&mut self, num_tuples: usize) -> Result<(), StructureError> {
        self.reshape_tuples(&[num_tuples])
    }

    /// Replace the tuple shape; retained tuples keep their values.
    pub fn reshape_tuples(&mut self, tuple_shape: &[usize]) -> Result<(), StructureError> {
        self.generation += 1;
        self.store.reshape_tuples(tuple_shape, self.fill_value)
    }

    /// Prepare a later `reshape_tuples(tuple_shape)` so it cannot fail.
    pub fn reserve_tuples(&mut self, tuple_shape: &[usize]) -> Result<(), StructureError> {
        self.store.reserve_tuples(tuple_shape)
    }

    /// Copy `count` tuples from `src` starting at `src_tuple` into `self` at `dst_tuple`.
    pub fn copy_tuples_from(
        &mut self,
        src: &DataArray<T>,
        src_tuple: usize,
        dst_tuple: usize,
        count: usize,
    ) -> Result<(), StructureError> {
        let nc = self.number_of_components();
        if src.number_of_components() != nc {
            return Err(StructureError::ComponentShapeMismatch {
                expected: self.component_shape().to_vec(),
                found: src.component_shape().to_vec(),
            });
        }
        let src_data = src.as_slice()?;
        let src_range = tuple_range(src_tuple, count, nc, src_data.len())?;
        let chunk = src_data
            .get(src_range.clone())
            .ok_or(StructureError::IndexOutOfBounds {
                index: src_range.end,
                len: src_data.len(),
            })?;
        let dst = self.as_mut_slice()?;
        let len = dst.len();
        let dst_range = tuple_range(dst_tuple, count, nc, len)?;
        let end = dst_range.end;
        dst.get_mut(dst_range)
            .ok_or(StructureError::IndexOutOfBounds { index: end, len })?
            .copy_from_slice(chunk);
        Ok(())
    }

    /// New array with the same shape and type and the given fill.
    pub fn like(&self, tuple_shape: Vec<usize>, fill: T) -> Result<Self, StructureError> {
        Self::new(tuple_shape, self.component_shape().to_vec(), fill)
    }

    fn linear_index(&self, tuple: usize, component: usize) -> Result<usize, StructureError> {
        let nc = self.number_of_components();
        if component >= nc {
            return Err(StructureError::IndexOutOfBounds {
                index: component,
                len: nc,
            });
        }
        tuple
            .checked_mul(nc)
            .and_then(|i| i.checked_add(component))
            .ok_or(StructureError::IndexOutOfBounds {
                index: tuple,
                len: self.number_of_tuples(),
            })
    }
}

impl<T: ArrayElement> DebugInvariants for DataArray<T> {
    fn invariant_scope(&self) -> &'static str {
        "DataArray"
    }

    /// A materialised buffer holds exactly `tuples × components` values.
    fn validate_invariants(&self) -> Result<(), StructureError> {
        let expected = checked_len(self.tuple_shape(), self.component_shape())?;
        if self.is_materialized() {
            let found = self.store.as_slice()?.len();
            if found != expected {
                return Err(StructureError::ShapeMismatch { expected, found });
            }
        }
        Ok(())
    }
}

/// Value range of `count` tuples from `first`, guarding overflow.
fn tuple_range(
    first: usize,
    count: usize,
    nc: usize,
    len: usize,
) -> Result<core::ops::Range<usize>, StructureError> {
    let overflow = StructureError::IndexOutOfBounds { index: first, len };
    let start = first.checked_mul(nc).ok_or(overflow.clone())?;
    let end = first
        .checked_add(count)
        .and_then(|e| e.checked_mul(nc))
        .ok_or(overflow)?;
    Ok(start..end)
}
