//! Pluggable storage formats for data array buffers.
//!
//! A store owns the flat `tuples × components` buffer together with its shape.
//! [`VecDataStore`] keeps values in memory; [`EmptyDataStore`] carries shape
//! metadata only and is what preflight reads produce so that validation can
//! run against very large files without materialising them.

use core::fmt::{self, Debug};

use crate::data::element::ArrayElement;
use crate::structure_error::StructureError;

/// Storage format tag reported by a store.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StoreFormat {
    /// Values held in a contiguous in-process buffer.
    InMemory,
    /// Shape only; no values are available.
    Empty,
}

/// Contiguous, shaped storage for `T`.
pub trait DataStore<T: ArrayElement>: Debug + Send + Sync {
    fn format(&self) -> StoreFormat;

    fn tuple_shape(&self) -> &[usize];

    fn component_shape(&self) -> &[usize];

    fn number_of_tuples(&self) -> usize {
        self.tuple_shape().iter().product()
    }

    fn number_of_components(&self) -> usize {
        self.component_shape().iter().product()
    }

    /// Always `number_of_tuples() * number_of_components()`.
    fn size(&self) -> usize {
        self.number_of_tuples() * self.number_of_components()
    }

    /// Entire read-only buffer.
    fn as_slice(&self) -> Result<&[T], StructureError>;

    /// Entire mutable buffer.
    fn as_mut_slice(&mut self) -> Result<&mut [T], StructureError>;

    /// Change the tuple shape, keeping the component shape.
    ///
    /// Values in the retained tuple prefix are preserved; new tuples are set to `fill`.
    fn reshape_tuples(&mut self, tuple_shape: &[usize], fill: T) -> Result<(), StructureError>;

    /// Secure whatever a later `reshape_tuples(tuple_shape, _)` needs, so
    /// that call cannot fail. Leaves the contents unchanged.
    fn reserve_tuples(&mut self, tuple_shape: &[usize]) -> Result<(), StructureError> {
        checked_len(tuple_shape, self.component_shape()).map(|_| ())
    }

    /// Boxed deep copy.
    fn clone_store(&self) -> Box<dyn DataStore<T>>;
}

/// `Vec`-backed store (default).
#[derive(Clone)]
pub struct VecDataStore<T> {
    data: Vec<T>,
    tuple_shape: Vec<usize>,
    component_shape: Vec<usize>,
}

impl<T> Debug for VecDataStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecDataStore")
            .field("tuple_shape", &self.tuple_shape)
            .field("component_shape", &self.component_shape)
            .field("len", &self.data.len())
            .finish()
    }
}

impl<T: ArrayElement> VecDataStore<T> {
    /// Allocate a store filled with `fill`.
    pub fn with_fill(
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        fill: T,
    ) -> Result<Self, StructureError> {
        let len = checked_len(&tuple_shape, &component_shape)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| StructureError::AllocationFailed(len))?;
        data.resize(len, fill);
        Ok(Self {
            data,
            tuple_shape,
            component_shape,
        })
    }

    /// Wrap an existing buffer; its length must match the shape.
    pub fn from_vec(
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self, StructureError> {
        let len = checked_len(&tuple_shape, &component_shape)?;
        if data.len() != len {
            return Err(StructureError::ShapeMismatch {
                expected: len,
                found: data.len(),
            });
        }
        Ok(Self {
            data,
            tuple_shape,
            component_shape,
        })
    }

    pub fn into_inner(self) -> Vec<T> {
        self.data
    }
}

impl<T: ArrayElement> DataStore<T> for VecDataStore<T> {
    fn format(&self) -> StoreFormat {
        StoreFormat::InMemory
    }

    fn tuple_shape(&self) -> &[usize] {
        &self.tuple_shape
    }

    fn component_shape(&self) -> &[usize] {
        &self.component_shape
    }

    fn as_slice(&self) -> Result<&[T], StructureError> {
        Ok(&self.data)
    }

    fn as_mut_slice(&mut self) -> Result<&mut [T], StructureError> {
        Ok(&mut self.data)
    }

    fn reshape_tuples(&mut self, tuple_shape: &[usize], fill: T) -> Result<(), StructureError> {
        let new_len = checked_len(tuple_shape, &self.component_shape)?;
        if new_len > self.data.len() {
            self.data
                .try_reserve_exact(new_len - self.data.len())
                .map_err(|_| StructureError::AllocationFailed(new_len))?;
        }
        self.data.resize(new_len, fill);
        self.tuple_shape = tuple_shape.to_vec();
        Ok(())
    }

    fn reserve_tuples(&mut self, tuple_shape: &[usize]) -> Result<(), StructureError> {
        let new_len = checked_len(tuple_shape, &self.component_shape)?;
        if new_len > self.data.len() {
            self.data
                .try_reserve_exact(new_len - self.data.len())
                .map_err(|_| StructureError::AllocationFailed(new_len))?;
        }
        Ok(())
    }

    fn clone_store(&self) -> Box<dyn DataStore<T>> {
        Box::new(self.clone())
    }
}

/// Shape-only store produced by preflight reads.
#[derive(Clone, Debug)]
pub struct EmptyDataStore {
    tuple_shape: Vec<usize>,
    component_shape: Vec<usize>,
}

impl EmptyDataStore {
    pub fn new(tuple_shape: Vec<usize>, component_shape: Vec<usize>) -> Self {
        Self {
            tuple_shape,
            component_shape,
        }
    }
}

impl<T: ArrayElement> DataStore<T> for EmptyDataStore {
    fn format(&self) -> StoreFormat {
        StoreFormat::Empty
    }

    fn tuple_shape(&self) -> &[usize] {
        &self.tuple_shape
    }

    fn component_shape(&self) -> &[usize] {
        &self.component_shape
    }

    fn as_slice(&self) -> Result<&[T], StructureError> {
        Err(StructureError::NotMaterialized)
    }

    fn as_mut_slice(&mut self) -> Result<&mut [T], StructureError> {
        Err(StructureError::NotMaterialized)
    }

    fn reshape_tuples(&mut self, tuple_shape: &[usize], _fill: T) -> Result<(), StructureError> {
        checked_len(tuple_shape, &self.component_shape)?;
        self.tuple_shape = tuple_shape.to_vec();
        Ok(())
    }

    fn clone_store(&self) -> Box<dyn DataStore<T>> {
        Box::new(self.clone())
    }
}

/// `product(tuple_shape) * product(component_shape)`, guarding overflow.
pub(crate) fn checked_len(
    tuple_shape: &[usize],
    component_shape: &[usize],
) -> Result<usize, StructureError> {
    tuple_shape
        .iter()
        .chain(component_shape)
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(StructureError::AllocationFailed(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_store_reshape_preserves_prefix() {
        let mut s = VecDataStore::from_vec(vec![3], vec![2], vec![1, 2, 3, 4, 5, 6]).unwrap();
        s.reshape_tuples(&[2], 0).unwrap();
        assert_eq!(s.as_slice().unwrap(), &[1, 2, 3, 4]);
        s.reshape_tuples(&[4], 9).unwrap();
        assert_eq!(s.as_slice().unwrap(), &[1, 2, 3, 4, 9, 9, 9, 9]);
        assert_eq!(s.size(), 8);
    }

    #[test]
    fn reserve_keeps_contents() {
        let mut s = VecDataStore::from_vec(vec![2], vec![1], vec![5u8, 6]).unwrap();
        s.reserve_tuples(&[64]).unwrap();
        assert_eq!(s.as_slice().unwrap(), &[5, 6]);
        assert_eq!(s.tuple_shape(), &[2]);
        assert!(s.reserve_tuples(&[usize::MAX, 2]).is_err());
    }

    #[test]
    fn from_vec_checks_length() {
        let err = VecDataStore::from_vec(vec![2], vec![3], vec![0u8; 5]).unwrap_err();
        assert_eq!(
            err,
            StructureError::ShapeMismatch {
                expected: 6,
                found: 5
            }
        );
    }

    #[test]
    fn empty_store_has_shape_but_no_values() {
        let mut s = EmptyDataStore::new(vec![10, 2], vec![3]);
        assert_eq!(DataStore::<f32>::size(&s), 60);
        assert_eq!(
            DataStore::<f32>::as_slice(&s).unwrap_err(),
            StructureError::NotMaterialized
        );
        DataStore::<f32>::reshape_tuples(&mut s, &[4], 0.0).unwrap();
        assert_eq!(DataStore::<f32>::number_of_tuples(&s), 4);
    }

    #[test]
    fn overflowing_shape_is_an_allocation_failure() {
        let err = VecDataStore::<u8>::with_fill(vec![usize::MAX, 2], vec![1], 0).unwrap_err();
        assert!(matches!(err, StructureError::AllocationFailed(_)));
    }
}
