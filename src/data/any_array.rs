//! Tagged, type-erased data array over the closed primitive set.

use crate::data::data_array::DataArray;
use crate::data::data_type::DataType;
use crate::data::element::ArrayElement;
use crate::data::store::StoreFormat;
use crate::debug_invariants::DebugInvariants;
use crate::structure_error::StructureError;

/// A [`DataArray`] of any supported primitive type.
#[derive(Clone, Debug)]
pub enum AnyDataArray {
    Bool(DataArray<bool>),
    Int8(DataArray<i8>),
    Int16(DataArray<i16>),
    Int32(DataArray<i32>),
    Int64(DataArray<i64>),
    UInt8(DataArray<u8>),
    UInt16(DataArray<u16>),
    UInt32(DataArray<u32>),
    UInt64(DataArray<u64>),
    Float32(DataArray<f32>),
    Float64(DataArray<f64>),
}

/// Expand `$body` once per variant with `$arr` bound to the typed array.
#[macro_export]
macro_rules! with_any_array {
    ($any:expr, $arr:ident => $body:expr) => {
        match $any {
            $crate::data::any_array::AnyDataArray::Bool($arr) => $body,
            $crate::data::any_array::AnyDataArray::Int8($arr) => $body,
            $crate::data::any_array::AnyDataArray::Int16($arr) => $body,
            $crate::data::any_array::AnyDataArray::Int32($arr) => $body,
            $crate::data::any_array::AnyDataArray::Int64($arr) => $body,
            $crate::data::any_array::AnyDataArray::UInt8($arr) => $body,
            $crate::data::any_array::AnyDataArray::UInt16($arr) => $body,
            $crate::data::any_array::AnyDataArray::UInt32($arr) => $body,
            $crate::data::any_array::AnyDataArray::UInt64($arr) => $body,
            $crate::data::any_array::AnyDataArray::Float32($arr) => $body,
            $crate::data::any_array::AnyDataArray::Float64($arr) => $body,
        }
    };
}

impl AnyDataArray {
    /// Allocate a fill-initialised array of the given runtime type.
    pub fn new(
        data_type: DataType,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
    ) -> Result<Self, StructureError> {
        struct Create {
            tuple_shape: Vec<usize>,
            component_shape: Vec<usize>,
        }
        impl crate::data::dispatch::DataFunction for Create {
            type Output = Result<AnyDataArray, StructureError>;
            fn call<T: ArrayElement>(self) -> Self::Output {
                DataArray::<T>::new(self.tuple_shape, self.component_shape, T::default())
                    .map(T::wrap)
            }
        }
        crate::data::dispatch::execute_data_function(
            data_type,
            Create {
                tuple_shape,
                component_shape,
            },
        )
    }

    /// Shape-only array of the given runtime type.
    pub fn empty(data_type: DataType, tuple_shape: Vec<usize>, component_shape: Vec<usize>) -> Self {
        struct Empty {
            tuple_shape: Vec<usize>,
            component_shape: Vec<usize>,
        }
        impl crate::data::dispatch::DataFunction for Empty {
            type Output = AnyDataArray;
            fn call<T: ArrayElement>(self) -> Self::Output {
                T::wrap(DataArray::<T>::empty(self.tuple_shape, self.component_shape))
            }
        }
        crate::data::dispatch::execute_data_function(
            data_type,
            Empty {
                tuple_shape,
                component_shape,
            },
        )
    }

    pub fn data_type(&self) -> DataType {
        with_any_array!(self, a => a.data_type())
    }

    pub fn store_format(&self) -> StoreFormat {
        with_any_array!(self, a => a.store_format())
    }

    pub fn is_materialized(&self) -> bool {
        with_any_array!(self, a => a.is_materialized())
    }

    pub fn tuple_shape(&self) -> &[usize] {
        with_any_array!(self, a => a.tuple_shape())
    }

    pub fn component_shape(&self) -> &[usize] {
        with_any_array!(self, a => a.component_shape())
    }

    pub fn number_of_tuples(&self) -> usize {
        with_any_array!(self, a => a.number_of_tuples())
    }

    pub fn number_of_components(&self) -> usize {
        with_any_array!(self, a => a.number_of_components())
    }

    pub fn size(&self) -> usize {
        with_any_array!(self, a => a.size())
    }

    pub fn generation(&self) -> u64 {
        with_any_array!(self, a => a.generation())
    }

    pub fn reshape_tuples(&mut self, tuple_shape: &[usize]) -> Result<(), StructureError> {
        with_any_array!(self, a => a.reshape_tuples(tuple_shape))
    }

    pub fn reserve_tuples(&mut self, tuple_shape: &[usize]) -> Result<(), StructureError> {
        with_any_array!(self, a => a.reserve_tuples(tuple_shape))
    }

    /// Copy whole tuples from an array of the same type.
    pub fn copy_tuples_from(
        &mut self,
        src: &AnyDataArray,
        src_tuple: usize,
        dst_tuple: usize,
        count: usize,
    ) -> Result<(), StructureError> {
        macro_rules! copy_arm {
            ($dst:ident, $src:ident; $($tag:ident),*) => {
                match ($dst, $src) {
                    $((AnyDataArray::$tag(d), AnyDataArray::$tag(s)) => {
                        d.copy_tuples_from(s, src_tuple, dst_tuple, count)
                    })*
                    (d, s) => Err(StructureError::DataTypeMismatch {
                        expected: d.data_type(),
                        found: s.data_type(),
                    }),
                }
            };
        }
        let dst = self;
        copy_arm!(dst, src; Bool, Int8, Int16, Int32, Int64, UInt8, UInt16, UInt32, UInt64, Float32, Float64)
    }

    /// Fill-initialised array with this array's type and component shape.
    pub fn like(&self, tuple_shape: Vec<usize>) -> Result<AnyDataArray, StructureError> {
        AnyDataArray::new(
            self.data_type(),
            tuple_shape,
            self.component_shape().to_vec(),
        )
    }

    /// Borrow as a typed array.
    pub fn as_typed<T: ArrayElement>(&self) -> Option<&DataArray<T>> {
        T::unwrap(self)
    }

    /// Mutably borrow as a typed array.
    pub fn as_typed_mut<T: ArrayElement>(&mut self) -> Option<&mut DataArray<T>> {
        T::unwrap_mut(self)
    }

    /// Value at a linear index as `f64`.
    pub fn value_as_f64(&self, index: usize) -> Result<f64, StructureError> {
        with_any_array!(self, a => a.at(index).map(ArrayElement::to_f64))
    }

    /// Native-endian byte image of the values.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StructureError> {
        with_any_array!(self, a => {
            let values = a.as_slice()?;
            let mut out = Vec::with_capacity(values.len() * a.data_type().size_of());
            ArrayElement::extend_bytes(values, &mut out);
            Ok(out)
        })
    }

    /// Rebuild an array from its type tag, shape and byte image.
    pub fn from_bytes(
        data_type: DataType,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        bytes: &[u8],
    ) -> Result<Self, StructureError> {
        struct Decode<'a> {
            tuple_shape: Vec<usize>,
            component_shape: Vec<usize>,
            bytes: &'a [u8],
        }
        impl crate::data::dispatch::DataFunction for Decode<'_> {
            type Output = Result<AnyDataArray, StructureError>;
            fn call<T: ArrayElement>(self) -> Self::Output {
                let values = T::from_bytes(self.bytes)?;
                DataArray::<T>::from_vec(self.tuple_shape, self.component_shape, values)
                    .map(T::wrap)
            }
        }
        crate::data::dispatch::execute_data_function(
            data_type,
            Decode {
                tuple_shape,
                component_shape,
                bytes,
            },
        )
    }
}

impl DebugInvariants for AnyDataArray {
    fn invariant_scope(&self) -> &'static str {
        "DataArray"
    }

    fn validate_invariants(&self) -> Result<(), StructureError> {
        with_any_array!(self, a => a.validate_invariants())
    }
}

impl<T: ArrayElement> From<DataArray<T>> for AnyDataArray {
    fn from(array: DataArray<T>) -> Self {
        T::wrap(array)
    }
}
