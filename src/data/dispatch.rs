//! Generic numeric-type dispatch.
//!
//! The primitive type is selected once through a `match` on the [`DataType`]
//! tag, and the generic body of a [`DataFunction`] (or [`ArrayFunction`]) is
//! monomorphised per type. Per-element loops inside the body therefore run on
//! concrete slices with no dynamic dispatch.

use crate::data::any_array::AnyDataArray;
use crate::data::data_array::DataArray;
use crate::data::data_type::DataType;
use crate::data::element::ArrayElement;

/// Operation instantiated per primitive type.
pub trait DataFunction {
    type Output;

    fn call<T: ArrayElement>(self) -> Self::Output;
}

/// Run `f` with `T` bound to the primitive named by `data_type`.
pub fn execute_data_function<F: DataFunction>(data_type: DataType, f: F) -> F::Output {
    match data_type {
        DataType::Bool => f.call::<bool>(),
        DataType::Int8 => f.call::<i8>(),
        DataType::Int16 => f.call::<i16>(),
        DataType::Int32 => f.call::<i32>(),
        DataType::Int64 => f.call::<i64>(),
        DataType::UInt8 => f.call::<u8>(),
        DataType::UInt16 => f.call::<u16>(),
        DataType::UInt32 => f.call::<u32>(),
        DataType::UInt64 => f.call::<u64>(),
        DataType::Float32 => f.call::<f32>(),
        DataType::Float64 => f.call::<f64>(),
    }
}

/// Read-only operation over a typed array.
pub trait ArrayFunction {
    type Output;

    fn call<T: ArrayElement>(self, array: &DataArray<T>) -> Self::Output;
}

/// Mutating operation over a typed array.
pub trait ArrayFunctionMut {
    type Output;

    fn call<T: ArrayElement>(self, array: &mut DataArray<T>) -> Self::Output;
}

/// Run `f` on the concrete array inside `array`.
pub fn execute_array_function<F: ArrayFunction>(array: &AnyDataArray, f: F) -> F::Output {
    crate::with_any_array!(array, a => f.call(a))
}

/// Run `f` on the concrete array inside `array`, mutably.
pub fn execute_array_function_mut<F: ArrayFunctionMut>(
    array: &mut AnyDataArray,
    f: F,
) -> F::Output {
    crate::with_any_array!(array, a => f.call(a))
}
