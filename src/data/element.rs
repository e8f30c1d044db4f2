//! `ArrayElement`: the bound shared by every primitive an array can hold.
//!
//! The trait ties a Rust primitive to its [`DataType`] tag and to its variant
//! of [`AnyDataArray`], so typed lookups into a type-erased array are a single
//! `match` and never a cast.

use std::fmt::Debug;

use crate::data::any_array::AnyDataArray;
use crate::data::data_array::DataArray;
use crate::data::data_type::DataType;
use crate::structure_error::StructureError;

/// Primitive element type of a [`DataArray`].
pub trait ArrayElement:
    Copy + Default + PartialEq + PartialOrd + Debug + Send + Sync + 'static
{
    /// Type tag for this concrete type.
    const DATA_TYPE: DataType;

    /// Wrap a typed array into the tagged container.
    fn wrap(array: DataArray<Self>) -> AnyDataArray;
    /// Borrow a typed array if the tag matches.
    fn unwrap(array: &AnyDataArray) -> Option<&DataArray<Self>>;
    /// Mutably borrow a typed array if the tag matches.
    fn unwrap_mut(array: &mut AnyDataArray) -> Option<&mut DataArray<Self>>;

    /// Lossy conversion used by comparisons and geometry math.
    fn to_f64(self) -> f64;
    /// Saturating conversion back from `f64`.
    fn from_f64(value: f64) -> Self;

    /// Append the native-endian byte image of `values` to `out`.
    fn extend_bytes(values: &[Self], out: &mut Vec<u8>);
    /// Decode values previously produced by [`ArrayElement::extend_bytes`].
    fn from_bytes(bytes: &[u8]) -> Result<Vec<Self>, StructureError>;
}

macro_rules! impl_numeric_element {
    ($t:ty, $tag:ident) => {
        impl ArrayElement for $t {
            const DATA_TYPE: DataType = DataType::$tag;

            fn wrap(array: DataArray<Self>) -> AnyDataArray {
                AnyDataArray::$tag(array)
            }

            fn unwrap(array: &AnyDataArray) -> Option<&DataArray<Self>> {
                if let AnyDataArray::$tag(a) = array { Some(a) } else { None }
            }

            fn unwrap_mut(array: &mut AnyDataArray) -> Option<&mut DataArray<Self>> {
                if let AnyDataArray::$tag(a) = array { Some(a) } else { None }
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $t
            }

            fn extend_bytes(values: &[Self], out: &mut Vec<u8>) {
                out.extend_from_slice(bytemuck::cast_slice(values));
            }

            fn from_bytes(bytes: &[u8]) -> Result<Vec<Self>, StructureError> {
                let width = std::mem::size_of::<$t>();
                if bytes.len() % width != 0 {
                    return Err(StructureError::Persistence(format!(
                        "{} payload of {} bytes is not a multiple of {width}",
                        DataType::$tag,
                        bytes.len()
                    )));
                }
                Ok(bytemuck::pod_collect_to_vec::<u8, $t>(bytes))
            }
        }
    };
}

impl_numeric_element!(i8, Int8);
impl_numeric_element!(i16, Int16);
impl_numeric_element!(i32, Int32);
impl_numeric_element!(i64, Int64);
impl_numeric_element!(u8, UInt8);
impl_numeric_element!(u16, UInt16);
impl_numeric_element!(u32, UInt32);
impl_numeric_element!(u64, UInt64);
impl_numeric_element!(f32, Float32);
impl_numeric_element!(f64, Float64);

impl ArrayElement for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn wrap(array: DataArray<Self>) -> AnyDataArray {
        AnyDataArray::Bool(array)
    }

    fn unwrap(array: &AnyDataArray) -> Option<&DataArray<Self>> {
        if let AnyDataArray::Bool(a) = array { Some(a) } else { None }
    }

    fn unwrap_mut(array: &mut AnyDataArray) -> Option<&mut DataArray<Self>> {
        if let AnyDataArray::Bool(a) = array { Some(a) } else { None }
    }

    #[inline]
    fn to_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value != 0.0
    }

    fn extend_bytes(values: &[Self], out: &mut Vec<u8>) {
        out.extend(values.iter().map(|&b| u8::from(b)));
    }

    fn from_bytes(bytes: &[u8]) -> Result<Vec<Self>, StructureError> {
        Ok(bytes.iter().map(|&b| b != 0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_images_decode() {
        let mut buf = Vec::new();
        f32::extend_bytes(&[1.5, -2.0], &mut buf);
        assert_eq!(buf.len(), 8);
        assert_eq!(f32::from_bytes(&buf).unwrap(), vec![1.5, -2.0]);
        assert!(u32::from_bytes(&buf[..7]).is_err());

        let mut bools = Vec::new();
        bool::extend_bytes(&[true, false, true], &mut bools);
        assert_eq!(bools, vec![1, 0, 1]);
        assert_eq!(bool::from_bytes(&bools).unwrap(), vec![true, false, true]);
    }

    #[test]
    fn float_conversions_saturate() {
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(i8::from_f64(-300.0), -128);
        assert!(bool::from_f64(2.0));
    }
}
