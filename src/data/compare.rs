//! Element-wise comparison of two arrays, used for exemplar-vs-computed checks.
//!
//! Arrays of different primitive types are never coerced: the comparison is
//! rejected with [`StructureError::MixedTypeComparison`] and logged.

use crate::data::any_array::AnyDataArray;
use crate::data::data_array::DataArray;
use crate::data::element::ArrayElement;
use crate::structure_error::StructureError;

/// Options for [`compare_arrays`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComparisonOptions {
    /// Absolute tolerance applied to floating-point arrays. Integer and
    /// boolean arrays always compare exactly.
    pub tolerance: f64,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

/// Outcome of an element-wise comparison.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayComparison {
    /// Number of elements outside tolerance.
    pub mismatches: usize,
    /// Linear index of the first mismatch.
    pub first_mismatch: Option<usize>,
    /// Largest absolute difference seen.
    pub max_abs_difference: f64,
}

impl ArrayComparison {
    pub fn is_equal(&self) -> bool {
        self.mismatches == 0
    }
}

/// Compare two typed arrays of the same type.
pub fn compare_typed<T: ArrayElement>(
    left: &DataArray<T>,
    right: &DataArray<T>,
    options: &ComparisonOptions,
) -> Result<ArrayComparison, StructureError> {
    if left.component_shape() != right.component_shape() {
        return Err(StructureError::ComponentShapeMismatch {
            expected: left.component_shape().to_vec(),
            found: right.component_shape().to_vec(),
        });
    }
    if left.size() != right.size() {
        return Err(StructureError::ShapeMismatch {
            expected: left.size(),
            found: right.size(),
        });
    }
    let tolerance = if T::DATA_TYPE.is_float() {
        options.tolerance
    } else {
        0.0
    };
    let mut out = ArrayComparison::default();
    for (i, (a, b)) in left.as_slice()?.iter().zip(right.as_slice()?).enumerate() {
        let (a, b) = (a.to_f64(), b.to_f64());
        let diff = if a.is_nan() && b.is_nan() {
            0.0
        } else {
            (a - b).abs()
        };
        if diff.is_nan() || diff > tolerance {
            out.mismatches += 1;
            out.first_mismatch.get_or_insert(i);
        }
        if diff > out.max_abs_difference {
            out.max_abs_difference = diff;
        }
    }
    Ok(out)
}

/// Compare two type-erased arrays; mixed primitive types are rejected.
pub fn compare_arrays(
    left: &AnyDataArray,
    right: &AnyDataArray,
    options: &ComparisonOptions,
) -> Result<ArrayComparison, StructureError> {
    macro_rules! compare_arm {
        ($l:ident, $r:ident; $($tag:ident),*) => {
            match ($l, $r) {
                $((AnyDataArray::$tag(a), AnyDataArray::$tag(b)) => compare_typed(a, b, options),)*
                (a, b) => {
                    log::warn!(
                        "Skipping comparison of arrays with different types: {} vs {}",
                        a.data_type(),
                        b.data_type()
                    );
                    Err(StructureError::MixedTypeComparison {
                        left: a.data_type(),
                        right: b.data_type(),
                    })
                }
            }
        };
    }
    compare_arm!(left, right; Bool, Int8, Int16, Int32, Int64, UInt8, UInt16, UInt32, UInt64, Float32, Float64)
}
