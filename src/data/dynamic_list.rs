//! `DynamicListArray`: ragged per-index lists in one bulk allocation.
//!
//! Layout is CSR-like: `offsets[i]..offsets[i + 1]` is the slot range
//! reserved for list `i`, and `lengths[i]` counts the slots filled so far.
//! Lists are built in two passes: size every list from a count vector with
//! [`DynamicListArray::from_counts`], then append with
//! [`DynamicListArray::push_entry`], which never writes outside a list's range.

use crate::data::element::ArrayElement;
use crate::debug_invariants::DebugInvariants;
use crate::structure_error::StructureError;

/// Ragged array mapping an index to an ordered list of values.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicListArray<T> {
    offsets: Vec<usize>,
    lengths: Vec<usize>,
    values: Vec<T>,
}

impl<T> Default for DynamicListArray<T> {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            lengths: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: ArrayElement> DynamicListArray<T> {
    /// Reserve `counts[i]` slots for list `i`, all empty.
    pub fn from_counts(counts: &[usize]) -> Result<Self, StructureError> {
        let mut offsets = Vec::new();
        offsets
            .try_reserve_exact(counts.len() + 1)
            .map_err(|_| StructureError::AllocationFailed(counts.len() + 1))?;
        offsets.push(0usize);
        let mut total = 0usize;
        for &c in counts {
            total = total
                .checked_add(c)
                .ok_or(StructureError::AllocationFailed(usize::MAX))?;
            offsets.push(total);
        }
        let mut values = Vec::new();
        values
            .try_reserve_exact(total)
            .map_err(|_| StructureError::AllocationFailed(total))?;
        values.resize(total, T::default());
        Ok(Self {
            offsets,
            lengths: vec![0; counts.len()],
            values,
        })
    }

    /// Build from fully formed lists.
    pub fn from_lists<L: AsRef<[T]>>(lists: &[L]) -> Result<Self, StructureError> {
        let counts: Vec<usize> = lists.iter().map(|l| l.as_ref().len()).collect();
        let mut out = Self::from_counts(&counts)?;
        for (i, list) in lists.iter().enumerate() {
            for &v in list.as_ref() {
                out.push_entry(i, v)?;
            }
        }
        Ok(out)
    }

    /// Rebuild from raw CSR parts, as persisted.
    pub fn from_parts(offsets: Vec<usize>, values: Vec<T>) -> Result<Self, StructureError> {
        if offsets.first() != Some(&0) || offsets.last() != Some(&values.len()) {
            return Err(StructureError::ShapeMismatch {
                expected: values.len(),
                found: offsets.last().copied().unwrap_or(0),
            });
        }
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(StructureError::Persistence(
                "dynamic list offsets are not monotonic".into(),
            ));
        }
        let lengths = offsets.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self {
            offsets,
            lengths,
            values,
        })
    }

    /// Number of lists.
    pub fn number_of_lists(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Slots reserved for list `i`.
    pub fn capacity(&self, i: usize) -> Option<usize> {
        Some(self.offsets.get(i + 1)? - self.offsets[i])
    }

    /// Entries currently stored in list `i`.
    pub fn number_of_elements(&self, i: usize) -> Option<usize> {
        self.lengths.get(i).copied()
    }

    /// Sum of all list lengths.
    pub fn total_entries(&self) -> usize {
        self.lengths.iter().sum()
    }

    /// True when every list is completely filled.
    pub fn is_complete(&self) -> bool {
        (0..self.lengths.len()).all(|i| self.capacity(i) == Some(self.lengths[i]))
    }

    /// Append `value` to list `i`.
    pub fn push_entry(&mut self, i: usize, value: T) -> Result<(), StructureError> {
        let n = self.lengths.len();
        let cap = self
            .capacity(i)
            .ok_or(StructureError::IndexOutOfBounds { index: i, len: n })?;
        let len = self.lengths[i];
        if len >= cap {
            return Err(StructureError::IndexOutOfBounds {
                index: len,
                len: cap,
            });
        }
        self.values[self.offsets[i] + len] = value;
        self.lengths[i] += 1;
        Ok(())
    }

    /// Filled entries of list `i`.
    pub fn element_list(&self, i: usize) -> Option<&[T]> {
        let len = *self.lengths.get(i)?;
        let start = self.offsets[i];
        Some(&self.values[start..start + len])
    }

    /// Replace list `i`. Lists that outgrow their reserved range trigger a rebuild.
    pub fn set_element_list(&mut self, i: usize, list: &[T]) -> Result<(), StructureError> {
        let n = self.lengths.len();
        let cap = self
            .capacity(i)
            .ok_or(StructureError::IndexOutOfBounds { index: i, len: n })?;
        if list.len() <= cap {
            let start = self.offsets[i];
            self.values[start..start + list.len()].copy_from_slice(list);
            self.lengths[i] = list.len();
            return Ok(());
        }
        let lists: Vec<Vec<T>> = (0..n)
            .map(|j| {
                if j == i {
                    list.to_vec()
                } else {
                    self.element_list(j).map(<[T]>::to_vec).unwrap_or_default()
                }
            })
            .collect();
        *self = Self::from_lists(&lists)?;
        Ok(())
    }

    /// Iterate over filled lists in index order.
    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.lengths.len()).filter_map(move |i| self.element_list(i))
    }

    /// Compacted CSR offsets and values (filled entries only).
    pub fn to_parts(&self) -> (Vec<usize>, Vec<T>) {
        let mut offsets = Vec::with_capacity(self.lengths.len() + 1);
        let mut values = Vec::with_capacity(self.total_entries());
        offsets.push(0);
        for list in self.iter() {
            values.extend_from_slice(list);
            offsets.push(values.len());
        }
        (offsets, values)
    }
}

impl<T: ArrayElement> DebugInvariants for DynamicListArray<T> {
    fn invariant_scope(&self) -> &'static str {
        "DynamicListArray"
    }

    /// Offsets start at zero, never decrease and end at the slot count;
    /// no list holds more entries than its slots.
    fn validate_invariants(&self) -> Result<(), StructureError> {
        if self.offsets.len() != self.lengths.len() + 1 {
            return Err(StructureError::ShapeMismatch {
                expected: self.lengths.len() + 1,
                found: self.offsets.len(),
            });
        }
        if self.offsets.first() != Some(&0) || self.offsets.last() != Some(&self.values.len()) {
            return Err(StructureError::ShapeMismatch {
                expected: self.values.len(),
                found: self.offsets.last().copied().unwrap_or(0),
            });
        }
        for (i, w) in self.offsets.windows(2).enumerate() {
            let slots = w[1].checked_sub(w[0]).ok_or(StructureError::IndexOutOfBounds {
                index: w[1],
                len: w[0],
            })?;
            if self.lengths[i] > slots {
                return Err(StructureError::IndexOutOfBounds {
                    index: self.lengths[i],
                    len: slots,
                });
            }
        }
        Ok(())
    }
}
