//! `IdType`: an opaque, non-zero handle for objects owned by a
//! [`DataStructure`](crate::structure::DataStructure).
//!
//! Ids are assigned by the structure on insertion and never reused within one
//! structure. Zero is reserved, so `Option<IdType>` costs no extra space; the
//! geometry types rely on this for their many optional array references.

use std::{fmt, num::NonZeroU64};

use static_assertions::assert_eq_size;

/// Identifier of a [`DataObject`](crate::structure::DataObject).
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct IdType(NonZeroU64);

assert_eq_size!(IdType, Option<IdType>);
assert_eq_size!(IdType, u64);

impl IdType {
    /// Creates an id from a raw value.
    ///
    /// # Panics
    ///
    /// Panics if `raw == 0`.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        match NonZeroU64::new(raw) {
            Some(v) => IdType(v),
            None => panic!("IdType must be non-zero"),
        }
    }

    /// Creates an id from a raw value, returning `None` for zero.
    #[inline]
    pub const fn try_new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(IdType(v)),
            None => None,
        }
    }

    /// The `n`-th id handed out by a fresh structure (`n = 0` gives `1`).
    #[inline]
    pub(crate) const fn nth(n: u64) -> Self {
        IdType(NonZeroU64::MIN.saturating_add(n))
    }

    /// Raw integer value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdType({})", self.get())
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
