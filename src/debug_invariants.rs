//! Invariant checking for the data model.
//!
//! [`DebugInvariants::validate_invariants`] is always available and reports
//! the first broken rule, e.g. a dangling parent link, an attribute matrix
//! member with the wrong tuple count or a list whose entries overrun their
//! slots. Mutating operations call [`DebugInvariants::debug_assert_invariants`]
//! afterwards, which runs the same checks in debug builds or with the
//! `strict-invariants` feature and panics on failure.

use crate::structure_error::StructureError;

pub trait DebugInvariants {
    /// Label used in failure reports.
    fn invariant_scope(&self) -> &'static str;

    /// First violated invariant, if any.
    fn validate_invariants(&self) -> Result<(), StructureError>;

    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), self.invariant_scope());
    }
}

/// Panics with `scope` when `check` fails and invariant checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $scope:expr) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants"))]
        if let Err(e) = $check {
            panic!("[invariants] {}: {}", $scope, e);
        }
    };
}
