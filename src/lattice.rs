//! Lattice values for the fixed-point framework, grounded on
//! `hir-analysis/src/lattice.rs`'s `LatticeLike` trait: the same
//! `Default + Clone + Eq + Debug` bound and a single commutative, monotone
//! binary operation, but with only `merge` (there named `join`) — this
//! crate's fixed-point framework never needs a meet semi-lattice, so the
//! unused half of that trait is dropped.

use std::fmt;

/// A bounded join semi-lattice: `Default::default()` is bottom, `merge` is
/// the least-upper-bound operation the fixed-point drivers iterate with.
///
/// `merge` must be associative, commutative, and idempotent, and the lattice
/// must have finite height for the fixed-point drivers to be guaranteed to
/// terminate.
pub trait LatticeLike: Default + Clone + PartialEq + fmt::Debug {
    fn merge(&self, other: &Self) -> Self;
}

/// A lattice element augmented with per-field precision: `data` is the
/// value's own summary, `child_data` carries one entry per field for
/// structure-typed values (empty for scalars).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisValue<T> {
    data: T,
    child_data: Vec<T>,
}

impl<T: LatticeLike> AnalysisValue<T> {
    pub fn scalar(data: T) -> Self {
        Self {
            data,
            child_data: Vec::new(),
        }
    }

    pub fn structured(data: T, child_data: Vec<T>) -> Self {
        Self { data, child_data }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn child_data(&self) -> &[T] {
        &self.child_data
    }

    pub fn child(&self, index: usize) -> Option<&T> {
        self.child_data.get(index)
    }

    /// Field-wise merge: `data` merges with `data`, and each field merges
    /// with the field at the same index (mismatched field counts merge only
    /// the overlapping prefix, matching the scalar/structured boundary where
    /// one side degrades to an empty `child_data`). The result's `data` is
    /// then additionally joined with every merged field, so a structure-typed
    /// merge's parent summary never under-approximates its children.
    pub fn merge(&self, other: &Self) -> Self {
        let mut data = self.data.merge(&other.data);
        let child_data: Vec<T> = if self.child_data.is_empty() {
            other.child_data.clone()
        } else if other.child_data.is_empty() {
            self.child_data.clone()
        } else {
            self.child_data
                .iter()
                .zip(other.child_data.iter())
                .map(|(a, b)| a.merge(b))
                .collect()
        };
        for field in &child_data {
            data = data.merge(field);
        }
        Self { data, child_data }
    }
}

impl<T: LatticeLike> From<T> for AnalysisValue<T> {
    fn from(data: T) -> Self {
        Self::scalar(data)
    }
}
