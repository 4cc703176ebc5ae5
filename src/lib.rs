//! Control-flow and data-flow analysis core for a GPU kernel compiler.
//!
//! This crate is deliberately decoupled from any particular IR: callers
//! implement the traits in [`ir`] over their own block/value/method types,
//! and everything else here — traversal orders, the CFG view, SCC and loop
//! detection, the landscape (inter-procedural call graph), the lattice
//! machinery, and the fixed-point drivers — operates purely in terms of
//! those traits.

pub mod analyses;
pub mod cfg;
pub mod error;
pub mod fixedpoint;
pub mod ir;
pub mod landscape;
pub mod lattice;
pub mod loop_info;
pub mod loops;
pub mod phis;
pub mod scc;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AnalysisError;

/// Convenience alias used throughout the crate for operations that can fail
/// with an [`AnalysisError`].
pub type AnalysisResult<T> = Result<T, AnalysisError>;
