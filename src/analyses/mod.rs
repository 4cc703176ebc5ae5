//! The three concrete analyses built on the value-granularity fixed
//! point driver ([`crate::fixedpoint::value`]).

pub mod address_space;
pub mod alignment;
pub mod uniformity;
