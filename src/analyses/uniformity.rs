//! Uniformity analysis: whether every lane in a warp/group computes the same
//! value for a given `Value`.

use crate::fixedpoint::value::ValueAnalysis;
use crate::ir::{Block, Value, ValueKind};
use crate::lattice::{AnalysisValue, LatticeLike};

/// `Unknown < Uniform < Divergent`, ordered so `merge = max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Uniformity {
    #[default]
    Unknown,
    Uniform,
    Divergent,
}

impl LatticeLike for Uniformity {
    fn merge(&self, other: &Self) -> Self {
        (*self).max(*other)
    }
}

pub struct UniformityAnalysis;

impl<B: Block> ValueAnalysis<B> for UniformityAnalysis {
    type Lattice = Uniformity;

    fn seed(&self, value: &B::Value) -> Option<AnalysisValue<Uniformity>> {
        let result = match value.kind() {
            ValueKind::LaneIdxValue | ValueKind::GroupIndexValue => Uniformity::Divergent,
            ValueKind::ReturnTerminator(_) => Uniformity::Divergent,
            ValueKind::GridIndexValue
            | ValueKind::PrimitiveValue(_)
            | ValueKind::UndefinedValue
            | ValueKind::MethodCall { .. }
            | ValueKind::UnconditionalBranch { .. } => Uniformity::Uniform,
            // ConditionalBranch follows its condition via the default
            // operand-join rule, so it isn't seeded here.
            _ => return None,
        };
        Some(AnalysisValue::scalar(result))
    }
}

/// The `IsUniform` public predicate: `Unknown` is conservatively reported as
/// divergent, so only `Uniform` counts.
pub fn is_uniform(value: &AnalysisValue<Uniformity>) -> bool {
    matches!(value.data(), Uniformity::Uniform)
}
