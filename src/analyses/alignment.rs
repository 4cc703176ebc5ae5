//! Pointer-alignment analysis: the strongest statically-known alignment (in
//! bytes) of a pointer-typed value.

use crate::fixedpoint::value::ValueAnalysis;
use crate::ir::{Block, Value, ValueKind};
use crate::lattice::{AnalysisValue, LatticeLike};

/// A positive byte alignment. `Alignment::default()` (`u32::MAX`) is the
/// lattice's bottom element (unconstrained / not yet observed), so that
/// merging with a value never seen yet is the identity for `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment(pub u32);

impl Default for Alignment {
    fn default() -> Self {
        Alignment(u32::MAX)
    }
}

impl LatticeLike for Alignment {
    fn merge(&self, other: &Self) -> Self {
        Alignment(self.0.min(other.0))
    }
}

pub struct AlignmentAnalysis;

impl<B: Block> ValueAnalysis<B> for AlignmentAnalysis {
    type Lattice = Alignment;

    fn seed(&self, value: &B::Value) -> Option<AnalysisValue<Alignment>> {
        match value.kind() {
            ValueKind::Alloca { .. } => {
                Some(AnalysisValue::scalar(Alignment(value.stack_alignment())))
            }
            ValueKind::AlignViewTo { alignment, .. } => {
                Some(AnalysisValue::scalar(Alignment(alignment)))
            }
            _ => None,
        }
    }

    fn custom<F>(&self, value: &B::Value, operand: F) -> Option<AnalysisValue<Alignment>>
    where
        F: Fn(&B::Value) -> AnalysisValue<Alignment>,
    {
        match value.kind() {
            ValueKind::LoadFieldAddress { source, field } => {
                let source_alignment = operand(&source).data().0;
                Some(AnalysisValue::scalar(Alignment(
                    source_alignment.min(field.alignment),
                )))
            }
            ValueKind::LoadElementAddress {
                source,
                element_alignment,
            } => {
                let source_alignment = operand(&source).data().0;
                Some(AnalysisValue::scalar(Alignment(
                    source_alignment.max(element_alignment),
                )))
            }
            _ => None,
        }
    }
}
