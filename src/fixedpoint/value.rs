//! Value-granularity fixed-point driver: recomputes every value in a method
//! in source order, in block order, re-enqueuing a block's successors
//! whenever any of its values' states change.

use log::trace;
use rustc_hash::FxHashMap;

use super::Worklist;
use crate::cfg::{BasicBlockCollection, Direction};
use crate::ir::{Block, Value, ValueKind};
use crate::lattice::{AnalysisValue, LatticeLike};

/// The operations a concrete value-granularity analysis must supply. The
/// default merge rule handles every `ValueKind` not listed
/// explicitly here; `seed` lets a concrete analysis override that default
/// for value kinds that don't flow from their operands (e.g. `Alloca`,
/// intrinsics, typed constants).
pub trait ValueAnalysis<B: Block> {
    type Lattice: LatticeLike;

    /// A fixed, non-flow-sensitive value for `value`, if this analysis seeds
    /// it directly rather than deriving it from operands. Consulted before
    /// the generic per-`ValueKind` merge rule.
    fn seed(&self, value: &B::Value) -> Option<AnalysisValue<Self::Lattice>> {
        let _ = value;
        None
    }

    /// The best-known summary of a called method's return value, or `None`
    /// if the call's target is void/opaque (in which case the call value is
    /// left unchanged).
    fn method_return(&self, target: u64) -> Option<AnalysisValue<Self::Lattice>> {
        let _ = target;
        None
    }

    /// Overrides the built-in per-`ValueKind` merge rule for value kinds
    /// whose transfer function isn't a plain join of operand values (e.g.
    /// pointer alignment's `min`/`max` rules along `LoadFieldAddress` and
    /// `LoadElementAddress`). `operand` resolves an operand value's current
    /// result. Consulted after `seed`, before the built-in rules.
    fn custom<F>(&self, value: &B::Value, operand: F) -> Option<AnalysisValue<Self::Lattice>>
    where
        F: Fn(&B::Value) -> AnalysisValue<Self::Lattice>,
    {
        let _ = (value, operand);
        None
    }
}

/// Per-value results of running a [`ValueAnalysis`] to a fixed point.
pub struct ValueResults<B: Block, T> {
    values: FxHashMap<B::Id, AnalysisValue<T>>,
}

impl<B: Block, T: LatticeLike> ValueResults<B, T> {
    pub fn get(&self, id: B::Id) -> Option<&AnalysisValue<T>> {
        self.values.get(&id)
    }

    fn entry(&self, id: B::Id) -> AnalysisValue<T> {
        self.values.get(&id).cloned().unwrap_or_default()
    }
}

fn transfer<B, A>(
    analysis: &A,
    value: &B::Value,
    env: &ValueResults<B, A::Lattice>,
) -> AnalysisValue<A::Lattice>
where
    B: Block,
    A: ValueAnalysis<B>,
{
    if let Some(seeded) = analysis.seed(value) {
        return seeded;
    }

    let of = |v: &B::Value| env.entry(v.id());

    if let Some(custom) = analysis.custom(value, of) {
        return custom;
    }

    match value.kind() {
        ValueKind::GetField { source, field } => {
            let source_value = of(&source);
            let child = source_value
                .child(field.index)
                .cloned()
                .unwrap_or_default();
            AnalysisValue::scalar(child)
        }
        ValueKind::SetField {
            source,
            field,
            value: written,
        } => {
            let source_value = of(&source);
            let mut child_data = source_value.child_data().to_vec();
            if field.index >= child_data.len() {
                child_data.resize(field.index + 1, A::Lattice::default());
            }
            child_data[field.index] = of(&written).data().clone();
            let data = child_data
                .iter()
                .fold(A::Lattice::default(), |acc, f| acc.merge(f));
            AnalysisValue::structured(data, child_data)
        }
        ValueKind::StructureValue(fields) => {
            let child_data: Vec<A::Lattice> =
                fields.iter().map(|f| of(f).data().clone()).collect();
            let data = child_data
                .iter()
                .fold(A::Lattice::default(), |acc, f| acc.merge(f));
            AnalysisValue::structured(data, child_data)
        }
        ValueKind::PhiValue(incoming) => incoming
            .iter()
            .fold(AnalysisValue::default(), |acc, (_, v)| acc.merge(&of(v))),
        ValueKind::Predicate {
            if_true, if_false, ..
        } => of(&if_true).merge(&of(&if_false)),
        ValueKind::MethodCall { target, .. } => match analysis.method_return(target) {
            None => env.entry(value.id()),
            Some(returned) => returned.merge(&env.entry(value.id())),
        },
        other => {
            // Default rule: join of the data of every direct value operand.
            let operands = direct_operands::<B>(other);
            operands
                .into_iter()
                .fold(AnalysisValue::default(), |acc, v| acc.merge(&of(&v)))
        }
    }
}

fn direct_operands<B: Block>(kind: ValueKind<B::Value>) -> Vec<B::Value> {
    match kind {
        ValueKind::CompareValue { left, right, .. } => vec![left, right],
        ValueKind::BinaryArithmeticValue { left, right, .. } => vec![left, right],
        ValueKind::ConditionalBranch { condition, .. } => vec![condition],
        ValueKind::LoadElementAddress { source, .. } => vec![source],
        ValueKind::LoadFieldAddress { source, .. } => vec![source],
        ValueKind::AlignViewTo { source, .. } => vec![source],
        ValueKind::ReturnTerminator(Some(v)) => vec![v],
        _ => Vec::new(),
    }
}

/// Run `analysis` to a fixed point over every value reachable in
/// `collection`, in block order, re-scheduling a block's successors (under
/// `D`) whenever one of its values changes.
pub fn run_value_analysis<B, D, A>(
    collection: &BasicBlockCollection<B, D>,
    analysis: &A,
) -> ValueResults<B, A::Lattice>
where
    B: Block,
    D: Direction,
    A: ValueAnalysis<B>,
{
    let mut results: ValueResults<B, A::Lattice> = ValueResults {
        values: FxHashMap::default(),
    };
    let mut worklist = Worklist::seeded(collection.iter().map(|b| b.id()));

    while let Some(id) = worklist.pop() {
        let block = collection
            .block(id)
            .expect("worklist only ever holds ids drawn from this collection");

        let mut block_changed = false;
        for value in block.values() {
            let new_value = transfer(analysis, &value, &results);
            let changed = results
                .values
                .get(&value.id())
                .is_none_or(|current| *current != new_value);
            if changed {
                results.values.insert(value.id(), new_value);
                block_changed = true;
            }
        }

        if block_changed {
            trace!(target: "gpu_kernel_analysis::fixedpoint::value", "block {id:?} changed");
            for succ in collection.successors(id) {
                worklist.push(succ);
            }
        }
    }

    results
}
