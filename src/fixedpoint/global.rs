//! Inter-procedural (global) fixed-point driver: a worklist of methods, each
//! re-run with its accumulated argument summary whenever that summary grows,
//! propagating return-value summaries back to callers.

use rustc_hash::FxHashMap;

use super::value::{run_value_analysis, ValueAnalysis};
use super::Worklist;
use crate::cfg::{BasicBlockCollection, Forwards, Order};
use crate::ir::{Block, Method, Value, ValueKind};
use crate::landscape::Landscape;
use crate::lattice::{AnalysisValue, LatticeLike};

/// The per-method summary a global analysis accumulates across every call
/// site that reaches it: the merged argument values it's ever been called
/// with, and its merged return value.
#[derive(Clone)]
pub struct MethodSummary<T: LatticeLike> {
    pub arguments: Vec<AnalysisValue<T>>,
    pub return_value: AnalysisValue<T>,
}

impl<T: LatticeLike> MethodSummary<T> {
    fn bottom(num_parameters: usize) -> Self {
        Self {
            arguments: vec![AnalysisValue::default(); num_parameters],
            return_value: AnalysisValue::default(),
        }
    }

    fn merge_arguments(&mut self, args: &[AnalysisValue<T>]) -> bool {
        let mut changed = false;
        for (slot, arg) in self.arguments.iter_mut().zip(args) {
            let merged = slot.merge(arg);
            if merged != *slot {
                *slot = merged;
                changed = true;
            }
        }
        changed
    }

    fn merge_return(&mut self, value: &AnalysisValue<T>) -> bool {
        let merged = self.return_value.merge(value);
        let changed = merged != self.return_value;
        self.return_value = merged;
        changed
    }
}

/// Adapts a per-method [`ValueAnalysis`] to the inter-procedural setting: it
/// seeds `Parameter(i)` from the method's current accumulated argument
/// summary, and answers `method_return` from the shared summary table
/// instead of delegating to the wrapped analysis.
struct GlobalAdapter<'a, B: Block, A: ValueAnalysis<B>> {
    inner: &'a A,
    current: &'a MethodSummary<A::Lattice>,
    summaries: &'a FxHashMap<u64, MethodSummary<A::Lattice>>,
}

impl<'a, B, A> ValueAnalysis<B> for GlobalAdapter<'a, B, A>
where
    B: Block,
    A: ValueAnalysis<B>,
{
    type Lattice = A::Lattice;

    fn seed(&self, value: &B::Value) -> Option<AnalysisValue<Self::Lattice>> {
        if let ValueKind::Parameter(i) = value.kind() {
            return Some(self.current.arguments.get(i).cloned().unwrap_or_default());
        }
        self.inner.seed(value)
    }

    fn method_return(&self, target: u64) -> Option<AnalysisValue<Self::Lattice>> {
        match self.summaries.get(&target) {
            Some(summary) => Some(summary.return_value.clone()),
            None => self.inner.method_return(target),
        }
    }
}

fn build_collection<M: Method>(method: &M) -> BasicBlockCollection<M::Block, Forwards> {
    let blocks: FxHashMap<<M::Block as Block>::Id, M::Block> =
        method.blocks().into_iter().map(|b| (b.id(), b)).collect();
    BasicBlockCollection::build(method.entry_block(), Order::ReversePostOrder, |id| {
        blocks
            .get(&id)
            .cloned()
            .expect("method.blocks() must include every block reachable from its entry")
    })
}

/// Run `make_analysis()` (a fresh per-method [`ValueAnalysis`] instance,
/// since analyses here are expected to be stateless configuration objects)
/// to a whole-program fixed point over `landscape`, starting from `roots`
/// (typically every method with no unanalyzed caller, i.e. the landscape's
/// sinks in call-post-order, or a specific entry point set by the caller).
///
/// Methods without an implementation (declarations only) are left at their
/// bottom summary; their callers still see `method_return` return `None` for
/// them, per the "unchanged if target is void/opaque" rule.
pub fn run_global_analysis<M, A>(
    landscape: &Landscape<M, ()>,
    roots: &[u64],
    make_analysis: impl Fn() -> A,
) -> FxHashMap<u64, MethodSummary<A::Lattice>>
where
    M: Method,
    A: ValueAnalysis<M::Block>,
{
    let mut summaries: FxHashMap<u64, MethodSummary<A::Lattice>> = FxHashMap::default();
    let mut worklist = Worklist::seeded(roots.iter().copied());

    while let Some(id) = worklist.pop() {
        let Some(entry) = landscape.entry(id) else {
            continue;
        };
        let method = entry.method();
        if !method.has_implementation() {
            continue;
        }

        let current = summaries
            .entry(id)
            .or_insert_with(|| MethodSummary::bottom(method.num_parameters()))
            .clone();

        let collection = build_collection(method);
        let base = make_analysis();
        let adapter = GlobalAdapter {
            inner: &base,
            current: &current,
            summaries: &summaries,
        };
        let results = run_value_analysis(&collection, &adapter);

        let mut return_value = AnalysisValue::default();
        for block in collection.iter() {
            if let ValueKind::ReturnTerminator(Some(v)) = block.terminator().kind()
                && let Some(val) = results.get(v.id()) {
                    return_value = return_value.merge(val);
                }
        }

        let mut call_bindings: Vec<(u64, Vec<AnalysisValue<A::Lattice>>)> = Vec::new();
        for block in collection.iter() {
            for value in block.values() {
                if let ValueKind::MethodCall { target, args } = value.kind() {
                    let arg_values = args
                        .iter()
                        .map(|a| results.get(a.id()).cloned().unwrap_or_default())
                        .collect();
                    call_bindings.push((target, arg_values));
                }
            }
        }

        let return_changed = summaries
            .get_mut(&id)
            .expect("inserted above")
            .merge_return(&return_value);

        for (target, arg_values) in call_bindings {
            let target_params = landscape
                .entry(target)
                .map(|e| e.method().num_parameters())
                .unwrap_or(arg_values.len());
            let target_summary = summaries
                .entry(target)
                .or_insert_with(|| MethodSummary::bottom(target_params));
            if target_summary.merge_arguments(&arg_values) {
                worklist.push(target);
            }
        }

        if return_changed {
            for &caller in entry.uses() {
                worklist.push(caller);
            }
        }
    }

    summaries
}
