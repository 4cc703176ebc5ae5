//! Block-granularity fixed-point driver: `out[b] = transfer(b, merge(out[p]
//! for p in preds(b)))`, iterated to a fixed point.

use log::trace;

use super::Worklist;
use crate::cfg::{BasicBlockCollection, BlockMap, Direction};
use crate::ir::Block;
use crate::lattice::LatticeLike;

/// Run a block-granularity analysis to a fixed point and return the output
/// state of every block. `transfer(block, input)` computes a block's output
/// state from the merge of its predecessors' (or, under `Backwards`,
/// successors') output states.
pub fn run_block_analysis<B, D, S>(
    collection: &BasicBlockCollection<B, D>,
    transfer: impl Fn(&B, &S) -> S,
) -> BlockMap<B, S>
where
    B: Block,
    D: Direction,
    S: LatticeLike,
{
    let mut out: BlockMap<B, S> = collection.block_map(S::default());
    let mut worklist = Worklist::seeded(collection.iter().map(|b| b.id()));

    while let Some(id) = worklist.pop() {
        let block = collection
            .block(id)
            .expect("worklist only ever holds ids drawn from this collection");

        let mut input = S::default();
        for pred in collection.predecessors(id) {
            if let Some(pred_out) = out.get(pred) {
                input = input.merge(pred_out);
            }
        }

        let new_out = transfer(block, &input);
        let changed = out.get(id).is_none_or(|current| *current != new_out);
        if changed {
            trace!(target: "gpu_kernel_analysis::fixedpoint::block", "block {id:?} changed");
            out.set(id, new_out)
                .expect("id was drawn from this collection");
            for succ in collection.successors(id) {
                worklist.push(succ);
            }
        }
    }

    out
}
