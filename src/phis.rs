//! Phi collection and inter-procedural references.
//!
//! `collect_block_phis` mirrors the straightforward block-scan idiom used
//! throughout `hir`'s analysis passes (filter a block's value list by kind);
//! `references` is the same style of scan applied to `MethodCall` values,
//! feeding directly into [`crate::landscape`].

use rustc_hash::FxHashSet;

use crate::ir::{Block, Value, ValueKind};
use crate::loops::LoopNode;

/// Every `PhiValue` defined directly in `block`, in definition order.
pub fn collect_block_phis<B: Block>(block: &B) -> Vec<B::Value> {
    block
        .values()
        .into_iter()
        .filter(|v| matches!(v.kind(), ValueKind::PhiValue(_)))
        .collect()
}

/// Every phi value defined in one of `loop_node`'s member blocks that has at
/// least one incoming operand defined outside the loop.
pub fn collect_loop_external_phis<B>(
    loop_node: &LoopNode<B::Id>,
    get_block: impl Fn(B::Id) -> B,
) -> Vec<B::Value>
where
    B: Block,
{
    let mut out = Vec::new();
    for &member in loop_node.members() {
        let block = get_block(member);
        for value in collect_block_phis(&block) {
            if let ValueKind::PhiValue(incoming) = value.kind() {
                let has_external = incoming
                    .iter()
                    .any(|(src, _)| !loop_node.contains_block(*src));
                if has_external {
                    out.push(value);
                }
            }
        }
    }
    out
}

/// The ordered, deduplicated set of methods a method's blocks call, via
/// `MethodCall` values, optionally restricted to `candidates`.
pub fn references<B: Block>(
    blocks: impl IntoIterator<Item = B>,
    candidates: Option<&FxHashSet<u64>>,
) -> Vec<u64> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for block in blocks {
        for value in block.values() {
            if let ValueKind::MethodCall { target, .. } = value.kind() {
                if let Some(candidates) = candidates
                    && !candidates.contains(&target) {
                        continue;
                    }
                if seen.insert(target) {
                    out.push(target);
                }
            }
        }
    }
    out
}
