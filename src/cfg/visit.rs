//! Iterative depth-first traversal engine, grounded on
//! `hir/src/ir/cfg/visit.rs`'s `LazyDfsVisitor`: a single stack-based walker
//! parameterized over whether to emit a node on first reach (pre-order) or
//! only once all of its children have been emitted (post-order), avoiding
//! recursion so deep CFGs cannot overflow the stack.

use std::hash::Hash;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

struct VisitFrame<Id> {
    node: Id,
    /// Children not yet pushed for visitation.
    remaining: std::vec::IntoIter<Id>,
}

/// Run an iterative DFS from `entry` using `successors(id) -> Vec<Id>`,
/// emitting each reachable node exactly once.
///
/// `POSTORDER = false` emits a node the first time it is reached (pre-order);
/// `POSTORDER = true` emits a node only after every child has been emitted.
pub fn dfs<Id, F>(entry: Id, successors: F, postorder: bool) -> Vec<Id>
where
    Id: Copy + Eq + Hash,
    F: Fn(Id) -> Vec<Id>,
{
    let mut visited: FxHashSet<Id> = FxHashSet::default();
    let mut out = Vec::new();
    let mut stack: SmallVec<[VisitFrame<Id>; 8]> = SmallVec::new();

    visited.insert(entry);
    if !postorder {
        out.push(entry);
    }
    stack.push(VisitFrame {
        node: entry,
        remaining: successors(entry).into_iter(),
    });

    while let Some(frame) = stack.last_mut() {
        match frame.remaining.next() {
            Some(child) => {
                if visited.insert(child) {
                    if !postorder {
                        out.push(child);
                    }
                    stack.push(VisitFrame {
                        node: child,
                        remaining: successors(child).into_iter(),
                    });
                }
            }
            None => {
                let done = stack.pop().unwrap();
                if postorder {
                    out.push(done.node);
                }
            }
        }
    }

    out
}
