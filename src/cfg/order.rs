//! The four traversal orders a [`crate::cfg::BasicBlockCollection`] can be
//! built in.

use std::hash::Hash;

use super::visit::dfs;

/// One of the four depth-first traversal orders. `ReversePreOrder` and
/// `ReversePostOrder` are materialized by running the companion order
/// (`PreOrder`, `PostOrder` respectively) and reversing it — no separate
/// traversal work is needed since each pairs with a compatible order
/// (pre ↔ reverse-pre, post ↔ reverse-post).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Order {
    PreOrder,
    ReversePreOrder,
    PostOrder,
    ReversePostOrder,
}

impl Order {
    /// Run this traversal from `entry`, using `successors(id)` as the edge
    /// relation (already adjusted for the collection's [`crate::cfg::Direction`]).
    pub fn traverse<Id, F>(self, entry: Id, successors: F) -> Vec<Id>
    where
        Id: Copy + Eq + Hash,
        F: Fn(Id) -> Vec<Id>,
    {
        match self {
            Order::PreOrder => dfs(entry, successors, false),
            Order::ReversePreOrder => {
                let mut v = dfs(entry, successors, false);
                v.reverse();
                v
            }
            Order::PostOrder => dfs(entry, successors, true),
            Order::ReversePostOrder => {
                let mut v = dfs(entry, successors, true);
                v.reverse();
                v
            }
        }
    }
}
