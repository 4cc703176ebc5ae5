//! The inter-procedural call graph: a post-order over a set of methods
//! such that every caller precedes its callees, for bottom-up whole-program
//! passes.
//!
//! Grounded on the `hir/src/ir/cfg/visit.rs` iterative-DFS idiom, reused
//! here over the transposed call graph (`uses`) instead of a CFG.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cfg::visit::dfs;
use crate::ir::Method;
use crate::phis::references;

/// One method's place in the landscape: its outgoing references (within the
/// analyzed set), caller-supplied custom data, and the sorted list of
/// methods that call it.
pub struct LandscapeEntry<M: Method, T> {
    method: M,
    references: Vec<u64>,
    data: T,
    uses: Vec<u64>,
}

impl<M: Method, T> LandscapeEntry<M, T> {
    pub fn method(&self) -> &M {
        &self.method
    }

    pub fn references(&self) -> &[u64] {
        &self.references
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn uses(&self) -> &[u64] {
        &self.uses
    }

    pub fn is_sink(&self) -> bool {
        self.references.is_empty()
    }
}

/// The inter-procedural call graph over a set of methods, with a
/// `DataProvider` computing arbitrary per-method custom data.
pub struct Landscape<M: Method, T> {
    entries: FxHashMap<u64, LandscapeEntry<M, T>>,
    post_order: Vec<u64>,
}

impl<M: Method, T> Landscape<M, T> {
    /// Build the landscape over `methods`, calling `data_provider(method)` to
    /// compute each entry's custom data.
    pub fn build(methods: Vec<M>, data_provider: impl Fn(&M) -> T) -> Self {
        let candidates: FxHashSet<u64> = methods.iter().map(|m| m.id()).collect();

        let mut entries: FxHashMap<u64, LandscapeEntry<M, T>> = FxHashMap::default();
        for method in &methods {
            let refs = references::<M::Block>(method.blocks(), Some(&candidates));
            let data = data_provider(method);
            entries.insert(
                method.id(),
                LandscapeEntry {
                    method: method.clone(),
                    references: refs,
                    data,
                    uses: Vec::new(),
                },
            );
        }

        let mut uses_accum: FxHashMap<u64, Vec<u64>> = FxHashMap::default();
        for method in &methods {
            let refs = entries[&method.id()].references.clone();
            for r in refs {
                uses_accum.entry(r).or_default().push(method.id());
            }
        }
        for (id, mut callers) in uses_accum {
            callers.sort_unstable();
            if let Some(entry) = entries.get_mut(&id) {
                entry.uses = callers;
            }
        }

        let mut sinks: Vec<u64> = entries
            .values()
            .filter(|e| e.is_sink())
            .map(|e| e.method.id())
            .collect();
        sinks.sort_unstable();

        let mut post_order = Vec::with_capacity(entries.len());
        let mut visited = FxHashSet::default();
        for sink in sinks {
            let order = dfs(
                sink,
                |id| {
                    entries
                        .get(&id)
                        .map(|e| e.uses.clone())
                        .unwrap_or_default()
                },
                true,
            );
            for id in order {
                if visited.insert(id) {
                    post_order.push(id);
                }
            }
        }
        // Methods unreachable from any sink (mutually-recursive cycles with
        // no acyclic caller) still need to appear; append any left over.
        let mut remaining: Vec<u64> = entries
            .keys()
            .copied()
            .filter(|id| !visited.contains(id))
            .collect();
        remaining.sort_unstable();
        for id in remaining {
            let order = dfs(
                id,
                |id| {
                    entries
                        .get(&id)
                        .map(|e| e.uses.clone())
                        .unwrap_or_default()
                },
                true,
            );
            for id in order {
                if visited.insert(id) {
                    post_order.push(id);
                }
            }
        }

        Self {
            entries,
            post_order,
        }
    }

    pub fn entry(&self, id: u64) -> Option<&LandscapeEntry<M, T>> {
        self.entries.get(&id)
    }

    /// Methods in an order such that every caller precedes the callees it
    /// calls (within the analyzed set).
    pub fn post_order(&self) -> impl Iterator<Item = &LandscapeEntry<M, T>> {
        self.post_order.iter().map(move |id| &self.entries[id])
    }
}
