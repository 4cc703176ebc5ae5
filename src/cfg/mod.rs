//! The control-flow graph view: an ordered, direction-parameterized
//! read-only view over a method's blocks, plus dense block-indexed maps and
//! sets built against that ordering.
//!
//! Grounded on `hir/src/ir/cfg.rs`'s `Graph`/`InvertibleGraph`/`Inverse`
//! abstraction: there, a blanket `Graph` impl plus an `Inverse<G>` wrapper
//! let every CFG algorithm be written once and run forwards or backwards by
//! swapping which edge list `children()` returns. We keep that swap-the-edge-
//! list idiom (see [`Direction`]) but drop the wrapper-type indirection in
//! favor of a single marker trait, since this crate has no need to recover a
//! `Graph` from an `Inverse<Graph>` generically.

pub mod order;
pub mod visit;

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::AnalysisError;
use crate::ir::Block;

pub use order::Order;

/// Selects which of a block's edge lists is the "successor" list for a
/// traversal: the forward CFG's actual successors, or (for backward
/// analyses) its predecessors.
pub trait Direction: fmt::Debug + Copy + Clone + Eq + 'static {
    const IS_FORWARD: bool;

    fn successors<B: Block>(block: &B) -> Vec<B::Id>;
    fn predecessors<B: Block>(block: &B) -> Vec<B::Id>;
}

/// The CFG's own successor/predecessor edges.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Forwards;

impl Direction for Forwards {
    const IS_FORWARD: bool = true;

    fn successors<B: Block>(block: &B) -> Vec<B::Id> {
        block.successors()
    }

    fn predecessors<B: Block>(block: &B) -> Vec<B::Id> {
        block.predecessors()
    }
}

/// The CFG's edges with predecessor/successor swapped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Backwards;

impl Direction for Backwards {
    const IS_FORWARD: bool = false;

    fn successors<B: Block>(block: &B) -> Vec<B::Id> {
        block.predecessors()
    }

    fn predecessors<B: Block>(block: &B) -> Vec<B::Id> {
        block.successors()
    }
}

/// An immutable ordered sequence of blocks, reachable from an entry block
/// under a given [`Direction`], laid out according to an [`Order`].
///
/// This is the one piece of shared state every other component in this
/// crate is built against: SCC, loop detection, loop-info, and the
/// fixed-point drivers all index their per-block scratch storage by the
/// dense `traversal_index` this collection assigns.
pub struct BasicBlockCollection<B: Block, D: Direction> {
    entry: B::Id,
    order: Order,
    /// Blocks in traversal order; `blocks[i].id()` has traversal index `i`.
    blocks: Vec<B>,
    index: FxHashMap<B::Id, usize>,
    _direction: std::marker::PhantomData<D>,
}

impl<B: Block, D: Direction> BasicBlockCollection<B, D> {
    /// Traverse `get(id)` starting at `entry`, in `order`, following edges
    /// selected by `D`. `get` must be total over every block reachable from
    /// `entry`.
    pub fn build(entry: B, order: Order, get: impl Fn(B::Id) -> B) -> Self {
        let entry_id = entry.id();
        let ids = order.traverse(entry_id, |id| D::successors(&get(id)));
        let blocks: Vec<B> = ids.iter().map(|&id| get(id)).collect();
        let index = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id(), i))
            .collect();
        Self {
            entry: entry_id,
            order,
            blocks,
            index,
            _direction: std::marker::PhantomData,
        }
    }

    pub fn entry(&self) -> B::Id {
        self.entry
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[B] {
        &self.blocks
    }

    pub fn contains(&self, id: B::Id) -> bool {
        self.index.contains_key(&id)
    }

    /// The dense traversal index of `id`, stable for the lifetime of this
    /// collection. `None` if `id` is not reachable from the entry under this
    /// collection's direction.
    pub fn traversal_index(&self, id: B::Id) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn block(&self, id: B::Id) -> Option<&B> {
        self.index.get(&id).map(|&i| &self.blocks[i])
    }

    pub fn successors(&self, id: B::Id) -> Vec<B::Id> {
        self.block(id)
            .map(|b| D::successors(b))
            .unwrap_or_default()
    }

    pub fn predecessors(&self, id: B::Id) -> Vec<B::Id> {
        self.block(id)
            .map(|b| D::predecessors(b))
            .unwrap_or_default()
    }

    /// Allocate a [`BlockMap`] over this collection's blocks, each entry
    /// initialized with `init`.
    pub fn block_map<T: Clone>(&self, init: T) -> BlockMap<B, T> {
        BlockMap::new(self, init)
    }

    /// Allocate an empty [`BlockSet`] over this collection's blocks.
    pub fn block_set(&self) -> BlockSet<B> {
        BlockSet::new(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &B> {
        self.blocks.iter()
    }
}

/// A dense array of `T`, one per block, indexed by `BasicBlockCollection`'s
/// traversal index rather than by block identity. This is the idiom every
/// analysis in this crate uses for per-block scratch storage, in preference
/// to an identity hash map.
pub struct BlockMap<B: Block, T> {
    index: FxHashMap<B::Id, usize>,
    data: Vec<T>,
}

impl<B: Block, T: Clone> BlockMap<B, T> {
    fn new<D: Direction>(collection: &BasicBlockCollection<B, D>, init: T) -> Self {
        Self {
            index: collection.index.clone(),
            data: vec![init; collection.len()],
        }
    }

    pub fn get(&self, id: B::Id) -> Option<&T> {
        self.index.get(&id).map(|&i| &self.data[i])
    }

    pub fn get_mut(&mut self, id: B::Id) -> Option<&mut T> {
        if let Some(&i) = self.index.get(&id) {
            Some(&mut self.data[i])
        } else {
            None
        }
    }

    pub fn set(&mut self, id: B::Id, value: T) -> Result<(), AnalysisError> {
        match self.get_mut(id) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(AnalysisError::BlockNotInCollection),
        }
    }
}

/// A dense bitset over blocks, indexed by traversal index.
pub struct BlockSet<B: Block> {
    index: FxHashMap<B::Id, usize>,
    bits: bitvec::vec::BitVec,
}

impl<B: Block> BlockSet<B> {
    fn new<D: Direction>(collection: &BasicBlockCollection<B, D>) -> Self {
        Self {
            index: collection.index.clone(),
            bits: bitvec::vec::BitVec::repeat(false, collection.len()),
        }
    }

    pub fn insert(&mut self, id: B::Id) -> bool {
        if let Some(&i) = self.index.get(&id) {
            let was_set = self.bits[i];
            self.bits.set(i, true);
            !was_set
        } else {
            false
        }
    }

    pub fn contains(&self, id: B::Id) -> bool {
        self.index
            .get(&id)
            .map(|&i| self.bits[i])
            .unwrap_or(false)
    }

    pub fn remove(&mut self, id: B::Id) -> bool {
        if let Some(&i) = self.index.get(&id) {
            let was_set = self.bits[i];
            self.bits.set(i, false);
            was_set
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
