//! Natural loop detection: a modified Tarjan that classifies headers,
//! breakers, back-edges, entries, and exits, and builds a nesting forest.
//!
//! Grounded on `hir/src/ir/cfg/scc.rs` for the SCC search itself (reused via
//! [`crate::scc::tarjan`]) and on `hir/src/ir/loops.rs` for the public shape
//! of a loop-forest API (`LoopForest`/`Loop` there expose header/parent/
//! nested/blocks accessors, `loops_in_preorder`, bottom-up walkers, and a
//! `#[cfg(debug_assertions)]`-gated structural re-verification — all
//! patterns this module follows). The algorithm itself differs from that
//! module: `hir/src/ir/loops.rs` derives loops from a dominator tree,
//! whereas this module detects loops via pure Tarjan-SCC analysis with no
//! dominance computation. The forest is arena-backed (`Vec<LoopNode>` +
//! `LoopId(usize)`) rather than `Rc<RefCell<..>>`-linked, to avoid ownership
//! cycles between parent and child loops.

use std::hash::Hash;

use rustc_hash::FxHashSet;

use crate::cfg::{BasicBlockCollection, Direction};
use crate::ir::Block;
use crate::scc::tarjan;

/// A dense index into a [`Loops`] arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(usize);

/// A single natural loop: a strongly-connected region of the CFG together
/// with its structural boundary (headers/entries/breakers/exits/back-edges)
/// and its place in the nesting forest.
#[derive(Debug, Clone)]
pub struct LoopNode<Id> {
    headers: Vec<Id>,
    entries: Vec<Id>,
    breakers: Vec<Id>,
    exits: Vec<Id>,
    back_edges: Vec<Id>,
    members: FxHashSet<Id>,
    parent: Option<LoopId>,
    children: Vec<LoopId>,
}

impl<Id: Copy + Eq + Hash> LoopNode<Id> {
    pub fn headers(&self) -> &[Id] {
        &self.headers
    }

    pub fn entries(&self) -> &[Id] {
        &self.entries
    }

    pub fn breakers(&self) -> &[Id] {
        &self.breakers
    }

    pub fn exits(&self) -> &[Id] {
        &self.exits
    }

    pub fn back_edges(&self) -> &[Id] {
        &self.back_edges
    }

    pub fn contains_block(&self, id: Id) -> bool {
        self.members.contains(&id)
    }

    pub fn num_blocks(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> impl Iterator<Item = &Id> {
        self.members.iter()
    }

    pub fn parent(&self) -> Option<LoopId> {
        self.parent
    }

    pub fn children(&self) -> &[LoopId] {
        &self.children
    }

    pub fn is_nested(&self) -> bool {
        self.parent.is_some()
    }

    /// Materialize this loop's members in `order`, starting from `start`
    /// (typically one of `headers`). The successor relation hides any edge
    /// leaving the member set (so the walk never escapes through an exit)
    /// and, when `include_header` is `false`, also hides edges back into a
    /// header — letting a caller walk the loop body without revisiting the
    /// header itself.
    pub fn members_in_order(
        &self,
        order: crate::cfg::Order,
        start: Id,
        succ: impl Fn(Id) -> Vec<Id>,
        include_header: bool,
    ) -> Vec<Id> {
        let members = &self.members;
        let headers = &self.headers;
        order.traverse(start, |id| {
            succ(id)
                .into_iter()
                .filter(|s| members.contains(s))
                .filter(|s| include_header || !headers.contains(s))
                .collect()
        })
    }
}

struct LoopShape<Id> {
    headers: Vec<Id>,
    entries: Vec<Id>,
    breakers: Vec<Id>,
    exits: Vec<Id>,
    back_edges: Vec<Id>,
}

fn classify<Id: Copy + Eq + Hash>(
    members: &FxHashSet<Id>,
    succ: &dyn Fn(Id) -> Vec<Id>,
    pred: &dyn Fn(Id) -> Vec<Id>,
) -> LoopShape<Id> {
    let headers: Vec<Id> = members
        .iter()
        .copied()
        .filter(|&m| pred(m).iter().any(|p| !members.contains(p)))
        .collect();

    let mut entries = Vec::new();
    for &h in &headers {
        for p in pred(h) {
            if !members.contains(&p) && !entries.contains(&p) {
                entries.push(p);
            }
        }
    }

    let breakers: Vec<Id> = members
        .iter()
        .copied()
        .filter(|&m| succ(m).iter().any(|s| !members.contains(s)))
        .collect();

    let mut exits = Vec::new();
    for &b in &breakers {
        for s in succ(b) {
            if !members.contains(&s) && !exits.contains(&s) {
                exits.push(s);
            }
        }
    }

    let back_edges: Vec<Id> = members
        .iter()
        .copied()
        .filter(|&m| succ(m).iter().any(|s| headers.contains(s)))
        .collect();

    LoopShape {
        headers,
        entries,
        breakers,
        exits,
        back_edges,
    }
}

/// A loop forest over a method's CFG.
pub struct Loops<Id> {
    nodes: Vec<LoopNode<Id>>,
    top_level: Vec<LoopId>,
    block_to_loop: rustc_hash::FxHashMap<Id, LoopId>,
}

impl<Id: Copy + Eq + Hash + Ord> Loops<Id> {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: LoopId) -> &LoopNode<Id> {
        &self.nodes[id.0]
    }

    pub fn top_level_loops(&self) -> &[LoopId] {
        &self.top_level
    }

    pub fn loop_for(&self, block: Id) -> Option<LoopId> {
        self.block_to_loop.get(&block).copied()
    }

    pub fn loop_depth(&self, block: Id) -> usize {
        let mut depth = 0;
        let mut current = self.loop_for(block);
        while let Some(id) = current {
            depth += 1;
            current = self.get(id).parent();
        }
        depth
    }

    /// All loops in an order where every loop appears after its children
    /// (innermost first), suitable for transformations that must process
    /// nested loops before their enclosing loop.
    pub fn bottom_up(&self) -> Vec<LoopId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        fn visit<Id: Copy + Eq + Hash + Ord>(loops: &Loops<Id>, id: LoopId, out: &mut Vec<LoopId>) {
            for &child in loops.get(id).children() {
                visit(loops, child, out);
            }
            out.push(id);
        }
        for &top in &self.top_level {
            visit(self, top, &mut out);
        }
        out
    }

    /// All loops in preorder: every loop appears before its children.
    pub fn preorder(&self) -> Vec<LoopId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        fn visit<Id: Copy + Eq + Hash + Ord>(loops: &Loops<Id>, id: LoopId, out: &mut Vec<LoopId>) {
            out.push(id);
            for &child in loops.get(id).children() {
                visit(loops, child, out);
            }
        }
        for &top in &self.top_level {
            visit(self, top, &mut out);
        }
        out
    }
}

fn build_loop_recursive<Id: Copy + Eq + Hash + Ord>(
    members: FxHashSet<Id>,
    succ: &dyn Fn(Id) -> Vec<Id>,
    pred: &dyn Fn(Id) -> Vec<Id>,
    parent: Option<LoopId>,
    nodes: &mut Vec<LoopNode<Id>>,
    top_level: &mut Vec<LoopId>,
    block_to_loop: &mut rustc_hash::FxHashMap<Id, LoopId>,
) {
    let shape = classify(&members, succ, pred);
    let id = LoopId(nodes.len());
    for &m in &members {
        block_to_loop.insert(m, id);
    }
    nodes.push(LoopNode {
        headers: shape.headers.clone(),
        entries: shape.entries,
        breakers: shape.breakers,
        exits: shape.exits,
        back_edges: shape.back_edges,
        members: members.clone(),
        parent,
        children: Vec::new(),
    });
    match parent {
        Some(p) => nodes[p.0].children.push(id),
        None => top_level.push(id),
    }

    // Second pass: cut the now-promoted headers out of the member set and
    // re-run SCC search rooted at every remaining member, to discover loops
    // nested inside this one.
    let headers = shape.headers;
    let cut_succ = |x: Id| -> Vec<Id> {
        succ(x)
            .into_iter()
            .filter(|s| members.contains(s) && !headers.contains(s))
            .collect()
    };
    let roots: Vec<Id> = members
        .iter()
        .copied()
        .filter(|m| !headers.contains(m))
        .collect();

    for candidate in tarjan(roots, cut_succ) {
        let is_loop = if candidate.len() > 1 {
            true
        } else {
            let only = candidate[0];
            succ(only).contains(&only)
        };
        if !is_loop {
            continue;
        }
        let nested_members: FxHashSet<Id> = candidate.into_iter().collect();
        build_loop_recursive(
            nested_members,
            succ,
            pred,
            Some(id),
            nodes,
            top_level,
            block_to_loop,
        );
    }
}

/// Detect every natural loop in `collection`'s CFG.
pub fn analyze<B, D>(collection: &BasicBlockCollection<B, D>) -> Loops<B::Id>
where
    B: Block,
    D: Direction,
    B::Id: Ord,
{
    let succ = |id: B::Id| collection.successors(id);
    let pred = |id: B::Id| collection.predecessors(id);

    let mut nodes = Vec::new();
    let mut top_level = Vec::new();
    let mut block_to_loop = rustc_hash::FxHashMap::default();

    for candidate in tarjan([collection.entry()], succ) {
        let is_loop = if candidate.len() > 1 {
            true
        } else {
            let only = candidate[0];
            succ(only).contains(&only)
        };
        if !is_loop {
            continue;
        }
        let members: FxHashSet<B::Id> = candidate.into_iter().collect();
        build_loop_recursive(
            members, &succ, &pred, None, &mut nodes, &mut top_level, &mut block_to_loop,
        );
    }

    Loops {
        nodes,
        top_level,
        block_to_loop,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::cfg::{BasicBlockCollection, Forwards, Order};
    use crate::ir::PrimitiveConst;
    use crate::testing::{Graph, Op};

    /// A single counted loop: `A -> H`, `H -> {L, E}`, `L -> H`.
    fn simple_loop() -> (Graph, u32, u32, u32, u32) {
        let g = Graph::new();
        let a = g.add_block();
        let h = g.add_block();
        let l = g.add_block();
        let e = g.add_block();

        let c0 = g.add_value(a, Op::Const(PrimitiveConst::Int(0)));
        g.add_value(a, Op::Branch(h));

        let phi = g.add_value(h, Op::Undefined);
        let ten = g.add_value(h, Op::Const(PrimitiveConst::Int(10)));
        let cmp = g.add_value(
            h,
            Op::Compare {
                left: phi,
                right: ten,
                kind: crate::ir::CompareKind::Lt,
            },
        );
        g.add_value(
            h,
            Op::CondBranch {
                condition: cmp,
                then_block: l,
                else_block: e,
            },
        );

        let one = g.add_value(l, Op::Const(PrimitiveConst::Int(1)));
        let inc = g.add_value(
            l,
            Op::Arith {
                left: phi,
                right: one,
                kind: crate::ir::ArithKind::Add,
            },
        );
        g.add_value(l, Op::Branch(h));

        g.add_value(e, Op::Return(None));

        g.set_op(phi, Op::Phi(vec![(a, c0), (l, inc)]));
        g.finish();
        (g, a, h, l, e)
    }

    fn collection(g: &Graph, entry: u32) -> BasicBlockCollection<crate::testing::TestBlock, Forwards> {
        BasicBlockCollection::build(g.block(entry), Order::ReversePostOrder, |id| g.block(id))
    }

    #[test]
    fn s2_single_loop_shape() {
        let (g, a, h, l, e) = simple_loop();
        let collection = collection(&g, a);
        let loops = super::analyze(&collection);

        assert_eq!(loops.len(), 1);
        let top = loops.top_level_loops();
        assert_eq!(top.len(), 1);
        let node = loops.get(top[0]);

        assert_eq!(node.headers(), &[h]);
        assert_eq!(node.breakers(), &[h]);
        assert_eq!(node.back_edges(), &[l]);
        assert_eq!(node.entries(), &[a]);
        assert_eq!(node.exits(), &[e]);
        assert!(!node.is_nested());
        assert_eq!(loops.loop_for(h), Some(top[0]));
        assert_eq!(loops.loop_for(l), Some(top[0]));
        assert_eq!(loops.loop_for(a), None);
        assert_eq!(loops.loop_for(e), None);
    }

    /// `H1 -> {H2, Exit}`, `H2 -> {L2, X1}`, `L2 -> H2`, `X1 -> H1`: an inner
    /// loop `{H2, L2}` nested inside an outer loop `{H1, H2, L2, X1}`.
    fn nested_loops() -> (Graph, u32, u32, u32, u32, u32, u32) {
        let g = Graph::new();
        let start = g.add_block();
        let h1 = g.add_block();
        let h2 = g.add_block();
        let l2 = g.add_block();
        let x1 = g.add_block();
        let exit = g.add_block();

        g.add_value(start, Op::Branch(h1));

        let cond1 = g.add_value(h1, Op::Const(PrimitiveConst::Bool(true)));
        g.add_value(
            h1,
            Op::CondBranch {
                condition: cond1,
                then_block: h2,
                else_block: exit,
            },
        );

        let cond2 = g.add_value(h2, Op::Const(PrimitiveConst::Bool(true)));
        g.add_value(
            h2,
            Op::CondBranch {
                condition: cond2,
                then_block: l2,
                else_block: x1,
            },
        );

        g.add_value(l2, Op::Branch(h2));
        g.add_value(x1, Op::Branch(h1));
        g.add_value(exit, Op::Return(None));

        g.finish();
        (g, start, h1, h2, l2, x1, exit)
    }

    #[test]
    fn s4_nested_loop_forest() {
        let (g, start, h1, h2, l2, x1, _exit) = nested_loops();
        let collection = collection(&g, start);
        let loops = super::analyze(&collection);

        assert_eq!(loops.len(), 2);
        let top = loops.top_level_loops();
        assert_eq!(top.len(), 1, "only the outer loop has no parent");
        let outer_id = top[0];
        let outer = loops.get(outer_id);
        assert_eq!(outer.headers(), &[h1]);
        assert_eq!(outer.children().len(), 1);

        let inner_id = outer.children()[0];
        let inner = loops.get(inner_id);
        assert_eq!(inner.headers(), &[h2]);
        assert_eq!(inner.back_edges(), &[l2]);
        assert_eq!(inner.parent(), Some(outer_id));
        assert!(inner.is_nested());

        let bottom_up = loops.bottom_up();
        let inner_pos = bottom_up.iter().position(|&id| id == inner_id).unwrap();
        let outer_pos = bottom_up.iter().position(|&id| id == outer_id).unwrap();
        assert!(inner_pos < outer_pos, "inner loop must precede its parent");

        assert_eq!(loops.loop_depth(h2), 2);
        assert_eq!(loops.loop_depth(h1), 1);
        assert_eq!(loops.loop_depth(start), 0);

        let _ = x1;
    }

    #[test]
    fn members_in_order_hides_exit_and_optionally_the_header() {
        let (g, _start, h1, h2, l2, x1, _exit) = nested_loops();
        let collection = collection(&g, _start);
        let loops = super::analyze(&collection);
        let outer = loops.get(loops.top_level_loops()[0]);

        let succ = |id: u32| collection.successors(id);
        let with_header = outer.members_in_order(Order::PreOrder, h1, succ, true);
        assert_eq!(with_header.len(), 4);
        assert!(with_header.contains(&h1));

        let without_header = outer.members_in_order(Order::PreOrder, h2, succ, false);
        assert!(!without_header.contains(&h1));
        assert!(without_header.contains(&h2));
        assert!(without_header.contains(&l2) || without_header.contains(&x1));
    }
}
