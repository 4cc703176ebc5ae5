//! A toy in-memory IR implementing [`crate::ir`]'s traits, used only by unit
//! tests throughout this crate so analyses can be exercised without a real
//! compiler frontend.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ir::{self, AddressSpaceSet, ArithKind, Block, CompareKind, FieldRef, PrimitiveConst};

pub type BlockId = u32;
pub type ValueId = u32;

#[derive(Debug, Clone)]
pub enum Op {
    Parameter(usize),
    Phi(Vec<(BlockId, ValueId)>),
    Predicate {
        condition: ValueId,
        if_true: ValueId,
        if_false: ValueId,
    },
    GetField {
        source: ValueId,
        field: FieldRef,
    },
    SetField {
        source: ValueId,
        field: FieldRef,
        value: ValueId,
    },
    Structure(Vec<ValueId>),
    Call {
        target: u64,
        args: Vec<ValueId>,
    },
    Alloca {
        alignment: u32,
    },
    LoadElementAddress {
        source: ValueId,
        element_alignment: u32,
    },
    LoadFieldAddress {
        source: ValueId,
        field: FieldRef,
    },
    AlignViewTo {
        source: ValueId,
        alignment: u32,
    },
    Const(PrimitiveConst),
    Undefined,
    Compare {
        left: ValueId,
        right: ValueId,
        kind: CompareKind,
    },
    Arith {
        left: ValueId,
        right: ValueId,
        kind: ArithKind,
    },
    CondBranch {
        condition: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Branch(BlockId),
    Return(Option<ValueId>),
    LaneIdx,
    GroupIndex,
    GridIndex,
}

#[derive(Debug, Clone)]
struct ValueData {
    id: ValueId,
    block: BlockId,
    op: Op,
    address_space: Option<AddressSpaceSet>,
    stack_alignment: u32,
}

#[derive(Debug, Clone)]
struct BlockData {
    id: BlockId,
    values: Vec<ValueId>,
    predecessors: Vec<BlockId>,
}

#[derive(Debug, Default)]
struct GraphInner {
    blocks: Vec<BlockData>,
    values: Vec<ValueData>,
}

/// A small, mutable in-memory method under construction. Build one with
/// [`Graph::new`], add blocks/values, then hand out [`TestBlock`]/
/// [`TestValue`] handles that implement [`crate::ir::Block`]/
/// [`crate::ir::Value`] over a shared, reference-counted snapshot.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&self) -> BlockId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.blocks.len() as BlockId;
        inner.blocks.push(BlockData {
            id,
            values: Vec::new(),
            predecessors: Vec::new(),
        });
        id
    }

    pub fn add_value(&self, block: BlockId, op: Op) -> ValueId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.values.len() as ValueId;
        inner.values.push(ValueData {
            id,
            block,
            op,
            address_space: None,
            stack_alignment: 1,
        });
        inner.blocks[block as usize].values.push(id);
        id
    }

    /// Overwrite an already-created value's operation, so a phi can
    /// reference a value defined later in program order (e.g. a loop's
    /// back-edge increment) by reserving it with a placeholder first.
    pub fn set_op(&self, value: ValueId, op: Op) {
        self.inner.borrow_mut().values[value as usize].op = op;
    }

    pub fn set_address_space(&self, value: ValueId, space: AddressSpaceSet) {
        self.inner.borrow_mut().values[value as usize].address_space = Some(space);
    }

    pub fn set_stack_alignment(&self, value: ValueId, alignment: u32) {
        self.inner.borrow_mut().values[value as usize].stack_alignment = alignment;
    }

    /// Wires up `from`'s successor edges by scanning its terminator;
    /// predecessor lists are rebuilt from the full block set. Call once
    /// after all blocks/values/terminators have been added.
    pub fn finish(&self) {
        let successors: Vec<(BlockId, Vec<BlockId>)> = {
            let inner = self.inner.borrow();
            inner
                .blocks
                .iter()
                .map(|b| {
                    let term = &inner.values[*b.values.last().expect("block has a terminator") as usize];
                    (b.id, successors_of(&term.op))
                })
                .collect()
        };
        let mut inner = self.inner.borrow_mut();
        for b in &mut inner.blocks {
            b.predecessors.clear();
        }
        for (from, succs) in successors {
            for s in succs {
                inner.blocks[s as usize].predecessors.push(from);
            }
        }
    }

    pub fn block(&self, id: BlockId) -> TestBlock {
        TestBlock { graph: self.clone(), id }
    }

    pub fn value(&self, id: ValueId) -> TestValue {
        TestValue { graph: self.clone(), id }
    }

    pub fn method(&self, id: u64, num_parameters: usize, entry: BlockId, is_void: bool) -> TestMethod {
        TestMethod {
            graph: self.clone(),
            id,
            num_parameters,
            entry,
            is_void,
        }
    }
}

fn successors_of(op: &Op) -> Vec<BlockId> {
    match op {
        Op::CondBranch { then_block, else_block, .. } => vec![*then_block, *else_block],
        Op::Branch(target) => vec![*target],
        Op::Return(_) => Vec::new(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct TestBlock {
    graph: Graph,
    id: BlockId,
}

#[derive(Debug, Clone)]
pub struct TestValue {
    graph: Graph,
    id: ValueId,
}

#[derive(Debug, Clone)]
pub struct TestMethod {
    graph: Graph,
    id: u64,
    num_parameters: usize,
    entry: BlockId,
    is_void: bool,
}

impl PartialEq for TestMethod {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for TestMethod {}
impl std::hash::Hash for TestMethod {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl ir::Block for TestBlock {
    type Id = BlockId;
    type Value = TestValue;

    fn id(&self) -> BlockId {
        self.id
    }

    fn successors(&self) -> Vec<BlockId> {
        let inner = self.graph.inner.borrow();
        let block = &inner.blocks[self.id as usize];
        let term_id = *block.values.last().expect("block has a terminator");
        successors_of(&inner.values[term_id as usize].op)
    }

    fn predecessors(&self) -> Vec<BlockId> {
        self.graph.inner.borrow().blocks[self.id as usize]
            .predecessors
            .clone()
    }

    fn terminator(&self) -> TestValue {
        let inner = self.graph.inner.borrow();
        let block = &inner.blocks[self.id as usize];
        let term_id = *block.values.last().expect("block has a terminator");
        TestValue {
            graph: self.graph.clone(),
            id: term_id,
        }
    }

    fn values(&self) -> Vec<TestValue> {
        self.graph.inner.borrow().blocks[self.id as usize]
            .values
            .iter()
            .map(|&id| TestValue {
                graph: self.graph.clone(),
                id,
            })
            .collect()
    }
}

impl ir::Value for TestValue {
    type Block = TestBlock;

    fn id(&self) -> BlockId {
        self.id
    }

    fn block_id(&self) -> BlockId {
        self.graph.inner.borrow().values[self.id as usize].block
    }

    fn kind(&self) -> ir::ValueKind<TestValue> {
        let inner = self.graph.inner.borrow();
        let g = &self.graph;
        let v = |id: ValueId| TestValue { graph: g.clone(), id };
        match &inner.values[self.id as usize].op {
            Op::Parameter(i) => ir::ValueKind::Parameter(*i),
            Op::Phi(incoming) => {
                ir::ValueKind::PhiValue(incoming.iter().map(|&(b, id)| (b, v(id))).collect())
            }
            Op::Predicate { condition, if_true, if_false } => ir::ValueKind::Predicate {
                condition: v(*condition),
                if_true: v(*if_true),
                if_false: v(*if_false),
            },
            Op::GetField { source, field } => ir::ValueKind::GetField {
                source: v(*source),
                field: *field,
            },
            Op::SetField { source, field, value } => ir::ValueKind::SetField {
                source: v(*source),
                field: *field,
                value: v(*value),
            },
            Op::Structure(fields) => ir::ValueKind::StructureValue(fields.iter().copied().map(v).collect()),
            Op::Call { target, args } => ir::ValueKind::MethodCall {
                target: *target,
                args: args.iter().copied().map(v).collect(),
            },
            Op::Alloca { alignment } => ir::ValueKind::Alloca { alignment: *alignment },
            Op::LoadElementAddress { source, element_alignment } => ir::ValueKind::LoadElementAddress {
                source: v(*source),
                element_alignment: *element_alignment,
            },
            Op::LoadFieldAddress { source, field } => ir::ValueKind::LoadFieldAddress {
                source: v(*source),
                field: *field,
            },
            Op::AlignViewTo { source, alignment } => ir::ValueKind::AlignViewTo {
                source: v(*source),
                alignment: *alignment,
            },
            Op::Const(c) => ir::ValueKind::PrimitiveValue(*c),
            Op::Undefined => ir::ValueKind::UndefinedValue,
            Op::Compare { left, right, kind } => ir::ValueKind::CompareValue {
                left: v(*left),
                right: v(*right),
                kind: *kind,
            },
            Op::Arith { left, right, kind } => ir::ValueKind::BinaryArithmeticValue {
                left: v(*left),
                right: v(*right),
                kind: *kind,
            },
            Op::CondBranch { condition, then_block, else_block } => ir::ValueKind::ConditionalBranch {
                condition: v(*condition),
                then_block: *then_block,
                else_block: *else_block,
            },
            Op::Branch(target) => ir::ValueKind::UnconditionalBranch { target: *target },
            Op::Return(value) => ir::ValueKind::ReturnTerminator(value.map(v)),
            Op::LaneIdx => ir::ValueKind::LaneIdxValue,
            Op::GroupIndex => ir::ValueKind::GroupIndexValue,
            Op::GridIndex => ir::ValueKind::GridIndexValue,
        }
    }

    fn address_space(&self) -> Option<AddressSpaceSet> {
        self.graph.inner.borrow().values[self.id as usize].address_space
    }

    fn stack_alignment(&self) -> u32 {
        self.graph.inner.borrow().values[self.id as usize].stack_alignment
    }
}

impl ir::Method for TestMethod {
    type Block = TestBlock;

    fn id(&self) -> u64 {
        self.id
    }

    fn entry_block(&self) -> TestBlock {
        self.graph.block(self.entry)
    }

    fn blocks(&self) -> Vec<TestBlock> {
        let count = self.graph.inner.borrow().blocks.len() as BlockId;
        (0..count).map(|id| self.graph.block(id)).collect()
    }

    fn is_void(&self) -> bool {
        self.is_void
    }

    fn has_implementation(&self) -> bool {
        true
    }

    fn parameters(&self) -> Vec<TestValue> {
        self.graph
            .block(self.entry)
            .values()
            .into_iter()
            .filter(|v| matches!(ir::Value::kind(v), ir::ValueKind::Parameter(_)))
            .take(self.num_parameters)
            .collect()
    }
}
