//! The external contract this crate requires from a host IR.
//!
//! None of these traits are implemented in this crate for any real IR —
//! that's the job of the compiler's IR crate. A small `testing` module
//! (cfg-gated to `#[cfg(test)]`) implements them over a toy in-memory graph
//! so the analyses here can be exercised without a real frontend.

use std::fmt;
use std::hash::Hash;

use bitflags::bitflags;

bitflags! {
    /// The address spaces a pointer-typed value can live in. Several bits may
    /// be set at once while a value's address space is still being narrowed
    /// down by [`crate::analyses::address_space`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AddressSpaceSet: u8 {
        const GENERIC = 0b0001;
        const GLOBAL  = 0b0010;
        const SHARED  = 0b0100;
        const LOCAL   = 0b1000;
    }
}

impl AddressSpaceSet {
    /// The single, unambiguous address space this set denotes, or `Generic`
    /// if more than one bit is set (or the set names `Generic` itself).
    pub fn unify(self) -> AddressSpaceSet {
        if self.bits().count_ones() == 1 && self != AddressSpaceSet::GENERIC {
            self
        } else {
            AddressSpaceSet::GENERIC
        }
    }
}

/// The two comparison/arithmetic operator families a `CompareValue` or
/// `BinaryArithmeticValue` can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKind {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithKind {
    Add,
    Sub,
    Mul,
}

/// A reference to a field inside a structure type, carrying the metadata
/// analyses need without requiring a full type-system trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub index: usize,
    pub alignment: u32,
}

/// A compile-time constant carried by a `PrimitiveValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveConst {
    Int(i64),
    Bool(bool),
}

impl PrimitiveConst {
    pub fn as_int(self) -> Option<i64> {
        match self {
            PrimitiveConst::Int(v) => Some(v),
            PrimitiveConst::Bool(_) => None,
        }
    }
}

/// The subkind of a [`Value`], and the operands relevant to this crate's
/// analyses. `B` is the host's block type.
#[derive(Debug, Clone)]
pub enum ValueKind<V: Value> {
    Parameter(usize),
    PhiValue(Vec<(<V::Block as Block>::Id, V)>),
    Predicate {
        condition: V,
        if_true: V,
        if_false: V,
    },
    GetField {
        source: V,
        field: FieldRef,
    },
    SetField {
        source: V,
        field: FieldRef,
        value: V,
    },
    StructureValue(Vec<V>),
    MethodCall {
        target: u64,
        args: Vec<V>,
    },
    Alloca {
        alignment: u32,
    },
    LoadElementAddress {
        source: V,
        element_alignment: u32,
    },
    LoadFieldAddress {
        source: V,
        field: FieldRef,
    },
    AlignViewTo {
        source: V,
        alignment: u32,
    },
    PrimitiveValue(PrimitiveConst),
    UndefinedValue,
    CompareValue {
        left: V,
        right: V,
        kind: CompareKind,
    },
    BinaryArithmeticValue {
        left: V,
        right: V,
        kind: ArithKind,
    },
    ConditionalBranch {
        condition: V,
        then_block: <V::Block as Block>::Id,
        else_block: <V::Block as Block>::Id,
    },
    UnconditionalBranch {
        target: <V::Block as Block>::Id,
    },
    ReturnTerminator(Option<V>),
    LaneIdxValue,
    GroupIndexValue,
    GridIndexValue,
}

/// A basic block: a maximal straight-line run of values ending in a single
/// terminator. Blocks are identified by reference; `Id` is a small, cheaply
/// comparable/hashable handle (commonly a pointer or dense index) that the
/// host IR controls the meaning of.
pub trait Block: Clone + fmt::Debug {
    type Id: Copy + Eq + Hash + Ord + fmt::Debug;
    type Value: Value<Block = Self>;

    /// The identity of this block, used for map/set keys.
    fn id(&self) -> Self::Id;

    /// Successor blocks, in the canonical order defined by the terminator.
    fn successors(&self) -> Vec<Self::Id>;

    /// Predecessor blocks, in no particular guaranteed order.
    fn predecessors(&self) -> Vec<Self::Id>;

    /// The block's terminator value (a branch or return kind of [`Value`]).
    fn terminator(&self) -> Self::Value;

    /// Values of the block, in definition order.
    fn values(&self) -> Vec<Self::Value>;

    /// Render a diagnostic message pointing at this block, used to build
    /// [`crate::error::AnalysisError::InvalidOperation`] messages.
    fn format_error(&self, message: &str) -> String {
        format!("{:?}: {message}", self.id())
    }
}

/// An instruction-level value, living in exactly one [`Block`].
pub trait Value: Clone + fmt::Debug {
    type Block: Block<Value = Self>;

    /// Identity of this value (used for map/set keys and equality).
    fn id(&self) -> <Self::Block as Block>::Id;

    /// The block this value is defined in.
    fn block_id(&self) -> <Self::Block as Block>::Id;

    /// This value's subkind and relevant operands.
    fn kind(&self) -> ValueKind<Self>;

    /// The statically-known address space of this value's type, if the
    /// value's type carries address-space information at all.
    fn address_space(&self) -> Option<AddressSpaceSet> {
        None
    }

    /// The default stack alignment (in bytes) the host IR assigns to an
    /// `Alloca` of this value's type. Only meaningful when `kind()` is
    /// `Alloca`.
    fn stack_alignment(&self) -> u32 {
        1
    }
}

/// A method (function): an entry block plus a parameter list, identified
/// stably for use as a landscape node and a fixed-point worklist key.
pub trait Method: Clone + fmt::Debug + Eq + Hash {
    type Block: Block;

    /// A stable identifier, used for deterministic sorting (e.g. the
    /// landscape's `uses` lists) and as a map key.
    fn id(&self) -> u64;

    fn entry_block(&self) -> Self::Block;

    /// Every block belonging to this method, in no particular required
    /// order (callers that need a specific traversal order build their own
    /// [`crate::cfg::BasicBlockCollection`] from `entry_block()`).
    fn blocks(&self) -> Vec<Self::Block>;

    fn is_void(&self) -> bool;

    fn has_implementation(&self) -> bool;

    fn parameters(&self) -> Vec<<Self::Block as Block>::Value>;

    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }
}

/// `min(a, b)`, exposed as a named intrinsic for analyses that need it
/// without pulling in a full numeric trait.
#[inline]
pub fn min(a: u32, b: u32) -> u32 {
    core::cmp::min(a, b)
}

/// `is_power_of_two(x)`, exposed as a named intrinsic per the external
/// interface contract.
#[inline]
pub fn is_power_of_two(x: u32) -> bool {
    x != 0 && (x & (x - 1)) == 0
}
