//! Address-space analysis: which of {Generic, Global, Shared, Local} a
//! pointer-typed value may live in.

use crate::fixedpoint::value::ValueAnalysis;
use crate::ir::{AddressSpaceSet, Block, Value, ValueKind};
use crate::lattice::{AnalysisValue, LatticeLike};

impl LatticeLike for AddressSpaceSet {
    fn merge(&self, other: &Self) -> Self {
        *self | *other
    }
}

/// How a method's parameters seed their initial address space.
#[derive(Debug, Clone, Copy)]
pub enum ParameterSeed {
    /// Every parameter starts at a single, caller-supplied address space.
    Const(AddressSpaceSet),
    /// Each parameter seeds from its own static type.
    Automatic,
}

pub struct AddressSpaceAnalysis {
    pub parameter_seed: ParameterSeed,
    /// If set, `Generic` is masked out of every type-derived seed before it
    /// enters the lattice, so a value typed `Generic | Shared` starts at
    /// just `Shared` instead of carrying the uninformative bit along.
    pub filter_generic: bool,
}

impl AddressSpaceAnalysis {
    fn filter(&self, space: AddressSpaceSet) -> AddressSpaceSet {
        if self.filter_generic && space != AddressSpaceSet::GENERIC {
            space - AddressSpaceSet::GENERIC
        } else {
            space
        }
    }
}

impl<B: Block> ValueAnalysis<B> for AddressSpaceAnalysis {
    type Lattice = AddressSpaceSet;

    fn seed(&self, value: &B::Value) -> Option<AnalysisValue<AddressSpaceSet>> {
        if let ValueKind::Parameter(_) = value.kind() {
            return Some(AnalysisValue::scalar(match self.parameter_seed {
                ParameterSeed::Const(space) => space,
                ParameterSeed::Automatic => {
                    self.filter(value.address_space().unwrap_or_default())
                }
            }));
        }
        value
            .address_space()
            .map(|space| AnalysisValue::scalar(self.filter(space)))
    }
}

/// The single address space a value's computed bit-set denotes: if exactly
/// one bit is set and it isn't `Generic`, that space; otherwise `Generic`.
pub fn unified_address_space(value: &AnalysisValue<AddressSpaceSet>) -> AddressSpaceSet {
    value.data().unify()
}
