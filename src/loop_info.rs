//! Unique-header loop analysis: induction variables, do-while vs while
//! classification, and static trip counts.
//!
//! `InductionVariable`'s API surface (`try_resolve_update_operation`,
//! `try_resolve_break_operation`, `try_resolve_bounds`) mirrors the
//! `TryResolve*` naming convention used throughout this codebase's analyses
//! (e.g. `hir/src/ir/loops.rs`'s own `Try*`-prefixed accessors), adapted to
//! return `Option`s instead of an out-parameter boolean.

use crate::error::AnalysisError;
use crate::ir::{Block, CompareKind, Value, ValueKind};
use crate::loops::LoopNode;

/// A loop-header phi used as a trip counter: initialized outside the loop,
/// advanced on the back edge, and tested by the loop's single break branch.
#[derive(Debug, Clone)]
pub struct InductionVariable<V> {
    index: usize,
    phi: V,
    init: V,
    update: V,
    break_branch: V,
}

impl<V: Value> InductionVariable<V> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phi(&self) -> &V {
        &self.phi
    }

    pub fn init(&self) -> &V {
        &self.init
    }

    pub fn update(&self) -> &V {
        &self.update
    }

    pub fn break_branch(&self) -> &V {
        &self.break_branch
    }

    /// Requires `update` to be an integer `BinaryArithmeticValue`; resolves
    /// the step constant. The step is always read from operand index 1 of
    /// the update expression, regardless of which side the loop-carried
    /// value is on — a quirk preserved intentionally rather than "fixed" to
    /// `? 1 : 0`, since observable behavior must match.
    pub fn try_resolve_update_operation(&self) -> Option<i64> {
        let ValueKind::BinaryArithmeticValue { right, kind, .. } = self.update.kind() else {
            return None;
        };
        let ValueKind::PrimitiveValue(step_const) = right.kind() else {
            return None;
        };
        let step = step_const.as_int()?;
        match kind {
            crate::ir::ArithKind::Add => Some(step),
            crate::ir::ArithKind::Sub => Some(-step),
            crate::ir::ArithKind::Mul => None,
        }
    }

    /// Resolves the break branch's compare constant and kind, normalized so
    /// the induction phi is always the left-hand operand (mirroring the
    /// comparison kind when the phi was written on the right).
    pub fn try_resolve_break_operation(&self) -> Option<(CompareKind, i64)> {
        let ValueKind::ConditionalBranch { condition, .. } = self.break_branch.kind() else {
            return None;
        };
        let ValueKind::CompareValue { left, right, kind } = condition.kind() else {
            return None;
        };

        let phi_is_left = values_match(&left, &self.phi);
        let (const_operand, kind) = if phi_is_left {
            (right, kind)
        } else if values_match(&right, &self.phi) {
            (left, mirror(kind))
        } else {
            return None;
        };

        let ValueKind::PrimitiveValue(c) = const_operand.kind() else {
            return None;
        };
        Some((kind, c.as_int()?))
    }

    /// Resolves the fully-constant bounds of this induction variable, if its
    /// initial value is itself an integer constant.
    pub fn try_resolve_bounds(&self, is_do_while: bool) -> Option<InductionVariableBounds> {
        let ValueKind::PrimitiveValue(init_const) = self.init.kind() else {
            return None;
        };
        let init = init_const.as_int()?;
        let step = self.try_resolve_update_operation()?;
        let (kind, break_const) = self.try_resolve_break_operation()?;
        Some(InductionVariableBounds {
            init,
            step,
            kind,
            break_const,
            is_do_while,
        })
    }
}

fn mirror(kind: CompareKind) -> CompareKind {
    match kind {
        CompareKind::Eq => CompareKind::Eq,
        CompareKind::Ne => CompareKind::Ne,
        CompareKind::Lt => CompareKind::Gt,
        CompareKind::Le => CompareKind::Ge,
        CompareKind::Gt => CompareKind::Lt,
        CompareKind::Ge => CompareKind::Le,
    }
}

fn values_match<V: Value>(a: &V, b: &V) -> bool {
    a.id() == b.id()
}

fn eval_cmp(a: i64, kind: CompareKind, b: i64) -> bool {
    match kind {
        CompareKind::Eq => a == b,
        CompareKind::Ne => a != b,
        CompareKind::Lt => a < b,
        CompareKind::Le => a <= b,
        CompareKind::Gt => a > b,
        CompareKind::Ge => a >= b,
    }
}

/// The fully-resolved constant bounds of an [`InductionVariable`].
#[derive(Debug, Clone, Copy)]
pub struct InductionVariableBounds {
    init: i64,
    step: i64,
    kind: CompareKind,
    break_const: i64,
    is_do_while: bool,
}

impl InductionVariableBounds {
    /// The number of times the loop body executes, or `None` if the step is
    /// zero, the loop never enters its body, or the bound computation
    /// underflows (treated as an infinite loop).
    pub fn try_get_trip_count(&self) -> Option<u64> {
        if self.step == 0 {
            return None;
        }
        let offset: i64 = if self.is_do_while { 1 } else { 0 };
        let entered = eval_cmp(self.init, self.kind, self.break_const);
        if !entered {
            return u64::try_from(offset).ok();
        }
        if matches!(self.kind, CompareKind::Eq) {
            return u64::try_from(1 + offset).ok();
        }
        let last = match self.kind {
            CompareKind::Lt => self.break_const - 1,
            CompareKind::Gt => self.break_const + 1,
            CompareKind::Ne => {
                if self.step > 0 {
                    self.break_const - 1
                } else {
                    self.break_const + 1
                }
            }
            _ => self.break_const,
        };
        let count = (last - self.init) / self.step;
        if count < 0 {
            return None;
        }
        u64::try_from(count + 1 + offset).ok()
    }
}

/// Derived facts about a uniquely-shaped loop: its body entry, whether it is
/// a do-while loop, its induction variables, and any phi referenced outside
/// the loop.
pub struct LoopInfo<V: Value> {
    induction_variables: Vec<InductionVariable<V>>,
    external_phis: Vec<V>,
    body: <V::Block as Block>::Id,
    is_do_while: bool,
}

impl<V: Value> LoopInfo<V> {
    pub fn induction_variables(&self) -> &[InductionVariable<V>] {
        &self.induction_variables
    }

    pub fn external_phis(&self) -> &[V] {
        &self.external_phis
    }

    pub fn body(&self) -> <V::Block as Block>::Id {
        self.body
    }

    pub fn is_do_while(&self) -> bool {
        self.is_do_while
    }
}

/// Attempt to derive [`LoopInfo`] for `loop_node`. Fails with
/// [`AnalysisError::IrregularLoop`] unless the loop has exactly one header,
/// entry, exit, breaker, and back edge.
pub fn try_build<B>(
    loop_node: &LoopNode<B::Id>,
    get_block: impl Fn(B::Id) -> B,
) -> Result<LoopInfo<B::Value>, AnalysisError>
where
    B: Block,
{
    let [_header] = one(loop_node.headers())?;
    let [entry] = one(loop_node.entries())?;
    let [exit] = one(loop_node.exits())?;
    let [breaker] = one(loop_node.breakers())?;
    let [_back_edge] = one(loop_node.back_edges())?;

    let breaker_block = get_block(breaker);
    let breaker_successors = breaker_block.successors();
    if breaker_successors.len() != 2 {
        return Err(AnalysisError::IrregularLoop {
            reason: "loop breaker does not have exactly two successors",
        });
    }
    let body = *breaker_successors
        .iter()
        .find(|&&s| s != exit)
        .ok_or(AnalysisError::IrregularLoop {
            reason: "loop breaker's successors do not include the loop exit",
        })?;

    let entry_block = get_block(entry);
    let is_do_while = entry_block.successors().contains(&body);

    let break_branch_value = breaker_block.terminator();
    let mut induction_variables = Vec::new();
    let mut induction_phi_ids: Vec<B::Id> = Vec::new();

    if let ValueKind::ConditionalBranch { condition, .. } = break_branch_value.kind()
        && let ValueKind::CompareValue { left, right, .. } = condition.kind() {
            let phi_operand = match (left.kind(), right.kind()) {
                (ValueKind::PhiValue(_), ValueKind::PhiValue(_)) => None,
                (ValueKind::PhiValue(_), _) => Some(left),
                (_, ValueKind::PhiValue(_)) => Some(right),
                _ => None,
            };
            if let Some(phi) = phi_operand
                && loop_node.contains_block(phi.block_id())
                    && let ValueKind::PhiValue(incoming) = phi.kind()
                        && incoming.len() == 2 {
                            let inside: Vec<_> = incoming
                                .iter()
                                .filter(|(src, _)| loop_node.contains_block(*src))
                                .collect();
                            let outside: Vec<_> = incoming
                                .iter()
                                .filter(|(src, _)| !loop_node.contains_block(*src))
                                .collect();
                            if inside.len() == 1 && outside.len() == 1 {
                                induction_phi_ids.push(phi.id());
                                induction_variables.push(InductionVariable {
                                    index: 0,
                                    phi: phi.clone(),
                                    init: outside[0].1.clone(),
                                    update: inside[0].1.clone(),
                                    break_branch: break_branch_value.clone(),
                                });
                            }
                        }
        }

    let mut external_phis = Vec::new();
    for &member in loop_node.members() {
        let block = get_block(member);
        for value in crate::phis::collect_block_phis(&block) {
            if induction_phi_ids.contains(&value.id()) {
                continue;
            }
            let ValueKind::PhiValue(incoming) = value.kind() else {
                continue;
            };
            let has_internal = incoming
                .iter()
                .any(|(src, _)| loop_node.contains_block(*src));
            let has_external = incoming
                .iter()
                .any(|(src, _)| !loop_node.contains_block(*src));
            if !has_external {
                continue;
            }
            if has_internal {
                external_phis.push(value);
            } else {
                return Err(AnalysisError::IrregularLoop {
                    reason: "loop phi has no loop-internal source",
                });
            }
        }
    }

    Ok(LoopInfo {
        induction_variables,
        external_phis,
        body,
        is_do_while,
    })
}

fn one<Id: Copy>(slice: &[Id]) -> Result<[Id; 1], AnalysisError> {
    match slice {
        [only] => Ok([*only]),
        _ => Err(AnalysisError::IrregularLoop {
            reason: "loop does not have exactly one of header/entry/exit/breaker/back-edge",
        }),
    }
}
