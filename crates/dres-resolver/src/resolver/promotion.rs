//! Type promotion: narrowing a local variable or parameter inside the
//! branch guarded by an `is` test.

use super::ResolverVisitor;
use crate::variable_resolver::is_write_context;
use dres_element::{ElementFlags, ElementId, ElementKind, TypeId};
use dres_syntax::{NodeIndex, NodeKind, Operator};
use rustc_hash::FxHashMap;
use tracing::trace;

#[derive(Debug)]
pub struct PromotionManager {
    scopes: Vec<FxHashMap<ElementId, TypeId>>,
}

impl Default for PromotionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PromotionManager {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn set_type(&mut self, variable: ElementId, ty: TypeId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(variable, ty);
        }
    }

    pub fn promoted_type(&self, variable: ElementId) -> Option<TypeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&variable))
            .copied()
    }
}

impl ResolverVisitor<'_> {
    /// Visit `branch` with the promotions implied by `condition` being true.
    pub(crate) fn visit_promoted(&mut self, condition: NodeIndex, branch: NodeIndex) {
        self.promotion.enter_scope();
        self.promote_types(condition, branch);
        self.visit(branch);
        self.promotion.exit_scope();
    }

    pub(crate) fn promote_types(&mut self, condition: NodeIndex, branch: NodeIndex) {
        let arena = self.unit.arena;
        match arena.kind(condition) {
            Some(NodeKind::BinaryExpression {
                operator: Operator::AmpAmp,
                left,
                right,
            }) => {
                self.promote_types(*left, branch);
                self.promote_types(*right, branch);
            }
            Some(NodeKind::ParenthesizedExpression { expression }) => {
                self.promote_types(*expression, branch);
            }
            Some(NodeKind::IsExpression {
                expression,
                negated: false,
                type_name,
            }) => {
                let variable = self.annotations.static_element(*expression);
                if !matches!(arena.kind(*expression), Some(NodeKind::SimpleIdentifier { .. }))
                    || !matches!(
                        self.model.kind(variable),
                        Some(ElementKind::LocalVariable | ElementKind::Parameter)
                    )
                {
                    return;
                }
                let tested = self.static_type(*type_name);
                if !self.can_promote(variable, branch) {
                    trace!(variable = variable.0, "promotion blocked");
                    return;
                }
                let current = self
                    .promotion
                    .promoted_type(variable)
                    .unwrap_or_else(|| self.model.element_type(variable));
                if tested.is_dynamic() || tested == current || !self.ts().is_more_specific(tested, current) {
                    return;
                }
                if self.options.enable_type_promotion {
                    trace!(variable = variable.0, ty = tested.0, "promote");
                    self.promotion.set_type(variable, tested);
                } else if current.is_dynamic() {
                    self.overrides.set_type(variable, Some(tested));
                }
            }
            _ => {}
        }
    }

    fn can_promote(&self, variable: ElementId, branch: NodeIndex) -> bool {
        if self.model.has_flag(variable, ElementFlags::POTENTIALLY_MUTATED_IN_CLOSURE) {
            return false;
        }
        if self.is_mutated_in(variable, branch) {
            return false;
        }
        !(self.model.has_flag(variable, ElementFlags::POTENTIALLY_MUTATED_IN_SCOPE)
            && self.is_accessed_in_closure_in(variable, branch))
    }

    /// `variable` is assigned somewhere under `node`.
    fn is_mutated_in(&self, variable: ElementId, node: NodeIndex) -> bool {
        let arena = self.unit.arena;
        arena.descendants(node).into_iter().any(|n| {
            matches!(arena.kind(n), Some(NodeKind::SimpleIdentifier { .. }))
                && is_write_context(arena, n)
                && self.annotations.static_element(n) == variable
        })
    }

    /// `variable` is referenced from a closure nested under `node`.
    fn is_accessed_in_closure_in(&self, variable: ElementId, node: NodeIndex) -> bool {
        let arena = self.unit.arena;
        arena.descendants(node).into_iter().any(|n| {
            matches!(arena.kind(n), Some(NodeKind::FunctionExpression { .. }))
                && arena.descendants(n).into_iter().any(|m| {
                    matches!(arena.kind(m), Some(NodeKind::SimpleIdentifier { .. }))
                        && self.annotations.static_element(m) == variable
                })
        })
    }
}
