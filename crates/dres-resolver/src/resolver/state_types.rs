//! Literals, `this`/`super`, type tests, casts, conditionals and cascades.

use super::ResolverVisitor;
use dres_common::diagnostics::diagnostic_codes;
use dres_element::{Element, TypeId};
use dres_syntax::{NodeIndex, NodeKind};

impl ResolverVisitor<'_> {
    pub(crate) fn visit_literal(&mut self, node: NodeIndex) {
        let Some(kind) = self.unit.arena.kind(node) else {
            return;
        };
        let ty = match kind {
            NodeKind::NullLiteral => TypeId::BOTTOM,
            NodeKind::BooleanLiteral { .. } => self.provider.bool_type,
            NodeKind::IntegerLiteral { .. } => self.provider.int_type,
            NodeKind::DoubleLiteral { .. } => self.provider.double_type,
            NodeKind::SymbolLiteral { .. } => self.provider.symbol_type,
            NodeKind::StringInterpolation { elements } => {
                for element in elements.iter() {
                    self.visit(element);
                }
                self.provider.string_type
            }
            NodeKind::AdjacentStrings { strings } => {
                for string in strings.iter() {
                    self.visit(string);
                }
                self.provider.string_type
            }
            _ => self.provider.string_type,
        };
        self.record_static(node, ty);
    }

    pub(crate) fn visit_this(&mut self, node: NodeIndex) {
        let ty = self
            .model
            .element(self.context.class)
            .and_then(Element::as_class)
            .map_or(TypeId::DYNAMIC, |c| c.this_type);
        self.record_static(node, ty);
    }

    pub(crate) fn visit_super(&mut self, node: NodeIndex) {
        if !self.context.is_instance_context() {
            self.report(node, diagnostic_codes::SUPER_IN_INVALID_CONTEXT, Vec::new());
            self.record_static(node, TypeId::DYNAMIC);
            return;
        }
        let ty = self
            .model
            .supertype(self.context.class)
            .unwrap_or(TypeId::DYNAMIC);
        self.record_static(node, ty);
    }

    pub(crate) fn visit_is(&mut self, node: NodeIndex) {
        let Some(NodeKind::IsExpression { expression, .. }) = self.unit.arena.kind(node) else {
            return;
        };
        self.visit(*expression);
        self.record_static(node, self.provider.bool_type);
    }

    pub(crate) fn visit_as(&mut self, node: NodeIndex) {
        let Some(NodeKind::AsExpression {
            expression,
            type_name,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.visit(*expression);
        let ty = self.static_type(*type_name);
        self.record_static(node, ty);
    }

    pub(crate) fn visit_conditional(&mut self, node: NodeIndex) {
        let Some(NodeKind::ConditionalExpression {
            condition,
            then_expression,
            else_expression,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let (condition, then_expression, else_expression) =
            (*condition, *then_expression, *else_expression);
        self.visit(condition);
        self.visit_promoted(condition, then_expression);
        self.visit(else_expression);

        let (a, b) = (self.static_type(then_expression), self.static_type(else_expression));
        let static_type = self.ts().least_upper_bound(a, b);
        self.record_static(node, static_type);
        if self.propagated_type(then_expression).is_some() || self.propagated_type(else_expression).is_some() {
            let (a, b) = (self.best_type(then_expression), self.best_type(else_expression));
            let propagated = self.ts().least_upper_bound(a, b);
            self.record_propagated(node, propagated);
        }
    }

    pub(crate) fn visit_cascade(&mut self, node: NodeIndex) {
        let Some(NodeKind::CascadeExpression { target, sections }) = self.unit.arena.kind(node) else {
            return;
        };
        self.visit(*target);
        self.cascade_targets.push(*target);
        for section in sections.iter() {
            self.visit(section);
        }
        self.cascade_targets.pop();
        self.copy_types(*target, node);
    }

    // =========================================================================
    // Collection literals
    // =========================================================================

    pub(crate) fn visit_list_literal(&mut self, node: NodeIndex) {
        let Some(NodeKind::ListLiteral {
            type_arguments,
            elements,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        for element in elements.iter() {
            self.visit(element);
        }
        let arguments: Vec<TypeId> = type_arguments.iter().map(|t| self.static_type(t)).collect();
        let element_type = match arguments.as_slice() {
            [ty] => *ty,
            _ => TypeId::DYNAMIC,
        };
        let ty = self.provider.list_of(self.model, element_type);
        self.record_static(node, ty);
        if !arguments.is_empty() {
            return;
        }
        let common = self.common_type(elements.iter());
        if let Some(common) = common {
            let propagated = self.provider.list_of(self.model, common);
            self.record_propagated(node, propagated);
        }
    }

    pub(crate) fn visit_map_literal(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::MapLiteral {
            type_arguments,
            entries,
            ..
        }) = arena.kind(node)
        else {
            return;
        };
        for entry in entries.iter() {
            self.visit(entry);
        }
        let arguments: Vec<TypeId> = type_arguments.iter().map(|t| self.static_type(t)).collect();
        let (key, value) = match arguments.as_slice() {
            [k, v] => (*k, *v),
            _ => (TypeId::DYNAMIC, TypeId::DYNAMIC),
        };
        let ty = self.provider.map_of(self.model, key, value);
        self.record_static(node, ty);
        if !arguments.is_empty() {
            return;
        }
        let mut keys = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            if let Some(NodeKind::MapLiteralEntry { key, value }) = arena.kind(entry) {
                keys.push(*key);
                values.push(*value);
            }
        }
        let key_type = self.common_type(keys.into_iter());
        let value_type = self.common_type(values.into_iter());
        if key_type.is_some() || value_type.is_some() {
            let propagated = self.provider.map_of(
                self.model,
                key_type.unwrap_or(TypeId::DYNAMIC),
                value_type.unwrap_or(TypeId::DYNAMIC),
            );
            self.record_propagated(node, propagated);
        }
    }

    /// Best type shared by every node, when there is at least one node and
    /// the type is not `dynamic`.
    fn common_type(&self, nodes: impl Iterator<Item = NodeIndex>) -> Option<TypeId> {
        let mut common = None;
        for node in nodes {
            let ty = self.best_type(node);
            match common {
                None => common = Some(ty),
                Some(existing) if existing == ty => {}
                Some(_) => return None,
            }
        }
        common.filter(|ty| !ty.is_dynamic() && !ty.is_bottom())
    }
}
