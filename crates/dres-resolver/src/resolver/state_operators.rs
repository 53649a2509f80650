//! User-definable operators: binary, prefix, postfix, index and assignment.
//!
//! Each operator resolves to a method of its receiver named by the operator
//! (`+`, `[]`, `[]=`, `unary-`); `++`/`--` resolve to `+`/`-`, `x op= y` to `op`.

use super::state_identifiers::is_compound_write;
use super::ResolverVisitor;
use crate::variable_resolver::is_write_context;
use dres_binder::{AuxiliaryElements, UNARY_MINUS};
use dres_common::diagnostics::diagnostic_codes;
use dres_element::{Element, ElementId, ElementKind, TypeData, TypeId};
use dres_syntax::{NodeIndex, NodeKind, Operator};

type Member = Option<(ElementId, TypeId)>;

impl ResolverVisitor<'_> {
    /// Operator method `name` of the value of `receiver`.
    fn lookup_operator(&mut self, receiver: NodeIndex, name: &str, at: NodeIndex) -> (Member, Member) {
        if matches!(self.unit.arena.kind(receiver), Some(NodeKind::SuperExpression)) {
            let (member, ty) =
                self.lookup_super_member(name, at, diagnostic_codes::UNDEFINED_SUPER_METHOD);
            return (member.is_some().then_some((member, ty)), None);
        }
        self.lookup_member_of(
            receiver,
            name,
            at,
            diagnostic_codes::UNDEFINED_OPERATOR,
            diagnostic_codes::UNDEFINED_OPERATOR_HINT,
        )
    }

    /// Bind the operator elements of `node` and return the static and
    /// propagated return types.
    fn bind_operator(&mut self, node: NodeIndex, found: Member, propagated: Member) -> (TypeId, Option<TypeId>) {
        let (element, ty) = found.unwrap_or((ElementId::NONE, TypeId::DYNAMIC));
        if element.is_some() {
            self.annotations.set_static_element(node, element);
        }
        let static_return = self.call_return_type(element, ty);
        let propagated_return = propagated.map(|(member, ty)| {
            if member != element {
                self.annotations.set_propagated_element(node, member);
            }
            self.call_return_type(member, ty)
        });
        (static_return, propagated_return)
    }

    /// Bind `argument` to the first parameter of the operator of `node`.
    fn bind_operand(&mut self, node: NodeIndex, argument: NodeIndex) {
        let element = self.annotations.static_element(node);
        if let Some(&parameter) = self.model.parameters(element).first() {
            self.annotations.set_static_parameter(argument, parameter);
        }
        let propagated = self.annotations.propagated_element(node);
        if let Some(&parameter) = self.model.parameters(propagated).first() {
            self.annotations.set_propagated_parameter(argument, parameter);
        }
    }

    /// `int op int` is `int` and `int op double` is `double` for the
    /// arithmetic operators, whatever `num` operator they resolve to.
    fn refine_numeric(&self, operator: Operator, left: TypeId, right: TypeId, declared: TypeId) -> TypeId {
        if !operator.is_numeric_arithmetic() || left != self.provider.int_type {
            return declared;
        }
        if right == self.provider.int_type {
            self.provider.int_type
        } else if right == self.provider.double_type {
            self.provider.double_type
        } else {
            declared
        }
    }

    /// Variable whose value an assignment to `left` replaces.
    fn assigned_variable(&self, left: NodeIndex) -> ElementId {
        if !matches!(self.unit.arena.kind(left), Some(NodeKind::SimpleIdentifier { .. })) {
            return ElementId::NONE;
        }
        let element = self.annotations.static_element(left);
        match self.model.kind(element) {
            Some(
                ElementKind::LocalVariable
                | ElementKind::Parameter
                | ElementKind::Field
                | ElementKind::TopLevelVariable,
            ) => element,
            Some(ElementKind::Getter | ElementKind::Setter) => self
                .model
                .element(element)
                .and_then(Element::as_executable)
                .map_or(ElementId::NONE, |d| d.variable),
            _ => ElementId::NONE,
        }
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    pub(crate) fn visit_assignment(&mut self, node: NodeIndex) {
        let Some(NodeKind::AssignmentExpression {
            operator,
            left,
            right,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let (operator, left, right) = (*operator, *left, *right);
        self.visit(left);
        self.visit(right);

        let variable = self.assigned_variable(left);
        let Some(binary) = operator.compound_binary() else {
            self.copy_types(right, node);
            if variable.is_some() {
                let assigned = self.best_type(right);
                self.override_variable(variable, assigned, true);
            }
            return;
        };

        let (found, propagated) = self.lookup_operator(left, binary.lexeme(), node);
        let (declared, propagated_return) = self.bind_operator(node, found, propagated);
        self.bind_operand(node, right);
        let left_type = self.static_type(left);
        let right_type = self.static_type(right);
        let static_type = self.refine_numeric(binary, left_type, right_type, declared);
        self.record_static(node, static_type);
        let best = match propagated_return {
            Some(returned) => {
                let (l, r) = (self.best_type(left), self.best_type(right));
                let refined = self.refine_numeric(binary, l, r, returned);
                self.record_propagated(node, refined);
                refined
            }
            None => static_type,
        };
        if variable.is_some() {
            self.override_variable(variable, best, true);
        }
    }

    // =========================================================================
    // Binary and unary operators
    // =========================================================================

    pub(crate) fn visit_binary(&mut self, node: NodeIndex) {
        let Some(NodeKind::BinaryExpression {
            operator,
            left,
            right,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let (operator, left, right) = (*operator, *left, *right);
        self.visit(left);
        if operator == Operator::AmpAmp {
            self.visit_promoted(left, right);
        } else {
            self.visit(right);
        }
        if operator.is_logical() {
            self.record_static(node, self.provider.bool_type);
            return;
        }

        let name = match operator {
            Operator::BangEq => Operator::EqEq.lexeme(),
            other => other.lexeme(),
        };
        let (found, propagated) = self.lookup_operator(left, name, node);
        let (declared, propagated_return) = self.bind_operator(node, found, propagated);
        self.bind_operand(node, right);

        if operator.is_equality() || operator.is_relational() {
            self.record_static(node, self.provider.bool_type);
            return;
        }
        let static_type =
            self.refine_numeric(operator, self.static_type(left), self.static_type(right), declared);
        self.record_static(node, static_type);
        let propagated_left = self.propagated_type(left);
        let propagated_right = self.propagated_type(right);
        if propagated_return.is_some() || propagated_left.is_some() || propagated_right.is_some() {
            let returned = propagated_return.unwrap_or(declared);
            let (l, r) = (self.best_type(left), self.best_type(right));
            let refined = self.refine_numeric(operator, l, r, returned);
            self.record_propagated(node, refined);
        }
    }

    pub(crate) fn visit_prefix(&mut self, node: NodeIndex) {
        let Some(NodeKind::PrefixExpression { operator, operand }) = self.unit.arena.kind(node) else {
            return;
        };
        let (operator, operand) = (*operator, *operand);
        self.visit(operand);
        let name = match operator {
            Operator::Bang => {
                self.record_static(node, self.provider.bool_type);
                return;
            }
            Operator::Minus => UNARY_MINUS,
            Operator::PlusPlus => Operator::Plus.lexeme(),
            Operator::MinusMinus => Operator::Minus.lexeme(),
            other => other.lexeme(),
        };
        let (found, propagated) = self.lookup_operator(operand, name, node);
        let (declared, propagated_return) = self.bind_operator(node, found, propagated);
        let operand_type = self.static_type(operand);
        if operator.is_increment() {
            let static_type =
                self.refine_numeric(Operator::Plus, operand_type, self.provider.int_type, declared);
            self.record_static(node, static_type);
            let variable = self.assigned_variable(operand);
            if variable.is_some() {
                self.override_variable(variable, static_type, true);
            }
            return;
        }
        self.record_static(node, declared);
        if let Some(returned) = propagated_return {
            self.record_propagated(node, returned);
        }
    }

    pub(crate) fn visit_postfix(&mut self, node: NodeIndex) {
        let Some(NodeKind::PostfixExpression { operator, operand }) = self.unit.arena.kind(node) else {
            return;
        };
        let (operator, operand) = (*operator, *operand);
        self.visit(operand);
        let name = match operator {
            Operator::MinusMinus => Operator::Minus.lexeme(),
            _ => Operator::Plus.lexeme(),
        };
        let (found, propagated) = self.lookup_operator(operand, name, node);
        let _ = self.bind_operator(node, found, propagated);
        self.copy_types(operand, node);
    }

    // =========================================================================
    // Index
    // =========================================================================

    pub(crate) fn visit_index(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::IndexExpression {
            target,
            is_cascaded,
            index,
        }) = arena.kind(node)
        else {
            return;
        };
        let (target, index) = (*target, *index);
        self.visit(target);
        self.visit(index);
        let receiver = if *is_cascaded {
            self.receiver_of(NodeIndex::NONE)
        } else {
            target
        };
        let write = is_write_context(arena, node);
        let name = if write {
            Operator::IndexEq.lexeme()
        } else {
            Operator::Index.lexeme()
        };
        let (found, propagated) = self.lookup_operator(receiver, name, node);
        let (returned, propagated_return) = self.bind_operator(node, found, propagated);
        self.bind_operand(node, index);

        if write {
            let value_type = found.map_or(TypeId::DYNAMIC, |(_, ty)| self.parameter_type_at(ty, 1));
            self.record_static(node, value_type);
            if is_compound_write(arena, node) {
                let (getter, propagated_getter) = self.lookup_operator(
                    receiver,
                    Operator::Index.lexeme(),
                    NodeIndex::NONE,
                );
                self.annotations.set_auxiliary(
                    node,
                    AuxiliaryElements {
                        static_element: getter.map_or(ElementId::NONE, |(g, _)| g),
                        propagated_element: propagated_getter.map_or(ElementId::NONE, |(g, _)| g),
                    },
                );
            }
            return;
        }
        self.record_static(node, returned);
        if let Some(ty) = propagated_return {
            self.record_propagated(node, ty);
        }
    }

    /// Type of parameter `position` of the function type `ty`.
    fn parameter_type_at(&self, ty: TypeId, position: usize) -> TypeId {
        match self.model.types.lookup(ty) {
            Some(TypeData::Function { params, .. }) => {
                params.get(position).map_or(TypeId::DYNAMIC, |p| p.ty)
            }
            _ => TypeId::DYNAMIC,
        }
    }
}
