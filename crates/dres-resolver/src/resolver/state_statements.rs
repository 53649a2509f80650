//! Statements: lexical frames for blocks, loops and catch clauses, label
//! targets, and the flow of type overrides through branches and loops.

use super::ResolverVisitor;
use dres_binder::{LabelLookup, Scope, ScopeKind};
use dres_common::diagnostics::diagnostic_codes;
use dres_element::{ElementId, TypeId};
use dres_syntax::{NodeIndex, NodeKind, NodeList};
use tracing::trace;

impl ResolverVisitor<'_> {
    /// Bind the element `declaration` declares in the innermost frame.
    pub(crate) fn define_local(&mut self, declaration: NodeIndex) {
        let element = self.annotations.declared_element(declaration);
        if element.is_none() {
            return;
        }
        let name = self.model.name(element).to_string();
        trace!(%name, element = element.0, "define local");
        self.scopes.define(name, element);
    }

    pub(crate) fn visit_block(&mut self, node: NodeIndex) {
        let Some(NodeKind::Block { statements }) = self.unit.arena.kind(node) else {
            return;
        };
        let depth = self.scopes.push(Scope::new(ScopeKind::Block, ElementId::NONE));
        self.visit_statements(statements);
        self.scopes.truncate(depth);
    }

    /// Visit `statements` in the innermost frame. Locals declared among
    /// them are hidden until their declaration is reached.
    fn visit_statements(&mut self, statements: &NodeList) {
        let arena = self.unit.arena;
        for statement in statements.iter() {
            let declarations: Vec<NodeIndex> = match arena.kind(statement) {
                Some(NodeKind::VariableDeclarationStatement { variables }) => {
                    match arena.kind(*variables) {
                        Some(NodeKind::VariableDeclarationList { variables, .. }) => {
                            variables.iter().collect()
                        }
                        _ => Vec::new(),
                    }
                }
                Some(NodeKind::FunctionDeclarationStatement { declaration }) => vec![*declaration],
                _ => Vec::new(),
            };
            for declaration in declarations {
                let element = self.annotations.declared_element(declaration);
                if element.is_none() {
                    continue;
                }
                let name = self.model.name(element).to_string();
                if let Some(scope) = self.scopes.innermost_mut() {
                    scope.hide(name, element);
                }
            }
        }
        for statement in statements.iter() {
            self.visit(statement);
        }
    }

    /// Control never reaches the end of `node`.
    fn is_abrupt(&self, node: NodeIndex) -> bool {
        let arena = self.unit.arena;
        match arena.kind(node) {
            Some(
                NodeKind::ReturnStatement { .. }
                | NodeKind::BreakStatement { .. }
                | NodeKind::ContinueStatement { .. },
            ) => true,
            Some(NodeKind::ExpressionStatement { expression }) => matches!(
                arena.kind(*expression),
                Some(NodeKind::ThrowExpression { .. } | NodeKind::RethrowExpression)
            ),
            Some(NodeKind::Block { statements }) => statements
                .iter()
                .last()
                .is_some_and(|last| self.is_abrupt(last)),
            _ => false,
        }
    }

    // =========================================================================
    // Branches and loops
    // =========================================================================

    pub(crate) fn visit_if(&mut self, node: NodeIndex) {
        let Some(NodeKind::IfStatement {
            condition,
            then_statement,
            else_statement,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let (condition, then_statement, else_statement) =
            (*condition, *then_statement, *else_statement);
        self.visit(condition);

        self.overrides.enter_scope();
        self.visit_promoted(condition, then_statement);
        let then_overrides = self.overrides.exit_scope();

        self.overrides.enter_scope();
        self.visit(else_statement);
        let else_overrides = self.overrides.exit_scope();

        let then_abrupt = self.is_abrupt(then_statement);
        let else_abrupt = else_statement.is_some() && self.is_abrupt(else_statement);
        match (then_abrupt, else_abrupt) {
            (true, true) => {}
            (true, false) => self.overrides.apply(else_overrides),
            (false, true) => self.overrides.apply(then_overrides),
            (false, false) => {
                let merged = self.merge_branch_overrides(then_overrides, else_overrides);
                self.overrides.apply(merged);
            }
        }
    }

    /// Forget what is known about the variables `node` assigns; a loop body
    /// may run any number of times.
    fn clear_assigned_overrides(&mut self, node: NodeIndex) {
        for variable in self.assigned_variables(node) {
            self.overrides.set_type(variable, None);
        }
    }

    pub(crate) fn visit_loop(&mut self, node: NodeIndex) {
        let Some(kind) = self.unit.arena.kind(node) else {
            return;
        };
        let depth = self.scopes.push(Scope::new(ScopeKind::Loop, ElementId::NONE));
        if let NodeKind::ForStatement {
            variables,
            initialization,
            ..
        } = kind
        {
            self.visit(*variables);
            self.visit(*initialization);
        }
        self.clear_assigned_overrides(node);
        let labels = self.labels.push_implicit(node);
        self.overrides.enter_scope();
        match kind {
            NodeKind::WhileStatement { condition, body } => {
                self.visit(*condition);
                self.visit_promoted(*condition, *body);
            }
            NodeKind::DoStatement { body, condition } => {
                self.visit(*body);
                self.visit(*condition);
            }
            NodeKind::ForStatement {
                condition,
                updaters,
                body,
                ..
            } => {
                self.visit(*condition);
                self.visit_promoted(*condition, *body);
                for updater in updaters.iter() {
                    self.visit(updater);
                }
            }
            _ => {}
        }
        self.overrides.exit_scope();
        self.labels.truncate(labels);
        self.scopes.truncate(depth);
    }

    pub(crate) fn visit_for_each(&mut self, node: NodeIndex) {
        let Some(NodeKind::ForEachStatement {
            loop_variable,
            identifier,
            iterable,
            body,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let (loop_variable, identifier, iterable, body) =
            (*loop_variable, *identifier, *iterable, *body);
        self.visit(iterable);
        self.clear_assigned_overrides(node);

        let depth = self.scopes.push(Scope::new(ScopeKind::Loop, ElementId::NONE));
        let labels = self.labels.push_implicit(node);
        self.overrides.enter_scope();
        if loop_variable.is_some() {
            self.visit(loop_variable);
            let variable = self.annotations.declared_element(loop_variable);
            let iterable_type = self.best_type(iterable);
            if let Some(element_type) = self.iterated_type(iterable_type) {
                self.override_variable(variable, element_type, false);
            }
        } else {
            self.visit(identifier);
        }
        self.visit(body);
        self.overrides.exit_scope();
        self.labels.truncate(labels);
        self.scopes.truncate(depth);
    }

    /// Type of `iterator.current` on values of type `iterable`.
    fn iterated_type(&mut self, iterable: TypeId) -> Option<TypeId> {
        let (getter, ty) = self.lookup_on_type(iterable, "iterator")?;
        let iterator = self.read_type(getter, ty);
        let (current, ty) = self.lookup_on_type(iterator, "current")?;
        Some(self.read_type(current, ty))
    }

    pub(crate) fn visit_declared_identifier(&mut self, node: NodeIndex) {
        let Some(NodeKind::DeclaredIdentifier { name, .. }) = self.unit.arena.kind(node) else {
            return;
        };
        self.define_local(node);
        let element = self.annotations.declared_element(node);
        let ty = self.model.element_type(element);
        self.record_static(*name, ty);
    }

    // =========================================================================
    // Switch and try
    // =========================================================================

    pub(crate) fn visit_switch(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::SwitchStatement { expression, members }) = arena.kind(node) else {
            return;
        };
        self.visit(*expression);
        let depth = self.labels.push_implicit(node);
        // Case labels are targets from every member of the switch.
        for member in members.iter() {
            let labels = match arena.kind(member) {
                Some(
                    NodeKind::SwitchCase { labels, .. } | NodeKind::SwitchDefault { labels, .. },
                ) => labels,
                _ => continue,
            };
            for label in labels.iter() {
                self.push_label(label, member);
            }
        }
        self.overrides.enter_scope();
        for member in members.iter() {
            self.visit(member);
        }
        self.overrides.exit_scope();
        self.clear_assigned_overrides(node);
        self.labels.truncate(depth);
    }

    pub(crate) fn visit_switch_member(&mut self, node: NodeIndex) {
        let statements = match self.unit.arena.kind(node) {
            Some(NodeKind::SwitchCase {
                expression,
                statements,
                ..
            }) => {
                self.visit(*expression);
                statements
            }
            Some(NodeKind::SwitchDefault { statements, .. }) => statements,
            _ => return,
        };
        let depth = self.scopes.push(Scope::new(ScopeKind::Block, ElementId::NONE));
        self.visit_statements(statements);
        self.scopes.truncate(depth);
    }

    pub(crate) fn visit_try(&mut self, node: NodeIndex) {
        let Some(NodeKind::TryStatement {
            body,
            catch_clauses,
            finally_block,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.overrides.enter_scope();
        self.visit(*body);
        self.overrides.exit_scope();
        self.clear_assigned_overrides(*body);
        for clause in catch_clauses.iter() {
            self.overrides.enter_scope();
            self.visit(clause);
            self.overrides.exit_scope();
            self.clear_assigned_overrides(clause);
        }
        self.visit(*finally_block);
    }

    pub(crate) fn visit_catch(&mut self, node: NodeIndex) {
        let Some(NodeKind::CatchClause {
            exception_parameter,
            stack_trace_parameter,
            body,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let depth = self.scopes.push(Scope::new(ScopeKind::Catch, ElementId::NONE));
        for parameter in [*exception_parameter, *stack_trace_parameter] {
            if parameter.is_none() {
                continue;
            }
            self.define_local(parameter);
            let element = self.annotations.declared_element(parameter);
            let ty = self.model.element_type(element);
            self.record_static(parameter, ty);
        }
        self.visit(*body);
        self.scopes.truncate(depth);
    }

    // =========================================================================
    // Labels
    // =========================================================================

    fn push_label(&mut self, label: NodeIndex, target: NodeIndex) -> usize {
        let Some(NodeKind::Label { label: name }) = self.unit.arena.kind(label) else {
            return self.labels.depth();
        };
        let text = self.identifier_text(*name);
        let element = self.annotations.declared_element(label);
        self.labels.push(text, element, target)
    }

    pub(crate) fn visit_labeled_statement(&mut self, node: NodeIndex) {
        let Some(NodeKind::LabeledStatement { labels, statement }) = self.unit.arena.kind(node) else {
            return;
        };
        let depth = self.labels.depth();
        for label in labels.iter() {
            self.push_label(label, *statement);
        }
        self.visit(*statement);
        self.labels.truncate(depth);
    }

    pub(crate) fn visit_jump(&mut self, node: NodeIndex, label: NodeIndex) {
        let name = label.is_some().then(|| self.identifier_text(label));
        match self.labels.lookup(name.as_deref()) {
            LabelLookup::Target { element, .. } => {
                if label.is_some() && element.is_some() {
                    self.annotations.set_static_element(label, element);
                }
            }
            LabelLookup::OuterFunction(element) => {
                if element.is_some() {
                    self.annotations.set_static_element(label, element);
                }
                self.report(
                    label,
                    diagnostic_codes::LABEL_IN_OUTER_SCOPE,
                    vec![name.unwrap_or_default()],
                );
            }
            LabelLookup::Undefined => {
                self.report(
                    label,
                    diagnostic_codes::LABEL_UNDEFINED,
                    vec![name.unwrap_or_default()],
                );
            }
            LabelLookup::NoEnclosingTarget => {
                self.report(node, diagnostic_codes::BREAK_OUTSIDE_LOOP, Vec::new());
            }
        }
    }
}
