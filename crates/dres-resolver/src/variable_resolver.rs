//! Variable resolution pass.
//!
//! Binds every reference to a local variable or parameter and records how
//! it is used: written in its declaring scope, written from a closure, or
//! read from a closure. Type promotion consults these flags.

use crate::unit::ResolutionUnit;
use dres_binder::{Lookup, Scope, ScopeBuilder, ScopeKind, ScopeStack, UnitAnnotations};
use dres_element::{ElementFlags, ElementId, ElementKind, ElementModel};
use dres_syntax::{NodeIndex, NodeKind};
use tracing::trace;

const USAGE_FLAGS: ElementFlags = ElementFlags::POTENTIALLY_MUTATED_IN_SCOPE
    .union(ElementFlags::POTENTIALLY_MUTATED_IN_CLOSURE)
    .union(ElementFlags::ACCESSED_IN_CLOSURE);

pub struct VariableResolver<'a> {
    model: &'a mut ElementModel,
    unit: ResolutionUnit<'a>,
    annotations: &'a mut UnitAnnotations,
    scopes: ScopeStack,
    /// Innermost executable whose body is being walked.
    executable: ElementId,
}

impl<'a> VariableResolver<'a> {
    pub fn new(
        model: &'a mut ElementModel,
        unit: ResolutionUnit<'a>,
        annotations: &'a mut UnitAnnotations,
    ) -> Self {
        Self {
            model,
            unit,
            annotations,
            scopes: ScopeStack::new(),
            executable: ElementId::NONE,
        }
    }

    #[tracing::instrument(level = "debug", skip(self), fields(source = %self.unit.source))]
    pub fn resolve_unit(&mut self) {
        for decl in self.unit.declarations() {
            self.visit(decl);
        }
    }

    /// Re-run the pass over `root`, whose enclosing frames are `frames`.
    /// Usage flags of the locals declared under `root` are reset first.
    pub fn resolve_subtree(&mut self, root: NodeIndex, frames: Vec<Scope>) {
        let element = self.annotations.declared_element(root);
        clear_usage_flags(self.model, element);
        let depth = self.scopes.depth();
        for frame in frames {
            if frame.kind == ScopeKind::Function {
                self.executable = frame.owner;
            }
            self.scopes.push(frame);
        }
        self.visit(root);
        self.scopes.truncate(depth);
    }

    fn visit(&mut self, node: NodeIndex) {
        if node.is_none() {
            return;
        }
        let arena = self.unit.arena;
        let Some(kind) = arena.kind(node) else {
            return;
        };
        match kind {
            NodeKind::FunctionDeclaration { function, .. } => {
                let executable = self.annotations.declared_element(node);
                if let Some(NodeKind::FunctionExpression { parameters, body }) = arena.kind(*function) {
                    self.visit_executable(executable, &[*parameters, *body]);
                }
            }
            NodeKind::MethodDeclaration {
                parameters, body, ..
            } => {
                let method = self.annotations.declared_element(node);
                self.visit_executable(method, &[*parameters, *body]);
            }
            NodeKind::ConstructorDeclaration {
                parameters,
                initializers,
                body,
                ..
            } => {
                let constructor = self.annotations.declared_element(node);
                let mut parts = vec![*parameters];
                parts.extend(initializers.iter());
                parts.push(*body);
                self.visit_executable(constructor, &parts);
            }
            NodeKind::FunctionExpression { parameters, body } => {
                let closure = self.annotations.declared_element(node);
                self.visit_executable(closure, &[*parameters, *body]);
            }
            NodeKind::FunctionDeclarationStatement { declaration } => {
                self.define(*declaration);
                self.visit(*declaration);
            }
            NodeKind::Block { statements } => {
                let depth = self.scopes.push(Scope::new(ScopeKind::Block, self.executable));
                for statement in statements.iter() {
                    self.visit(statement);
                }
                self.scopes.truncate(depth);
            }
            NodeKind::SwitchCase { statements, .. } | NodeKind::SwitchDefault { statements, .. } => {
                let depth = self.scopes.push(Scope::new(ScopeKind::Block, self.executable));
                for statement in statements.iter() {
                    self.visit(statement);
                }
                self.scopes.truncate(depth);
            }
            NodeKind::ForStatement { .. } | NodeKind::ForEachStatement { .. } => {
                let depth = self.scopes.push(Scope::new(ScopeKind::Loop, self.executable));
                for child in arena.children(node) {
                    self.visit(child);
                }
                self.scopes.truncate(depth);
            }
            NodeKind::CatchClause {
                exception_parameter,
                stack_trace_parameter,
                body,
                ..
            } => {
                let depth = self.scopes.push(Scope::new(ScopeKind::Catch, self.executable));
                self.define(*exception_parameter);
                self.define(*stack_trace_parameter);
                self.visit(*body);
                self.scopes.truncate(depth);
            }
            NodeKind::VariableDeclaration { initializer, .. } => {
                if self.model.kind(self.annotations.declared_element(node))
                    == Some(ElementKind::LocalVariable)
                {
                    self.define(node);
                }
                self.visit(*initializer);
            }
            NodeKind::DeclaredIdentifier { .. } => self.define(node),
            NodeKind::SimpleIdentifier { name } => self.visit_identifier(node, name),
            NodeKind::PrefixedIdentifier { prefix, .. } => self.visit(*prefix),
            NodeKind::PropertyAccess { target, .. } => self.visit(*target),
            NodeKind::MethodInvocation {
                target,
                method_name,
                arguments,
                ..
            } => {
                if target.is_none() {
                    self.visit(*method_name);
                } else {
                    self.visit(*target);
                }
                self.visit(*arguments);
            }
            NodeKind::NamedExpression { expression, .. } => self.visit(*expression),
            NodeKind::ConstructorFieldInitializer { expression, .. } => self.visit(*expression),
            NodeKind::Annotation { arguments, .. } => self.visit(*arguments),
            NodeKind::TypeName { .. }
            | NodeKind::ConstructorName { .. }
            | NodeKind::Label { .. }
            | NodeKind::BreakStatement { .. }
            | NodeKind::ContinueStatement { .. } => {}
            _ => {
                for child in arena.children(node) {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_executable(&mut self, executable: ElementId, parts: &[NodeIndex]) {
        let saved = std::mem::replace(&mut self.executable, executable);
        let depth = self.scopes.depth();
        if executable.is_some() {
            self.scopes
                .push(ScopeBuilder::new(self.model).function_scope(executable));
        }
        for &part in parts {
            self.visit(part);
        }
        self.scopes.truncate(depth);
        self.executable = saved;
    }

    fn define(&mut self, node: NodeIndex) {
        let element = self.annotations.declared_element(node);
        if element.is_some() {
            let name = self.model.name(element).to_string();
            self.scopes.define(name, element);
        }
    }

    fn visit_identifier(&mut self, node: NodeIndex, name: &str) {
        if self.annotations.declared_element(node).is_some() {
            return;
        }
        let Some(Lookup::Found(element)) = self.scopes.lookup_local(name) else {
            return;
        };
        if !matches!(
            self.model.kind(element),
            Some(ElementKind::LocalVariable | ElementKind::Parameter)
        ) {
            return;
        }
        self.annotations.set_static_element(node, element);
        let declaring = self.model.elements.enclosing(element);
        let in_closure = declaring != self.executable;
        let mut flags = ElementFlags::empty();
        if is_write_context(self.unit.arena, node) {
            flags |= ElementFlags::POTENTIALLY_MUTATED_IN_SCOPE;
            if in_closure {
                flags |= ElementFlags::POTENTIALLY_MUTATED_IN_CLOSURE;
            }
        } else if in_closure {
            flags |= ElementFlags::ACCESSED_IN_CLOSURE;
        }
        trace!(node = node.0, name, ?flags, "variable reference");
        if let Some(e) = self.model.element_mut(element) {
            e.flags |= flags;
        }
    }
}

/// True when the identifier at `node` is assigned to.
pub(crate) fn is_write_context(arena: &dres_syntax::NodeArena, node: NodeIndex) -> bool {
    match arena.kind(arena.parent(node)) {
        Some(NodeKind::AssignmentExpression { left, .. }) => *left == node,
        Some(
            NodeKind::PrefixExpression { operator, operand }
            | NodeKind::PostfixExpression { operator, operand },
        ) => *operand == node && operator.is_increment(),
        Some(NodeKind::ForEachStatement { identifier, .. }) => *identifier == node,
        _ => false,
    }
}

/// Reset the usage flags of every local variable and parameter declared
/// under `element`.
pub fn clear_usage_flags(model: &mut ElementModel, element: ElementId) {
    let locals: Vec<ElementId> = std::iter::once(element)
        .chain(model.elements.descendants(element))
        .filter(|&e| {
            matches!(
                model.kind(e),
                Some(ElementKind::LocalVariable | ElementKind::Parameter)
            )
        })
        .collect();
    for local in locals {
        if let Some(e) = model.element_mut(local) {
            e.flags.remove(USAGE_FLAGS);
        }
    }
}
