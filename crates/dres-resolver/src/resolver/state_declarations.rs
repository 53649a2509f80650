//! Declarations: the frames and enclosing context their bodies see,
//! annotations, and constructor initializer lists.

use super::arguments::Correspondence;
use super::{EnclosingContext, ResolverVisitor};
use crate::lookup::prefixed_lookup;
use dres_binder::{Lookup, ScopeBuilder};
use dres_common::diagnostics::diagnostic_codes;
use dres_element::{Element, ElementFlags, ElementId, ElementKind};
use dres_syntax::{NodeIndex, NodeKind, NodeList};
use tracing::{debug, trace};

impl ResolverVisitor<'_> {
    fn visit_metadata(&mut self, metadata: &NodeList) {
        for annotation in metadata.iter() {
            self.visit(annotation);
        }
    }

    // =========================================================================
    // Classes and aliases
    // =========================================================================

    pub(crate) fn visit_class(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let (metadata, name, members) = match arena.kind(node) {
            Some(NodeKind::ClassDeclaration {
                metadata,
                name,
                members,
                ..
            }) => (metadata, *name, Some(members)),
            Some(NodeKind::ClassTypeAlias { metadata, name, .. }) => (metadata, *name, None),
            _ => return,
        };
        let class = self.annotations.declared_element(node);
        self.visit_metadata(metadata);
        if class.is_none() {
            return;
        }
        self.report_inheritance_conflicts(class, name);

        let frames = ScopeBuilder::new(self.model).frames_for(class);
        let depth = self.scopes.depth();
        for frame in frames {
            self.scopes.push(frame);
        }
        let context = EnclosingContext {
            class,
            ..EnclosingContext::default()
        };
        if let Some(members) = members {
            self.with_context(context, |this| {
                for member in members.iter() {
                    this.visit(member);
                }
            });
        }
        self.scopes.truncate(depth);
    }

    fn report_inheritance_conflicts(&mut self, class: ElementId, name: NodeIndex) {
        let conflicts = self.inheritance.conflicts(&self.ts(), class);
        for conflict in conflicts {
            let args = if conflict.code == diagnostic_codes::INCONSISTENT_METHOD_INHERITANCE {
                let declaring: Vec<String> = conflict
                    .members
                    .iter()
                    .map(|&m| {
                        let enclosing = self.model.element(m).map_or(ElementId::NONE, |e| e.enclosing);
                        self.model.name(enclosing).to_string()
                    })
                    .collect();
                vec![conflict.name.clone(), declaring.join(", ")]
            } else {
                vec![conflict.name.clone()]
            };
            debug!(name = %conflict.name, code = conflict.code, "inheritance conflict");
            self.report(name, conflict.code, args);
        }
    }

    pub(crate) fn visit_function_type_alias(&mut self, node: NodeIndex) {
        let Some(NodeKind::FunctionTypeAlias {
            metadata,
            parameters,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.visit_metadata(metadata);
        let alias = self.annotations.declared_element(node);
        let scope = ScopeBuilder::new(self.model).function_type_scope(alias);
        let depth = self.scopes.push(scope);
        let context = EnclosingContext {
            function_type_alias: alias,
            ..self.context
        };
        self.with_context(context, |this| this.visit(*parameters));
        self.scopes.truncate(depth);
    }

    // =========================================================================
    // Executables
    // =========================================================================

    /// Visit `parts` (parameters, initializers) and then `body` of
    /// `executable` inside its parameter frame.
    pub(crate) fn visit_function_body(
        &mut self,
        executable: ElementId,
        context: EnclosingContext,
        parts: &[NodeIndex],
        body: NodeIndex,
    ) {
        let scope = ScopeBuilder::new(self.model).function_scope(executable);
        let depth = self.scopes.push(scope);
        self.labels.enter_function();
        self.overrides.enter_scope();
        self.promotion.enter_scope();
        let analyze_body = self.options.analyze_function_bodies;
        self.with_context(context, |this| {
            for &part in parts {
                this.visit(part);
            }
            if analyze_body {
                let body_context = EnclosingContext {
                    in_initializer: false,
                    parameter: ElementId::NONE,
                    ..context
                };
                this.with_context(body_context, |this| this.visit(body));
            } else {
                trace!(executable = executable.0, "body skipped");
            }
        });
        self.promotion.exit_scope();
        self.overrides.exit_scope();
        self.labels.exit_function();
        self.scopes.truncate(depth);
    }

    pub(crate) fn visit_function_declaration(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::FunctionDeclaration {
            metadata,
            name,
            function,
            ..
        }) = arena.kind(node)
        else {
            return;
        };
        self.visit_metadata(metadata);
        let function_element = self.annotations.declared_element(node);
        let ty = self.model.element_type(function_element);
        self.record_static(*name, ty);
        self.record_static(*function, ty);
        let Some(NodeKind::FunctionExpression { parameters, body }) = arena.kind(*function) else {
            return;
        };
        let context = EnclosingContext {
            executable: function_element,
            parameter: ElementId::NONE,
            in_initializer: false,
            ..self.context
        };
        self.visit_function_body(function_element, context, &[*parameters], *body);
    }

    pub(crate) fn visit_method(&mut self, node: NodeIndex) {
        let Some(NodeKind::MethodDeclaration {
            metadata,
            is_static,
            name,
            parameters,
            body,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.visit_metadata(metadata);
        let method = self.annotations.declared_element(node);
        let ty = self.model.element_type(method);
        self.record_static(*name, ty);
        let context = EnclosingContext {
            executable: method,
            is_static: *is_static,
            ..self.context
        };
        self.visit_function_body(method, context, &[*parameters], *body);
    }

    pub(crate) fn visit_constructor(&mut self, node: NodeIndex) {
        let Some(NodeKind::ConstructorDeclaration {
            metadata,
            is_factory,
            return_type,
            parameters,
            initializers,
            redirected,
            body,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.visit_metadata(metadata);
        let constructor = self.annotations.declared_element(node);
        let class = self.context.class;
        if class.is_some() {
            self.annotations.set_static_element(*return_type, class);
            let ty = self.model.element_type(class);
            self.record_static(*return_type, ty);
        }
        if redirected.is_some() {
            self.resolve_redirection(constructor, *redirected);
        }
        let context = EnclosingContext {
            executable: constructor,
            is_factory: *is_factory,
            in_initializer: true,
            ..self.context
        };
        let mut parts = Vec::with_capacity(initializers.len() + 1);
        parts.push(*parameters);
        parts.extend(initializers.iter());
        self.visit_function_body(constructor, context, &parts, *body);
    }

    /// `factory C() = D.named;`
    fn resolve_redirection(&mut self, constructor: ElementId, redirected: NodeIndex) {
        let Some(NodeKind::ConstructorName { type_name, name }) = self.unit.arena.kind(redirected) else {
            return;
        };
        let ty = self.static_type(*type_name);
        let class = self.model.class_of_type(ty);
        if class.is_none() {
            return;
        }
        let constructor_name = if name.is_some() {
            self.identifier_text(*name)
        } else {
            String::new()
        };
        let target = self.model.get_constructor(class, &constructor_name);
        if target.is_none() {
            let class_name = self.model.name(class).to_string();
            let shown = if constructor_name.is_empty() {
                class_name.clone()
            } else {
                format!("{class_name}.{constructor_name}")
            };
            self.report(
                redirected,
                diagnostic_codes::REDIRECT_TO_MISSING_CONSTRUCTOR,
                vec![shown, class_name],
            );
            return;
        }
        self.annotations.set_static_element(redirected, target);
        if name.is_some() {
            self.annotations.set_static_element(*name, target);
        }
        if let Some(data) = self
            .model
            .element_mut(constructor)
            .and_then(Element::as_executable_mut)
        {
            data.redirected_constructor = target;
        }
    }

    // =========================================================================
    // Variables and parameters
    // =========================================================================

    pub(crate) fn visit_variable_declaration(&mut self, node: NodeIndex) {
        let (metadata, is_static, variables) = match self.unit.arena.kind(node) {
            Some(NodeKind::FieldDeclaration {
                metadata,
                is_static,
                variables,
            }) => (metadata, *is_static, *variables),
            Some(NodeKind::TopLevelVariableDeclaration {
                metadata,
                variables,
            }) => (metadata, false, *variables),
            _ => return,
        };
        self.visit_metadata(metadata);
        let context = EnclosingContext {
            is_static,
            ..self.context
        };
        self.with_context(context, |this| this.visit(variables));
    }

    pub(crate) fn visit_variable(&mut self, node: NodeIndex) {
        let Some(NodeKind::VariableDeclaration { name, initializer }) = self.unit.arena.kind(node) else {
            return;
        };
        let (name, initializer) = (*name, *initializer);
        let variable = self.annotations.declared_element(node);
        let is_local = self.model.kind(variable) == Some(ElementKind::LocalVariable);
        if is_local {
            self.define_local(node);
        }
        self.visit(initializer);

        let declared = self.model.element_type(variable);
        self.record_static(name, declared);
        if initializer.is_none() {
            return;
        }
        let best = self.best_type(initializer);
        self.override_variable(variable, best, false);
        if is_local {
            let is_constant = self
                .model
                .element(variable)
                .is_some_and(|e| e.is_final() || e.is_const());
            if is_constant && best != declared && self.ts().is_more_specific(best, declared) {
                if let Some(data) = self
                    .model
                    .element_mut(variable)
                    .and_then(Element::as_variable_mut)
                {
                    data.propagated_type = Some(best);
                }
            }
        }
        self.record_propagated(name, best);
    }

    pub(crate) fn visit_formal_parameter(&mut self, node: NodeIndex) {
        let Some(NodeKind::FormalParameter {
            metadata,
            name,
            parameters,
            default_value,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.visit_metadata(metadata);
        let parameter = self.annotations.declared_element(node);
        let ty = self.model.element_type(parameter);
        self.record_static(*name, ty);
        self.visit(*parameters);
        if default_value.is_some() {
            let context = EnclosingContext {
                parameter,
                ..self.context
            };
            self.with_context(context, |this| this.visit(*default_value));
        }
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    pub(crate) fn visit_annotation(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::Annotation {
            name,
            constructor_name,
            arguments,
        }) = arena.kind(node)
        else {
            return;
        };
        let (name, constructor_name, arguments) = (*name, *constructor_name, *arguments);
        self.visit(arguments);

        let element = self.resolve_annotation(name, constructor_name, arguments.is_some());
        let valid = element.is_some() && self.oracle.is_constant(self.model, element);
        if !valid {
            self.report(node, diagnostic_codes::INVALID_ANNOTATION, Vec::new());
            return;
        }
        self.annotations.set_static_element(node, element);
        if self.model.kind(element) == Some(ElementKind::Constructor) {
            let parameters = self.model.parameters(element).to_vec();
            self.resolve_arguments(arguments, &parameters, Correspondence::Static);
        }
        for annotated in self.annotated_elements(node) {
            if let Some(e) = self.model.element_mut(annotated) {
                if !e.metadata.contains(&element) {
                    e.metadata.push(element);
                }
            }
        }
    }

    /// Element named by an annotation: a constant getter for `@x`,
    /// `@p.x` and `@C.x`, else a constructor for `@C(..)`, `@C.named(..)`
    /// and their prefixed forms.
    fn resolve_annotation(&mut self, name: NodeIndex, third: NodeIndex, has_arguments: bool) -> ElementId {
        let (first, second) = match self.unit.arena.kind(name) {
            Some(NodeKind::PrefixedIdentifier { prefix, identifier }) => (*prefix, *identifier),
            Some(NodeKind::SimpleIdentifier { .. }) => (name, NodeIndex::NONE),
            _ => return ElementId::NONE,
        };
        let first_text = self.identifier_text(first);
        let mut element = self.lookup_name(&first_text).element();
        self.bind_segment(first, element);
        let (mut next, mut rest) = (second, third);

        if self.model.kind(element) == Some(ElementKind::Prefix) {
            if next.is_none() {
                return ElementId::NONE;
            }
            let text = self.identifier_text(next);
            element = match prefixed_lookup(self.model, element, &text) {
                Lookup::Found(found) => found,
                _ => ElementId::NONE,
            };
            self.bind_segment(next, element);
            (next, rest) = (rest, NodeIndex::NONE);
        }
        if rest.is_some() && self.model.kind(element) != Some(ElementKind::Class) {
            return ElementId::NONE;
        }

        match self.model.kind(element) {
            Some(ElementKind::Class) => {
                let class = element;
                if next.is_some() {
                    let member = self.identifier_text(next);
                    if !has_arguments && rest.is_none() {
                        let getter = self.model.get_getter(class, &member);
                        if getter.is_some() && self.model.has_flag(getter, ElementFlags::STATIC) {
                            self.bind_segment(next, getter);
                            return getter;
                        }
                    }
                    let constructor = self.model.get_constructor(class, &member);
                    self.bind_segment(next, constructor);
                    if rest.is_some() {
                        return ElementId::NONE;
                    }
                    return if has_arguments { constructor } else { ElementId::NONE };
                }
                if !has_arguments {
                    return ElementId::NONE;
                }
                self.model.get_constructor(class, "")
            }
            Some(ElementKind::Getter | ElementKind::TopLevelVariable | ElementKind::Field)
                if next.is_none() && !has_arguments =>
            {
                element
            }
            _ => ElementId::NONE,
        }
    }

    fn bind_segment(&mut self, node: NodeIndex, element: ElementId) {
        if node.is_some() && element.is_some() {
            self.annotations.set_static_element(node, element);
        }
    }

    /// Elements the annotation at `node` is attached to.
    fn annotated_elements(&self, node: NodeIndex) -> Vec<ElementId> {
        let arena = self.unit.arena;
        let parent = arena.parent(node);
        let declared = self.annotations.declared_element(parent);
        if declared.is_some() {
            return vec![declared];
        }
        let list = match arena.kind(parent) {
            Some(
                NodeKind::FieldDeclaration { variables, .. }
                | NodeKind::TopLevelVariableDeclaration { variables, .. },
            ) => *variables,
            _ => return Vec::new(),
        };
        match arena.kind(list) {
            Some(NodeKind::VariableDeclarationList { variables, .. }) => variables
                .iter()
                .map(|v| self.annotations.declared_element(v))
                .filter(|e| e.is_some())
                .collect(),
            _ => Vec::new(),
        }
    }

    // =========================================================================
    // Constructor initializers
    // =========================================================================

    pub(crate) fn visit_field_initializer(&mut self, node: NodeIndex) {
        let Some(NodeKind::ConstructorFieldInitializer {
            field_name,
            expression,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.visit(*expression);
        let name = self.identifier_text(*field_name);
        let field = self.model.get_field(self.context.class, &name);
        if field.is_none() || self.model.has_flag(field, ElementFlags::STATIC) {
            self.report(
                *field_name,
                diagnostic_codes::INITIALIZER_FOR_NON_EXISTENT_FIELD,
                vec![name],
            );
            return;
        }
        self.annotations.set_static_element(*field_name, field);
        let ty = self.model.element_type(field);
        self.record_static(*field_name, ty);
    }

    pub(crate) fn visit_constructor_invocation(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let (is_super, constructor_name, arguments) = match arena.kind(node) {
            Some(NodeKind::SuperConstructorInvocation {
                constructor_name,
                arguments,
            }) => (true, *constructor_name, *arguments),
            Some(NodeKind::RedirectingConstructorInvocation {
                constructor_name,
                arguments,
            }) => (false, *constructor_name, *arguments),
            _ => return,
        };
        self.visit(arguments);
        let class = if is_super {
            self.model
                .supertype(self.context.class)
                .map_or(ElementId::NONE, |t| self.model.class_of_type(t))
        } else {
            self.context.class
        };
        if class.is_none() {
            return;
        }
        let name = if constructor_name.is_some() {
            self.identifier_text(constructor_name)
        } else {
            String::new()
        };
        let constructor = self.model.get_constructor(class, &name);
        if constructor.is_none() || self.model.has_flag(constructor, ElementFlags::FACTORY) {
            let class_name = self.model.name(class).to_string();
            if name.is_empty() {
                self.report(
                    node,
                    diagnostic_codes::UNDEFINED_CONSTRUCTOR_IN_INITIALIZER_DEFAULT,
                    vec![class_name],
                );
            } else {
                self.report(
                    node,
                    diagnostic_codes::UNDEFINED_CONSTRUCTOR_IN_INITIALIZER,
                    vec![class_name, name],
                );
            }
            return;
        }
        self.annotations.set_static_element(node, constructor);
        self.bind_segment(constructor_name, constructor);
        if !is_super {
            let enclosing = self.context.executable;
            if let Some(data) = self
                .model
                .element_mut(enclosing)
                .and_then(Element::as_executable_mut)
            {
                data.redirected_constructor = constructor;
            }
        }
        let parameters = self.model.parameters(constructor).to_vec();
        self.resolve_arguments(arguments, &parameters, Correspondence::Static);
    }
}
