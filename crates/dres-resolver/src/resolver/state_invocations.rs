//! Method, function and constructor invocations, and closures.

use super::arguments::Correspondence;
use super::ResolverVisitor;
use crate::html::{element_class_for_selector, is_html_query};
use crate::lookup::{library_names, prefixed_lookup};
use dres_binder::Lookup;
use dres_common::diagnostics::diagnostic_codes;
use dres_element::{ElementId, ElementKind, TypeData, TypeId, find_class};
use dres_syntax::{NodeIndex, NodeKind};
use tracing::trace;

/// A resolved callee: the element and its type as seen from the call site.
type Callee = Option<(ElementId, TypeId)>;

impl ResolverVisitor<'_> {
    pub(crate) fn visit_method_invocation(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::MethodInvocation {
            target,
            is_cascaded,
            method_name,
            arguments,
        }) = arena.kind(node)
        else {
            return;
        };
        let (target, method_name, arguments) = (*target, *method_name, *arguments);
        self.visit(target);
        self.visit(arguments);
        let name = self.identifier_text(method_name);
        let receiver = if *is_cascaded {
            self.receiver_of(NodeIndex::NONE)
        } else {
            target
        };

        let class = if receiver.is_some() {
            self.static_class_target(receiver)
        } else {
            ElementId::NONE
        };
        let (found, propagated) = if receiver.is_none() {
            (self.resolve_untargeted_callee(method_name, &name), None)
        } else if self.model.kind(self.annotations.static_element(receiver)) == Some(ElementKind::Prefix) {
            (self.resolve_prefixed_callee(receiver, method_name, &name), None)
        } else if matches!(arena.kind(receiver), Some(NodeKind::SuperExpression)) {
            let (member, ty) =
                self.lookup_super_member(&name, method_name, diagnostic_codes::UNDEFINED_SUPER_METHOD);
            (member.is_some().then_some((member, ty)), None)
        } else if class.is_some() {
            let member =
                self.lookup_static_member(class, &name, method_name, diagnostic_codes::UNDEFINED_METHOD);
            (member.is_some().then(|| (member, self.model.element_type(member))), None)
        } else {
            self.lookup_member_of(
                receiver,
                &name,
                method_name,
                diagnostic_codes::UNDEFINED_METHOD,
                diagnostic_codes::UNDEFINED_METHOD_HINT,
            )
        };
        trace!(node = node.0, name = %name, found = found.is_some(), "method invocation");

        let (element, member_type) = found.unwrap_or((ElementId::NONE, TypeId::DYNAMIC));
        if element.is_some() {
            self.annotations.set_static_element(method_name, element);
        }
        let value_type = self.callee_value_type(element, member_type);
        self.record_static(method_name, self.read_type(element, member_type));
        self.record_static(node, self.call_return_type(element, value_type));
        if let Some(parameters) = self.callee_parameters(element, value_type) {
            self.resolve_arguments(arguments, &parameters, Correspondence::Static);
        }

        if let Some((member, ty)) = propagated {
            if member != element {
                self.annotations.set_propagated_element(method_name, member);
            }
            let value = self.callee_value_type(member, ty);
            let returned = self.call_return_type(member, value);
            self.record_propagated(node, returned);
            if let Some(parameters) = self.callee_parameters(member, value) {
                self.resolve_arguments(arguments, &parameters, Correspondence::Propagated);
            }
        }
        self.propagate_html_query(node, element, arguments);
    }

    /// `m(...)` with no target: lexical scope first, then the members the
    /// enclosing class inherits.
    fn resolve_untargeted_callee(&mut self, method_name: NodeIndex, name: &str) -> Callee {
        let element = match self.lookup_name(name) {
            Lookup::Found(element) => element,
            Lookup::Hidden(element) => {
                self.report(
                    method_name,
                    diagnostic_codes::REFERENCED_BEFORE_DECLARATION,
                    vec![name.to_string()],
                );
                element
            }
            Lookup::Ambiguous(elements) => {
                let libraries = library_names(self.model, &elements);
                self.report(
                    method_name,
                    diagnostic_codes::AMBIGUOUS_IMPORT,
                    vec![name.to_string(), libraries],
                );
                return None;
            }
            Lookup::NotFound => {
                let class = self.context.class;
                let inherited = if class.is_some() {
                    self.inheritance.lookup_member(&self.ts(), class, name)
                } else {
                    ElementId::NONE
                };
                if inherited.is_none() {
                    if class.is_some() {
                        if !self.model.is_proxy(class) {
                            let class_name = self.model.name(class).to_string();
                            self.report(
                                method_name,
                                diagnostic_codes::UNDEFINED_METHOD,
                                vec![name.to_string(), class_name],
                            );
                        }
                    } else {
                        self.report(
                            method_name,
                            diagnostic_codes::UNDEFINED_FUNCTION,
                            vec![name.to_string()],
                        );
                    }
                    return None;
                }
                inherited
            }
        };
        Some((element, self.model.element_type(element)))
    }

    fn resolve_prefixed_callee(&mut self, prefix: NodeIndex, method_name: NodeIndex, name: &str) -> Callee {
        let prefix_element = self.annotations.static_element(prefix);
        let qualified = format!("{}.{name}", self.model.name(prefix_element));
        match prefixed_lookup(self.model, prefix_element, name) {
            Lookup::Found(element) | Lookup::Hidden(element) => {
                Some((element, self.model.element_type(element)))
            }
            Lookup::Ambiguous(elements) => {
                let libraries = library_names(self.model, &elements);
                self.report(method_name, diagnostic_codes::AMBIGUOUS_IMPORT, vec![qualified, libraries]);
                None
            }
            Lookup::NotFound => {
                self.report(method_name, diagnostic_codes::UNDEFINED_FUNCTION, vec![qualified]);
                None
            }
        }
    }

    /// Value a callee denotes before it is called: the function type of a
    /// method, the value of a getter or variable.
    fn callee_value_type(&self, callee: ElementId, member_type: TypeId) -> TypeId {
        match self.model.kind(callee) {
            Some(ElementKind::Getter) => self
                .model
                .types
                .return_type(member_type)
                .unwrap_or(TypeId::DYNAMIC),
            Some(ElementKind::LocalVariable | ElementKind::Parameter) => self
                .promotion
                .promoted_type(callee)
                .unwrap_or(member_type),
            _ => member_type,
        }
    }

    /// Type a call of `callee` evaluates to, given its value type. Function
    /// values return their declared return type; objects with a `call`
    /// method return that method's return type.
    pub(crate) fn call_return_type(&self, callee: ElementId, value_type: TypeId) -> TypeId {
        if matches!(
            self.model.kind(callee),
            Some(ElementKind::Method | ElementKind::Function)
        ) {
            return self
                .model
                .types
                .return_type(value_type)
                .unwrap_or_else(|| self.model.return_type(callee));
        }
        if let Some(returned) = self.model.types.return_type(value_type) {
            return returned;
        }
        self.ts()
            .call_method_type(value_type)
            .and_then(|call| self.model.types.return_type(call))
            .unwrap_or(TypeId::DYNAMIC)
    }

    /// `querySelector('tag')` and `query('tag')` in `dart:html` evaluate to
    /// the element class of the tag.
    fn propagate_html_query(&mut self, node: NodeIndex, callee: ElementId, arguments: NodeIndex) {
        if callee.is_none() || !is_html_query(self.model, callee) {
            return;
        }
        let arena = self.unit.arena;
        let Some(NodeKind::ArgumentList { arguments }) = arena.kind(arguments) else {
            return;
        };
        let Some(first) = arguments.first() else {
            return;
        };
        let Some(NodeKind::SimpleStringLiteral { value }) = arena.kind(first) else {
            return;
        };
        let Some(class_name) = element_class_for_selector(value) else {
            return;
        };
        let library = self.model.elements.library_of(callee);
        if let Some(class) = find_class(self.model, library, class_name) {
            let ty = self.model.element_type(class);
            trace!(selector = %value, class = class_name, "html query");
            self.record_propagated(node, ty);
        }
    }

    // =========================================================================
    // Function expression invocations
    // =========================================================================

    pub(crate) fn visit_function_expression_invocation(&mut self, node: NodeIndex) {
        let Some(NodeKind::FunctionExpressionInvocation {
            function,
            arguments,
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let (function, arguments) = (*function, *arguments);
        self.visit(function);
        self.visit(arguments);

        let static_type = self.static_type(function);
        let element = function_type_element(self, static_type);
        if element.is_some() {
            self.annotations.set_static_element(node, element);
        }
        self.record_static(node, self.call_return_type(ElementId::NONE, static_type));
        if let Some(parameters) = self.callee_parameters(ElementId::NONE, static_type) {
            self.resolve_arguments(arguments, &parameters, Correspondence::Static);
        }
        if let Some(propagated) = self.propagated_type(function) {
            let element = function_type_element(self, propagated);
            if element.is_some() {
                self.annotations.set_propagated_element(node, element);
            }
            let returned = self.call_return_type(ElementId::NONE, propagated);
            self.record_propagated(node, returned);
            if let Some(parameters) = self.callee_parameters(ElementId::NONE, propagated) {
                self.resolve_arguments(arguments, &parameters, Correspondence::Propagated);
            }
        }
    }

    // =========================================================================
    // Instance creation
    // =========================================================================

    pub(crate) fn visit_instance_creation(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::InstanceCreationExpression {
            constructor_name,
            arguments,
            ..
        }) = arena.kind(node)
        else {
            return;
        };
        let (constructor_name, arguments) = (*constructor_name, *arguments);
        self.visit(arguments);
        let Some(NodeKind::ConstructorName { type_name, name }) = arena.kind(constructor_name) else {
            return;
        };
        let ty = self.static_type(*type_name);
        self.record_static(node, ty);
        let class = self.model.class_of_type(ty);
        if class.is_none() {
            return;
        }
        let name_node = self.constructor_name_node(*type_name, *name);
        let ctor_name = if name_node.is_some() {
            self.identifier_text(name_node)
        } else {
            String::new()
        };
        let constructor = self.model.get_constructor(class, &ctor_name);
        if constructor.is_none() {
            let class_name = self.model.name(class).to_string();
            if ctor_name.is_empty() {
                self.report(
                    constructor_name,
                    diagnostic_codes::NEW_WITH_UNDEFINED_CONSTRUCTOR_DEFAULT,
                    vec![class_name],
                );
            } else {
                self.report(
                    constructor_name,
                    diagnostic_codes::NEW_WITH_UNDEFINED_CONSTRUCTOR,
                    vec![class_name, ctor_name],
                );
            }
            return;
        }
        trace!(node = node.0, constructor = constructor.0, "instance creation");
        self.annotations.set_static_element(constructor_name, constructor);
        self.annotations.set_static_element(node, constructor);
        if name_node.is_some() {
            self.annotations.set_static_element(name_node, constructor);
        }
        let parameters = self.model.parameters(constructor).to_vec();
        self.resolve_arguments(arguments, &parameters, Correspondence::Static);
    }

    /// Identifier holding the constructor name of `T.name` or `p.T.name`.
    /// `new C.named()` parses the name into the type name, with the class
    /// as prefix.
    pub(crate) fn constructor_name_node(&self, type_name: NodeIndex, name: NodeIndex) -> NodeIndex {
        if name.is_some() {
            return name;
        }
        let arena = self.unit.arena;
        let Some(NodeKind::TypeName { name: type_ident, .. }) = arena.kind(type_name) else {
            return NodeIndex::NONE;
        };
        match arena.kind(*type_ident) {
            Some(NodeKind::PrefixedIdentifier { prefix, identifier })
                if self.model.kind(self.annotations.static_element(*prefix))
                    == Some(ElementKind::Class) =>
            {
                *identifier
            }
            _ => NodeIndex::NONE,
        }
    }

    // =========================================================================
    // Closures
    // =========================================================================

    pub(crate) fn visit_function_expression(&mut self, node: NodeIndex) {
        let Some(NodeKind::FunctionExpression { parameters, body }) = self.unit.arena.kind(node) else {
            return;
        };
        let (parameters, body) = (*parameters, *body);
        let closure = self.annotations.declared_element(node);
        let ty = self.model.element_type(closure);
        self.record_static(node, ty);
        let context = super::EnclosingContext {
            executable: closure,
            parameter: ElementId::NONE,
            in_initializer: false,
            ..self.context
        };
        self.visit_function_body(closure, context, &[parameters], body);

        if let Some(NodeKind::ExpressionFunctionBody { expression }) = self.unit.arena.kind(body) {
            let returned = self.best_type(*expression);
            if let Some(TypeData::Function { element, params, .. }) = self.model.types.lookup(ty) {
                let inferred = self.model.types.function(element, params, returned);
                self.record_propagated(node, inferred);
            }
        }
    }
}

/// Executable or alias a function type was built from.
fn function_type_element(visitor: &ResolverVisitor<'_>, ty: TypeId) -> ElementId {
    match visitor.model.types.lookup(ty) {
        Some(TypeData::Function { element, .. }) => element,
        _ => ElementId::NONE,
    }
}
