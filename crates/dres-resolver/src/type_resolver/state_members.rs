//! Member types: return, parameter and variable types inside declarations.

use super::TypeResolver;
use dres_binder::ScopeBuilder;
use dres_element::{Element, ElementId, ElementKind, TypeId, find_class};
use dres_syntax::{NodeIndex, NodeKind, ParameterShape, PropertyKind};

impl TypeResolver<'_> {
    /// Resolve the member types of every declaration in the unit. Class
    /// headers must have been resolved.
    pub fn resolve_members(&mut self) {
        for decl in self.unit.declarations() {
            self.resolve_declaration(decl);
        }
    }

    fn push_frames(&mut self, element: ElementId) -> usize {
        let depth = self.scopes.depth();
        let frames = ScopeBuilder::new(self.model).frames_for(element);
        for frame in frames {
            self.scopes.push(frame);
        }
        depth
    }

    pub(crate) fn resolve_declaration(&mut self, node: NodeIndex) {
        if node.is_none() {
            return;
        }
        let arena = self.unit.arena;
        let Some(kind) = arena.kind(node) else {
            return;
        };
        match kind {
            NodeKind::ClassDeclaration { members, .. } => {
                let class = self.annotations.declared_element(node);
                let depth = self.push_frames(class);
                let (fields, others): (Vec<NodeIndex>, Vec<NodeIndex>) = members
                    .iter()
                    .partition(|&m| matches!(arena.kind(m), Some(NodeKind::FieldDeclaration { .. })));
                for member in fields.into_iter().chain(others) {
                    self.resolve_declaration(member);
                }
                self.scopes.truncate(depth);
            }
            // The header is all there is.
            NodeKind::ClassTypeAlias { .. } => {}
            NodeKind::FunctionTypeAlias {
                return_type,
                type_parameters,
                parameters,
                ..
            } => {
                let alias = self.annotations.declared_element(node);
                let depth = self.push_frames(alias);
                for param in type_parameters.iter() {
                    self.resolve_type_parameter(param);
                }
                let ret = self.resolve_type_name(*return_type);
                self.resolve_parameters(*parameters);
                let ty = self.function_type(alias, ret);
                if let Some(data) = self.model.element_mut(alias).and_then(Element::as_alias_mut) {
                    data.return_type = ret;
                    data.ty = ty;
                }
                self.scopes.truncate(depth);
            }
            NodeKind::FunctionDeclaration {
                return_type,
                property_kind,
                function,
                ..
            } => {
                let executable = self.annotations.declared_element(node);
                let Some(NodeKind::FunctionExpression { parameters, body }) = arena.kind(*function)
                else {
                    return;
                };
                self.resolve_executable(executable, *return_type, *property_kind, *parameters, *body);
                if let Some(ty) = self.model.element(executable).and_then(Element::as_executable).map(|d| d.ty) {
                    self.annotations.set_static_type(*function, ty);
                }
            }
            NodeKind::MethodDeclaration {
                return_type,
                property_kind,
                parameters,
                body,
                ..
            } => {
                let method = self.annotations.declared_element(node);
                self.resolve_executable(method, *return_type, *property_kind, *parameters, *body);
            }
            NodeKind::ConstructorDeclaration {
                parameters,
                initializers,
                redirected,
                body,
                ..
            } => {
                let constructor = self.annotations.declared_element(node);
                let depth = self.push_frames(constructor);
                self.resolve_parameters(*parameters);
                let class = self.model.elements.class_of(constructor);
                let this_type = self
                    .model
                    .element(class)
                    .and_then(Element::as_class)
                    .map_or(TypeId::DYNAMIC, |d| d.this_type);
                self.set_executable_type(constructor, this_type);
                for initializer in initializers.iter() {
                    self.resolve_declaration(initializer);
                }
                self.resolve_declaration(*redirected);
                self.resolve_declaration(*body);
                self.scopes.truncate(depth);
            }
            NodeKind::VariableDeclarationList {
                type_name,
                variables,
                ..
            } => {
                let ty = self.resolve_type_name(*type_name);
                for decl in variables.iter() {
                    let variable = self.annotations.declared_element(decl);
                    self.set_variable_type(variable, ty);
                    if let Some(NodeKind::VariableDeclaration { initializer, .. }) = arena.kind(decl) {
                        self.resolve_declaration(*initializer);
                    }
                }
            }
            NodeKind::FormalParameterList { .. } => self.resolve_parameters(node),
            NodeKind::FunctionExpression { parameters, body } => {
                let closure = self.annotations.declared_element(node);
                let depth = self.push_frames(closure);
                self.resolve_parameters(*parameters);
                self.set_executable_type(closure, TypeId::DYNAMIC);
                if let Some(ty) = self.model.element(closure).and_then(Element::as_executable).map(|d| d.ty) {
                    self.annotations.set_static_type(node, ty);
                }
                self.resolve_declaration(*body);
                self.scopes.truncate(depth);
            }
            NodeKind::DeclaredIdentifier { type_name, .. } => {
                let ty = self.resolve_type_name(*type_name);
                let variable = self.annotations.declared_element(node);
                self.set_variable_type(variable, ty);
            }
            NodeKind::CatchClause {
                exception_type,
                exception_parameter,
                stack_trace_parameter,
                body,
            } => {
                let ty = self.resolve_type_name(*exception_type);
                let exception = self.annotations.declared_element(*exception_parameter);
                self.set_variable_type(exception, ty);
                if stack_trace_parameter.is_some() {
                    let stack_trace = find_class(self.model, self.provider.core_library, "StackTrace")
                        .map_or(TypeId::DYNAMIC, |c| self.model.element_type(c));
                    let variable = self.annotations.declared_element(*stack_trace_parameter);
                    self.set_variable_type(variable, stack_trace);
                }
                self.resolve_declaration(*body);
            }
            NodeKind::ConstructorName { type_name, .. } => {
                let previous = std::mem::replace(&mut self.in_constructor_name, true);
                self.resolve_type_name(*type_name);
                self.in_constructor_name = previous;
            }
            NodeKind::TypeName { .. } => {
                self.resolve_type_name(node);
            }
            _ => {
                for child in arena.children(node) {
                    self.resolve_declaration(child);
                }
            }
        }
    }

    /// Function, method or accessor: parameters, return type, function type
    /// and body.
    fn resolve_executable(
        &mut self,
        executable: ElementId,
        return_type: NodeIndex,
        property_kind: PropertyKind,
        parameters: NodeIndex,
        body: NodeIndex,
    ) {
        let depth = self.push_frames(executable);
        let ret = if return_type.is_some() {
            self.resolve_type_name(return_type)
        } else if property_kind == PropertyKind::Set {
            TypeId::VOID
        } else {
            TypeId::DYNAMIC
        };
        self.resolve_parameters(parameters);
        self.set_executable_type(executable, ret);
        match property_kind {
            PropertyKind::Get => self.type_accessor_variable(executable, ret),
            PropertyKind::Set => {
                let ty = self
                    .model
                    .parameters(executable)
                    .first()
                    .map_or(TypeId::DYNAMIC, |&p| self.model.element_type(p));
                self.type_accessor_variable(executable, ty);
            }
            PropertyKind::None => {}
        }
        self.resolve_declaration(body);
        self.scopes.truncate(depth);
    }

    /// Give the synthetic variable behind an explicit accessor the
    /// accessor's type. A getter wins over the setter.
    fn type_accessor_variable(&mut self, accessor: ElementId, ty: TypeId) {
        let variable = self
            .model
            .element(accessor)
            .and_then(Element::as_executable)
            .map_or(ElementId::NONE, |d| d.variable);
        if !self.model.element(variable).is_some_and(Element::is_synthetic) {
            return;
        }
        let is_setter = self.model.kind(accessor) == Some(ElementKind::Setter);
        let Some(data) = self.model.element_mut(variable).and_then(Element::as_variable_mut) else {
            return;
        };
        if is_setter && data.getter.is_some() {
            return;
        }
        data.ty = ty;
    }

    fn resolve_parameters(&mut self, list: NodeIndex) {
        let Some(NodeKind::FormalParameterList { parameters }) = self.unit.arena.kind(list) else {
            return;
        };
        for param in parameters.iter() {
            self.resolve_parameter(param);
        }
    }

    fn resolve_parameter(&mut self, node: NodeIndex) {
        let Some(NodeKind::FormalParameter {
            shape,
            type_name,
            parameters,
            default_value,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        let param = self.annotations.declared_element(node);
        let ty = match shape {
            ParameterShape::FunctionTyped => {
                let ret = self.resolve_type_name(*type_name);
                self.resolve_parameters(*parameters);
                self.function_type(param, ret)
            }
            ParameterShape::Field if type_name.is_none() => {
                let field = self
                    .model
                    .element(param)
                    .and_then(Element::as_parameter)
                    .map_or(ElementId::NONE, |d| d.field);
                if field.is_some() {
                    self.model.element_type(field)
                } else {
                    TypeId::DYNAMIC
                }
            }
            _ => self.resolve_type_name(*type_name),
        };
        self.set_parameter_type(param, ty);
        self.resolve_declaration(*default_value);
    }
}
