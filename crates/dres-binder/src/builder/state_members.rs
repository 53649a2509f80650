//! Classes and their members.

use super::ElementBuilder;
use crate::naming::method_name;
use dres_element::{
    ClassData, Element, ElementData, ElementFlags, ElementId, ExecutableData, ExecutableKind,
    VariableKind,
};
use dres_syntax::{NodeIndex, NodeKind, PropertyKind};

impl<'a> ElementBuilder<'a> {
    pub(crate) fn build_class(&mut self, decl: NodeIndex) {
        let arena = self.arena;
        let Some(NodeKind::ClassDeclaration {
            is_abstract,
            name,
            type_parameters,
            members,
            ..
        }) = arena.kind(decl)
        else {
            return;
        };
        let (text, offset) = self.name_of(*name);
        let mut element = Element::new(text, offset, ElementData::Class(ClassData::default()));
        if *is_abstract {
            element.flags |= ElementFlags::ABSTRACT;
        }
        let class = self.add(decl, element, self.unit);
        self.build_type_parameters(type_parameters.nodes.as_slice(), class);
        self.set_this_type(class);

        let outer = std::mem::replace(&mut self.current_class, class);
        // Fields first so initializing formals can find them.
        for member in members.iter() {
            if let Some(NodeKind::FieldDeclaration {
                is_static,
                variables,
                ..
            }) = arena.kind(member)
            {
                self.build_variables(*variables, class, VariableKind::Field, *is_static);
            }
        }
        let mut has_constructor = false;
        for member in members.iter() {
            match arena.kind(member) {
                Some(NodeKind::ConstructorDeclaration { .. }) => {
                    has_constructor = true;
                    self.build_constructor(member, class);
                }
                Some(NodeKind::MethodDeclaration { .. }) => self.build_method(member, class),
                _ => {}
            }
        }
        if !has_constructor {
            let ctor = Element::new(
                "",
                offset,
                ElementData::Executable(ExecutableData::new(ExecutableKind::Constructor)),
            );
            self.add_synthetic(ctor, class);
        }
        self.current_class = outer;
    }

    fn build_constructor(&mut self, node: NodeIndex, class: ElementId) {
        let arena = self.arena;
        let Some(NodeKind::ConstructorDeclaration {
            is_external,
            is_const,
            is_factory,
            return_type,
            name,
            parameters,
            initializers,
            body,
            ..
        }) = arena.kind(node)
        else {
            return;
        };
        let (text, offset) = match arena.identifier_name(*name) {
            Some(text) => (text.to_string(), arena.offset(*name)),
            None => (String::new(), arena.offset(*return_type)),
        };
        let mut element = Element::new(
            text,
            offset,
            ElementData::Executable(ExecutableData::new(ExecutableKind::Constructor)),
        );
        if *is_external {
            element.flags |= ElementFlags::EXTERNAL;
        }
        if *is_const {
            element.flags |= ElementFlags::CONST;
        }
        if *is_factory {
            element.flags |= ElementFlags::FACTORY;
        }
        let ctor = self.add(node, element, class);
        self.build_parameters(*parameters, ctor);
        for init in initializers.iter() {
            self.build_locals_in(init, ctor);
        }
        self.build_locals_in(*body, ctor);
    }

    fn build_method(&mut self, node: NodeIndex, class: ElementId) {
        let arena = self.arena;
        let Some(NodeKind::MethodDeclaration {
            is_static,
            is_external,
            property_kind,
            is_operator,
            name,
            parameters,
            body,
            ..
        }) = arena.kind(node)
        else {
            return;
        };
        let Some(element_name) = method_name(arena, node) else {
            return;
        };
        let kind = match property_kind {
            PropertyKind::Get => ExecutableKind::Getter,
            PropertyKind::Set => ExecutableKind::Setter,
            PropertyKind::None => ExecutableKind::Method,
        };
        let offset = arena.offset(*name);
        let mut element = Element::new(
            element_name,
            offset,
            ElementData::Executable(ExecutableData::new(kind)),
        );
        if *is_static {
            element.flags |= ElementFlags::STATIC;
        }
        if *is_external {
            element.flags |= ElementFlags::EXTERNAL;
        }
        if *is_operator {
            element.flags |= ElementFlags::OPERATOR;
        }
        if !*is_external && matches!(arena.kind(*body), Some(NodeKind::EmptyFunctionBody)) {
            element.flags |= ElementFlags::ABSTRACT;
        }
        let method = self.add(node, element, class);
        self.build_parameters(*parameters, method);
        self.build_locals_in(*body, method);
        if kind != ExecutableKind::Method {
            let plain = arena.identifier_name(*name).unwrap_or("").to_string();
            self.link_explicit_accessor(method, class, &plain, offset, *is_static);
        }
    }
}
