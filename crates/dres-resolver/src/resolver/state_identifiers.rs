//! Simple identifiers, prefixed identifiers and property accesses, plus the
//! member lookups on receiver types the other expression kinds share.

use super::ResolverVisitor;
use crate::lookup::{library_names, prefixed_lookup};
use crate::variable_resolver::is_write_context;
use dres_binder::{AuxiliaryElements, Lookup, setter_name};
use dres_common::diagnostics::diagnostic_codes;
use dres_common::limits::MAX_TYPE_DEPTH;
use dres_element::{Element, ElementId, ElementKind, TypeData, TypeId};
use dres_syntax::{NodeArena, NodeIndex, NodeKind, Operator};
use tracing::trace;

/// Written and read in one expression: `x += 1`, `x++`, `--a.b`.
pub(crate) fn is_compound_write(arena: &NodeArena, node: NodeIndex) -> bool {
    match arena.kind(arena.parent(node)) {
        Some(NodeKind::AssignmentExpression { operator, left, .. }) => {
            *left == node && *operator != Operator::Eq
        }
        Some(
            NodeKind::PrefixExpression { operator, operand }
            | NodeKind::PostfixExpression { operator, operand },
        ) => *operand == node && operator.is_increment(),
        _ => false,
    }
}

/// Which kind of accessor a reference needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

impl ResolverVisitor<'_> {
    pub(crate) fn lookup_name(&self, name: &str) -> Lookup {
        self.scopes.lookup(self.unit.library_scope, self.model, name)
    }

    // =========================================================================
    // Simple identifiers
    // =========================================================================

    pub(crate) fn visit_simple_identifier(&mut self, node: NodeIndex) {
        if self.annotations.declared_element(node).is_some() {
            return;
        }
        let name = self.identifier_text(node);
        let arena = self.unit.arena;
        let access = if is_write_context(arena, node) {
            Access::Write
        } else {
            Access::Read
        };
        let element = self.resolve_simple_name(node, &name, access);
        if element.is_some() {
            self.annotations.set_static_element(node, element);
        }
        if access == Access::Write && is_compound_write(arena, node) {
            let getter = self.resolve_simple_name(NodeIndex::NONE, &name, Access::Read);
            self.annotations.set_auxiliary(
                node,
                AuxiliaryElements {
                    static_element: getter,
                    propagated_element: ElementId::NONE,
                },
            );
        }
        self.record_identifier_types(node, element);
    }

    /// Element a bare `name` denotes here. Diagnostics are reported at
    /// `node` unless it is `NONE`.
    fn resolve_simple_name(&mut self, node: NodeIndex, name: &str, access: Access) -> ElementId {
        let mut lookup = self.lookup_name(name);
        if access == Access::Write {
            match self.model.kind(lookup.element()) {
                Some(ElementKind::Getter) => {
                    let setter = self.lookup_name(&setter_name(name));
                    if setter.is_found() {
                        lookup = setter;
                    }
                }
                None if lookup == Lookup::NotFound => lookup = self.lookup_name(&setter_name(name)),
                _ => {}
            }
        }
        match lookup {
            Lookup::Found(element) => element,
            Lookup::Hidden(element) => {
                if node.is_some() {
                    self.report(
                        node,
                        diagnostic_codes::REFERENCED_BEFORE_DECLARATION,
                        vec![name.to_string()],
                    );
                }
                element
            }
            Lookup::Ambiguous(elements) => {
                if node.is_some() {
                    let libraries = library_names(self.model, &elements);
                    self.report(
                        node,
                        diagnostic_codes::AMBIGUOUS_IMPORT,
                        vec![name.to_string(), libraries],
                    );
                }
                ElementId::NONE
            }
            Lookup::NotFound => {
                let inherited = self.lookup_in_enclosing_class(name, access);
                if inherited.is_none() && node.is_some() && !self.model.is_proxy(self.context.class) {
                    self.report(node, diagnostic_codes::UNDEFINED_IDENTIFIER, vec![name.to_string()]);
                }
                inherited
            }
        }
    }

    /// Inherited member of the enclosing class, for bare names.
    pub(crate) fn lookup_in_enclosing_class(&self, name: &str, access: Access) -> ElementId {
        let class = self.context.class;
        if class.is_none() {
            return ElementId::NONE;
        }
        let name = match access {
            Access::Read => name.to_string(),
            Access::Write => setter_name(name),
        };
        self.inheritance.lookup_member(&self.ts(), class, &name)
    }

    /// Static and propagated types of an identifier bound to `element`.
    pub(crate) fn record_identifier_types(&mut self, node: NodeIndex, element: ElementId) {
        let declared = self.model.element_type(element);
        let static_type = self.read_type(element, declared);
        let static_type = match self.model.kind(element) {
            Some(ElementKind::LocalVariable | ElementKind::Parameter) => self
                .promotion
                .promoted_type(element)
                .unwrap_or(static_type),
            _ => static_type,
        };
        self.record_static(node, static_type);
        if let Some(propagated) = self.variable_propagated_type(element) {
            self.record_propagated(node, propagated);
        }
    }

    /// Flow-sensitive type of a variable, or of the variable behind a getter.
    pub(crate) fn variable_propagated_type(&self, element: ElementId) -> Option<TypeId> {
        match self.model.kind(element)? {
            ElementKind::LocalVariable | ElementKind::Parameter => {
                self.overrides.get_type(element).or_else(|| {
                    self.model
                        .element(element)
                        .and_then(Element::as_variable)
                        .and_then(|d| d.propagated_type)
                })
            }
            ElementKind::Field | ElementKind::TopLevelVariable => self
                .model
                .element(element)
                .and_then(Element::as_variable)
                .and_then(|d| d.propagated_type),
            ElementKind::Getter => {
                let variable = self
                    .model
                    .element(element)
                    .and_then(Element::as_executable)
                    .map_or(ElementId::NONE, |d| d.variable);
                if variable.is_none() {
                    return None;
                }
                self.variable_propagated_type(variable)
            }
            _ => None,
        }
    }

    /// Type of a reference to `element` given its (possibly substituted)
    /// declared type: the value a getter returns, the argument a setter
    /// takes, the function type of a method.
    pub(crate) fn read_type(&self, element: ElementId, member_type: TypeId) -> TypeId {
        match self.model.kind(element) {
            Some(ElementKind::Getter) => self
                .model
                .types
                .return_type(member_type)
                .unwrap_or(TypeId::DYNAMIC),
            Some(ElementKind::Setter) => match self.model.types.lookup(member_type) {
                Some(TypeData::Function { params, .. }) => {
                    params.first().map_or(TypeId::DYNAMIC, |p| p.ty)
                }
                _ => TypeId::DYNAMIC,
            },
            Some(ElementKind::Class | ElementKind::FunctionTypeAlias | ElementKind::TypeParameter) => {
                self.provider.type_type
            }
            Some(ElementKind::Prefix | ElementKind::Import | ElementKind::Library) | None => {
                TypeId::DYNAMIC
            }
            Some(_) => member_type,
        }
    }

    // =========================================================================
    // Member lookup on types
    // =========================================================================

    /// Member `name` of values of type `receiver`, with its type as seen
    /// through the receiver. Dynamic receivers have no members.
    pub(crate) fn lookup_on_type(&mut self, receiver: TypeId, name: &str) -> Option<(ElementId, TypeId)> {
        let mut receiver = receiver;
        for _ in 0..MAX_TYPE_DEPTH {
            match self.model.types.lookup(receiver)? {
                TypeData::Interface { .. } => {
                    return self.inheritance.lookup_member_type(&self.ts(), receiver, name);
                }
                TypeData::TypeParameter { .. } => {
                    let bound = self.ts().bound_of(receiver);
                    if bound == receiver {
                        return None;
                    }
                    receiver = bound;
                }
                TypeData::Function { .. } => receiver = self.provider.function_type,
                TypeData::Union(_) => {
                    let merged = self.lookup_in_union(receiver, name);
                    return merged
                        .is_some()
                        .then(|| (merged, self.model.element_type(merged)));
                }
                TypeData::Dynamic | TypeData::Bottom | TypeData::Void => return None,
            }
        }
        None
    }

    /// Missing members of `ty` should be reported.
    pub(crate) fn should_report_missing(&self, ty: TypeId) -> bool {
        match self.model.types.lookup(ty) {
            Some(TypeData::Interface { element, .. }) => !self.model.is_proxy(element),
            Some(TypeData::TypeParameter { .. } | TypeData::Function { .. }) => true,
            _ => false,
        }
    }

    /// Member `name` of the static and the propagated receiver type of
    /// `target`. Missing members are reported at `at` with `code` (static)
    /// or `hint` (propagated only).
    pub(crate) fn lookup_member_of(
        &mut self,
        target: NodeIndex,
        name: &str,
        at: NodeIndex,
        code: u32,
        hint: u32,
    ) -> (Option<(ElementId, TypeId)>, Option<(ElementId, TypeId)>) {
        let static_receiver = self.static_type(target);
        let propagated_receiver = self.propagated_type(target);
        let found = self.lookup_on_type(static_receiver, name);
        let propagated = propagated_receiver.and_then(|ty| self.lookup_on_type(ty, name));

        let report_static = at.is_some()
            && found.is_none()
            && propagated.is_none()
            && self.should_report_missing(static_receiver);
        if report_static {
            let display = self.display(static_receiver);
            self.report(at, code, vec![display_member(name), display]);
        } else if let Some(receiver) = propagated_receiver
            && at.is_some()
            && propagated.is_none()
            && self.options.generate_hints
            && self.should_report_missing(receiver)
        {
            let display = self.display(receiver);
            self.report(at, hint, vec![display_member(name), display]);
        }
        if let Some((member, _)) = found
            && at.is_some()
            && self.model.element(member).is_some_and(Element::is_static)
        {
            self.report(
                at,
                diagnostic_codes::INSTANCE_ACCESS_TO_STATIC_MEMBER,
                vec![display_member(name)],
            );
        }
        (found, propagated)
    }

    /// Static member `name` of `class` (not inherited ones).
    pub(crate) fn lookup_static_member(&mut self, class: ElementId, name: &str, at: NodeIndex, code: u32) -> ElementId {
        let member = self.model.get_member(class, name);
        if member.is_none() {
            if !self.model.is_proxy(class) {
                let class_name = self.model.name(class).to_string();
                self.report(at, code, vec![display_member(name), class_name]);
            }
            return ElementId::NONE;
        }
        if !self.model.element(member).is_some_and(Element::is_static) {
            self.report(
                at,
                diagnostic_codes::STATIC_ACCESS_TO_INSTANCE_MEMBER,
                vec![display_member(name)],
            );
        }
        member
    }

    /// Target node whose value a member is selected from: the cascade
    /// target for cascade sections.
    pub(crate) fn receiver_of(&self, target: NodeIndex) -> NodeIndex {
        if target.is_some() {
            return target;
        }
        self.cascade_targets.last().copied().unwrap_or(NodeIndex::NONE)
    }

    /// `target` names a class, as in `C.m` or `p.C.m`.
    pub(crate) fn static_class_target(&self, target: NodeIndex) -> ElementId {
        let arena = self.unit.arena;
        let element = match arena.kind(target) {
            Some(NodeKind::SimpleIdentifier { .. }) => self.annotations.static_element(target),
            Some(NodeKind::PrefixedIdentifier { identifier, .. }) => {
                self.annotations.static_element(*identifier)
            }
            _ => ElementId::NONE,
        };
        if self.model.kind(element) == Some(ElementKind::Class) {
            element
        } else {
            ElementId::NONE
        }
    }

    // =========================================================================
    // Prefixed identifiers and property access
    // =========================================================================

    pub(crate) fn visit_prefixed_identifier(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(NodeKind::PrefixedIdentifier { prefix, identifier }) = arena.kind(node) else {
            return;
        };
        let prefix_name = self.identifier_text(*prefix);
        let prefix_element = self.lookup_name(&prefix_name).element();
        if self.model.kind(prefix_element) != Some(ElementKind::Prefix) {
            self.visit(*prefix);
            self.resolve_property(node, *prefix, *identifier);
            return;
        }
        self.annotations.set_static_element(*prefix, prefix_element);
        let name = self.identifier_text(*identifier);
        let write = is_write_context(arena, node);
        let mut lookup = prefixed_lookup(self.model, prefix_element, &name);
        if write {
            let setter = prefixed_lookup(self.model, prefix_element, &setter_name(&name));
            if setter.is_found() {
                lookup = setter;
            }
        }
        let element = match lookup {
            Lookup::Found(element) | Lookup::Hidden(element) => element,
            Lookup::Ambiguous(elements) => {
                let libraries = library_names(self.model, &elements);
                self.report(
                    *identifier,
                    diagnostic_codes::AMBIGUOUS_IMPORT,
                    vec![format!("{prefix_name}.{name}"), libraries],
                );
                ElementId::NONE
            }
            Lookup::NotFound => {
                self.report(
                    node,
                    diagnostic_codes::UNDEFINED_IDENTIFIER,
                    vec![format!("{prefix_name}.{name}")],
                );
                ElementId::NONE
            }
        };
        trace!(node = node.0, element = element.0, "prefixed identifier");
        if element.is_some() {
            self.annotations.set_static_element(*identifier, element);
        }
        if write && is_compound_write(arena, node) {
            let getter = prefixed_lookup(self.model, prefix_element, &name).element();
            self.annotations.set_auxiliary(
                *identifier,
                AuxiliaryElements {
                    static_element: getter,
                    propagated_element: ElementId::NONE,
                },
            );
        }
        self.record_identifier_types(*identifier, element);
        self.copy_types(*identifier, node);
    }

    pub(crate) fn visit_property_access(&mut self, node: NodeIndex) {
        let Some(NodeKind::PropertyAccess {
            target,
            property_name,
            ..
        }) = self.unit.arena.kind(node)
        else {
            return;
        };
        self.visit(*target);
        let receiver = self.receiver_of(*target);
        self.resolve_property(node, receiver, *property_name);
    }

    /// Bind `property` selected from `target`, then type `node`.
    fn resolve_property(&mut self, node: NodeIndex, target: NodeIndex, property: NodeIndex) {
        let arena = self.unit.arena;
        let name = self.identifier_text(property);
        let write = is_write_context(arena, node);
        let compound = write && is_compound_write(arena, node);
        let member_name = if write { setter_name(&name) } else { name.clone() };

        if matches!(arena.kind(target), Some(NodeKind::SuperExpression)) {
            let code = if write {
                diagnostic_codes::UNDEFINED_SUPER_SETTER
            } else {
                diagnostic_codes::UNDEFINED_SUPER_GETTER
            };
            let (element, ty) = self.lookup_super_member(&member_name, property, code);
            self.bind_property(node, property, element, ty, None);
            if compound {
                let (getter, _) =
                    self.lookup_super_member(&name, NodeIndex::NONE, diagnostic_codes::UNDEFINED_SUPER_GETTER);
                self.set_getter_auxiliary(property, getter, ElementId::NONE);
            }
            return;
        }

        let class = self.static_class_target(target);
        if class.is_some() {
            let code = if write {
                diagnostic_codes::UNDEFINED_SETTER
            } else {
                diagnostic_codes::UNDEFINED_GETTER
            };
            let element = self.lookup_static_member(class, &member_name, property, code);
            let ty = self.model.element_type(element);
            self.bind_property(node, property, element, ty, None);
            if compound {
                let getter = self.model.get_member(class, &name);
                self.set_getter_auxiliary(property, getter, ElementId::NONE);
            }
            return;
        }

        let (code, hint) = if write {
            (diagnostic_codes::UNDEFINED_SETTER, diagnostic_codes::UNDEFINED_SETTER_HINT)
        } else {
            (diagnostic_codes::UNDEFINED_GETTER, diagnostic_codes::UNDEFINED_GETTER_HINT)
        };
        let (found, propagated) = self.lookup_member_of(target, &member_name, property, code, hint);
        let (element, ty) = found.unwrap_or((ElementId::NONE, TypeId::DYNAMIC));
        self.bind_property(node, property, element, ty, propagated);
        if compound {
            let getter = self
                .lookup_on_type(self.static_type(target), &name)
                .map_or(ElementId::NONE, |(g, _)| g);
            let propagated_getter = self
                .propagated_type(target)
                .and_then(|ty| self.lookup_on_type(ty, &name))
                .map_or(ElementId::NONE, |(g, _)| g);
            self.set_getter_auxiliary(property, getter, propagated_getter);
        }
    }

    /// Member `name` inherited by the enclosing class, typed through its
    /// superclass.
    pub(crate) fn lookup_super_member(&mut self, name: &str, at: NodeIndex, code: u32) -> (ElementId, TypeId) {
        let class = self.context.class;
        if class.is_none() || !self.context.is_instance_context() {
            return (ElementId::NONE, TypeId::DYNAMIC);
        }
        let member = self.inheritance.lookup_inherited(&self.ts(), class, name);
        if member.is_none() {
            if at.is_some() {
                let class_name = self.model.name(class).to_string();
                self.report(at, code, vec![display_member(name), class_name]);
            }
            return (ElementId::NONE, TypeId::DYNAMIC);
        }
        let ty = match self.model.supertype(class) {
            Some(supertype) => self
                .inheritance
                .substitute_member_type(&self.ts(), supertype, member),
            None => self.model.element_type(member),
        };
        (member, ty)
    }

    fn set_getter_auxiliary(&mut self, node: NodeIndex, getter: ElementId, propagated: ElementId) {
        self.annotations.set_auxiliary(
            node,
            AuxiliaryElements {
                static_element: getter,
                propagated_element: propagated,
            },
        );
    }

    fn bind_property(
        &mut self,
        node: NodeIndex,
        property: NodeIndex,
        element: ElementId,
        member_type: TypeId,
        propagated: Option<(ElementId, TypeId)>,
    ) {
        if element.is_some() {
            self.annotations.set_static_element(property, element);
        }
        let static_type = self.read_type(element, member_type);
        self.record_static(property, static_type);
        self.record_static(node, static_type);
        if let Some((member, ty)) = propagated {
            if member != element {
                self.annotations.set_propagated_element(property, member);
            }
            let propagated_type = self
                .variable_propagated_type(member)
                .unwrap_or_else(|| self.read_type(member, ty));
            self.record_propagated(property, propagated_type);
            self.record_propagated(node, propagated_type);
        } else if let Some(ty) = self.variable_propagated_type(element) {
            self.record_propagated(property, ty);
            self.record_propagated(node, ty);
        }
    }
}

/// Member names as they appear in diagnostics, without the setter `=`.
pub(crate) fn display_member(name: &str) -> String {
    match name.strip_suffix('=') {
        Some(base) if base.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$') => {
            base.to_string()
        }
        _ => name.to_string(),
    }
}
