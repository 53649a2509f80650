//! Element builder: creates one element per declaration of a unit.
//!
//! The builder runs once per unit when its library is first built. It records
//! every declaration node in the unit's [`UnitAnnotations`] and synthesizes
//! the implicit elements the language requires (default constructors and
//! accessors of variables). Types are left `dynamic`; the type resolution pass
//! fills them in.

mod state_bodies;
mod state_members;

use crate::annotations::UnitAnnotations;
use crate::naming::{declared_nodes, setter_name};
use dres_element::{
    ClassData, Element, ElementData, ElementFlags, ElementId, ElementKind, ElementModel,
    ExecutableData, ExecutableKind, FunctionTypeAliasData, TypeParameterData, UnitData,
    VariableData, VariableKind,
};
use dres_syntax::{NodeArena, NodeIndex, NodeKind, ParameterKind, ParsedUnit, PropertyKind};
use tracing::{debug, trace};

pub struct ElementBuilder<'a> {
    pub(crate) model: &'a mut ElementModel,
    pub(crate) arena: &'a NodeArena,
    pub(crate) annotations: &'a mut UnitAnnotations,
    pub(crate) unit: ElementId,
    /// Class whose members are being built.
    pub(crate) current_class: ElementId,
}

impl<'a> ElementBuilder<'a> {
    /// Create the unit element for `parsed` (enclosed by `library`, but not
    /// yet listed in it) and build all of its declarations.
    #[tracing::instrument(level = "debug", skip_all, fields(source = %parsed.source))]
    pub fn build_unit(
        model: &'a mut ElementModel,
        parsed: &'a ParsedUnit,
        annotations: &'a mut UnitAnnotations,
        library: ElementId,
    ) -> ElementId {
        let unit = model.elements.add(
            Element::new(
                "",
                0,
                ElementData::CompilationUnit(UnitData {
                    source: parsed.source.clone(),
                    classes: Vec::new(),
                    function_type_aliases: Vec::new(),
                    functions: Vec::new(),
                    top_level_variables: Vec::new(),
                    accessors: Vec::new(),
                }),
            ),
            library,
        );
        annotations.declare(parsed.root, unit);
        let mut builder = ElementBuilder {
            model,
            arena: &parsed.arena,
            annotations,
            unit,
            current_class: ElementId::NONE,
        };
        for &decl in parsed.declarations() {
            builder.build_top_level(decl);
        }
        debug!(unit = unit.0, elements = builder.model.elements.len(), "built unit");
        unit
    }

    /// Add an element for the declaration `node` inside `container` and map
    /// the declaration's nodes to it.
    pub(crate) fn add(&mut self, node: NodeIndex, element: Element, container: ElementId) -> ElementId {
        trace!(name = %element.name, kind = ?element.kind(), "element");
        let id = self.model.add_child(element, container);
        if node.is_some() {
            for n in declared_nodes(self.arena, node) {
                self.annotations.declare(n, id);
                if self.arena.identifier_name(n).is_some() {
                    self.annotations.set_static_element(n, id);
                }
            }
        }
        id
    }

    pub(crate) fn add_synthetic(&mut self, mut element: Element, container: ElementId) -> ElementId {
        element.flags |= ElementFlags::SYNTHETIC;
        self.model.add_child(element, container)
    }

    pub(crate) fn name_of(&self, ident: NodeIndex) -> (String, u32) {
        (
            self.arena.identifier_name(ident).unwrap_or("").to_string(),
            self.arena.offset(ident),
        )
    }

    fn build_top_level(&mut self, decl: NodeIndex) {
        let arena = self.arena;
        let Some(kind) = arena.kind(decl) else {
            return;
        };
        match kind {
            NodeKind::ClassDeclaration { .. } => self.build_class(decl),
            NodeKind::ClassTypeAlias {
                is_abstract,
                name,
                type_parameters,
                ..
            } => {
                let (text, offset) = self.name_of(*name);
                let mut element = Element::new(text, offset, ElementData::Class(ClassData::default()));
                element.flags |= ElementFlags::MIXIN_APPLICATION;
                if *is_abstract {
                    element.flags |= ElementFlags::ABSTRACT;
                }
                let class = self.add(decl, element, self.unit);
                self.build_type_parameters(type_parameters.nodes.as_slice(), class);
                self.set_this_type(class);
            }
            NodeKind::FunctionTypeAlias {
                name,
                type_parameters,
                parameters,
                ..
            } => {
                let (text, offset) = self.name_of(*name);
                let alias = self.add(
                    decl,
                    Element::new(
                        text,
                        offset,
                        ElementData::FunctionTypeAlias(FunctionTypeAliasData {
                            type_parameters: Vec::new(),
                            parameters: Vec::new(),
                            return_type: dres_element::TypeId::DYNAMIC,
                            ty: dres_element::TypeId::DYNAMIC,
                        }),
                    ),
                    self.unit,
                );
                self.build_type_parameters(type_parameters.nodes.as_slice(), alias);
                self.build_parameters(*parameters, alias);
            }
            NodeKind::FunctionDeclaration {
                is_external,
                property_kind,
                name,
                function,
                ..
            } => {
                let (text, offset) = self.name_of(*name);
                let kind = match property_kind {
                    PropertyKind::Get => ExecutableKind::Getter,
                    PropertyKind::Set => ExecutableKind::Setter,
                    PropertyKind::None => ExecutableKind::Function,
                };
                let element_name = if kind == ExecutableKind::Setter {
                    setter_name(&text)
                } else {
                    text.clone()
                };
                let mut element = Element::new(
                    element_name,
                    offset,
                    ElementData::Executable(ExecutableData::new(kind)),
                );
                if *is_external {
                    element.flags |= ElementFlags::EXTERNAL;
                }
                let executable = self.add(decl, element, self.unit);
                self.build_function_expression(*function, executable);
                if kind != ExecutableKind::Function {
                    self.link_explicit_accessor(executable, self.unit, &text, offset, false);
                }
            }
            NodeKind::TopLevelVariableDeclaration { variables, .. } => {
                self.build_variables(*variables, self.unit, VariableKind::TopLevel, false);
            }
            _ => {}
        }
    }

    /// Type-parameter elements of a class or alias.
    pub(crate) fn build_type_parameters(&mut self, nodes: &[NodeIndex], container: ElementId) {
        for &node in nodes {
            let Some(NodeKind::TypeParameter { name, .. }) = self.arena.kind(node) else {
                continue;
            };
            let (text, offset) = self.name_of(*name);
            let id = self.add(
                node,
                Element::new(
                    text,
                    offset,
                    ElementData::TypeParameter(TypeParameterData {
                        bound: None,
                        ty: dres_element::TypeId::DYNAMIC,
                    }),
                ),
                container,
            );
            let ty = self.model.types.type_parameter(id);
            if let Some(data) = self
                .model
                .element_mut(id)
                .and_then(Element::as_type_parameter_mut)
            {
                data.ty = ty;
            }
        }
    }

    /// `C<T1..Tn>` with the class's own parameters.
    pub(crate) fn set_this_type(&mut self, class: ElementId) {
        let args = self.model.type_parameter_types(class);
        let this_type = self.model.types.interface(class, args);
        if let Some(data) = self.model.element_mut(class).and_then(Element::as_class_mut) {
            data.this_type = this_type;
        }
    }

    /// Variables of a `VariableDeclarationList` with their implicit
    /// accessors (none for locals).
    pub(crate) fn build_variables(
        &mut self,
        list: NodeIndex,
        container: ElementId,
        kind: VariableKind,
        is_static: bool,
    ) {
        let arena = self.arena;
        let Some(NodeKind::VariableDeclarationList {
            keyword, variables, ..
        }) = arena.kind(list)
        else {
            return;
        };
        for decl in variables.iter() {
            let Some(NodeKind::VariableDeclaration { name, initializer }) = arena.kind(decl) else {
                continue;
            };
            let (text, offset) = self.name_of(*name);
            let mut data = VariableData::new(kind);
            data.has_initializer = initializer.is_some();
            let mut element = Element::new(text.clone(), offset, ElementData::Variable(data));
            if keyword.is_final() {
                element.flags |= ElementFlags::FINAL;
            }
            if keyword.is_const() {
                element.flags |= ElementFlags::CONST | ElementFlags::FINAL;
            }
            if is_static {
                element.flags |= ElementFlags::STATIC;
            }
            if kind == VariableKind::Local {
                element.flags |= ElementFlags::LOCAL;
            }
            let variable = self.add(decl, element, container);
            if kind == VariableKind::Local {
                self.build_locals_in(*initializer, container);
                continue;
            }
            if initializer.is_some() && self.contains_closure(*initializer) {
                let mut init = Element::new(
                    "",
                    offset,
                    ElementData::Executable(ExecutableData::new(ExecutableKind::Function)),
                );
                init.flags |= ElementFlags::SYNTHETIC;
                let init = self.model.add_child(init, variable);
                self.build_locals_in(*initializer, init);
            }
            self.build_implicit_accessors(variable, container, &text, offset, keyword.is_final() || keyword.is_const(), is_static);
        }
    }

    fn contains_closure(&self, node: NodeIndex) -> bool {
        self.arena
            .descendants(node)
            .into_iter()
            .any(|n| matches!(self.arena.kind(n), Some(NodeKind::FunctionExpression { .. })))
    }

    /// Synthetic getter, and setter unless the variable is final.
    fn build_implicit_accessors(
        &mut self,
        variable: ElementId,
        container: ElementId,
        name: &str,
        offset: u32,
        is_final: bool,
        is_static: bool,
    ) {
        let static_flag = if is_static {
            ElementFlags::STATIC
        } else {
            ElementFlags::empty()
        };
        let mut getter_data = ExecutableData::new(ExecutableKind::Getter);
        getter_data.variable = variable;
        let mut getter = Element::new(name, offset, ElementData::Executable(getter_data));
        getter.flags |= static_flag;
        let getter = self.add_synthetic(getter, container);
        let mut setter = ElementId::NONE;
        if !is_final {
            let mut setter_data = ExecutableData::new(ExecutableKind::Setter);
            setter_data.variable = variable;
            let mut element = Element::new(setter_name(name), offset, ElementData::Executable(setter_data));
            element.flags |= static_flag;
            setter = self.add_synthetic(element, container);
            let param = Element::new(
                format!("_{name}"),
                offset,
                ElementData::Parameter(dres_element::ParameterData::new(ParameterKind::Required)),
            );
            self.add_synthetic(param, setter);
        }
        if let Some(data) = self.model.element_mut(variable).and_then(Element::as_variable_mut) {
            data.getter = getter;
            data.setter = setter;
        }
    }

    /// Connect an explicit getter or setter to its variable, creating a
    /// synthetic variable when none is declared.
    pub(crate) fn link_explicit_accessor(
        &mut self,
        accessor: ElementId,
        container: ElementId,
        name: &str,
        offset: u32,
        is_static: bool,
    ) {
        let is_setter = self.model.kind(accessor) == Some(ElementKind::Setter);
        let existing = self.find_variable(container, name);
        let variable = match existing {
            Some(v) => v,
            None => {
                let kind = if self.model.kind(container) == Some(ElementKind::Class) {
                    VariableKind::Field
                } else {
                    VariableKind::TopLevel
                };
                let mut element = Element::new(name, offset, ElementData::Variable(VariableData::new(kind)));
                if is_static {
                    element.flags |= ElementFlags::STATIC;
                }
                self.add_synthetic(element, container)
            }
        };
        if let Some(data) = self.model.element_mut(accessor).and_then(Element::as_executable_mut) {
            data.variable = variable;
        }
        if let Some(data) = self.model.element_mut(variable).and_then(Element::as_variable_mut) {
            if is_setter {
                data.setter = accessor;
            } else {
                data.getter = accessor;
            }
        }
    }

    fn find_variable(&self, container: ElementId, name: &str) -> Option<ElementId> {
        let ids: &[ElementId] = match self.model.element(container).map(|e| &e.data) {
            Some(ElementData::Class(d)) => &d.fields,
            Some(ElementData::CompilationUnit(d)) => &d.top_level_variables,
            _ => return None,
        };
        ids.iter().copied().find(|&id| self.model.name(id) == name)
    }
}
