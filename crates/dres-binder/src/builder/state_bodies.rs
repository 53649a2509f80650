//! Parameters and the declarations nested in function bodies.

use super::ElementBuilder;
use crate::naming::is_closure;
use dres_element::{
    Element, ElementData, ElementFlags, ElementId, ExecutableData, ExecutableKind, LabelData,
    ParameterData, VariableData, VariableKind,
};
use dres_syntax::{NodeIndex, NodeKind, ParameterShape, VarKeyword};

impl<'a> ElementBuilder<'a> {
    /// Parameter elements of a `FormalParameterList`.
    pub(crate) fn build_parameters(&mut self, list: NodeIndex, container: ElementId) {
        let arena = self.arena;
        let Some(NodeKind::FormalParameterList { parameters }) = arena.kind(list) else {
            return;
        };
        for node in parameters.iter() {
            let Some(NodeKind::FormalParameter {
                kind,
                shape,
                keyword,
                name,
                parameters: nested,
                default_value,
                ..
            }) = arena.kind(node)
            else {
                continue;
            };
            let (text, offset) = self.name_of(*name);
            let mut data = ParameterData::new(*kind);
            data.has_default = default_value.is_some();
            if *shape == ParameterShape::Field {
                data.is_initializing_formal = true;
                data.field = self.model.get_field(self.current_class, &text);
            }
            let mut element = Element::new(text, offset, ElementData::Parameter(data));
            element.flags |= keyword_flags(*keyword);
            let param = self.add(node, element, container);
            if *shape == ParameterShape::FunctionTyped {
                self.build_parameters(*nested, param);
            }
        }
    }

    /// Parameters and body of the `FunctionExpression` of a declaration.
    pub(crate) fn build_function_expression(&mut self, function: NodeIndex, executable: ElementId) {
        let Some(NodeKind::FunctionExpression { parameters, body }) = self.arena.kind(function)
        else {
            return;
        };
        self.build_parameters(*parameters, executable);
        self.build_locals_in(*body, executable);
    }

    /// Walk `node` and build the local declarations it contains, stopping at
    /// nested functions, whose contents belong to their own element.
    pub(crate) fn build_locals_in(&mut self, node: NodeIndex, container: ElementId) {
        if node.is_none() {
            return;
        }
        let arena = self.arena;
        let Some(kind) = arena.kind(node) else {
            return;
        };
        match kind {
            NodeKind::FunctionDeclarationStatement { declaration } => {
                let Some(NodeKind::FunctionDeclaration { name, function, .. }) =
                    arena.kind(*declaration)
                else {
                    return;
                };
                let (text, offset) = self.name_of(*name);
                let mut element = Element::new(
                    text,
                    offset,
                    ElementData::Executable(ExecutableData::new(ExecutableKind::Function)),
                );
                element.flags |= ElementFlags::LOCAL;
                let local = self.add(*declaration, element, container);
                self.build_function_expression(*function, local);
            }
            NodeKind::FunctionExpression { .. } if is_closure(arena, node) => {
                let mut element = Element::new(
                    "",
                    arena.offset(node),
                    ElementData::Executable(ExecutableData::new(ExecutableKind::Function)),
                );
                element.flags |= ElementFlags::LOCAL;
                let closure = self.add(node, element, container);
                self.build_function_expression(node, closure);
            }
            NodeKind::VariableDeclarationList { .. } => {
                self.build_variables(node, container, VariableKind::Local, false);
            }
            NodeKind::DeclaredIdentifier { keyword, name, .. } => {
                let (text, offset) = self.name_of(*name);
                let mut element = Element::new(
                    text,
                    offset,
                    ElementData::Variable(VariableData::new(VariableKind::Local)),
                );
                element.flags |= keyword_flags(*keyword) | ElementFlags::LOCAL;
                self.add(node, element, container);
            }
            NodeKind::CatchClause {
                exception_parameter,
                stack_trace_parameter,
                body,
                ..
            } => {
                for param in [*exception_parameter, *stack_trace_parameter] {
                    if param.is_none() {
                        continue;
                    }
                    let (text, offset) = self.name_of(param);
                    let mut element = Element::new(
                        text,
                        offset,
                        ElementData::Variable(VariableData::new(VariableKind::Local)),
                    );
                    element.flags |= ElementFlags::LOCAL;
                    self.add(param, element, container);
                }
                self.build_locals_in(*body, container);
            }
            NodeKind::Label { label } => {
                let (text, offset) = self.name_of(*label);
                let on_switch_member = matches!(
                    arena.kind(arena.parent(node)),
                    Some(NodeKind::SwitchCase { .. } | NodeKind::SwitchDefault { .. })
                );
                self.add(
                    node,
                    Element::new(text, offset, ElementData::Label(LabelData { on_switch_member })),
                    container,
                );
            }
            _ => {
                for child in arena.children(node) {
                    self.build_locals_in(child, container);
                }
            }
        }
    }
}

fn keyword_flags(keyword: VarKeyword) -> ElementFlags {
    match keyword {
        VarKeyword::Final => ElementFlags::FINAL,
        VarKeyword::Const => ElementFlags::CONST | ElementFlags::FINAL,
        _ => ElementFlags::empty(),
    }
}
