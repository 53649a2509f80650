//! Element names and identity keys of declaration nodes.
//!
//! The builder and the matcher derive the `(kind, name, offset)` key of a
//! declaration through the same functions, so a tree always re-matches the
//! elements built from it.

use dres_element::ElementKind;
use dres_syntax::{NodeArena, NodeIndex, NodeKind, PropertyKind};
use smallvec::SmallVec;

/// Name used for `operator -()` with no parameters.
pub const UNARY_MINUS: &str = "unary-";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationKey {
    pub kind: ElementKind,
    pub name: String,
    pub offset: u32,
}

impl DeclarationKey {
    fn new(kind: ElementKind, name: impl Into<String>, offset: u32) -> Self {
        Self {
            kind,
            name: name.into(),
            offset,
        }
    }
}

/// Setter names carry a trailing `=`.
pub fn setter_name(name: &str) -> String {
    format!("{name}=")
}

/// Number of parameters in a `FormalParameterList`.
pub fn parameter_count(arena: &NodeArena, list: NodeIndex) -> usize {
    match arena.kind(list) {
        Some(NodeKind::FormalParameterList { parameters }) => parameters.len(),
        _ => 0,
    }
}

/// Name of the element a `MethodDeclaration` declares.
pub fn method_name(arena: &NodeArena, node: NodeIndex) -> Option<String> {
    let Some(NodeKind::MethodDeclaration {
        property_kind,
        is_operator,
        name,
        parameters,
        ..
    }) = arena.kind(node)
    else {
        return None;
    };
    let text = arena.identifier_name(*name)?;
    Some(match property_kind {
        PropertyKind::Set => setter_name(text),
        _ if *is_operator && text == "-" && parameter_count(arena, *parameters) == 0 => {
            UNARY_MINUS.to_string()
        }
        _ => text.to_string(),
    })
}

/// Function declarations that are the direct child of a function statement.
pub fn is_local_function(arena: &NodeArena, node: NodeIndex) -> bool {
    matches!(
        arena.kind(arena.parent(node)),
        Some(NodeKind::FunctionDeclarationStatement { .. })
    )
}

/// Function expressions that are not the body of a function declaration.
pub fn is_closure(arena: &NodeArena, node: NodeIndex) -> bool {
    matches!(arena.kind(node), Some(NodeKind::FunctionExpression { .. }))
        && !matches!(
            arena.kind(arena.parent(node)),
            Some(NodeKind::FunctionDeclaration { .. })
        )
}

/// Kind of variable a `VariableDeclaration` declares.
pub fn variable_kind(arena: &NodeArena, node: NodeIndex) -> ElementKind {
    let list = arena.parent(node);
    match arena.kind(arena.parent(list)) {
        Some(NodeKind::FieldDeclaration { .. }) => ElementKind::Field,
        Some(NodeKind::TopLevelVariableDeclaration { .. }) => ElementKind::TopLevelVariable,
        _ => ElementKind::LocalVariable,
    }
}

/// True for the exception and stack-trace identifiers of a catch clause.
pub fn is_catch_parameter(arena: &NodeArena, node: NodeIndex) -> bool {
    match arena.kind(arena.parent(node)) {
        Some(NodeKind::CatchClause {
            exception_parameter,
            stack_trace_parameter,
            ..
        }) => node == *exception_parameter || node == *stack_trace_parameter,
        _ => false,
    }
}

/// Identity key of the element declared by `node`, `None` for nodes that
/// declare nothing.
pub fn declaration_key(arena: &NodeArena, node: NodeIndex) -> Option<DeclarationKey> {
    let ident = |idx: NodeIndex| -> Option<(String, u32)> {
        Some((arena.identifier_name(idx)?.to_string(), arena.offset(idx)))
    };
    let key = match arena.kind(node)? {
        NodeKind::ClassDeclaration { name, .. } | NodeKind::ClassTypeAlias { name, .. } => {
            let (name, offset) = ident(*name)?;
            DeclarationKey::new(ElementKind::Class, name, offset)
        }
        NodeKind::FunctionTypeAlias { name, .. } => {
            let (name, offset) = ident(*name)?;
            DeclarationKey::new(ElementKind::FunctionTypeAlias, name, offset)
        }
        NodeKind::FunctionDeclaration {
            property_kind, name, ..
        } => {
            let (text, offset) = ident(*name)?;
            match property_kind {
                PropertyKind::Get => DeclarationKey::new(ElementKind::Getter, text, offset),
                PropertyKind::Set => {
                    DeclarationKey::new(ElementKind::Setter, setter_name(&text), offset)
                }
                PropertyKind::None => DeclarationKey::new(ElementKind::Function, text, offset),
            }
        }
        NodeKind::ConstructorDeclaration {
            return_type, name, ..
        } => match ident(*name) {
            Some((text, offset)) => DeclarationKey::new(ElementKind::Constructor, text, offset),
            None => DeclarationKey::new(ElementKind::Constructor, "", arena.offset(*return_type)),
        },
        NodeKind::MethodDeclaration {
            property_kind, name, ..
        } => {
            let kind = match property_kind {
                PropertyKind::Get => ElementKind::Getter,
                PropertyKind::Set => ElementKind::Setter,
                PropertyKind::None => ElementKind::Method,
            };
            DeclarationKey::new(kind, method_name(arena, node)?, arena.offset(*name))
        }
        NodeKind::VariableDeclaration { name, .. } => {
            let (text, offset) = ident(*name)?;
            DeclarationKey::new(variable_kind(arena, node), text, offset)
        }
        NodeKind::FormalParameter { name, .. } => {
            let (text, offset) = ident(*name)?;
            DeclarationKey::new(ElementKind::Parameter, text, offset)
        }
        NodeKind::TypeParameter { name, .. } => {
            let (text, offset) = ident(*name)?;
            DeclarationKey::new(ElementKind::TypeParameter, text, offset)
        }
        NodeKind::Label { label } => {
            let (text, offset) = ident(*label)?;
            DeclarationKey::new(ElementKind::Label, text, offset)
        }
        NodeKind::DeclaredIdentifier { name, .. } => {
            let (text, offset) = ident(*name)?;
            DeclarationKey::new(ElementKind::LocalVariable, text, offset)
        }
        NodeKind::SimpleIdentifier { name } if is_catch_parameter(arena, node) => {
            DeclarationKey::new(ElementKind::LocalVariable, name.clone(), arena.offset(node))
        }
        NodeKind::FunctionExpression { .. } if is_closure(arena, node) => {
            DeclarationKey::new(ElementKind::Function, "", arena.offset(node))
        }
        _ => return None,
    };
    Some(key)
}

/// Nodes that should map to the element declared by `node`: the node
/// itself, its name identifier, and the function expression of a function
/// declaration.
pub fn declared_nodes(arena: &NodeArena, node: NodeIndex) -> SmallVec<[NodeIndex; 3]> {
    let mut out: SmallVec<[NodeIndex; 3]> = SmallVec::new();
    out.push(node);
    let name = match arena.kind(node) {
        Some(
            NodeKind::ClassDeclaration { name, .. }
            | NodeKind::ClassTypeAlias { name, .. }
            | NodeKind::FunctionTypeAlias { name, .. }
            | NodeKind::ConstructorDeclaration { name, .. }
            | NodeKind::MethodDeclaration { name, .. }
            | NodeKind::VariableDeclaration { name, .. }
            | NodeKind::FormalParameter { name, .. }
            | NodeKind::TypeParameter { name, .. }
            | NodeKind::DeclaredIdentifier { name, .. },
        ) => *name,
        Some(NodeKind::FunctionDeclaration { name, function, .. }) => {
            out.push(*function);
            *name
        }
        Some(NodeKind::Label { label }) => *label,
        _ => NodeIndex::NONE,
    };
    if name.is_some() {
        out.push(name);
    }
    out
}
