//! Node storage and structural queries.

use crate::base::{NodeIndex, NodeList};
use crate::node::{Node, NodeKind};
use smallvec::SmallVec;

/// Children of one node, in source order.
pub type Children = SmallVec<[NodeIndex; 8]>;

/// Arena holding every node of one compilation unit.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Append a node. Parent links are filled by [`NodeArena::link_parents`].
    pub fn add(&mut self, kind: NodeKind, pos: u32, end: u32) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            pos,
            end,
            parent: NodeIndex::NONE,
        });
        idx
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get_mut(idx.0 as usize)
    }

    #[inline]
    pub fn kind(&self, idx: NodeIndex) -> Option<&NodeKind> {
        self.get(idx).map(|node| &node.kind)
    }

    #[inline]
    pub fn parent(&self, idx: NodeIndex) -> NodeIndex {
        self.get(idx).map_or(NodeIndex::NONE, |node| node.parent)
    }

    #[inline]
    pub fn offset(&self, idx: NodeIndex) -> u32 {
        self.get(idx).map_or(0, |node| node.pos)
    }

    #[inline]
    pub fn end(&self, idx: NodeIndex) -> u32 {
        self.get(idx).map_or(0, |node| node.end)
    }

    #[inline]
    pub fn length(&self, idx: NodeIndex) -> u32 {
        self.get(idx).map_or(0, Node::len)
    }

    /// Text of a `SimpleIdentifier` node.
    pub fn identifier_name(&self, idx: NodeIndex) -> Option<&str> {
        match self.kind(idx)? {
            NodeKind::SimpleIdentifier { name } => Some(name.as_str()),
            _ => None,
        }
    }

    /// `p.q` for prefixed identifiers, the plain name otherwise.
    pub fn qualified_name(&self, idx: NodeIndex) -> Option<String> {
        match self.kind(idx)? {
            NodeKind::SimpleIdentifier { name } => Some(name.clone()),
            NodeKind::PrefixedIdentifier { prefix, identifier } => Some(format!(
                "{}.{}",
                self.identifier_name(*prefix)?,
                self.identifier_name(*identifier)?
            )),
            _ => None,
        }
    }

    /// String value of a `SimpleStringLiteral` or adjacent simple strings.
    pub fn string_value(&self, idx: NodeIndex) -> Option<String> {
        match self.kind(idx)? {
            NodeKind::SimpleStringLiteral { value } => Some(value.clone()),
            NodeKind::AdjacentStrings { strings } => {
                let mut out = String::new();
                for part in strings.iter() {
                    out.push_str(&self.string_value(part)?);
                }
                Some(out)
            }
            _ => None,
        }
    }

    /// Children of `idx` in source order, skipping absent slots.
    pub fn children(&self, idx: NodeIndex) -> Children {
        let mut out = Children::new();
        let Some(kind) = self.kind(idx) else {
            return out;
        };
        let mut one = |child: NodeIndex| {
            if child.is_some() {
                out.push(child);
            }
        };
        macro_rules! push {
            ($($item:expr),* $(,)?) => {{
                $( push_item(&mut one, $item); )*
            }};
        }
        match kind {
            NodeKind::CompilationUnit {
                directives,
                declarations,
            } => push!(directives, declarations),
            NodeKind::LibraryDirective { metadata, name } => push!(metadata, name),
            NodeKind::ImportDirective {
                metadata,
                uri,
                prefix,
                combinators,
                ..
            } => push!(metadata, *uri, *prefix, combinators),
            NodeKind::ExportDirective {
                metadata,
                uri,
                combinators,
            } => push!(metadata, *uri, combinators),
            NodeKind::PartDirective { metadata, uri } => push!(metadata, *uri),
            NodeKind::PartOfDirective {
                metadata,
                library_name,
            } => push!(metadata, library_name),
            NodeKind::Combinator { names, .. } => push!(names),
            NodeKind::Annotation {
                name,
                constructor_name,
                arguments,
            } => push!(*name, *constructor_name, *arguments),
            NodeKind::ClassDeclaration {
                metadata,
                name,
                type_parameters,
                extends,
                with,
                implements,
                members,
                ..
            } => push!(metadata, *name, type_parameters, *extends, with, implements, members),
            NodeKind::ClassTypeAlias {
                metadata,
                name,
                type_parameters,
                superclass,
                with,
                implements,
                ..
            } => push!(metadata, *name, type_parameters, *superclass, with, implements),
            NodeKind::FunctionTypeAlias {
                metadata,
                return_type,
                name,
                type_parameters,
                parameters,
            } => push!(metadata, *return_type, *name, type_parameters, *parameters),
            NodeKind::FunctionDeclaration {
                metadata,
                return_type,
                name,
                function,
                ..
            } => push!(metadata, *return_type, *name, *function),
            NodeKind::TopLevelVariableDeclaration {
                metadata,
                variables,
            } => push!(metadata, *variables),
            NodeKind::ConstructorDeclaration {
                metadata,
                return_type,
                name,
                parameters,
                initializers,
                redirected,
                body,
                ..
            } => push!(
                metadata,
                *return_type,
                *name,
                *parameters,
                initializers,
                *redirected,
                *body
            ),
            NodeKind::ConstructorFieldInitializer {
                field_name,
                expression,
                ..
            } => push!(*field_name, *expression),
            NodeKind::RedirectingConstructorInvocation {
                constructor_name,
                arguments,
            }
            | NodeKind::SuperConstructorInvocation {
                constructor_name,
                arguments,
            } => push!(*constructor_name, *arguments),
            NodeKind::ConstructorName { type_name, name } => push!(*type_name, *name),
            NodeKind::MethodDeclaration {
                metadata,
                return_type,
                name,
                parameters,
                body,
                ..
            } => push!(metadata, *return_type, *name, *parameters, *body),
            NodeKind::FieldDeclaration {
                metadata,
                variables,
                ..
            } => push!(metadata, *variables),
            NodeKind::VariableDeclarationList {
                type_name,
                variables,
                ..
            } => push!(*type_name, variables),
            NodeKind::VariableDeclaration { name, initializer } => push!(*name, *initializer),
            NodeKind::TypeName {
                name,
                type_arguments,
            } => push!(*name, type_arguments),
            NodeKind::TypeParameter { name, bound } => push!(*name, *bound),
            NodeKind::FormalParameterList { parameters } => push!(parameters),
            NodeKind::FormalParameter {
                metadata,
                type_name,
                name,
                parameters,
                default_value,
                ..
            } => push!(metadata, *type_name, *name, *parameters, *default_value),
            NodeKind::BlockFunctionBody { block } => push!(*block),
            NodeKind::ExpressionFunctionBody { expression } => push!(*expression),
            NodeKind::EmptyFunctionBody => {}
            NodeKind::Block { statements } => push!(statements),
            NodeKind::VariableDeclarationStatement { variables } => push!(*variables),
            NodeKind::ExpressionStatement { expression } => push!(*expression),
            NodeKind::IfStatement {
                condition,
                then_statement,
                else_statement,
            } => push!(*condition, *then_statement, *else_statement),
            NodeKind::WhileStatement { condition, body } => push!(*condition, *body),
            NodeKind::DoStatement { body, condition } => push!(*body, *condition),
            NodeKind::ForStatement {
                variables,
                initialization,
                condition,
                updaters,
                body,
            } => push!(*variables, *initialization, *condition, updaters, *body),
            NodeKind::ForEachStatement {
                loop_variable,
                identifier,
                iterable,
                body,
            } => push!(*loop_variable, *identifier, *iterable, *body),
            NodeKind::DeclaredIdentifier {
                type_name, name, ..
            } => push!(*type_name, *name),
            NodeKind::SwitchStatement {
                expression,
                members,
            } => push!(*expression, members),
            NodeKind::SwitchCase {
                labels,
                expression,
                statements,
            } => push!(labels, *expression, statements),
            NodeKind::SwitchDefault { labels, statements } => push!(labels, statements),
            NodeKind::TryStatement {
                body,
                catch_clauses,
                finally_block,
            } => push!(*body, catch_clauses, *finally_block),
            NodeKind::CatchClause {
                exception_type,
                exception_parameter,
                stack_trace_parameter,
                body,
            } => push!(
                *exception_type,
                *exception_parameter,
                *stack_trace_parameter,
                *body
            ),
            NodeKind::ReturnStatement { expression } => push!(*expression),
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } => {
                push!(*label)
            }
            NodeKind::LabeledStatement { labels, statement } => push!(labels, *statement),
            NodeKind::Label { label } => push!(*label),
            NodeKind::FunctionDeclarationStatement { declaration } => push!(*declaration),
            NodeKind::AssertStatement { condition } => push!(*condition),
            NodeKind::EmptyStatement => {}
            NodeKind::SimpleIdentifier { .. } => {}
            NodeKind::PrefixedIdentifier { prefix, identifier } => push!(*prefix, *identifier),
            NodeKind::PropertyAccess {
                target,
                property_name,
                ..
            } => push!(*target, *property_name),
            NodeKind::MethodInvocation {
                target,
                method_name,
                arguments,
                ..
            } => push!(*target, *method_name, *arguments),
            NodeKind::FunctionExpressionInvocation {
                function,
                arguments,
            } => push!(*function, *arguments),
            NodeKind::FunctionExpression { parameters, body } => push!(*parameters, *body),
            NodeKind::ArgumentList { arguments } => push!(arguments),
            NodeKind::NamedExpression { name, expression } => push!(*name, *expression),
            NodeKind::IndexExpression { target, index, .. } => push!(*target, *index),
            NodeKind::AssignmentExpression { left, right, .. }
            | NodeKind::BinaryExpression { left, right, .. } => push!(*left, *right),
            NodeKind::PrefixExpression { operand, .. }
            | NodeKind::PostfixExpression { operand, .. } => push!(*operand),
            NodeKind::ConditionalExpression {
                condition,
                then_expression,
                else_expression,
            } => push!(*condition, *then_expression, *else_expression),
            NodeKind::IsExpression {
                expression,
                type_name,
                ..
            }
            | NodeKind::AsExpression {
                expression,
                type_name,
            } => push!(*expression, *type_name),
            NodeKind::InstanceCreationExpression {
                constructor_name,
                arguments,
                ..
            } => push!(*constructor_name, *arguments),
            NodeKind::NullLiteral
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::IntegerLiteral { .. }
            | NodeKind::DoubleLiteral { .. }
            | NodeKind::SimpleStringLiteral { .. }
            | NodeKind::InterpolationString { .. }
            | NodeKind::SymbolLiteral { .. }
            | NodeKind::ThisExpression
            | NodeKind::SuperExpression
            | NodeKind::RethrowExpression => {}
            NodeKind::StringInterpolation { elements } => push!(elements),
            NodeKind::InterpolationExpression { expression } => push!(*expression),
            NodeKind::AdjacentStrings { strings } => push!(strings),
            NodeKind::ListLiteral {
                type_arguments,
                elements,
                ..
            } => push!(type_arguments, elements),
            NodeKind::MapLiteral {
                type_arguments,
                entries,
                ..
            } => push!(type_arguments, entries),
            NodeKind::MapLiteralEntry { key, value } => push!(*key, *value),
            NodeKind::ParenthesizedExpression { expression } => push!(*expression),
            NodeKind::CascadeExpression { target, sections } => push!(*target, sections),
            NodeKind::ThrowExpression { expression } => push!(*expression),
        }
        out
    }

    /// Fill in `parent` for every node reachable from `root`.
    pub fn link_parents(&mut self, root: NodeIndex) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            for child in self.children(idx) {
                if let Some(node) = self.get_mut(child) {
                    node.parent = idx;
                }
                stack.push(child);
            }
        }
    }

    /// Ancestors of `idx`, nearest first, excluding `idx` itself.
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = self.parent(idx);
        std::iter::from_fn(move || {
            let out = current.to_option()?;
            current = self.parent(out);
            Some(out)
        })
    }

    /// The nearest ancestor (or `idx` itself) satisfying `pred`.
    pub fn find_ancestor_or_self(
        &self,
        idx: NodeIndex,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> NodeIndex {
        let mut current = idx;
        while let Some(node) = self.get(current) {
            if pred(&node.kind) {
                return current;
            }
            current = node.parent;
        }
        NodeIndex::NONE
    }

    /// All nodes under `root` (inclusive) in pre-order.
    pub fn descendants(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if idx.is_none() {
                continue;
            }
            out.push(idx);
            let children = self.children(idx);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// True when `node` is `ancestor` or lies inside it.
    pub fn is_within(&self, node: NodeIndex, ancestor: NodeIndex) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// The innermost node under `root` whose range covers `[start, end)`.
    pub fn covering_node(&self, root: NodeIndex, start: u32, end: u32) -> NodeIndex {
        let Some(root_node) = self.get(root) else {
            return NodeIndex::NONE;
        };
        if !root_node.contains_range(start, end) {
            return NodeIndex::NONE;
        }
        let mut current = root;
        'descend: loop {
            for child in self.children(current) {
                if let Some(node) = self.get(child)
                    && node.contains_range(start, end)
                {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }
}

fn push_item<F: FnMut(NodeIndex)>(one: &mut F, item: impl ChildSlot) {
    item.visit(one);
}

trait ChildSlot {
    fn visit<F: FnMut(NodeIndex)>(self, one: &mut F);
}

impl ChildSlot for NodeIndex {
    fn visit<F: FnMut(NodeIndex)>(self, one: &mut F) {
        one(self);
    }
}

impl ChildSlot for &NodeList {
    fn visit<F: FnMut(NodeIndex)>(self, one: &mut F) {
        for idx in self.iter() {
            one(idx);
        }
    }
}

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod tests;
