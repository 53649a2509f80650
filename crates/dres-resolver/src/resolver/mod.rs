//! Reference resolution and static type analysis.
//!
//! [`ResolverVisitor`] walks a unit once, bottom-up within each expression:
//! children are resolved first, then the node gets its static and
//! propagated elements and its static and propagated types. Declarations
//! push the lexical frames and the enclosing context their bodies need.
//!
//! Submodules:
//! - `state_declarations`: classes, members, annotations, constructor initializers
//! - `state_statements`: blocks, control flow, labels, flow of overrides
//! - `state_identifiers`: simple and prefixed identifiers, property access
//! - `state_invocations`: method, function and constructor invocations
//! - `state_operators`: binary, unary, assignment and index operators
//! - `state_types`: literals and the remaining expression kinds
//! - `arguments`: argument to parameter correspondence
//! - `promotion` / `overrides`: flow-sensitive variable types
//! - `union`: member lookup on union types

mod arguments;
mod overrides;
mod promotion;
mod state_declarations;
mod state_identifiers;
mod state_invocations;
mod state_operators;
mod state_statements;
mod state_types;
mod union;

pub use overrides::OverrideManager;
pub use promotion::PromotionManager;

use crate::inheritance::InheritanceManager;
use crate::lookup::diagnostic_at;
use crate::options::ResolverOptions;
use crate::oracle::{ConstantOracle, DeclaredConstantOracle};
use crate::unit::ResolutionUnit;
use dres_binder::{LabelScope, Scope, ScopeKind, ScopeStack, UnitAnnotations};
use dres_common::limits::MAX_EXPRESSION_DEPTH;
use dres_common::DiagnosticSink;
use dres_element::{ElementId, ElementModel, TypeId, TypeProvider, TypeSystem, display_type};
use dres_syntax::{NodeIndex, NodeKind};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

static DECLARED_CONSTANTS: DeclaredConstantOracle = DeclaredConstantOracle;

/// What encloses the node being visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnclosingContext {
    pub class: ElementId,
    pub executable: ElementId,
    /// Parameter whose default value is being resolved.
    pub parameter: ElementId,
    pub function_type_alias: ElementId,
    /// Inside a static member or a static field initializer.
    pub is_static: bool,
    pub is_factory: bool,
    /// Inside the initializer list of a constructor.
    pub in_initializer: bool,
}

impl EnclosingContext {
    /// `super` and `this` are valid here.
    pub fn is_instance_context(&self) -> bool {
        self.class.is_some() && !self.is_static && !self.is_factory
    }
}

pub struct ResolverVisitor<'a> {
    pub(crate) model: &'a mut ElementModel,
    pub(crate) provider: &'a TypeProvider,
    pub(crate) unit: ResolutionUnit<'a>,
    pub(crate) annotations: &'a mut UnitAnnotations,
    pub(crate) sink: &'a mut dyn DiagnosticSink,
    pub(crate) inheritance: &'a InheritanceManager,
    pub(crate) options: &'a ResolverOptions,
    pub(crate) oracle: &'a dyn ConstantOracle,
    pub(crate) scopes: ScopeStack,
    pub(crate) labels: LabelScope,
    pub(crate) context: EnclosingContext,
    pub(crate) promotion: PromotionManager,
    pub(crate) overrides: OverrideManager,
    /// Targets of the cascades being visited, innermost last.
    pub(crate) cascade_targets: Vec<NodeIndex>,
    /// Synthetic members merged from the members of a union type.
    pub(crate) merged_members: FxHashMap<(TypeId, String), ElementId>,
    depth: usize,
}

impl<'a> ResolverVisitor<'a> {
    pub fn new(
        model: &'a mut ElementModel,
        provider: &'a TypeProvider,
        unit: ResolutionUnit<'a>,
        annotations: &'a mut UnitAnnotations,
        sink: &'a mut dyn DiagnosticSink,
        inheritance: &'a InheritanceManager,
        options: &'a ResolverOptions,
    ) -> Self {
        Self {
            model,
            provider,
            unit,
            annotations,
            sink,
            inheritance,
            options,
            oracle: &DECLARED_CONSTANTS,
            scopes: ScopeStack::new(),
            labels: LabelScope::new(),
            context: EnclosingContext::default(),
            promotion: PromotionManager::new(),
            overrides: OverrideManager::new(),
            cascade_targets: Vec::new(),
            merged_members: FxHashMap::default(),
            depth: 0,
        }
    }

    pub fn with_oracle(mut self, oracle: &'a dyn ConstantOracle) -> Self {
        self.oracle = oracle;
        self
    }

    #[tracing::instrument(level = "debug", skip(self), fields(source = %self.unit.source))]
    pub fn resolve_unit(&mut self) {
        for decl in self.unit.declarations() {
            self.visit(decl);
        }
        debug!(
            resolved = self.annotations.resolved_node_count(),
            "unit resolved"
        );
    }

    /// Resolve the declaration at `root` in isolation; `frames` are the
    /// lexical frames of its enclosing declarations, outermost first.
    #[tracing::instrument(level = "debug", skip(self, frames), fields(root = root.0))]
    pub fn resolve_subtree(&mut self, root: NodeIndex, frames: Vec<Scope>) {
        let depth = self.scopes.depth();
        let mut context = EnclosingContext::default();
        for frame in frames {
            match frame.kind {
                ScopeKind::Class => context.class = frame.owner,
                ScopeKind::Function => context.executable = frame.owner,
                ScopeKind::FunctionType => context.function_type_alias = frame.owner,
                _ => {}
            }
            self.scopes.push(frame);
        }
        self.with_context(context, |this| this.visit(root));
        self.scopes.truncate(depth);
    }

    /// Run `f` with `context` as the enclosing context, restoring the
    /// current one afterwards.
    pub(crate) fn with_context<R>(
        &mut self,
        context: EnclosingContext,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = std::mem::replace(&mut self.context, context);
        let result = f(self);
        self.context = saved;
        result
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub(crate) fn visit(&mut self, node: NodeIndex) {
        if node.is_none() {
            return;
        }
        if self.depth >= MAX_EXPRESSION_DEPTH {
            trace!(node = node.0, "nesting limit reached");
            return;
        }
        self.depth += 1;
        self.dispatch(node);
        self.depth -= 1;
    }

    fn dispatch(&mut self, node: NodeIndex) {
        let arena = self.unit.arena;
        let Some(kind) = arena.kind(node) else {
            return;
        };
        match kind {
            NodeKind::CompilationUnit { declarations, .. } => {
                for decl in declarations.iter() {
                    self.visit(decl);
                }
            }
            NodeKind::ClassDeclaration { .. } | NodeKind::ClassTypeAlias { .. } => {
                self.visit_class(node)
            }
            NodeKind::FunctionTypeAlias { .. } => self.visit_function_type_alias(node),
            NodeKind::FunctionDeclaration { .. } => self.visit_function_declaration(node),
            NodeKind::MethodDeclaration { .. } => self.visit_method(node),
            NodeKind::ConstructorDeclaration { .. } => self.visit_constructor(node),
            NodeKind::FieldDeclaration { .. } | NodeKind::TopLevelVariableDeclaration { .. } => {
                self.visit_variable_declaration(node)
            }
            NodeKind::VariableDeclarationList { variables, .. } => {
                for decl in variables.iter() {
                    self.visit(decl);
                }
            }
            NodeKind::VariableDeclaration { .. } => self.visit_variable(node),
            NodeKind::FormalParameterList { parameters } => {
                for param in parameters.iter() {
                    self.visit(param);
                }
            }
            NodeKind::FormalParameter { .. } => self.visit_formal_parameter(node),
            NodeKind::Annotation { .. } => self.visit_annotation(node),
            NodeKind::ConstructorFieldInitializer { .. } => self.visit_field_initializer(node),
            NodeKind::SuperConstructorInvocation { .. }
            | NodeKind::RedirectingConstructorInvocation { .. } => {
                self.visit_constructor_invocation(node)
            }

            // Resolved by the type pass.
            NodeKind::TypeName { .. } | NodeKind::TypeParameter { .. } => {}

            NodeKind::BlockFunctionBody { block } => self.visit(*block),
            NodeKind::ExpressionFunctionBody { expression } => self.visit(*expression),
            NodeKind::EmptyFunctionBody | NodeKind::EmptyStatement => {}
            NodeKind::Block { .. } => self.visit_block(node),
            NodeKind::VariableDeclarationStatement { variables } => self.visit(*variables),
            NodeKind::ExpressionStatement { expression } => self.visit(*expression),
            NodeKind::IfStatement { .. } => self.visit_if(node),
            NodeKind::WhileStatement { .. }
            | NodeKind::DoStatement { .. }
            | NodeKind::ForStatement { .. } => self.visit_loop(node),
            NodeKind::ForEachStatement { .. } => self.visit_for_each(node),
            NodeKind::DeclaredIdentifier { .. } => self.visit_declared_identifier(node),
            NodeKind::SwitchStatement { .. } => self.visit_switch(node),
            NodeKind::SwitchCase { .. } | NodeKind::SwitchDefault { .. } => {
                self.visit_switch_member(node)
            }
            NodeKind::TryStatement { .. } => self.visit_try(node),
            NodeKind::CatchClause { .. } => self.visit_catch(node),
            NodeKind::ReturnStatement { expression } => self.visit(*expression),
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } => {
                self.visit_jump(node, *label)
            }
            NodeKind::LabeledStatement { .. } => self.visit_labeled_statement(node),
            NodeKind::FunctionDeclarationStatement { declaration } => {
                self.define_local(*declaration);
                self.visit(*declaration);
            }
            NodeKind::AssertStatement { condition } => self.visit(*condition),

            NodeKind::SimpleIdentifier { .. } => self.visit_simple_identifier(node),
            NodeKind::PrefixedIdentifier { .. } => self.visit_prefixed_identifier(node),
            NodeKind::PropertyAccess { .. } => self.visit_property_access(node),
            NodeKind::MethodInvocation { .. } => self.visit_method_invocation(node),
            NodeKind::FunctionExpressionInvocation { .. } => {
                self.visit_function_expression_invocation(node)
            }
            NodeKind::InstanceCreationExpression { .. } => self.visit_instance_creation(node),
            NodeKind::FunctionExpression { .. } => self.visit_function_expression(node),
            NodeKind::AssignmentExpression { .. } => self.visit_assignment(node),
            NodeKind::BinaryExpression { .. } => self.visit_binary(node),
            NodeKind::PrefixExpression { .. } => self.visit_prefix(node),
            NodeKind::PostfixExpression { .. } => self.visit_postfix(node),
            NodeKind::IndexExpression { .. } => self.visit_index(node),
            NodeKind::ConditionalExpression { .. } => self.visit_conditional(node),
            NodeKind::IsExpression { .. } => self.visit_is(node),
            NodeKind::AsExpression { .. } => self.visit_as(node),
            NodeKind::NamedExpression { expression, .. } => {
                self.visit(*expression);
                self.copy_types(*expression, node);
            }
            NodeKind::ParenthesizedExpression { expression } => {
                self.visit(*expression);
                self.copy_types(*expression, node);
            }
            NodeKind::CascadeExpression { .. } => self.visit_cascade(node),
            NodeKind::ThrowExpression { expression } => {
                self.visit(*expression);
                self.record_static(node, TypeId::BOTTOM);
            }
            NodeKind::RethrowExpression => self.record_static(node, TypeId::BOTTOM),
            NodeKind::ThisExpression => self.visit_this(node),
            NodeKind::SuperExpression => self.visit_super(node),
            NodeKind::ListLiteral { .. } => self.visit_list_literal(node),
            NodeKind::MapLiteral { .. } => self.visit_map_literal(node),
            NodeKind::MapLiteralEntry { key, value } => {
                self.visit(*key);
                self.visit(*value);
            }
            NodeKind::NullLiteral
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::IntegerLiteral { .. }
            | NodeKind::DoubleLiteral { .. }
            | NodeKind::SimpleStringLiteral { .. }
            | NodeKind::StringInterpolation { .. }
            | NodeKind::AdjacentStrings { .. }
            | NodeKind::SymbolLiteral { .. } => self.visit_literal(node),
            NodeKind::InterpolationExpression { expression } => self.visit(*expression),
            NodeKind::InterpolationString { .. } => {}

            NodeKind::ArgumentList { arguments } => {
                for argument in arguments.iter() {
                    self.visit(argument);
                }
            }

            // Bound by their parents, or carrying nothing to bind.
            NodeKind::LibraryDirective { .. }
            | NodeKind::ImportDirective { .. }
            | NodeKind::ExportDirective { .. }
            | NodeKind::PartDirective { .. }
            | NodeKind::PartOfDirective { .. }
            | NodeKind::Combinator { .. }
            | NodeKind::ConstructorName { .. }
            | NodeKind::Label { .. } => {}
        }
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    pub(crate) fn ts(&self) -> TypeSystem<'_> {
        TypeSystem::new(self.model, self.provider).with_strict_unions(self.options.strict_union_types)
    }

    pub(crate) fn report(&mut self, node: NodeIndex, code: u32, args: Vec<String>) {
        self.sink
            .report(diagnostic_at(self.unit.source, self.unit.arena, node, code, args));
    }

    pub(crate) fn display(&self, ty: TypeId) -> String {
        display_type(self.model, ty)
    }

    pub(crate) fn static_type(&self, node: NodeIndex) -> TypeId {
        self.annotations.static_type(node).unwrap_or(TypeId::DYNAMIC)
    }

    pub(crate) fn propagated_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.annotations.propagated_type(node)
    }

    /// Propagated type when present, else the static type.
    pub(crate) fn best_type(&self, node: NodeIndex) -> TypeId {
        self.propagated_type(node)
            .unwrap_or_else(|| self.static_type(node))
    }

    pub(crate) fn record_static(&mut self, node: NodeIndex, ty: TypeId) {
        self.annotations.set_static_type(node, ty);
    }

    /// Record `ty` as the propagated type of `node` when it is a strict
    /// refinement of the static type.
    pub(crate) fn record_propagated(&mut self, node: NodeIndex, ty: TypeId) {
        let static_type = self.static_type(node);
        if ty.is_dynamic() || ty == static_type {
            return;
        }
        if self.ts().is_more_specific(ty, static_type) {
            self.annotations.set_propagated_type(node, Some(ty));
        }
    }

    pub(crate) fn copy_types(&mut self, from: NodeIndex, to: NodeIndex) {
        let static_type = self.static_type(from);
        self.record_static(to, static_type);
        if let Some(ty) = self.propagated_type(from) {
            self.record_propagated(to, ty);
        }
    }

    pub(crate) fn identifier_text(&self, node: NodeIndex) -> String {
        self.unit
            .arena
            .identifier_name(node)
            .unwrap_or_default()
            .to_string()
    }
}
