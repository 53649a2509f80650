//! Node kinds.
//!
//! The tree is a closed tagged union: every node stores its kind-specific
//! data inline in [`NodeKind`], with children referenced by [`NodeIndex`].
//! Absent optional children are `NodeIndex::NONE`.

use crate::base::{NodeIndex, NodeList};

/// A node in the arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Start offset (inclusive).
    pub pos: u32,
    /// End offset (exclusive).
    pub end: u32,
    pub parent: NodeIndex,
}

impl Node {
    #[inline]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.pos)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.pos
    }

    #[inline]
    pub fn contains_range(&self, start: u32, end: u32) -> bool {
        self.pos <= start && end <= self.end
    }
}

/// Operator tokens that appear in expressions and operator declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    TildeSlash,
    Percent,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    BangEq,
    AmpAmp,
    BarBar,
    Amp,
    Bar,
    Caret,
    LtLt,
    GtGt,
    Bang,
    Tilde,
    PlusPlus,
    MinusMinus,
    Index,
    IndexEq,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    TildeSlashEq,
    PercentEq,
    AmpEq,
    BarEq,
    CaretEq,
    LtLtEq,
    GtGtEq,
}

impl Operator {
    pub fn lexeme(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::TildeSlash => "~/",
            Operator::Percent => "%",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::EqEq => "==",
            Operator::BangEq => "!=",
            Operator::AmpAmp => "&&",
            Operator::BarBar => "||",
            Operator::Amp => "&",
            Operator::Bar => "|",
            Operator::Caret => "^",
            Operator::LtLt => "<<",
            Operator::GtGt => ">>",
            Operator::Bang => "!",
            Operator::Tilde => "~",
            Operator::PlusPlus => "++",
            Operator::MinusMinus => "--",
            Operator::Index => "[]",
            Operator::IndexEq => "[]=",
            Operator::Eq => "=",
            Operator::PlusEq => "+=",
            Operator::MinusEq => "-=",
            Operator::StarEq => "*=",
            Operator::SlashEq => "/=",
            Operator::TildeSlashEq => "~/=",
            Operator::PercentEq => "%=",
            Operator::AmpEq => "&=",
            Operator::BarEq => "|=",
            Operator::CaretEq => "^=",
            Operator::LtLtEq => "<<=",
            Operator::GtGtEq => ">>=",
        }
    }

    /// The binary operator a compound assignment expands to (`+=` is `+`).
    pub fn compound_binary(self) -> Option<Operator> {
        Some(match self {
            Operator::PlusEq => Operator::Plus,
            Operator::MinusEq => Operator::Minus,
            Operator::StarEq => Operator::Star,
            Operator::SlashEq => Operator::Slash,
            Operator::TildeSlashEq => Operator::TildeSlash,
            Operator::PercentEq => Operator::Percent,
            Operator::AmpEq => Operator::Amp,
            Operator::BarEq => Operator::Bar,
            Operator::CaretEq => Operator::Caret,
            Operator::LtLtEq => Operator::LtLt,
            Operator::GtGtEq => Operator::GtGt,
            _ => return None,
        })
    }

    pub fn is_assignment(self) -> bool {
        self == Operator::Eq || self.compound_binary().is_some()
    }

    pub fn is_increment(self) -> bool {
        matches!(self, Operator::PlusPlus | Operator::MinusMinus)
    }

    /// `&&` and `||`, which are not user-definable.
    pub fn is_logical(self) -> bool {
        matches!(self, Operator::AmpAmp | Operator::BarBar)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Operator::EqEq | Operator::BangEq)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq
        )
    }

    /// Operators whose `int op int` result is refined to `int`.
    pub fn is_numeric_arithmetic(self) -> bool {
        matches!(
            self,
            Operator::Plus | Operator::Minus | Operator::Star | Operator::Percent
        )
    }
}

/// `var`, `final`, `const` or no keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum VarKeyword {
    #[default]
    None,
    Var,
    Final,
    Const,
}

impl VarKeyword {
    pub fn is_final(self) -> bool {
        self == VarKeyword::Final
    }

    pub fn is_const(self) -> bool {
        self == VarKeyword::Const
    }
}

/// Required, optional positional (`[...]`) or optional named (`{...}`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ParameterKind {
    #[default]
    Required,
    Positional,
    Named,
}

/// The syntactic form of a formal parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterShape {
    /// `T name`
    Simple,
    /// `this.name` (initializing formal)
    Field,
    /// `T name(params)`
    FunctionTyped,
}

/// Getter/setter marker on functions and methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PropertyKind {
    #[default]
    None,
    Get,
    Set,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Units and directives
    CompilationUnit {
        directives: NodeList,
        declarations: NodeList,
    },
    LibraryDirective {
        metadata: NodeList,
        name: NodeList,
    },
    ImportDirective {
        metadata: NodeList,
        uri: NodeIndex,
        deferred: bool,
        prefix: NodeIndex,
        combinators: NodeList,
    },
    ExportDirective {
        metadata: NodeList,
        uri: NodeIndex,
        combinators: NodeList,
    },
    PartDirective {
        metadata: NodeList,
        uri: NodeIndex,
    },
    PartOfDirective {
        metadata: NodeList,
        library_name: NodeList,
    },
    /// `show a, b` when `show` is true, otherwise `hide a, b`.
    Combinator {
        show: bool,
        names: NodeList,
    },
    Annotation {
        /// Simple or prefixed identifier.
        name: NodeIndex,
        /// Third segment of `@p.C.named(...)`.
        constructor_name: NodeIndex,
        arguments: NodeIndex,
    },

    // Declarations
    ClassDeclaration {
        metadata: NodeList,
        is_abstract: bool,
        name: NodeIndex,
        type_parameters: NodeList,
        extends: NodeIndex,
        with: NodeList,
        implements: NodeList,
        members: NodeList,
    },
    /// `class C = S with M implements I;`
    ClassTypeAlias {
        metadata: NodeList,
        is_abstract: bool,
        name: NodeIndex,
        type_parameters: NodeList,
        superclass: NodeIndex,
        with: NodeList,
        implements: NodeList,
    },
    /// `typedef R F(params);`
    FunctionTypeAlias {
        metadata: NodeList,
        return_type: NodeIndex,
        name: NodeIndex,
        type_parameters: NodeList,
        parameters: NodeIndex,
    },
    FunctionDeclaration {
        metadata: NodeList,
        is_external: bool,
        return_type: NodeIndex,
        property_kind: PropertyKind,
        name: NodeIndex,
        /// The `FunctionExpression` holding parameters and body.
        function: NodeIndex,
    },
    TopLevelVariableDeclaration {
        metadata: NodeList,
        variables: NodeIndex,
    },
    ConstructorDeclaration {
        metadata: NodeList,
        is_external: bool,
        is_const: bool,
        is_factory: bool,
        /// The class-name identifier before the optional `.name`.
        return_type: NodeIndex,
        name: NodeIndex,
        parameters: NodeIndex,
        initializers: NodeList,
        /// `ConstructorName` of a redirecting factory (`= D.named`).
        redirected: NodeIndex,
        body: NodeIndex,
    },
    ConstructorFieldInitializer {
        has_this: bool,
        field_name: NodeIndex,
        expression: NodeIndex,
    },
    RedirectingConstructorInvocation {
        constructor_name: NodeIndex,
        arguments: NodeIndex,
    },
    SuperConstructorInvocation {
        constructor_name: NodeIndex,
        arguments: NodeIndex,
    },
    /// `Type` or `Type.name` in instance creation and redirections.
    ConstructorName {
        type_name: NodeIndex,
        name: NodeIndex,
    },
    MethodDeclaration {
        metadata: NodeList,
        is_static: bool,
        is_external: bool,
        return_type: NodeIndex,
        property_kind: PropertyKind,
        is_operator: bool,
        name: NodeIndex,
        /// `NONE` for getters.
        parameters: NodeIndex,
        body: NodeIndex,
    },
    FieldDeclaration {
        metadata: NodeList,
        is_static: bool,
        variables: NodeIndex,
    },
    VariableDeclarationList {
        keyword: VarKeyword,
        type_name: NodeIndex,
        variables: NodeList,
    },
    VariableDeclaration {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    TypeName {
        /// Simple or prefixed identifier.
        name: NodeIndex,
        type_arguments: NodeList,
    },
    TypeParameter {
        name: NodeIndex,
        bound: NodeIndex,
    },
    FormalParameterList {
        parameters: NodeList,
    },
    FormalParameter {
        metadata: NodeList,
        kind: ParameterKind,
        shape: ParameterShape,
        keyword: VarKeyword,
        /// Declared type, or return type of a function-typed parameter.
        type_name: NodeIndex,
        name: NodeIndex,
        /// Nested `FormalParameterList` of function-typed parameters.
        parameters: NodeIndex,
        default_value: NodeIndex,
    },
    BlockFunctionBody {
        block: NodeIndex,
    },
    ExpressionFunctionBody {
        expression: NodeIndex,
    },
    EmptyFunctionBody,

    // Statements
    Block {
        statements: NodeList,
    },
    VariableDeclarationStatement {
        variables: NodeIndex,
    },
    ExpressionStatement {
        expression: NodeIndex,
    },
    IfStatement {
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    },
    WhileStatement {
        condition: NodeIndex,
        body: NodeIndex,
    },
    DoStatement {
        body: NodeIndex,
        condition: NodeIndex,
    },
    ForStatement {
        variables: NodeIndex,
        initialization: NodeIndex,
        condition: NodeIndex,
        updaters: NodeList,
        body: NodeIndex,
    },
    ForEachStatement {
        /// `DeclaredIdentifier`, or `NONE` when `identifier` is used.
        loop_variable: NodeIndex,
        identifier: NodeIndex,
        iterable: NodeIndex,
        body: NodeIndex,
    },
    DeclaredIdentifier {
        keyword: VarKeyword,
        type_name: NodeIndex,
        name: NodeIndex,
    },
    SwitchStatement {
        expression: NodeIndex,
        members: NodeList,
    },
    SwitchCase {
        labels: NodeList,
        expression: NodeIndex,
        statements: NodeList,
    },
    SwitchDefault {
        labels: NodeList,
        statements: NodeList,
    },
    TryStatement {
        body: NodeIndex,
        catch_clauses: NodeList,
        finally_block: NodeIndex,
    },
    CatchClause {
        exception_type: NodeIndex,
        exception_parameter: NodeIndex,
        stack_trace_parameter: NodeIndex,
        body: NodeIndex,
    },
    ReturnStatement {
        expression: NodeIndex,
    },
    BreakStatement {
        label: NodeIndex,
    },
    ContinueStatement {
        label: NodeIndex,
    },
    LabeledStatement {
        labels: NodeList,
        statement: NodeIndex,
    },
    Label {
        label: NodeIndex,
    },
    FunctionDeclarationStatement {
        declaration: NodeIndex,
    },
    AssertStatement {
        condition: NodeIndex,
    },
    EmptyStatement,

    // Expressions
    SimpleIdentifier {
        name: String,
    },
    PrefixedIdentifier {
        prefix: NodeIndex,
        identifier: NodeIndex,
    },
    /// `target.name`; `target` is `NONE` inside a cascade section.
    PropertyAccess {
        target: NodeIndex,
        is_cascaded: bool,
        property_name: NodeIndex,
    },
    MethodInvocation {
        target: NodeIndex,
        is_cascaded: bool,
        method_name: NodeIndex,
        arguments: NodeIndex,
    },
    FunctionExpressionInvocation {
        function: NodeIndex,
        arguments: NodeIndex,
    },
    FunctionExpression {
        parameters: NodeIndex,
        body: NodeIndex,
    },
    ArgumentList {
        arguments: NodeList,
    },
    NamedExpression {
        name: NodeIndex,
        expression: NodeIndex,
    },
    IndexExpression {
        target: NodeIndex,
        is_cascaded: bool,
        index: NodeIndex,
    },
    AssignmentExpression {
        operator: Operator,
        left: NodeIndex,
        right: NodeIndex,
    },
    BinaryExpression {
        operator: Operator,
        left: NodeIndex,
        right: NodeIndex,
    },
    PrefixExpression {
        operator: Operator,
        operand: NodeIndex,
    },
    PostfixExpression {
        operator: Operator,
        operand: NodeIndex,
    },
    ConditionalExpression {
        condition: NodeIndex,
        then_expression: NodeIndex,
        else_expression: NodeIndex,
    },
    IsExpression {
        expression: NodeIndex,
        negated: bool,
        type_name: NodeIndex,
    },
    AsExpression {
        expression: NodeIndex,
        type_name: NodeIndex,
    },
    InstanceCreationExpression {
        is_const: bool,
        constructor_name: NodeIndex,
        arguments: NodeIndex,
    },
    NullLiteral,
    BooleanLiteral {
        value: bool,
    },
    IntegerLiteral {
        value: i64,
    },
    /// Stored as written; the resolver never evaluates it.
    DoubleLiteral {
        lexeme: String,
    },
    SimpleStringLiteral {
        value: String,
    },
    StringInterpolation {
        elements: NodeList,
    },
    InterpolationString {
        value: String,
    },
    InterpolationExpression {
        expression: NodeIndex,
    },
    AdjacentStrings {
        strings: NodeList,
    },
    SymbolLiteral {
        components: Vec<String>,
    },
    ListLiteral {
        is_const: bool,
        type_arguments: NodeList,
        elements: NodeList,
    },
    MapLiteral {
        is_const: bool,
        type_arguments: NodeList,
        entries: NodeList,
    },
    MapLiteralEntry {
        key: NodeIndex,
        value: NodeIndex,
    },
    ThisExpression,
    SuperExpression,
    ParenthesizedExpression {
        expression: NodeIndex,
    },
    CascadeExpression {
        target: NodeIndex,
        sections: NodeList,
    },
    ThrowExpression {
        expression: NodeIndex,
    },
    RethrowExpression,
}

impl NodeKind {
    /// Short name of the variant, used in traces and mismatch reports.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit { .. } => "CompilationUnit",
            NodeKind::LibraryDirective { .. } => "LibraryDirective",
            NodeKind::ImportDirective { .. } => "ImportDirective",
            NodeKind::ExportDirective { .. } => "ExportDirective",
            NodeKind::PartDirective { .. } => "PartDirective",
            NodeKind::PartOfDirective { .. } => "PartOfDirective",
            NodeKind::Combinator { .. } => "Combinator",
            NodeKind::Annotation { .. } => "Annotation",
            NodeKind::ClassDeclaration { .. } => "ClassDeclaration",
            NodeKind::ClassTypeAlias { .. } => "ClassTypeAlias",
            NodeKind::FunctionTypeAlias { .. } => "FunctionTypeAlias",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::TopLevelVariableDeclaration { .. } => "TopLevelVariableDeclaration",
            NodeKind::ConstructorDeclaration { .. } => "ConstructorDeclaration",
            NodeKind::ConstructorFieldInitializer { .. } => "ConstructorFieldInitializer",
            NodeKind::RedirectingConstructorInvocation { .. } => {
                "RedirectingConstructorInvocation"
            }
            NodeKind::SuperConstructorInvocation { .. } => "SuperConstructorInvocation",
            NodeKind::ConstructorName { .. } => "ConstructorName",
            NodeKind::MethodDeclaration { .. } => "MethodDeclaration",
            NodeKind::FieldDeclaration { .. } => "FieldDeclaration",
            NodeKind::VariableDeclarationList { .. } => "VariableDeclarationList",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::TypeName { .. } => "TypeName",
            NodeKind::TypeParameter { .. } => "TypeParameter",
            NodeKind::FormalParameterList { .. } => "FormalParameterList",
            NodeKind::FormalParameter { .. } => "FormalParameter",
            NodeKind::BlockFunctionBody { .. } => "BlockFunctionBody",
            NodeKind::ExpressionFunctionBody { .. } => "ExpressionFunctionBody",
            NodeKind::EmptyFunctionBody => "EmptyFunctionBody",
            NodeKind::Block { .. } => "Block",
            NodeKind::VariableDeclarationStatement { .. } => "VariableDeclarationStatement",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoStatement { .. } => "DoStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::ForEachStatement { .. } => "ForEachStatement",
            NodeKind::DeclaredIdentifier { .. } => "DeclaredIdentifier",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::SwitchDefault { .. } => "SwitchDefault",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::BreakStatement { .. } => "BreakStatement",
            NodeKind::ContinueStatement { .. } => "ContinueStatement",
            NodeKind::LabeledStatement { .. } => "LabeledStatement",
            NodeKind::Label { .. } => "Label",
            NodeKind::FunctionDeclarationStatement { .. } => "FunctionDeclarationStatement",
            NodeKind::AssertStatement { .. } => "AssertStatement",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::SimpleIdentifier { .. } => "SimpleIdentifier",
            NodeKind::PrefixedIdentifier { .. } => "PrefixedIdentifier",
            NodeKind::PropertyAccess { .. } => "PropertyAccess",
            NodeKind::MethodInvocation { .. } => "MethodInvocation",
            NodeKind::FunctionExpressionInvocation { .. } => "FunctionExpressionInvocation",
            NodeKind::FunctionExpression { .. } => "FunctionExpression",
            NodeKind::ArgumentList { .. } => "ArgumentList",
            NodeKind::NamedExpression { .. } => "NamedExpression",
            NodeKind::IndexExpression { .. } => "IndexExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::PrefixExpression { .. } => "PrefixExpression",
            NodeKind::PostfixExpression { .. } => "PostfixExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::IsExpression { .. } => "IsExpression",
            NodeKind::AsExpression { .. } => "AsExpression",
            NodeKind::InstanceCreationExpression { .. } => "InstanceCreationExpression",
            NodeKind::NullLiteral => "NullLiteral",
            NodeKind::BooleanLiteral { .. } => "BooleanLiteral",
            NodeKind::IntegerLiteral { .. } => "IntegerLiteral",
            NodeKind::DoubleLiteral { .. } => "DoubleLiteral",
            NodeKind::SimpleStringLiteral { .. } => "SimpleStringLiteral",
            NodeKind::StringInterpolation { .. } => "StringInterpolation",
            NodeKind::InterpolationString { .. } => "InterpolationString",
            NodeKind::InterpolationExpression { .. } => "InterpolationExpression",
            NodeKind::AdjacentStrings { .. } => "AdjacentStrings",
            NodeKind::SymbolLiteral { .. } => "SymbolLiteral",
            NodeKind::ListLiteral { .. } => "ListLiteral",
            NodeKind::MapLiteral { .. } => "MapLiteral",
            NodeKind::MapLiteralEntry { .. } => "MapLiteralEntry",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::SuperExpression => "SuperExpression",
            NodeKind::ParenthesizedExpression { .. } => "ParenthesizedExpression",
            NodeKind::CascadeExpression { .. } => "CascadeExpression",
            NodeKind::ThrowExpression { .. } => "ThrowExpression",
            NodeKind::RethrowExpression => "RethrowExpression",
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::SimpleIdentifier { .. }
                | NodeKind::PrefixedIdentifier { .. }
                | NodeKind::PropertyAccess { .. }
                | NodeKind::MethodInvocation { .. }
                | NodeKind::FunctionExpressionInvocation { .. }
                | NodeKind::FunctionExpression { .. }
                | NodeKind::NamedExpression { .. }
                | NodeKind::IndexExpression { .. }
                | NodeKind::AssignmentExpression { .. }
                | NodeKind::BinaryExpression { .. }
                | NodeKind::PrefixExpression { .. }
                | NodeKind::PostfixExpression { .. }
                | NodeKind::ConditionalExpression { .. }
                | NodeKind::IsExpression { .. }
                | NodeKind::AsExpression { .. }
                | NodeKind::InstanceCreationExpression { .. }
                | NodeKind::NullLiteral
                | NodeKind::BooleanLiteral { .. }
                | NodeKind::IntegerLiteral { .. }
                | NodeKind::DoubleLiteral { .. }
                | NodeKind::SimpleStringLiteral { .. }
                | NodeKind::StringInterpolation { .. }
                | NodeKind::AdjacentStrings { .. }
                | NodeKind::SymbolLiteral { .. }
                | NodeKind::ListLiteral { .. }
                | NodeKind::MapLiteral { .. }
                | NodeKind::ThisExpression
                | NodeKind::SuperExpression
                | NodeKind::ParenthesizedExpression { .. }
                | NodeKind::CascadeExpression { .. }
                | NodeKind::ThrowExpression { .. }
                | NodeKind::RethrowExpression
        )
    }

    /// Declarations that can be re-resolved in isolation.
    pub fn is_resolution_root(&self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration { .. }
                | NodeKind::ClassTypeAlias { .. }
                | NodeKind::FunctionTypeAlias { .. }
                | NodeKind::ConstructorDeclaration { .. }
                | NodeKind::MethodDeclaration { .. }
                | NodeKind::FunctionDeclaration { .. }
        )
    }

    pub fn metadata(&self) -> Option<&NodeList> {
        match self {
            NodeKind::LibraryDirective { metadata, .. }
            | NodeKind::ImportDirective { metadata, .. }
            | NodeKind::ExportDirective { metadata, .. }
            | NodeKind::PartDirective { metadata, .. }
            | NodeKind::PartOfDirective { metadata, .. }
            | NodeKind::ClassDeclaration { metadata, .. }
            | NodeKind::ClassTypeAlias { metadata, .. }
            | NodeKind::FunctionTypeAlias { metadata, .. }
            | NodeKind::FunctionDeclaration { metadata, .. }
            | NodeKind::TopLevelVariableDeclaration { metadata, .. }
            | NodeKind::ConstructorDeclaration { metadata, .. }
            | NodeKind::MethodDeclaration { metadata, .. }
            | NodeKind::FieldDeclaration { metadata, .. }
            | NodeKind::FormalParameter { metadata, .. } => Some(metadata),
            _ => None,
        }
    }
}
