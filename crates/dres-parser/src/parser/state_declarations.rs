//! Parser state - units, directives, declarations and parameters.

use super::state::ParserState;
use crate::ParseError;
use crate::scanner::TokenKind;
use dres_syntax::{
    NodeIndex, NodeKind, NodeList, Operator, ParameterKind, ParameterShape, PropertyKind,
    VarKeyword,
};

impl ParserState {
    // =========================================================================
    // Compilation unit and directives
    // =========================================================================

    pub fn parse_compilation_unit(&mut self) -> Result<NodeIndex, ParseError> {
        let start = 0;
        let mut directives = Vec::new();
        let mut declarations = Vec::new();
        while !self.at(&TokenKind::Eof) {
            let metadata = self.parse_metadata()?;
            if declarations.is_empty() && self.at_directive() {
                directives.push(self.parse_directive(metadata)?);
            } else {
                declarations.push(self.parse_top_level_declaration(metadata)?);
            }
        }
        let end = self.last_end;
        Ok(self.arena.add(
            NodeKind::CompilationUnit {
                directives: Self::list(directives),
                declarations: Self::list(declarations),
            },
            start,
            end,
        ))
    }

    fn at_directive(&self) -> bool {
        let next_is_string = matches!(self.peek_at(1), TokenKind::Str(_));
        match self.peek().identifier() {
            Some("library") => self.identifier_at(1),
            Some("import") | Some("export") => next_is_string,
            Some("part") => next_is_string || self.keyword_at(1, "of"),
            _ => false,
        }
    }

    fn parse_directive(&mut self, metadata: NodeList) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let keyword = self.peek().identifier().unwrap_or_default().to_string();
        self.advance();
        let kind = match keyword.as_str() {
            "library" => {
                let name = self.parse_dotted_name()?;
                NodeKind::LibraryDirective { metadata, name }
            }
            "import" => {
                let uri = self.parse_string_literal()?;
                let deferred = self.eat_keyword("deferred");
                let prefix = if self.eat_keyword("as") {
                    self.parse_simple_identifier()?
                } else {
                    NodeIndex::NONE
                };
                let combinators = self.parse_combinators()?;
                NodeKind::ImportDirective {
                    metadata,
                    uri,
                    deferred,
                    prefix,
                    combinators,
                }
            }
            "export" => {
                let uri = self.parse_string_literal()?;
                let combinators = self.parse_combinators()?;
                NodeKind::ExportDirective {
                    metadata,
                    uri,
                    combinators,
                }
            }
            _ => {
                if self.eat_keyword("of") {
                    let library_name = self.parse_dotted_name()?;
                    NodeKind::PartOfDirective {
                        metadata,
                        library_name,
                    }
                } else {
                    let uri = self.parse_string_literal()?;
                    NodeKind::PartDirective { metadata, uri }
                }
            }
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.finish(kind, start))
    }

    fn parse_dotted_name(&mut self) -> Result<NodeList, ParseError> {
        let mut parts = vec![self.parse_simple_identifier()?];
        while self.eat(&TokenKind::Dot) {
            parts.push(self.parse_simple_identifier()?);
        }
        Ok(Self::list(parts))
    }

    fn parse_combinators(&mut self) -> Result<NodeList, ParseError> {
        let mut combinators = Vec::new();
        while self.at_keyword("show") || self.at_keyword("hide") {
            let start = self.token_pos();
            let show = self.at_keyword("show");
            self.advance();
            let mut names = vec![self.parse_simple_identifier()?];
            while self.eat(&TokenKind::Comma) {
                names.push(self.parse_simple_identifier()?);
            }
            combinators.push(self.finish(
                NodeKind::Combinator {
                    show,
                    names: Self::list(names),
                },
                start,
            ));
        }
        Ok(Self::list(combinators))
    }

    /// `@name`, `@p.name`, `@p.C.named`, each optionally with arguments.
    pub(crate) fn parse_metadata(&mut self) -> Result<NodeList, ParseError> {
        let mut annotations = Vec::new();
        while self.at(&TokenKind::At) {
            let start = self.token_pos();
            self.advance();
            let name = self.parse_qualified_identifier()?;
            let constructor_name = if self.at(&TokenKind::Dot) {
                self.advance();
                self.parse_simple_identifier()?
            } else {
                NodeIndex::NONE
            };
            let arguments = if self.at(&TokenKind::LParen) {
                self.parse_argument_list()?
            } else {
                NodeIndex::NONE
            };
            annotations.push(self.finish(
                NodeKind::Annotation {
                    name,
                    constructor_name,
                    arguments,
                },
                start,
            ));
        }
        Ok(Self::list(annotations))
    }

    // =========================================================================
    // Top-level declarations
    // =========================================================================

    fn parse_top_level_declaration(&mut self, metadata: NodeList) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        if self.at_keyword("class") || (self.at_keyword("abstract") && self.keyword_at(1, "class"))
        {
            return self.parse_class_or_alias(metadata, start);
        }
        if self.at_keyword("typedef") {
            return self.parse_function_type_alias(metadata, start);
        }
        let is_external = self.eat_keyword("external");
        if matches!(
            self.peek().identifier(),
            Some("var") | Some("final") | Some("const")
        ) {
            let variables = self.parse_variable_declaration_list()?;
            self.expect(&TokenKind::Semicolon, "';'")?;
            return Ok(self.finish(
                NodeKind::TopLevelVariableDeclaration {
                    metadata,
                    variables,
                },
                start,
            ));
        }
        let return_type = self.parse_optional_return_type()?;
        let property_kind = self.parse_property_kind();
        let name = self.parse_simple_identifier()?;
        if property_kind != PropertyKind::None || self.at(&TokenKind::LParen) {
            let fn_start = self.token_pos();
            let parameters = if property_kind == PropertyKind::Get {
                NodeIndex::NONE
            } else {
                self.parse_formal_parameter_list()?
            };
            let body = self.parse_function_body(true)?;
            let function = self.finish(NodeKind::FunctionExpression { parameters, body }, fn_start);
            return Ok(self.finish(
                NodeKind::FunctionDeclaration {
                    metadata,
                    is_external,
                    return_type,
                    property_kind,
                    name,
                    function,
                },
                start,
            ));
        }
        let variables = self.parse_variables_after_name(VarKeyword::None, return_type, start, name)?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.finish(
            NodeKind::TopLevelVariableDeclaration {
                metadata,
                variables,
            },
            start,
        ))
    }

    /// A return type, when one is present before the declared name.
    pub(crate) fn parse_optional_return_type(&mut self) -> Result<NodeIndex, ParseError> {
        if self.at_keyword("void") {
            return self.parse_type_name();
        }
        let is_accessor_name = (self.at_keyword("get") || self.at_keyword("set"))
            && self.identifier_at(1)
            && !matches!(self.peek_at(2), TokenKind::Op(Operator::Lt));
        if is_accessor_name && !self.looks_like_type_then_accessor() {
            return Ok(NodeIndex::NONE);
        }
        if self.looks_like_typed_name() {
            return self.parse_type_name();
        }
        Ok(NodeIndex::NONE)
    }

    // `get get => ...` style edge cases: a type named `get` followed by `get`.
    fn looks_like_type_then_accessor(&mut self) -> bool {
        self.looks_like(|p| {
            p.parse_type_name()?;
            if (p.at_keyword("get") || p.at_keyword("set")) && p.identifier_at(1) {
                Ok(())
            } else {
                Err(p.error("no accessor"))
            }
        })
    }

    pub(crate) fn parse_property_kind(&mut self) -> PropertyKind {
        if self.at_keyword("get") && self.identifier_at(1) {
            self.advance();
            PropertyKind::Get
        } else if self.at_keyword("set") && self.identifier_at(1) {
            self.advance();
            PropertyKind::Set
        } else {
            PropertyKind::None
        }
    }

    fn parse_class_or_alias(&mut self, metadata: NodeList, start: u32) -> Result<NodeIndex, ParseError> {
        let is_abstract = self.eat_keyword("abstract");
        self.expect_keyword("class")?;
        let name = self.parse_simple_identifier()?;
        let type_parameters = self.parse_optional_type_parameters()?;

        if self.eat_op(Operator::Eq) {
            let superclass = self.parse_type_name()?;
            self.expect_keyword("with")?;
            let with = self.parse_type_name_list()?;
            let implements = if self.eat_keyword("implements") {
                self.parse_type_name_list()?
            } else {
                NodeList::new()
            };
            self.expect(&TokenKind::Semicolon, "';'")?;
            return Ok(self.finish(
                NodeKind::ClassTypeAlias {
                    metadata,
                    is_abstract,
                    name,
                    type_parameters,
                    superclass,
                    with,
                    implements,
                },
                start,
            ));
        }

        let extends = if self.eat_keyword("extends") {
            self.parse_type_name()?
        } else {
            NodeIndex::NONE
        };
        let with = if self.eat_keyword("with") {
            self.parse_type_name_list()?
        } else {
            NodeList::new()
        };
        let implements = if self.eat_keyword("implements") {
            self.parse_type_name_list()?
        } else {
            NodeList::new()
        };
        self.expect(&TokenKind::LBrace, "'{'")?;
        let class_name = self.arena.identifier_name(name).unwrap_or_default().to_string();
        let mut members = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.error("unterminated class body"));
            }
            members.push(self.parse_class_member(&class_name)?);
        }
        self.advance();
        Ok(self.finish(
            NodeKind::ClassDeclaration {
                metadata,
                is_abstract,
                name,
                type_parameters,
                extends,
                with,
                implements,
                members: Self::list(members),
            },
            start,
        ))
    }

    fn parse_type_name_list(&mut self) -> Result<NodeList, ParseError> {
        let mut types = vec![self.parse_type_name()?];
        while self.eat(&TokenKind::Comma) {
            types.push(self.parse_type_name()?);
        }
        Ok(Self::list(types))
    }

    fn parse_function_type_alias(&mut self, metadata: NodeList, start: u32) -> Result<NodeIndex, ParseError> {
        self.expect_keyword("typedef")?;
        let return_type = if self.identifier_at(1) || self.at_keyword("void") {
            self.parse_type_name()?
        } else if self.at_identifier() && matches!(self.peek_at(1), TokenKind::Op(Operator::Lt)) {
            // `typedef List<T> F<T>()` has a generic return type before the name.
            let candidate = self.try_parse(|p| {
                let ty = p.parse_type_name()?;
                if p.at_identifier() { Ok(ty) } else { Err(p.error("no name")) }
            });
            candidate.unwrap_or(NodeIndex::NONE)
        } else {
            NodeIndex::NONE
        };
        let name = self.parse_simple_identifier()?;
        let type_parameters = self.parse_optional_type_parameters()?;
        let parameters = self.parse_formal_parameter_list()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.finish(
            NodeKind::FunctionTypeAlias {
                metadata,
                return_type,
                name,
                type_parameters,
                parameters,
            },
            start,
        ))
    }

    // =========================================================================
    // Class members
    // =========================================================================

    fn parse_class_member(&mut self, class_name: &str) -> Result<NodeIndex, ParseError> {
        let metadata = self.parse_metadata()?;
        let start = self.token_pos();
        let is_external = self.eat_keyword("external");
        let is_static = self.eat_keyword("static");

        if self.at_constructor_start(class_name) {
            return self.parse_constructor(metadata, start, is_external);
        }

        if matches!(
            self.peek().identifier(),
            Some("var") | Some("final") | Some("const")
        ) {
            let variables = self.parse_variable_declaration_list()?;
            self.expect(&TokenKind::Semicolon, "';'")?;
            return Ok(self.finish(
                NodeKind::FieldDeclaration {
                    metadata,
                    is_static,
                    variables,
                },
                start,
            ));
        }

        let return_type = if self.at_keyword("operator") && !self.identifier_at(1) {
            NodeIndex::NONE
        } else {
            self.parse_optional_return_type()?
        };

        if self.at_keyword("operator") && !self.identifier_at(1) {
            self.advance();
            let name = self.parse_operator_name()?;
            let parameters = self.parse_formal_parameter_list()?;
            let body = self.parse_function_body(true)?;
            return Ok(self.finish(
                NodeKind::MethodDeclaration {
                    metadata,
                    is_static,
                    is_external,
                    return_type,
                    property_kind: PropertyKind::None,
                    is_operator: true,
                    name,
                    parameters,
                    body,
                },
                start,
            ));
        }

        let property_kind = self.parse_property_kind();
        let name = self.parse_simple_identifier()?;
        if property_kind != PropertyKind::None || self.at(&TokenKind::LParen) {
            let parameters = if property_kind == PropertyKind::Get {
                NodeIndex::NONE
            } else {
                self.parse_formal_parameter_list()?
            };
            let body = self.parse_function_body(true)?;
            return Ok(self.finish(
                NodeKind::MethodDeclaration {
                    metadata,
                    is_static,
                    is_external,
                    return_type,
                    property_kind,
                    is_operator: false,
                    name,
                    parameters,
                    body,
                },
                start,
            ));
        }

        let variables = self.parse_variables_after_name(VarKeyword::None, return_type, start, name)?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.finish(
            NodeKind::FieldDeclaration {
                metadata,
                is_static,
                variables,
            },
            start,
        ))
    }

    fn at_constructor_start(&self, class_name: &str) -> bool {
        if self.at_keyword("factory") {
            return true;
        }
        let offset = usize::from(self.at_keyword("const"));
        if !self.keyword_at(offset, class_name) {
            return false;
        }
        match self.peek_at(offset + 1) {
            TokenKind::LParen => true,
            TokenKind::Dot => {
                self.identifier_at(offset + 2)
                    && matches!(self.peek_at(offset + 3), TokenKind::LParen)
            }
            _ => false,
        }
    }

    fn parse_operator_name(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let name = match self.peek().clone() {
            TokenKind::LBracket => {
                self.advance();
                self.expect(&TokenKind::RBracket, "']'")?;
                if self.eat_op(Operator::Eq) {
                    Operator::IndexEq.lexeme()
                } else {
                    Operator::Index.lexeme()
                }
            }
            TokenKind::Op(op)
                if !op.is_assignment() && !op.is_logical() && op != Operator::BangEq =>
            {
                self.advance();
                op.lexeme()
            }
            _ => return Err(self.error("expected operator")),
        };
        Ok(self.finish(
            NodeKind::SimpleIdentifier {
                name: name.to_string(),
            },
            start,
        ))
    }

    fn parse_constructor(
        &mut self,
        metadata: NodeList,
        start: u32,
        is_external: bool,
    ) -> Result<NodeIndex, ParseError> {
        let is_factory = self.eat_keyword("factory");
        let is_const = self.eat_keyword("const");
        let return_type = self.parse_simple_identifier()?;
        let name = if self.eat(&TokenKind::Dot) {
            self.parse_simple_identifier()?
        } else {
            NodeIndex::NONE
        };
        let parameters = self.parse_formal_parameter_list()?;

        let mut initializers = Vec::new();
        let mut redirected = NodeIndex::NONE;
        if is_factory && self.eat_op(Operator::Eq) {
            redirected = self.parse_constructor_name()?;
        } else if self.eat(&TokenKind::Colon) {
            loop {
                initializers.push(self.parse_constructor_initializer()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let body = if redirected.is_some() {
            self.expect(&TokenKind::Semicolon, "';'")?;
            self.finish(NodeKind::EmptyFunctionBody, self.last_end)
        } else {
            self.parse_function_body(true)?
        };
        Ok(self.finish(
            NodeKind::ConstructorDeclaration {
                metadata,
                is_external,
                is_const,
                is_factory,
                return_type,
                name,
                parameters,
                initializers: Self::list(initializers),
                redirected,
                body,
            },
            start,
        ))
    }

    fn parse_constructor_initializer(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        if self.at_keyword("super") {
            self.advance();
            let constructor_name = if self.eat(&TokenKind::Dot) {
                self.parse_simple_identifier()?
            } else {
                NodeIndex::NONE
            };
            let arguments = self.parse_argument_list()?;
            return Ok(self.finish(
                NodeKind::SuperConstructorInvocation {
                    constructor_name,
                    arguments,
                },
                start,
            ));
        }
        if self.at_keyword("this") {
            let is_redirect = matches!(self.peek_at(1), TokenKind::LParen)
                || (matches!(self.peek_at(1), TokenKind::Dot)
                    && matches!(self.peek_at(3), TokenKind::LParen));
            if is_redirect {
                self.advance();
                let constructor_name = if self.eat(&TokenKind::Dot) {
                    self.parse_simple_identifier()?
                } else {
                    NodeIndex::NONE
                };
                let arguments = self.parse_argument_list()?;
                return Ok(self.finish(
                    NodeKind::RedirectingConstructorInvocation {
                        constructor_name,
                        arguments,
                    },
                    start,
                ));
            }
            self.advance();
            self.expect(&TokenKind::Dot, "'.'")?;
            let field_name = self.parse_simple_identifier()?;
            self.expect(&TokenKind::Op(Operator::Eq), "'='")?;
            let expression = self.parse_conditional_expression()?;
            return Ok(self.finish(
                NodeKind::ConstructorFieldInitializer {
                    has_this: true,
                    field_name,
                    expression,
                },
                start,
            ));
        }
        let field_name = self.parse_simple_identifier()?;
        self.expect(&TokenKind::Op(Operator::Eq), "'='")?;
        let expression = self.parse_conditional_expression()?;
        Ok(self.finish(
            NodeKind::ConstructorFieldInitializer {
                has_this: false,
                field_name,
                expression,
            },
            start,
        ))
    }

    /// `C`, `C.named`, `p.C`, `C<T>.named`, `p.C<T>.named`.
    ///
    /// `a.b` without type arguments is kept as a prefixed type name; the
    /// resolver decides whether `a` is a prefix or a class.
    pub(crate) fn parse_constructor_name(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let type_name = self.parse_type_name()?;
        let name = if self.at(&TokenKind::Dot) && self.identifier_at(1) {
            self.advance();
            self.parse_simple_identifier()?
        } else {
            NodeIndex::NONE
        };
        Ok(self.finish(NodeKind::ConstructorName { type_name, name }, start))
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// `(var|final|const) [Type] a [= e], b [= e]` or `Type a, b`.
    pub(crate) fn parse_variable_declaration_list(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let keyword = if self.eat_keyword("var") {
            VarKeyword::Var
        } else if self.eat_keyword("final") {
            VarKeyword::Final
        } else if self.eat_keyword("const") {
            VarKeyword::Const
        } else {
            VarKeyword::None
        };
        let type_name = if keyword == VarKeyword::Var {
            NodeIndex::NONE
        } else if self.looks_like_typed_name() {
            self.parse_type_name()?
        } else if keyword == VarKeyword::None {
            return Err(self.error("expected variable declaration"));
        } else {
            NodeIndex::NONE
        };
        let name = self.parse_simple_identifier()?;
        self.parse_variables_after_name(keyword, type_name, start, name)
    }

    pub(crate) fn parse_variables_after_name(
        &mut self,
        keyword: VarKeyword,
        type_name: NodeIndex,
        start: u32,
        first_name: NodeIndex,
    ) -> Result<NodeIndex, ParseError> {
        let mut variables = vec![self.parse_variable_rest(first_name)?];
        while self.eat(&TokenKind::Comma) {
            let name = self.parse_simple_identifier()?;
            variables.push(self.parse_variable_rest(name)?);
        }
        Ok(self.finish(
            NodeKind::VariableDeclarationList {
                keyword,
                type_name,
                variables: Self::list(variables),
            },
            start,
        ))
    }

    fn parse_variable_rest(&mut self, name: NodeIndex) -> Result<NodeIndex, ParseError> {
        let start = self.arena.offset(name);
        let initializer = if self.eat_op(Operator::Eq) {
            self.parse_expression()?
        } else {
            NodeIndex::NONE
        };
        Ok(self.finish(NodeKind::VariableDeclaration { name, initializer }, start))
    }

    // =========================================================================
    // Parameters and bodies
    // =========================================================================

    pub(crate) fn parse_formal_parameter_list(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect(&TokenKind::LParen, "'('")?;
        let mut parameters = Vec::new();
        let mut kind = ParameterKind::Required;
        let mut closer: Option<TokenKind> = None;
        while !self.at(&TokenKind::RParen) {
            if kind == ParameterKind::Required {
                if self.eat(&TokenKind::LBracket) {
                    kind = ParameterKind::Positional;
                    closer = Some(TokenKind::RBracket);
                } else if self.eat(&TokenKind::LBrace) {
                    kind = ParameterKind::Named;
                    closer = Some(TokenKind::RBrace);
                }
            }
            parameters.push(self.parse_formal_parameter(kind)?);
            if let Some(close) = &closer
                && self.at(close)
            {
                self.advance();
                break;
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            if let Some(close) = &closer
                && self.at(close)
            {
                self.advance();
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(self.finish(
            NodeKind::FormalParameterList {
                parameters: Self::list(parameters),
            },
            start,
        ))
    }

    fn parse_formal_parameter(&mut self, kind: ParameterKind) -> Result<NodeIndex, ParseError> {
        let metadata = self.parse_metadata()?;
        let start = self.token_pos();
        let keyword = if self.eat_keyword("final") {
            VarKeyword::Final
        } else if self.eat_keyword("const") {
            VarKeyword::Const
        } else if self.eat_keyword("var") {
            VarKeyword::Var
        } else {
            VarKeyword::None
        };

        let mut shape = ParameterShape::Simple;
        let mut type_name = NodeIndex::NONE;
        let name;
        let mut parameters = NodeIndex::NONE;

        let typed_field = self.looks_like(|p| {
            p.parse_type_name()?;
            if p.at_keyword("this") { Ok(()) } else { Err(p.error("no field")) }
        });
        if typed_field {
            type_name = self.parse_type_name()?;
        }
        if self.at_keyword("this") {
            self.advance();
            self.expect(&TokenKind::Dot, "'.'")?;
            shape = ParameterShape::Field;
            name = self.parse_simple_identifier()?;
            if self.at(&TokenKind::LParen) {
                parameters = self.parse_formal_parameter_list()?;
            }
        } else {
            if self.looks_like_typed_name() {
                type_name = self.parse_type_name()?;
            }
            name = self.parse_simple_identifier()?;
            if self.at(&TokenKind::LParen) {
                shape = ParameterShape::FunctionTyped;
                parameters = self.parse_formal_parameter_list()?;
            }
        }

        let default_value = if kind != ParameterKind::Required
            && (self.eat_op(Operator::Eq) || self.eat(&TokenKind::Colon))
        {
            self.parse_expression()?
        } else {
            NodeIndex::NONE
        };
        Ok(self.finish(
            NodeKind::FormalParameter {
                metadata,
                kind,
                shape,
                keyword,
                type_name,
                name,
                parameters,
                default_value,
            },
            start,
        ))
    }

    /// `{ ... }`, `=> e;` (the `;` only when `needs_semicolon`) or `;`.
    pub(crate) fn parse_function_body(&mut self, needs_semicolon: bool) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        if self.at(&TokenKind::LBrace) {
            let block = self.parse_block()?;
            return Ok(self.finish(NodeKind::BlockFunctionBody { block }, start));
        }
        if self.eat(&TokenKind::Arrow) {
            let expression = self.parse_expression()?;
            if needs_semicolon {
                self.expect(&TokenKind::Semicolon, "';'")?;
            }
            return Ok(self.finish(NodeKind::ExpressionFunctionBody { expression }, start));
        }
        if self.eat(&TokenKind::Semicolon) {
            return Ok(self.finish(NodeKind::EmptyFunctionBody, start));
        }
        Err(self.error("expected function body"))
    }
}
