//! Parser state - expressions.
//!
//! Precedence, loosest first: assignment and cascade, conditional, `||`,
//! `&&`, equality, relational with `is`/`as`, `|`, `^`, `&`, shift,
//! additive, multiplicative, unary prefix, postfix with selectors.

use super::state::ParserState;
use crate::ParseError;
use crate::scanner::{StrSegment, Token, TokenKind};
use dres_common::limits::MAX_EXPRESSION_DEPTH;
use dres_syntax::{NodeIndex, NodeKind, Operator};

impl ParserState {
    pub(crate) fn parse_expression(&mut self) -> Result<NodeIndex, ParseError> {
        self.parse_expression_impl(true)
    }

    pub(crate) fn parse_expression_without_cascade(&mut self) -> Result<NodeIndex, ParseError> {
        self.parse_expression_impl(false)
    }

    fn parse_expression_impl(&mut self, allow_cascade: bool) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        if self.depth >= MAX_EXPRESSION_DEPTH {
            return Err(self.error("expression nesting too deep"));
        }
        self.depth += 1;
        let result = self.parse_expression_inner(start, allow_cascade);
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self, start: u32, allow_cascade: bool) -> Result<NodeIndex, ParseError> {
        if self.eat_keyword("throw") {
            let expression = self.parse_expression_impl(allow_cascade)?;
            return Ok(self.finish(NodeKind::ThrowExpression { expression }, start));
        }
        let left = self.parse_conditional_expression()?;
        if let TokenKind::Op(op) = *self.peek()
            && op.is_assignment()
        {
            self.advance();
            let right = self.parse_expression_impl(allow_cascade)?;
            return Ok(self.finish(
                NodeKind::AssignmentExpression {
                    operator: op,
                    left,
                    right,
                },
                start,
            ));
        }
        if allow_cascade && self.at(&TokenKind::DotDot) {
            let mut sections = Vec::new();
            while self.at(&TokenKind::DotDot) {
                sections.push(self.parse_cascade_section()?);
            }
            return Ok(self.finish(
                NodeKind::CascadeExpression {
                    target: left,
                    sections: Self::list(sections),
                },
                start,
            ));
        }
        Ok(left)
    }

    fn parse_cascade_section(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect(&TokenKind::DotDot, "'..'")?;
        let first = if self.eat(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect(&TokenKind::RBracket, "']'")?;
            self.finish(
                NodeKind::IndexExpression {
                    target: NodeIndex::NONE,
                    is_cascaded: true,
                    index,
                },
                start,
            )
        } else {
            let name = self.parse_simple_identifier()?;
            if self.at(&TokenKind::LParen) {
                let arguments = self.parse_argument_list()?;
                self.finish(
                    NodeKind::MethodInvocation {
                        target: NodeIndex::NONE,
                        is_cascaded: true,
                        method_name: name,
                        arguments,
                    },
                    start,
                )
            } else {
                self.finish(
                    NodeKind::PropertyAccess {
                        target: NodeIndex::NONE,
                        is_cascaded: true,
                        property_name: name,
                    },
                    start,
                )
            }
        };
        let section = self.parse_selectors(start, first)?;
        if let TokenKind::Op(op) = *self.peek()
            && op.is_assignment()
        {
            self.advance();
            let right = self.parse_expression_without_cascade()?;
            return Ok(self.finish(
                NodeKind::AssignmentExpression {
                    operator: op,
                    left: section,
                    right,
                },
                start,
            ));
        }
        Ok(section)
    }

    pub(crate) fn parse_conditional_expression(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let condition = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(condition);
        }
        let then_expression = self.parse_expression_without_cascade()?;
        self.expect(&TokenKind::Colon, "':'")?;
        let else_expression = self.parse_expression_without_cascade()?;
        Ok(self.finish(
            NodeKind::ConditionalExpression {
                condition,
                then_expression,
                else_expression,
            },
            start,
        ))
    }

    /// Binary operators grouped by level; `is`/`as` sit with the relational level.
    fn parse_binary(&mut self, level: usize) -> Result<NodeIndex, ParseError> {
        const LEVELS: &[&[Operator]] = &[
            &[Operator::BarBar],
            &[Operator::AmpAmp],
            &[Operator::EqEq, Operator::BangEq],
            &[Operator::Lt, Operator::Gt, Operator::LtEq, Operator::GtEq],
            &[Operator::Bar],
            &[Operator::Caret],
            &[Operator::Amp],
            &[Operator::LtLt, Operator::GtGt],
            &[Operator::Plus, Operator::Minus],
            &[
                Operator::Star,
                Operator::Slash,
                Operator::Percent,
                Operator::TildeSlash,
            ],
        ];
        const RELATIONAL: usize = 3;

        let Some(operators) = LEVELS.get(level) else {
            return self.parse_unary();
        };
        let start = self.token_pos();
        let mut left = self.parse_binary(level + 1)?;
        loop {
            if level == RELATIONAL && self.at_keyword("is") {
                self.advance();
                let negated = self.eat_op(Operator::Bang);
                let type_name = self.parse_type_name()?;
                left = self.finish(
                    NodeKind::IsExpression {
                        expression: left,
                        negated,
                        type_name,
                    },
                    start,
                );
                continue;
            }
            if level == RELATIONAL && self.at_keyword("as") {
                self.advance();
                let type_name = self.parse_type_name()?;
                left = self.finish(
                    NodeKind::AsExpression {
                        expression: left,
                        type_name,
                    },
                    start,
                );
                continue;
            }
            let operator = match *self.peek() {
                TokenKind::Op(op) if operators.contains(&op) => op,
                _ => break,
            };
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = self.finish(
                NodeKind::BinaryExpression {
                    operator,
                    left,
                    right,
                },
                start,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let prefix = match *self.peek() {
            TokenKind::Op(
                op @ (Operator::Minus
                | Operator::Bang
                | Operator::Tilde
                | Operator::PlusPlus
                | Operator::MinusMinus),
            ) => Some(op),
            _ => None,
        };
        if let Some(operator) = prefix {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.finish(NodeKind::PrefixExpression { operator, operand }, start));
        }
        let primary = self.parse_primary()?;
        let expression = self.parse_selectors(start, primary)?;
        match *self.peek() {
            TokenKind::Op(operator @ (Operator::PlusPlus | Operator::MinusMinus)) => {
                self.advance();
                Ok(self.finish(
                    NodeKind::PostfixExpression {
                        operator,
                        operand: expression,
                    },
                    start,
                ))
            }
            _ => Ok(expression),
        }
    }

    /// `.name`, `.name(args)`, `(args)` and `[index]` after a primary.
    ///
    /// `a.b` on a bare identifier is a `PrefixedIdentifier`; `a(x)` on a bare
    /// identifier is an untargeted `MethodInvocation`.
    pub(crate) fn parse_selectors(&mut self, start: u32, mut expression: NodeIndex) -> Result<NodeIndex, ParseError> {
        loop {
            let is_bare_identifier = matches!(
                self.arena.kind(expression),
                Some(NodeKind::SimpleIdentifier { .. })
            );
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.parse_simple_identifier()?;
                    expression = if self.at(&TokenKind::LParen) {
                        let arguments = self.parse_argument_list()?;
                        self.finish(
                            NodeKind::MethodInvocation {
                                target: expression,
                                is_cascaded: false,
                                method_name: name,
                                arguments,
                            },
                            start,
                        )
                    } else if is_bare_identifier {
                        self.finish(
                            NodeKind::PrefixedIdentifier {
                                prefix: expression,
                                identifier: name,
                            },
                            start,
                        )
                    } else {
                        self.finish(
                            NodeKind::PropertyAccess {
                                target: expression,
                                is_cascaded: false,
                                property_name: name,
                            },
                            start,
                        )
                    };
                }
                TokenKind::LParen => {
                    let arguments = self.parse_argument_list()?;
                    expression = if is_bare_identifier {
                        self.finish(
                            NodeKind::MethodInvocation {
                                target: NodeIndex::NONE,
                                is_cascaded: false,
                                method_name: expression,
                                arguments,
                            },
                            start,
                        )
                    } else {
                        self.finish(
                            NodeKind::FunctionExpressionInvocation {
                                function: expression,
                                arguments,
                            },
                            start,
                        )
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expression = self.finish(
                        NodeKind::IndexExpression {
                            target: expression,
                            is_cascaded: false,
                            index,
                        },
                        start,
                    );
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        match self.peek().clone() {
            TokenKind::Int(value) => {
                self.advance();
                Ok(self.finish(NodeKind::IntegerLiteral { value }, start))
            }
            TokenKind::Double(lexeme) => {
                self.advance();
                Ok(self.finish(NodeKind::DoubleLiteral { lexeme }, start))
            }
            TokenKind::Str(_) => self.parse_string_literal(),
            TokenKind::Hash => self.parse_symbol_literal(),
            TokenKind::LBracket | TokenKind::LBrace | TokenKind::Op(Operator::Lt) => {
                self.parse_collection_literal(false, start)
            }
            TokenKind::LParen => {
                if self.at_function_expression() {
                    return self.parse_function_expression();
                }
                self.advance();
                let expression = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(self.finish(NodeKind::ParenthesizedExpression { expression }, start))
            }
            TokenKind::Identifier(word) => match word.as_str() {
                "null" => {
                    self.advance();
                    Ok(self.finish(NodeKind::NullLiteral, start))
                }
                "true" | "false" => {
                    self.advance();
                    Ok(self.finish(
                        NodeKind::BooleanLiteral {
                            value: word == "true",
                        },
                        start,
                    ))
                }
                "this" => {
                    self.advance();
                    Ok(self.finish(NodeKind::ThisExpression, start))
                }
                "super" => {
                    self.advance();
                    Ok(self.finish(NodeKind::SuperExpression, start))
                }
                "rethrow" => {
                    self.advance();
                    Ok(self.finish(NodeKind::RethrowExpression, start))
                }
                "new" => {
                    self.advance();
                    self.parse_instance_creation(false, start)
                }
                "const" => {
                    self.advance();
                    if matches!(
                        self.peek(),
                        TokenKind::LBracket | TokenKind::LBrace | TokenKind::Op(Operator::Lt)
                    ) {
                        self.parse_collection_literal(true, start)
                    } else {
                        self.parse_instance_creation(true, start)
                    }
                }
                _ => self.parse_simple_identifier(),
            },
            _ => Err(self.error("expected expression")),
        }
    }

    fn parse_instance_creation(&mut self, is_const: bool, start: u32) -> Result<NodeIndex, ParseError> {
        let constructor_name = self.parse_constructor_name()?;
        let arguments = self.parse_argument_list()?;
        Ok(self.finish(
            NodeKind::InstanceCreationExpression {
                is_const,
                constructor_name,
                arguments,
            },
            start,
        ))
    }

    fn parse_collection_literal(&mut self, is_const: bool, start: u32) -> Result<NodeIndex, ParseError> {
        let type_arguments = self.parse_optional_type_arguments()?;
        if self.eat(&TokenKind::LBracket) {
            let mut elements = Vec::new();
            while !self.at(&TokenKind::RBracket) {
                elements.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBracket, "']'")?;
            return Ok(self.finish(
                NodeKind::ListLiteral {
                    is_const,
                    type_arguments,
                    elements: Self::list(elements),
                },
                start,
            ));
        }
        self.expect(&TokenKind::LBrace, "'{' or '['")?;
        let mut entries = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let entry_start = self.token_pos();
            let key = self.parse_expression()?;
            self.expect(&TokenKind::Colon, "':'")?;
            let value = self.parse_expression()?;
            entries.push(self.finish(NodeKind::MapLiteralEntry { key, value }, entry_start));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(self.finish(
            NodeKind::MapLiteral {
                is_const,
                type_arguments,
                entries: Self::list(entries),
            },
            start,
        ))
    }

    fn at_function_expression(&mut self) -> bool {
        self.looks_like(|p| {
            p.skip_parenthesized()?;
            if p.at(&TokenKind::LBrace) || p.at(&TokenKind::Arrow) {
                Ok(())
            } else {
                Err(p.error("not a function expression"))
            }
        })
    }

    fn parse_function_expression(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let parameters = self.parse_formal_parameter_list()?;
        let body = self.parse_function_body(false)?;
        Ok(self.finish(NodeKind::FunctionExpression { parameters, body }, start))
    }

    pub(crate) fn parse_argument_list(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect(&TokenKind::LParen, "'('")?;
        let mut arguments = Vec::new();
        while !self.at(&TokenKind::RParen) {
            if self.at_identifier() && matches!(self.peek_at(1), TokenKind::Colon) {
                let named_start = self.token_pos();
                let name = self.parse_simple_identifier()?;
                self.advance();
                let expression = self.parse_expression()?;
                arguments.push(self.finish(NodeKind::NamedExpression { name, expression }, named_start));
            } else {
                arguments.push(self.parse_expression()?);
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(self.finish(
            NodeKind::ArgumentList {
                arguments: Self::list(arguments),
            },
            start,
        ))
    }

    // =========================================================================
    // Strings and symbols
    // =========================================================================

    /// One string literal, or several adjacent ones.
    pub(crate) fn parse_string_literal(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let mut strings = Vec::new();
        while let TokenKind::Str(segments) = self.peek().clone() {
            let pos = self.token_pos();
            self.advance();
            let end = self.last_end;
            strings.push(self.build_string(segments, pos, end)?);
        }
        match strings.len() {
            0 => Err(self.error("expected string literal")),
            1 => Ok(strings[0]),
            _ => Ok(self.finish(
                NodeKind::AdjacentStrings {
                    strings: Self::list(strings),
                },
                start,
            )),
        }
    }

    fn build_string(&mut self, segments: Vec<StrSegment>, pos: u32, end: u32) -> Result<NodeIndex, ParseError> {
        let interpolated = segments
            .iter()
            .any(|s| !matches!(s, StrSegment::Text { .. }));
        if !interpolated {
            let value: String = segments
                .into_iter()
                .filter_map(|s| match s {
                    StrSegment::Text { value, .. } => Some(value),
                    _ => None,
                })
                .collect();
            return Ok(self.arena.add(NodeKind::SimpleStringLiteral { value }, pos, end));
        }

        let mut elements = Vec::new();
        for segment in segments {
            match segment {
                StrSegment::Text { value, pos, end } => {
                    elements.push(self.arena.add(NodeKind::InterpolationString { value }, pos, end));
                }
                StrSegment::Identifier { name, pos, end } => {
                    let identifier = self.arena.add(NodeKind::SimpleIdentifier { name }, pos, end);
                    elements.push(self.arena.add(
                        NodeKind::InterpolationExpression {
                            expression: identifier,
                        },
                        pos.saturating_sub(1),
                        end,
                    ));
                }
                StrSegment::Expression { tokens, pos, end } => {
                    let expression = self.parse_embedded_expression(tokens)?;
                    elements.push(self.arena.add(
                        NodeKind::InterpolationExpression { expression },
                        pos,
                        end,
                    ));
                }
            }
        }
        Ok(self.arena.add(
            NodeKind::StringInterpolation {
                elements: Self::list(elements),
            },
            pos,
            end,
        ))
    }

    /// Parse the tokens of a `${...}` in place of the main token stream.
    fn parse_embedded_expression(&mut self, tokens: Vec<Token>) -> Result<NodeIndex, ParseError> {
        let saved_tokens = std::mem::replace(&mut self.tokens, tokens);
        let saved_pos = std::mem::replace(&mut self.pos, 0);
        let saved_end = self.last_end;
        let result = self.parse_expression().and_then(|expression| {
            if self.at(&TokenKind::Eof) {
                Ok(expression)
            } else {
                Err(self.error("unexpected token in interpolation"))
            }
        });
        self.tokens = saved_tokens;
        self.pos = saved_pos;
        self.last_end = saved_end;
        result
    }

    fn parse_symbol_literal(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect(&TokenKind::Hash, "'#'")?;
        let mut components = Vec::new();
        if let TokenKind::Op(op) = *self.peek() {
            self.advance();
            components.push(op.lexeme().to_string());
        } else {
            loop {
                match self.advance() {
                    TokenKind::Identifier(name) => components.push(name),
                    _ => return Err(self.error("expected symbol name")),
                }
                if !self.eat(&TokenKind::Dot) {
                    break;
                }
            }
        }
        Ok(self.finish(NodeKind::SymbolLiteral { components }, start))
    }
}

