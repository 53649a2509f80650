//! Parser state - statements.

use super::state::ParserState;
use crate::ParseError;
use crate::scanner::TokenKind;
use dres_syntax::{NodeIndex, NodeKind, NodeList, Operator, PropertyKind, VarKeyword};

impl ParserState {
    pub(crate) fn parse_block(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.error("unterminated block"));
            }
            statements.push(self.parse_statement()?);
        }
        self.advance();
        Ok(self.finish(
            NodeKind::Block {
                statements: Self::list(statements),
            },
            start,
        ))
    }

    pub(crate) fn parse_statement(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        if self.at_identifier() && matches!(self.peek_at(1), TokenKind::Colon) {
            let labels = self.parse_labels()?;
            let statement = self.parse_statement()?;
            return Ok(self.finish(NodeKind::LabeledStatement { labels, statement }, start));
        }
        if self.at(&TokenKind::LBrace) {
            return self.parse_block();
        }
        if self.eat(&TokenKind::Semicolon) {
            return Ok(self.finish(NodeKind::EmptyStatement, start));
        }
        let keyword = self.peek().identifier().map(str::to_string);
        match keyword.as_deref() {
            Some("if") => return self.parse_if_statement(),
            Some("while") => return self.parse_while_statement(),
            Some("do") => return self.parse_do_statement(),
            Some("for") => return self.parse_for_statement(),
            Some("switch") => return self.parse_switch_statement(),
            Some("try") => return self.parse_try_statement(),
            Some("return") => {
                self.advance();
                let expression = if self.at(&TokenKind::Semicolon) {
                    NodeIndex::NONE
                } else {
                    self.parse_expression()?
                };
                self.expect(&TokenKind::Semicolon, "';'")?;
                return Ok(self.finish(NodeKind::ReturnStatement { expression }, start));
            }
            Some("break") | Some("continue") => {
                let is_break = self.at_keyword("break");
                self.advance();
                let label = if self.at_identifier() {
                    self.parse_simple_identifier()?
                } else {
                    NodeIndex::NONE
                };
                self.expect(&TokenKind::Semicolon, "';'")?;
                let kind = if is_break {
                    NodeKind::BreakStatement { label }
                } else {
                    NodeKind::ContinueStatement { label }
                };
                return Ok(self.finish(kind, start));
            }
            Some("assert") => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let condition = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                self.expect(&TokenKind::Semicolon, "';'")?;
                return Ok(self.finish(NodeKind::AssertStatement { condition }, start));
            }
            Some("var") | Some("final") => return self.parse_local_variables(start),
            Some("const") if !self.at_const_expression() => {
                return self.parse_local_variables(start);
            }
            _ => {}
        }
        if self.at_local_function() {
            return self.parse_local_function(start);
        }
        if self.looks_like_typed_name() {
            return self.parse_local_variables(start);
        }
        let expression = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.finish(NodeKind::ExpressionStatement { expression }, start))
    }

    /// `const [..]`, `const C()` and friends, as opposed to `const x = ..`.
    fn at_const_expression(&mut self) -> bool {
        !self.looks_like(|p| {
            p.advance();
            if p.looks_like_typed_name() {
                p.parse_type_name()?;
            }
            p.parse_simple_identifier()?;
            if p.at_op(Operator::Eq) || p.at(&TokenKind::Semicolon) || p.at(&TokenKind::Comma) {
                Ok(())
            } else {
                Err(p.error("not a constant declaration"))
            }
        })
    }

    fn parse_local_variables(&mut self, start: u32) -> Result<NodeIndex, ParseError> {
        let variables = self.parse_variable_declaration_list()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.finish(NodeKind::VariableDeclarationStatement { variables }, start))
    }

    fn parse_labels(&mut self) -> Result<NodeList, ParseError> {
        let mut labels = Vec::new();
        while self.at_identifier() && matches!(self.peek_at(1), TokenKind::Colon) {
            let start = self.token_pos();
            let label = self.parse_simple_identifier()?;
            self.advance();
            labels.push(self.finish(NodeKind::Label { label }, start));
        }
        Ok(Self::list(labels))
    }

    /// `[Type] name(params) {` or `[Type] name(params) =>`.
    fn at_local_function(&mut self) -> bool {
        self.looks_like(|p| {
            if p.at_keyword("void") || p.looks_like_typed_name() {
                p.parse_type_name()?;
            }
            p.parse_simple_identifier()?;
            p.skip_parenthesized()?;
            if p.at(&TokenKind::LBrace) || p.at(&TokenKind::Arrow) {
                Ok(())
            } else {
                Err(p.error("not a local function"))
            }
        })
    }

    fn parse_local_function(&mut self, start: u32) -> Result<NodeIndex, ParseError> {
        let return_type = if self.at_keyword("void") || self.looks_like_typed_name() {
            self.parse_type_name()?
        } else {
            NodeIndex::NONE
        };
        let name = self.parse_simple_identifier()?;
        let fn_start = self.token_pos();
        let parameters = self.parse_formal_parameter_list()?;
        let body = self.parse_function_body(true)?;
        let function = self.finish(NodeKind::FunctionExpression { parameters, body }, fn_start);
        let declaration = self.finish(
            NodeKind::FunctionDeclaration {
                metadata: NodeList::new(),
                is_external: false,
                return_type,
                property_kind: PropertyKind::None,
                name,
                function,
            },
            start,
        );
        Ok(self.finish(NodeKind::FunctionDeclarationStatement { declaration }, start))
    }

    fn parse_condition(&mut self) -> Result<NodeIndex, ParseError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(condition)
    }

    fn parse_if_statement(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect_keyword("if")?;
        let condition = self.parse_condition()?;
        let then_statement = self.parse_statement()?;
        let else_statement = if self.eat_keyword("else") {
            self.parse_statement()?
        } else {
            NodeIndex::NONE
        };
        Ok(self.finish(
            NodeKind::IfStatement {
                condition,
                then_statement,
                else_statement,
            },
            start,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect_keyword("while")?;
        let condition = self.parse_condition()?;
        let body = self.parse_statement()?;
        Ok(self.finish(NodeKind::WhileStatement { condition, body }, start))
    }

    fn parse_do_statement(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect_keyword("do")?;
        let body = self.parse_statement()?;
        self.expect_keyword("while")?;
        let condition = self.parse_condition()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.finish(NodeKind::DoStatement { body, condition }, start))
    }

    fn parse_for_statement(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect_keyword("for")?;
        self.expect(&TokenKind::LParen, "'('")?;

        if let Some(loop_variable) = self.try_parse(Self::parse_for_in_variable) {
            let iterable = self.parse_expression()?;
            self.expect(&TokenKind::RParen, "')'")?;
            let body = self.parse_statement()?;
            return Ok(self.finish(
                NodeKind::ForEachStatement {
                    loop_variable,
                    identifier: NodeIndex::NONE,
                    iterable,
                    body,
                },
                start,
            ));
        }
        if self.at_identifier() && self.keyword_at(1, "in") {
            let identifier = self.parse_simple_identifier()?;
            self.expect_keyword("in")?;
            let iterable = self.parse_expression()?;
            self.expect(&TokenKind::RParen, "')'")?;
            let body = self.parse_statement()?;
            return Ok(self.finish(
                NodeKind::ForEachStatement {
                    loop_variable: NodeIndex::NONE,
                    identifier,
                    iterable,
                    body,
                },
                start,
            ));
        }

        let mut variables = NodeIndex::NONE;
        let mut initialization = NodeIndex::NONE;
        if !self.at(&TokenKind::Semicolon) {
            let declares = matches!(
                self.peek().identifier(),
                Some("var") | Some("final") | Some("const")
            ) || self.looks_like_typed_name();
            if declares {
                variables = self.parse_variable_declaration_list()?;
            } else {
                initialization = self.parse_expression()?;
            }
        }
        self.expect(&TokenKind::Semicolon, "';'")?;
        let condition = if self.at(&TokenKind::Semicolon) {
            NodeIndex::NONE
        } else {
            self.parse_expression()?
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        let mut updaters = Vec::new();
        while !self.at(&TokenKind::RParen) {
            updaters.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        let body = self.parse_statement()?;
        Ok(self.finish(
            NodeKind::ForStatement {
                variables,
                initialization,
                condition,
                updaters: Self::list(updaters),
                body,
            },
            start,
        ))
    }

    /// `var x in`, `final T x in`, `T x in`; the `in` is consumed.
    fn parse_for_in_variable(&mut self) -> Result<NodeIndex, ParseError> {
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
        let type_name = if keyword != VarKeyword::Var && self.looks_like_typed_name() {
            self.parse_type_name()?
        } else {
            NodeIndex::NONE
        };
        if keyword == VarKeyword::None && type_name.is_none() {
            return Err(self.error("not a declared loop variable"));
        }
        let name = self.parse_simple_identifier()?;
        let declared = self.finish(
            NodeKind::DeclaredIdentifier {
                keyword,
                type_name,
                name,
            },
            start,
        );
        self.expect_keyword("in")?;
        Ok(declared)
    }

    fn parse_switch_statement(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect_keyword("switch")?;
        let expression = self.parse_condition()?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let member_start = self.token_pos();
            let labels = self.parse_labels()?;
            if self.eat_keyword("case") {
                let case_expression = self.parse_expression()?;
                self.expect(&TokenKind::Colon, "':'")?;
                let statements = self.parse_switch_statements()?;
                members.push(self.finish(
                    NodeKind::SwitchCase {
                        labels,
                        expression: case_expression,
                        statements,
                    },
                    member_start,
                ));
            } else if self.eat_keyword("default") {
                self.expect(&TokenKind::Colon, "':'")?;
                let statements = self.parse_switch_statements()?;
                members.push(self.finish(
                    NodeKind::SwitchDefault { labels, statements },
                    member_start,
                ));
            } else {
                return Err(self.error("expected 'case' or 'default'"));
            }
        }
        self.advance();
        Ok(self.finish(
            NodeKind::SwitchStatement {
                expression,
                members: Self::list(members),
            },
            start,
        ))
    }

    fn parse_switch_statements(&mut self) -> Result<NodeList, ParseError> {
        let mut statements = Vec::new();
        loop {
            if self.at(&TokenKind::RBrace) || self.at_keyword("case") || self.at_keyword("default")
            {
                break;
            }
            // A label followed by `case`/`default` belongs to the next member.
            let labels_case = self.looks_like(|p| {
                p.parse_labels()?;
                if p.at_keyword("case") || p.at_keyword("default") {
                    Ok(())
                } else {
                    Err(p.error("labeled statement"))
                }
            });
            if labels_case && self.at_identifier() {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Self::list(statements))
    }

    fn parse_try_statement(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        self.expect_keyword("try")?;
        let body = self.parse_block()?;
        let mut catch_clauses = Vec::new();
        while self.at_keyword("on") || self.at_keyword("catch") {
            let clause_start = self.token_pos();
            let exception_type = if self.eat_keyword("on") {
                self.parse_type_name()?
            } else {
                NodeIndex::NONE
            };
            let mut exception_parameter = NodeIndex::NONE;
            let mut stack_trace_parameter = NodeIndex::NONE;
            if self.eat_keyword("catch") {
                self.expect(&TokenKind::LParen, "'('")?;
                exception_parameter = self.parse_simple_identifier()?;
                if self.eat(&TokenKind::Comma) {
                    stack_trace_parameter = self.parse_simple_identifier()?;
                }
                self.expect(&TokenKind::RParen, "')'")?;
            }
            let clause_body = self.parse_block()?;
            catch_clauses.push(self.finish(
                NodeKind::CatchClause {
                    exception_type,
                    exception_parameter,
                    stack_trace_parameter,
                    body: clause_body,
                },
                clause_start,
            ));
        }
        let finally_block = if self.eat_keyword("finally") {
            self.parse_block()?
        } else {
            NodeIndex::NONE
        };
        if catch_clauses.is_empty() && finally_block.is_none() {
            return Err(self.error("expected 'catch', 'on' or 'finally'"));
        }
        Ok(self.finish(
            NodeKind::TryStatement {
                body,
                catch_clauses: Self::list(catch_clauses),
                finally_block,
            },
            start,
        ))
    }
}
