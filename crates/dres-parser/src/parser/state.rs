//! Parser state: token cursor, node construction and shared productions.

use crate::ParseError;
use crate::scanner::{Token, TokenKind};
use dres_syntax::{NodeArena, NodeIndex, NodeKind, NodeList, Operator};

/// Words that can never be used as identifiers in expressions.
const RESERVED_WORDS: &[&str] = &[
    "assert", "break", "case", "catch", "class", "const", "continue", "default", "do", "else",
    "extends", "false", "final", "finally", "for", "if", "in", "is", "new", "null", "rethrow",
    "return", "super", "switch", "this", "throw", "true", "try", "var", "void", "while", "with",
];

pub struct ParserState {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) arena: NodeArena,
    /// End offset of the last consumed token.
    pub(crate) last_end: u32,
    /// Current expression nesting.
    pub(crate) depth: usize,
}

impl ParserState {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            arena: NodeArena::new(),
            last_end: 0,
            depth: 0,
        }
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn into_arena(self) -> NodeArena {
        self.arena
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    pub(crate) fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    pub(crate) fn token_pos(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(self.last_end, |t| t.pos)
    }

    pub(crate) fn advance(&mut self) -> TokenKind {
        let Some(token) = self.tokens.get(self.pos) else {
            return TokenKind::Eof;
        };
        let kind = token.kind.clone();
        if kind != TokenKind::Eof {
            self.last_end = token.end;
            self.pos += 1;
        }
        kind
    }

    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn at_op(&self, op: Operator) -> bool {
        matches!(self.peek(), TokenKind::Op(o) if *o == op)
    }

    pub(crate) fn at_keyword(&self, word: &str) -> bool {
        self.peek().identifier() == Some(word)
    }

    pub(crate) fn keyword_at(&self, offset: usize, word: &str) -> bool {
        self.peek_at(offset).identifier() == Some(word)
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_op(&mut self, op: Operator) -> bool {
        if self.at_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_keyword(&mut self, word: &str) -> bool {
        if self.at_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    pub(crate) fn expect_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.eat_keyword(word) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{word}'")))
        }
    }

    /// Consume a `>` closing type arguments, splitting `>>` if needed.
    pub(crate) fn expect_type_arguments_close(&mut self) -> Result<(), ParseError> {
        if self.eat_op(Operator::Gt) {
            return Ok(());
        }
        if self.at_op(Operator::GtGt)
            && let Some(token) = self.tokens.get_mut(self.pos)
        {
            token.kind = TokenKind::Op(Operator::Gt);
            token.pos += 1;
            self.last_end = token.pos;
            return Ok(());
        }
        Err(self.error("expected '>'"))
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.token_pos())
    }

    /// Run `f` speculatively; on failure the cursor is restored.
    ///
    /// Nodes created by a failed attempt stay in the arena unreferenced.
    pub(crate) fn try_parse<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Option<T> {
        let saved_pos = self.pos;
        let saved_end = self.last_end;
        let saved_tokens = self.split_token_snapshot();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = saved_pos;
                self.last_end = saved_end;
                self.restore_split_tokens(saved_tokens);
                None
            }
        }
    }

    /// `try_parse` that always rewinds, reporting only whether `f` succeeded.
    pub(crate) fn looks_like<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> bool {
        let saved_pos = self.pos;
        let saved_end = self.last_end;
        let saved_tokens = self.split_token_snapshot();
        let ok = f(self).is_ok();
        self.pos = saved_pos;
        self.last_end = saved_end;
        self.restore_split_tokens(saved_tokens);
        ok
    }

    // `>>` splitting mutates tokens in place; snapshots make it reversible.
    fn split_token_snapshot(&self) -> Vec<(usize, Token)> {
        self.tokens
            .iter()
            .enumerate()
            .skip(self.pos)
            .filter(|(_, t)| matches!(t.kind, TokenKind::Op(Operator::GtGt)))
            .map(|(i, t)| (i, t.clone()))
            .collect()
    }

    fn restore_split_tokens(&mut self, snapshot: Vec<(usize, Token)>) {
        for (i, token) in snapshot {
            if let Some(slot) = self.tokens.get_mut(i) {
                *slot = token;
            }
        }
    }

    // =========================================================================
    // Node construction
    // =========================================================================

    pub(crate) fn finish(&mut self, kind: NodeKind, start: u32) -> NodeIndex {
        let end = self.last_end.max(start);
        self.arena.add(kind, start, end)
    }

    pub(crate) fn list(nodes: Vec<NodeIndex>) -> NodeList {
        NodeList::from_vec(nodes)
    }

    // =========================================================================
    // Identifiers and types
    // =========================================================================

    pub(crate) fn is_reserved(word: &str) -> bool {
        RESERVED_WORDS.contains(&word)
    }

    /// True if the current token can start an identifier.
    pub(crate) fn at_identifier(&self) -> bool {
        matches!(self.peek(), TokenKind::Identifier(name) if !Self::is_reserved(name))
    }

    pub(crate) fn identifier_at(&self, offset: usize) -> bool {
        matches!(self.peek_at(offset), TokenKind::Identifier(name) if !Self::is_reserved(name))
    }

    pub(crate) fn parse_simple_identifier(&mut self) -> Result<NodeIndex, ParseError> {
        match self.peek().clone() {
            TokenKind::Identifier(name) if !Self::is_reserved(&name) => {
                let start = self.token_pos();
                self.advance();
                Ok(self.finish(NodeKind::SimpleIdentifier { name }, start))
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    /// `a` or `a.b`.
    pub(crate) fn parse_qualified_identifier(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        let first = self.parse_simple_identifier()?;
        if self.at(&TokenKind::Dot) && self.identifier_at(1) {
            self.advance();
            let second = self.parse_simple_identifier()?;
            return Ok(self.finish(
                NodeKind::PrefixedIdentifier {
                    prefix: first,
                    identifier: second,
                },
                start,
            ));
        }
        Ok(first)
    }

    /// `T`, `p.T`, `T<A, B>` or `void`.
    pub(crate) fn parse_type_name(&mut self) -> Result<NodeIndex, ParseError> {
        let start = self.token_pos();
        if self.at_keyword("void") {
            self.advance();
            let name = self.finish(
                NodeKind::SimpleIdentifier {
                    name: "void".to_string(),
                },
                start,
            );
            return Ok(self.finish(
                NodeKind::TypeName {
                    name,
                    type_arguments: NodeList::new(),
                },
                start,
            ));
        }
        let name = self.parse_qualified_identifier()?;
        let type_arguments = self.parse_optional_type_arguments()?;
        Ok(self.finish(
            NodeKind::TypeName {
                name,
                type_arguments,
            },
            start,
        ))
    }

    pub(crate) fn parse_optional_type_arguments(&mut self) -> Result<NodeList, ParseError> {
        if !self.at_op(Operator::Lt) {
            return Ok(NodeList::new());
        }
        self.advance();
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type_name()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_type_arguments_close()?;
        Ok(Self::list(args))
    }

    pub(crate) fn parse_optional_type_parameters(&mut self) -> Result<NodeList, ParseError> {
        if !self.at_op(Operator::Lt) {
            return Ok(NodeList::new());
        }
        self.advance();
        let mut params = Vec::new();
        loop {
            let start = self.token_pos();
            let name = self.parse_simple_identifier()?;
            let bound = if self.eat_keyword("extends") {
                self.parse_type_name()?
            } else {
                NodeIndex::NONE
            };
            params.push(self.finish(NodeKind::TypeParameter { name, bound }, start));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_type_arguments_close()?;
        Ok(Self::list(params))
    }

    /// A type immediately followed by an identifier (`int x`, `List<T> f`).
    pub(crate) fn looks_like_typed_name(&mut self) -> bool {
        self.looks_like(|p| {
            p.parse_type_name()?;
            if p.at_identifier() {
                Ok(())
            } else {
                Err(p.error("not a typed name"))
            }
        })
    }

    /// Skip a balanced `( ... )` group starting at the current token.
    pub(crate) fn skip_parenthesized(&mut self) -> Result<(), ParseError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                TokenKind::Eof => return Err(self.error("unbalanced parentheses")),
                _ => {}
            }
        }
        Ok(())
    }
}
