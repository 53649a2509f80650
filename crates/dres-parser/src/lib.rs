//! Fixture parser for the Dart subset understood by the dres resolver.
//!
//! Hosts normally hand the resolver their own trees; this parser exists so
//! tests and small tools can produce `ParsedUnit`s with real offsets from
//! source text. It performs no error recovery: the first syntax error aborts
//! the parse with a [`ParseError`].

pub mod scanner;
pub use scanner::{Scanner, StrSegment, Token, TokenKind};

pub mod parser;
pub use parser::ParserState;

use dres_common::Source;
use dres_syntax::ParsedUnit;
use std::fmt;

/// A syntax error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: u32) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse `text` as the compilation unit named by `source`.
pub fn parse_unit(source: Source, text: &str) -> Result<ParsedUnit, ParseError> {
    let tokens = Scanner::new(text).tokenize()?;
    let mut parser = ParserState::new(tokens);
    let root = parser.parse_compilation_unit()?;
    tracing::trace!(source = %source, nodes = parser.arena().len(), "parsed unit");
    Ok(ParsedUnit::new(source, parser.into_arena(), root))
}
