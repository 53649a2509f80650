//! Tokenizer for the supported Dart subset.

use crate::ParseError;
use dres_syntax::Operator;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: u32,
    pub end: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Int(i64),
    Double(String),
    /// One quoted literal; adjacent literals are separate tokens.
    Str(Vec<StrSegment>),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    DotDot,
    Colon,
    Question,
    At,
    Hash,
    Arrow,
    Op(Operator),
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StrSegment {
    Text { value: String, pos: u32, end: u32 },
    /// `$name`
    Identifier { name: String, pos: u32, end: u32 },
    /// `${ ... }`, tokens of the embedded expression followed by `Eof`.
    Expression { tokens: Vec<Token>, pos: u32, end: u32 },
}

impl TokenKind {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

pub struct Scanner<'a> {
    text: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text: text.as_bytes(),
            pos: 0,
        }
    }

    fn at(&self, offset: usize) -> u8 {
        self.text.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.pos as u32)
    }

    /// Tokenize the whole input, ending with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.at(0), self.at(1)) {
                (b' ' | b'\t' | b'\r' | b'\n', _) => self.pos += 1,
                (b'/', b'/') => {
                    while self.pos < self.text.len() && self.at(0) != b'\n' {
                        self.pos += 1;
                    }
                }
                (b'/', b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    let mut depth = 1;
                    while depth > 0 {
                        if self.pos >= self.text.len() {
                            return Err(ParseError::new("unterminated comment", start as u32));
                        }
                        match (self.at(0), self.at(1)) {
                            (b'*', b'/') => {
                                depth -= 1;
                                self.pos += 2;
                            }
                            (b'/', b'*') => {
                                depth += 1;
                                self.pos += 2;
                            }
                            _ => self.pos += 1,
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let start = self.pos;
        if self.pos >= self.text.len() {
            return Ok(self.token(TokenKind::Eof, start));
        }
        let c = self.at(0);
        if c == b'r' && matches!(self.at(1), b'\'' | b'"') {
            self.pos += 1;
            return self.scan_string(start, true);
        }
        if is_identifier_start(c) {
            while is_identifier_part(self.at(0)) {
                self.pos += 1;
            }
            let name = self.slice(start, self.pos);
            return Ok(self.token(TokenKind::Identifier(name), start));
        }
        if c.is_ascii_digit() || (c == b'.' && self.at(1).is_ascii_digit()) {
            return self.scan_number(start);
        }
        if c == b'\'' || c == b'"' {
            return self.scan_string(start, false);
        }
        let (kind, width) = match (c, self.at(1), self.at(2)) {
            (b'(', _, _) => (TokenKind::LParen, 1),
            (b')', _, _) => (TokenKind::RParen, 1),
            (b'{', _, _) => (TokenKind::LBrace, 1),
            (b'}', _, _) => (TokenKind::RBrace, 1),
            (b'[', _, _) => (TokenKind::LBracket, 1),
            (b']', _, _) => (TokenKind::RBracket, 1),
            (b';', _, _) => (TokenKind::Semicolon, 1),
            (b',', _, _) => (TokenKind::Comma, 1),
            (b'.', b'.', _) => (TokenKind::DotDot, 2),
            (b'.', _, _) => (TokenKind::Dot, 1),
            (b':', _, _) => (TokenKind::Colon, 1),
            (b'?', _, _) => (TokenKind::Question, 1),
            (b'@', _, _) => (TokenKind::At, 1),
            (b'#', _, _) => (TokenKind::Hash, 1),
            (b'=', b'>', _) => (TokenKind::Arrow, 2),
            (b'=', b'=', _) => (TokenKind::Op(Operator::EqEq), 2),
            (b'=', _, _) => (TokenKind::Op(Operator::Eq), 1),
            (b'!', b'=', _) => (TokenKind::Op(Operator::BangEq), 2),
            (b'!', _, _) => (TokenKind::Op(Operator::Bang), 1),
            (b'+', b'+', _) => (TokenKind::Op(Operator::PlusPlus), 2),
            (b'+', b'=', _) => (TokenKind::Op(Operator::PlusEq), 2),
            (b'+', _, _) => (TokenKind::Op(Operator::Plus), 1),
            (b'-', b'-', _) => (TokenKind::Op(Operator::MinusMinus), 2),
            (b'-', b'=', _) => (TokenKind::Op(Operator::MinusEq), 2),
            (b'-', _, _) => (TokenKind::Op(Operator::Minus), 1),
            (b'*', b'=', _) => (TokenKind::Op(Operator::StarEq), 2),
            (b'*', _, _) => (TokenKind::Op(Operator::Star), 1),
            (b'/', b'=', _) => (TokenKind::Op(Operator::SlashEq), 2),
            (b'/', _, _) => (TokenKind::Op(Operator::Slash), 1),
            (b'~', b'/', b'=') => (TokenKind::Op(Operator::TildeSlashEq), 3),
            (b'~', b'/', _) => (TokenKind::Op(Operator::TildeSlash), 2),
            (b'~', _, _) => (TokenKind::Op(Operator::Tilde), 1),
            (b'%', b'=', _) => (TokenKind::Op(Operator::PercentEq), 2),
            (b'%', _, _) => (TokenKind::Op(Operator::Percent), 1),
            (b'<', b'<', b'=') => (TokenKind::Op(Operator::LtLtEq), 3),
            (b'<', b'<', _) => (TokenKind::Op(Operator::LtLt), 2),
            (b'<', b'=', _) => (TokenKind::Op(Operator::LtEq), 2),
            (b'<', _, _) => (TokenKind::Op(Operator::Lt), 1),
            (b'>', b'>', b'=') => (TokenKind::Op(Operator::GtGtEq), 3),
            (b'>', b'>', _) => (TokenKind::Op(Operator::GtGt), 2),
            (b'>', b'=', _) => (TokenKind::Op(Operator::GtEq), 2),
            (b'>', _, _) => (TokenKind::Op(Operator::Gt), 1),
            (b'&', b'&', _) => (TokenKind::Op(Operator::AmpAmp), 2),
            (b'&', b'=', _) => (TokenKind::Op(Operator::AmpEq), 2),
            (b'&', _, _) => (TokenKind::Op(Operator::Amp), 1),
            (b'|', b'|', _) => (TokenKind::Op(Operator::BarBar), 2),
            (b'|', b'=', _) => (TokenKind::Op(Operator::BarEq), 2),
            (b'|', _, _) => (TokenKind::Op(Operator::Bar), 1),
            (b'^', b'=', _) => (TokenKind::Op(Operator::CaretEq), 2),
            (b'^', _, _) => (TokenKind::Op(Operator::Caret), 1),
            _ => return Err(self.error(format!("unexpected character '{}'", c as char))),
        };
        self.pos += width;
        Ok(self.token(kind, start))
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            pos: start as u32,
            end: self.pos as u32,
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.text[start..end]).into_owned()
    }

    fn scan_number(&mut self, start: usize) -> Result<Token, ParseError> {
        if self.at(0) == b'0' && matches!(self.at(1), b'x' | b'X') {
            self.pos += 2;
            let digits_start = self.pos;
            while self.at(0).is_ascii_hexdigit() {
                self.pos += 1;
            }
            let digits = self.slice(digits_start, self.pos);
            let value = i64::from_str_radix(&digits, 16)
                .map_err(|_| ParseError::new("invalid hex literal", start as u32))?;
            return Ok(self.token(TokenKind::Int(value), start));
        }
        let mut is_double = false;
        while self.at(0).is_ascii_digit() {
            self.pos += 1;
        }
        if self.at(0) == b'.' && self.at(1).is_ascii_digit() {
            is_double = true;
            self.pos += 1;
            while self.at(0).is_ascii_digit() {
                self.pos += 1;
            }
        }
        if matches!(self.at(0), b'e' | b'E') {
            let sign = usize::from(matches!(self.at(1), b'+' | b'-'));
            if self.at(1 + sign).is_ascii_digit() {
                is_double = true;
                self.pos += 1 + sign;
                while self.at(0).is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }
        let lexeme = self.slice(start, self.pos);
        if is_double {
            return Ok(self.token(TokenKind::Double(lexeme), start));
        }
        let value = lexeme
            .parse::<i64>()
            .map_err(|_| ParseError::new("integer literal out of range", start as u32))?;
        Ok(self.token(TokenKind::Int(value), start))
    }

    fn scan_string(&mut self, start: usize, raw: bool) -> Result<Token, ParseError> {
        let quote = self.at(0);
        let triple = self.at(1) == quote && self.at(2) == quote;
        self.pos += if triple { 3 } else { 1 };
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut text_start = self.pos;
        loop {
            if self.pos >= self.text.len() {
                return Err(ParseError::new("unterminated string", start as u32));
            }
            let c = self.at(0);
            if c == quote && (!triple || (self.at(1) == quote && self.at(2) == quote)) {
                flush_text(&mut segments, &mut text, text_start, self.pos);
                self.pos += if triple { 3 } else { 1 };
                break;
            }
            if !triple && c == b'\n' {
                return Err(ParseError::new("unterminated string", start as u32));
            }
            if c == b'\\' && !raw {
                self.pos += 1;
                let escaped = self.at(0);
                self.pos += 1;
                match escaped {
                    b'n' => text.push('\n'),
                    b't' => text.push('\t'),
                    b'r' => text.push('\r'),
                    b'b' => text.push('\u{8}'),
                    b'f' => text.push('\u{c}'),
                    b'v' => text.push('\u{b}'),
                    other => text.push(other as char),
                }
                continue;
            }
            if c == b'$' && !raw {
                if self.at(1) == b'{' {
                    flush_text(&mut segments, &mut text, text_start, self.pos);
                    let seg_start = self.pos;
                    self.pos += 2;
                    let tokens = self.scan_interpolated_expression()?;
                    segments.push(StrSegment::Expression {
                        tokens,
                        pos: seg_start as u32,
                        end: self.pos as u32,
                    });
                    text_start = self.pos;
                    continue;
                }
                if is_identifier_start(self.at(1)) && self.at(1) != b'$' {
                    flush_text(&mut segments, &mut text, text_start, self.pos);
                    self.pos += 1;
                    let name_start = self.pos;
                    while is_identifier_part(self.at(0)) && self.at(0) != b'$' {
                        self.pos += 1;
                    }
                    segments.push(StrSegment::Identifier {
                        name: self.slice(name_start, self.pos),
                        pos: name_start as u32,
                        end: self.pos as u32,
                    });
                    text_start = self.pos;
                    continue;
                }
            }
            let width = utf8_width(c);
            text.push_str(&self.slice(self.pos, self.pos + width));
            self.pos += width;
        }
        Ok(self.token(TokenKind::Str(segments), start))
    }

    /// Scan tokens up to the `}` closing a `${`, consuming it.
    fn scan_interpolated_expression(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::Eof => return Err(self.error("unterminated interpolation")),
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        pos: token.pos,
                        end: token.pos,
                    });
                    return Ok(tokens);
                }
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            tokens.push(token);
        }
    }
}

fn flush_text(segments: &mut Vec<StrSegment>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() || segments.is_empty() {
        segments.push(StrSegment::Text {
            value: std::mem::take(text),
            pos: start as u32,
            end: end as u32,
        });
    }
}

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_identifier_part(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}
