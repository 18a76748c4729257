//! IDL Lexer
//!
//! Tokenizes interface template source.

use crate::error::{IdlError, Result, Span};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Const,
    In,
    Interface,
    Library,
    Object,
    Out,
    Retval,
    Uuid,
    Version,
    Void,

    // Identifiers and literals
    Ident(String),
    Integer(u64),
    UuidLiteral(String),

    // Punctuation
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Star,      // *
    Dot,       // .

    // End of file
    Eof,
}

impl Token {
    pub fn keyword(s: &str) -> Option<Token> {
        match s {
            "const" => Some(Token::Const),
            "in" => Some(Token::In),
            "interface" => Some(Token::Interface),
            "library" => Some(Token::Library),
            "object" => Some(Token::Object),
            "out" => Some(Token::Out),
            "retval" => Some(Token::Retval),
            "uuid" => Some(Token::Uuid),
            "version" => Some(Token::Version),
            "void" => Some(Token::Void),
            _ => None,
        }
    }
}

/// A token with its source location
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer state
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<SpannedToken> {
        self.skip_whitespace_and_comments();

        let start = self.pos;

        if self.pos >= self.bytes.len() {
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span::at(self.pos),
            });
        }

        // UUIDs mix digits and letters freely, so they are recognised as a whole
        // before falling back to number / identifier rules.
        if let Some(uuid) = self.input.get(self.pos..self.pos + 36) {
            if is_uuid_format(uuid) && !self.is_ident_byte_at(self.pos + 36) {
                self.pos += 36;
                return Ok(SpannedToken {
                    token: Token::UuidLiteral(uuid.to_ascii_lowercase()),
                    span: Span::new(start, self.pos),
                });
            }
        }

        let ch = self.bytes[self.pos];

        let token = match ch {
            b'{' => { self.pos += 1; Token::LBrace }
            b'}' => { self.pos += 1; Token::RBrace }
            b'[' => { self.pos += 1; Token::LBracket }
            b']' => { self.pos += 1; Token::RBracket }
            b'(' => { self.pos += 1; Token::LParen }
            b')' => { self.pos += 1; Token::RParen }
            b',' => { self.pos += 1; Token::Comma }
            b';' => { self.pos += 1; Token::Semicolon }
            b':' => { self.pos += 1; Token::Colon }
            b'*' => { self.pos += 1; Token::Star }
            b'.' => { self.pos += 1; Token::Dot }
            b'0'..=b'9' => return self.lex_number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => return Ok(self.lex_ident()),
            _ => {
                let ch = self.input[self.pos..].chars().next().unwrap_or('?');
                return Err(IdlError::lexer(self.pos, format!("unexpected character: {}", ch)));
            }
        };

        Ok(SpannedToken {
            token,
            span: Span::new(start, self.pos),
        })
    }

    fn is_ident_byte_at(&self, pos: usize) -> bool {
        self.bytes
            .get(pos)
            .map(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .unwrap_or(false)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.pos + 1 < self.bytes.len() && self.bytes[self.pos] == b'/' {
                match self.bytes[self.pos + 1] {
                    b'/' => {
                        self.pos += 2;
                        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                            self.pos += 1;
                        }
                        continue;
                    }
                    b'*' => {
                        self.pos += 2;
                        while self.pos < self.bytes.len() {
                            if self.bytes[self.pos] == b'*' && self.bytes.get(self.pos + 1) == Some(&b'/') {
                                self.pos += 2;
                                break;
                            }
                            self.pos += 1;
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            break;
        }
    }

    fn lex_ident(&mut self) -> SpannedToken {
        let start = self.pos;

        while self.is_ident_byte_at(self.pos) {
            self.pos += 1;
        }

        let s = &self.input[start..self.pos];
        let token = Token::keyword(s).unwrap_or_else(|| Token::Ident(s.to_string()));

        SpannedToken {
            token,
            span: Span::new(start, self.pos),
        }
    }

    fn lex_number(&mut self) -> Result<SpannedToken> {
        let start = self.pos;

        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        if self.is_ident_byte_at(self.pos) {
            return Err(IdlError::lexer(start, "malformed number"));
        }

        let value: u64 = self.input[start..self.pos]
            .parse()
            .map_err(|_| IdlError::lexer(start, "integer out of range"))?;

        Ok(SpannedToken {
            token: Token::Integer(value),
            span: Span::new(start, self.pos),
        })
    }
}

/// Check if a string looks like a UUID
fn is_uuid_format(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 5 {
        return false;
    }
    parts[0].len() == 8
        && parts[1].len() == 4
        && parts[2].len() == 4
        && parts[3].len() == 4
        && parts[4].len() == 12
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_hexdigit()))
}
