//! IDL Parser
//!
//! Recursive-descent parser over the token stream produced by the lexer.

use crate::ast::*;
use crate::error::{IdlError, Result, Span};
use crate::lexer::{Lexer, SpannedToken, Token};

/// Parse a source unit into an AST
pub fn parse(input: &str) -> Result<File> {
    let mut lexer = Lexer::new(input);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(&tokens);
    parser.parse_file()
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [SpannedToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn current_pos(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.span.start).unwrap_or(0)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(IdlError::parse(
                self.current_pos(),
                format!("expected {:?}, got {:?}", expected, self.current()),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.current() {
            Token::Ident(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(IdlError::parse(
                self.current_pos(),
                format!("expected identifier, got {:?}", self.current()),
            )),
        }
    }

    fn expect_integer(&mut self) -> Result<u64> {
        match self.current() {
            Token::Integer(n) => {
                let n = *n;
                self.advance();
                Ok(n)
            }
            _ => Err(IdlError::parse(
                self.current_pos(),
                format!("expected integer, got {:?}", self.current()),
            )),
        }
    }

    fn expect_u32(&mut self) -> Result<u32> {
        let pos = self.current_pos();
        let n = self.expect_integer()?;
        u32::try_from(n).map_err(|_| IdlError::parse(pos, format!("{} does not fit in 32 bits", n)))
    }

    fn expect_u16(&mut self) -> Result<u16> {
        let pos = self.current_pos();
        let n = self.expect_integer()?;
        u16::try_from(n).map_err(|_| IdlError::parse(pos, format!("{} does not fit in 16 bits", n)))
    }

    fn parse_file(&mut self) -> Result<File> {
        let mut items = Vec::new();

        while *self.current() != Token::Eof {
            items.push(self.parse_item()?);
        }

        Ok(File { items })
    }

    fn parse_item(&mut self) -> Result<Item> {
        let start = self.current_pos();
        let attrs = if *self.current() == Token::LBracket {
            self.parse_attributes()?
        } else {
            Vec::new()
        };

        match self.current() {
            Token::Library => self.parse_library(attrs, start),
            Token::Interface => self.parse_interface(attrs, start),
            _ => Err(IdlError::parse(
                self.current_pos(),
                format!("unexpected token: {:?}", self.current()),
            )),
        }
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>> {
        self.expect(&Token::LBracket)?;
        let mut attrs = Vec::new();

        loop {
            attrs.push(self.parse_attribute()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }

        self.expect(&Token::RBracket)?;
        Ok(attrs)
    }

    fn parse_attribute(&mut self) -> Result<Attribute> {
        let attr = match self.current() {
            Token::Object => {
                self.advance();
                Attribute::Object
            }
            Token::In => {
                self.advance();
                Attribute::In
            }
            Token::Out => {
                self.advance();
                Attribute::Out
            }
            Token::Retval => {
                self.advance();
                Attribute::Retval
            }
            Token::Uuid => {
                self.advance();
                self.expect(&Token::LParen)?;
                let uuid = match self.current() {
                    Token::UuidLiteral(s) => s.clone(),
                    _ => return Err(IdlError::parse(self.current_pos(), "expected UUID")),
                };
                self.advance();
                self.expect(&Token::RParen)?;
                Attribute::Uuid(uuid)
            }
            Token::Version => {
                self.advance();
                self.expect(&Token::LParen)?;
                let major = self.expect_u16()?;
                let minor = if self.eat(&Token::Dot) { self.expect_u16()? } else { 0 };
                self.expect(&Token::RParen)?;
                Attribute::Version(major, minor)
            }
            Token::Ident(name) => {
                let name = name.clone();
                let pos = self.current_pos();
                self.advance();
                match name.as_str() {
                    "build" => {
                        self.expect(&Token::LParen)?;
                        let n = self.expect_u32()?;
                        self.expect(&Token::RParen)?;
                        Attribute::Build(n)
                    }
                    "interface_version" => {
                        self.expect(&Token::LParen)?;
                        let n = self.expect_u32()?;
                        self.expect(&Token::RParen)?;
                        Attribute::InterfaceVersion(n)
                    }
                    _ => return Err(IdlError::parse(pos, format!("unknown attribute: {}", name))),
                }
            }
            _ => {
                return Err(IdlError::parse(
                    self.current_pos(),
                    format!("expected attribute, got {:?}", self.current()),
                ))
            }
        };
        Ok(attr)
    }

    fn parse_library(&mut self, attrs: Vec<Attribute>, start: usize) -> Result<Item> {
        self.expect(&Token::Library)?;
        let name = self.expect_ident()?;
        self.expect(&Token::Semicolon)?;
        Ok(Item::Library(Library {
            attrs,
            name,
            span: Some(Span::new(start, self.current_pos())),
        }))
    }

    fn parse_interface(&mut self, attrs: Vec<Attribute>, start: usize) -> Result<Item> {
        self.expect(&Token::Interface)?;
        let name = self.expect_ident()?;

        if self.eat(&Token::Semicolon) {
            if !attrs.is_empty() {
                return Err(IdlError::parse(
                    start,
                    format!("forward declaration of {} cannot carry attributes", name),
                ));
            }
            return Ok(Item::Forward(ForwardDecl {
                name,
                span: Some(Span::new(start, self.current_pos())),
            }));
        }

        let base = if self.eat(&Token::Colon) {
            Some(self.expect_ident()?)
        } else {
            None
        };

        self.expect(&Token::LBrace)?;

        let mut methods = Vec::new();
        while *self.current() != Token::RBrace {
            if *self.current() == Token::Eof {
                return Err(IdlError::parse(self.current_pos(), format!("unterminated interface {}", name)));
            }
            methods.push(self.parse_method()?);
        }

        self.expect(&Token::RBrace)?;
        self.eat(&Token::Semicolon);

        Ok(Item::Interface(Interface {
            attrs,
            name,
            base,
            methods,
            span: Some(Span::new(start, self.current_pos())),
        }))
    }

    fn parse_method(&mut self) -> Result<Method> {
        let start = self.current_pos();
        let return_type = self.parse_type()?;
        let name = self.expect_ident()?;

        self.expect(&Token::LParen)?;

        let mut params = Vec::new();
        if *self.current() == Token::Void && self.peek_is(&Token::RParen) {
            self.advance();
        } else if *self.current() != Token::RParen {
            loop {
                params.push(self.parse_param()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        self.expect(&Token::RParen)?;
        self.expect(&Token::Semicolon)?;

        Ok(Method {
            return_type,
            name,
            params,
            span: Some(Span::new(start, self.current_pos())),
        })
    }

    fn peek_is(&self, token: &Token) -> bool {
        self.tokens.get(self.pos + 1).map(|t| &t.token == token).unwrap_or(false)
    }

    fn parse_param(&mut self) -> Result<Param> {
        let attrs = if *self.current() == Token::LBracket {
            self.parse_attributes()?
        } else {
            Vec::new()
        };

        let ty = self.parse_type()?;
        let name = self.expect_ident()?;

        Ok(Param { attrs, ty, name })
    }

    fn parse_type(&mut self) -> Result<Type> {
        let is_const = self.eat(&Token::Const);

        let name = match self.current() {
            Token::Void => {
                self.advance();
                "void".to_string()
            }
            Token::Ident(_) => self.expect_ident()?,
            _ => {
                return Err(IdlError::parse(
                    self.current_pos(),
                    format!("expected type, got {:?}", self.current()),
                ))
            }
        };

        let mut pointer_depth = 0u8;
        while self.eat(&Token::Star) {
            pointer_depth = pointer_depth.saturating_add(1);
        }

        Ok(Type {
            name,
            pointer_depth,
            is_const,
        })
    }
}
