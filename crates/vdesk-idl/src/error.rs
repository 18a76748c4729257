//! IDL compiler errors

use std::fmt;
use thiserror::Error;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn at(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }
}

/// Errors raised while compiling a single source unit
#[derive(Debug, Error)]
pub enum IdlError {
    /// Lexer error
    #[error("lexer error at position {position}: {message}")]
    LexerError {
        position: usize,
        message: String,
    },

    /// Parser error
    #[error("parse error at position {position}: {message}")]
    ParseError {
        position: usize,
        message: String,
    },

    /// Semantic error
    #[error("semantic error: {message}")]
    SemanticError {
        message: String,
    },

    /// Undefined type
    #[error("undefined type `{name}` in {context}")]
    UndefinedType {
        name: String,
        context: String,
    },

    /// Duplicate definition
    #[error("duplicate definition: {name}")]
    DuplicateDefinition {
        name: String,
    },

    /// Missing required attribute
    #[error("missing required attribute: {attribute} on {target}")]
    MissingAttribute {
        attribute: String,
        target: String,
    },

    /// The identifier placeholder survived into compilation
    #[error("interface {interface} still carries the placeholder identifier")]
    PlaceholderIdentifier {
        interface: String,
    },

    /// Invalid UUID
    #[error("invalid UUID: {uuid}")]
    InvalidUuid {
        uuid: String,
    },

    /// Code generation error
    #[error("code generation error: {message}")]
    CodegenError {
        message: String,
    },
}

/// Result type for IDL operations
pub type Result<T> = std::result::Result<T, IdlError>;

impl IdlError {
    pub fn lexer(position: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            position,
            message: message.into(),
        }
    }

    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            position,
            message: message.into(),
        }
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::SemanticError {
            message: message.into(),
        }
    }

    pub fn undefined_type(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UndefinedType {
            name: name.into(),
            context: context.into(),
        }
    }

    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateDefinition { name: name.into() }
    }

    pub fn missing_attribute(attribute: impl Into<String>, target: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute: attribute.into(),
            target: target.into(),
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::CodegenError {
            message: message.into(),
        }
    }
}

/// A single compiler message attributed to the unit it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source unit name, or `None` for module-wide checks
    pub unit: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{}: {}", unit, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Every diagnostic produced by a failed compilation.
#[derive(Debug, Clone, Error)]
#[error("compilation failed with {} error(s)", .0.len())]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn push(&mut self, unit: Option<&str>, error: IdlError) {
        self.0.push(Diagnostic {
            unit: unit.map(str::to_string),
            message: error.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Render every diagnostic as a single line
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}
