//! IDL Abstract Syntax Tree
//!
//! AST nodes for interface templates and the module descriptor.

use crate::error::Span;

/// Root of a source unit
#[derive(Debug, Clone, Default)]
pub struct File {
    pub items: Vec<Item>,
}

/// Top-level items
#[derive(Debug, Clone)]
pub enum Item {
    /// `library Name;` module descriptor
    Library(Library),
    /// Full interface definition
    Interface(Interface),
    /// `interface Name;` opaque forward declaration
    Forward(ForwardDecl),
}

/// Attributes that may appear in `[...]` lists
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Object,
    Uuid(String),
    /// `version(major.minor)`
    Version(u16, u16),
    /// `build(n)`
    Build(u32),
    /// `interface_version(n)`
    InterfaceVersion(u32),
    In,
    Out,
    Retval,
}

/// Module descriptor
#[derive(Debug, Clone)]
pub struct Library {
    pub attrs: Vec<Attribute>,
    pub name: String,
    pub span: Option<Span>,
}

/// Forward declaration of an interface defined elsewhere
#[derive(Debug, Clone)]
pub struct ForwardDecl {
    pub name: String,
    pub span: Option<Span>,
}

/// Interface definition
#[derive(Debug, Clone)]
pub struct Interface {
    pub attrs: Vec<Attribute>,
    pub name: String,
    pub base: Option<String>,
    pub methods: Vec<Method>,
    pub span: Option<Span>,
}

impl Interface {
    pub fn uuid(&self) -> Option<&str> {
        self.attrs.iter().find_map(|a| match a {
            Attribute::Uuid(u) => Some(u.as_str()),
            _ => None,
        })
    }

    pub fn is_object(&self) -> bool {
        self.attrs.contains(&Attribute::Object)
    }
}

/// Method declaration
#[derive(Debug, Clone)]
pub struct Method {
    pub return_type: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub span: Option<Span>,
}

/// Method parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub attrs: Vec<Attribute>,
    pub ty: Type,
    pub name: String,
}

impl Param {
    pub fn direction(&self) -> ParamDirection {
        let is_in = self.attrs.contains(&Attribute::In);
        let is_out = self.attrs.contains(&Attribute::Out);
        match (is_in, is_out) {
            (true, true) => ParamDirection::InOut,
            (false, true) => ParamDirection::Out,
            _ => ParamDirection::In,
        }
    }

    pub fn is_retval(&self) -> bool {
        self.attrs.contains(&Attribute::Retval)
    }
}

/// Parameter direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamDirection {
    #[default]
    In,
    Out,
    InOut,
}

impl ParamDirection {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::In => 0,
            Self::Out => 1,
            Self::InOut => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::In),
            1 => Some(Self::Out),
            2 => Some(Self::InOut),
            _ => None,
        }
    }
}

/// Type reference: a named type plus pointer depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    /// `void` is represented as "void"
    pub name: String,
    pub pointer_depth: u8,
    pub is_const: bool,
}

impl Type {
    pub fn named(name: impl Into<String>, pointer_depth: u8) -> Self {
        Self {
            name: name.into(),
            pointer_depth,
            is_const: false,
        }
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && self.pointer_depth == 0
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        f.write_str(&self.name)?;
        for _ in 0..self.pointer_depth {
            f.write_str("*")?;
        }
        Ok(())
    }
}
