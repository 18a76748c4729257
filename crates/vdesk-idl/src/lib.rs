//! Interface template compiler
//!
//! This crate compiles the IDL dialect used by the virtual desktop interface
//! templates into a [`CompiledModule`]: one module descriptor plus every
//! interface with its identifier and vtable layout. The module can then be
//! encoded into a binding artifact or turned into Rust source.
//!
//! # Architecture
//!
//! 1. Lexer: tokenizes each source unit
//! 2. Parser: builds an AST per unit
//! 3. Semantic Analysis: resolves names across units, assigns vtable slots
//! 4. Code Generation: produces Rust vtable definitions (optional)
//!
//! # Example
//!
//! ```ignore
//! use vdesk_idl::{compile, SourceUnit};
//!
//! let units = vec![
//!     SourceUnit::new("ModuleDescriptor", r#"
//!         [version(1.0), build(22631), interface_version(22449)]
//!         library VirtualDesktop;
//!     "#),
//!     SourceUnit::new("IVirtualDesktop", r#"
//!         [object, uuid(3f07f4be-b107-441a-af0f-39d82529072c)]
//!         interface IVirtualDesktop : IUnknown {
//!             HRESULT GetId([out] GUID* id);
//!         }
//!     "#),
//! ];
//!
//! let module = compile(&units)?;
//! assert_eq!(module.interfaces[0].methods[0].slot, 3);
//! ```

pub mod ast;
pub mod codegen;
mod error;
pub mod guid;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use ast::{ParamDirection, Type};
pub use error::{Diagnostic, Diagnostics, IdlError, Result, Span};
pub use guid::Guid;
pub use semantic::{CompiledInterface, CompiledMethod, CompiledModule, CompiledParam, ModuleDescriptor};

/// One named piece of source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub name: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Compile a set of source units into a single module.
///
/// Units that fail to parse are all reported before semantic analysis runs;
/// semantic analysis then reports every remaining problem at once.
pub fn compile(units: &[SourceUnit]) -> std::result::Result<CompiledModule, Diagnostics> {
    let mut diags = Diagnostics(Vec::new());
    let mut parsed = Vec::with_capacity(units.len());

    for unit in units {
        match parser::parse(&unit.text) {
            Ok(file) => parsed.push((unit.name.clone(), file)),
            Err(e) => diags.push(Some(unit.name.as_str()), e),
        }
    }

    if !diags.is_empty() {
        return Err(diags);
    }

    semantic::analyze(&parsed)
}

/// Parse a single unit without analysis (for syntax checking)
pub fn parse(source: &str) -> Result<ast::File> {
    parser::parse(source)
}
