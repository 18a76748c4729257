//! Semantic Analysis
//!
//! Resolves names across every source unit of a module, validates interface
//! definitions and assigns vtable slots.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ast::*;
use crate::error::{Diagnostics, IdlError, Result};
use crate::guid::Guid;

/// Scalar types understood by the compiler
pub const PRIMITIVE_TYPES: &[&str] = &[
    "void", "HRESULT", "BOOL", "INT", "UINT", "LONG", "ULONG", "DWORD", "HWND", "HMONITOR",
    "HSTRING", "GUID", "REFIID",
];

/// Root interfaces every definition ultimately derives from, with their slot counts
pub const ROOT_INTERFACES: &[(&str, u16)] = &[("IUnknown", 3), ("IInspectable", 6)];

/// Fully analyzed module, ready for encoding or code generation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModule {
    pub descriptor: ModuleDescriptor,
    /// Sorted by name
    pub interfaces: Vec<CompiledInterface>,
    /// Forward-declared interfaces that are referenced but not defined here
    pub opaque: Vec<String>,
}

impl CompiledModule {
    pub fn interface(&self, name: &str) -> Option<&CompiledInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// Values from the `library` descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub version: (u16, u16),
    pub os_build: u32,
    pub interface_version: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledInterface {
    pub name: String,
    pub iid: Guid,
    pub base: String,
    /// Slot of the first method declared by this interface
    pub first_slot: u16,
    pub methods: Vec<CompiledMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMethod {
    pub name: String,
    pub slot: u16,
    pub return_type: Type,
    pub params: Vec<CompiledParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledParam {
    pub name: String,
    pub ty: Type,
    pub direction: ParamDirection,
}

/// Analyze parsed units as one module.
///
/// Every problem found is reported; analysis does not stop at the first one.
pub fn analyze(units: &[(String, File)]) -> std::result::Result<CompiledModule, Diagnostics> {
    let mut diags = Diagnostics(Vec::new());
    let mut descriptors: Vec<(&str, &Library)> = Vec::new();
    let mut forwards: BTreeSet<String> = BTreeSet::new();
    let mut interfaces: BTreeMap<&str, (&str, &Interface)> = BTreeMap::new();

    for (unit, file) in units {
        for item in &file.items {
            match item {
                Item::Library(lib) => descriptors.push((unit.as_str(), lib)),
                Item::Forward(fwd) => {
                    forwards.insert(fwd.name.clone());
                }
                Item::Interface(iface) => {
                    let name = iface.name.as_str();
                    if is_root(name) || interfaces.contains_key(name) {
                        diags.push(Some(unit.as_str()), IdlError::duplicate(name));
                    } else {
                        interfaces.insert(name, (unit.as_str(), iface));
                    }
                }
            }
        }
    }

    let descriptor = match descriptors.as_slice() {
        [] => {
            diags.push(None, IdlError::semantic("module descriptor (library) is missing"));
            None
        }
        [(unit, lib)] => match analyze_descriptor(lib) {
            Ok(d) => Some(d),
            Err(e) => {
                diags.push(Some(*unit), e);
                None
            }
        },
        [_, rest @ ..] => {
            for (unit, lib) in rest {
                diags.push(Some(*unit), IdlError::duplicate(format!("library {}", lib.name)));
            }
            None
        }
    };

    let mut slot_counts: HashMap<String, u16> = ROOT_INTERFACES
        .iter()
        .map(|(name, slots)| (name.to_string(), *slots))
        .collect();

    let mut compiled = Vec::new();
    for (name, (unit, iface)) in &interfaces {
        let scope = Scope {
            interfaces: &interfaces,
            forwards: &forwards,
        };
        let result = scope
            .first_slot(name, &mut slot_counts, &mut Vec::new())
            .and_then(|first_slot| analyze_interface(iface, first_slot, &scope));
        match result {
            Ok(ci) => compiled.push(ci),
            Err(e) => diags.push(Some(*unit), e),
        }
    }

    match descriptor {
        Some(descriptor) if diags.is_empty() => {
            let opaque = forwards
                .into_iter()
                .filter(|f| !interfaces.contains_key(f.as_str()))
                .collect();
            Ok(CompiledModule {
                descriptor,
                interfaces: compiled,
                opaque,
            })
        }
        _ => Err(diags),
    }
}

fn is_root(name: &str) -> bool {
    ROOT_INTERFACES.iter().any(|(root, _)| *root == name)
}

fn analyze_descriptor(lib: &Library) -> Result<ModuleDescriptor> {
    let target = format!("library {}", lib.name);
    let mut version = None;
    let mut os_build = None;
    let mut interface_version = None;

    for attr in &lib.attrs {
        match attr {
            Attribute::Version(major, minor) => version = Some((*major, *minor)),
            Attribute::Build(n) => os_build = Some(*n),
            Attribute::InterfaceVersion(n) => interface_version = Some(*n),
            other => {
                return Err(IdlError::semantic(format!(
                    "attribute {:?} is not valid on {}",
                    other, target
                )))
            }
        }
    }

    Ok(ModuleDescriptor {
        name: lib.name.clone(),
        version: version.ok_or_else(|| IdlError::missing_attribute("version", &target))?,
        os_build: os_build.ok_or_else(|| IdlError::missing_attribute("build", &target))?,
        interface_version: interface_version
            .ok_or_else(|| IdlError::missing_attribute("interface_version", &target))?,
    })
}

/// Names visible to every unit of the module
struct Scope<'s, 'a> {
    interfaces: &'s BTreeMap<&'a str, (&'a str, &'a Interface)>,
    forwards: &'s BTreeSet<String>,
}

impl Scope<'_, '_> {
    fn is_interface(&self, name: &str) -> bool {
        is_root(name) || self.interfaces.contains_key(name) || self.forwards.contains(name)
    }

    /// Slot of the first method declared by `name`, resolving the base chain.
    fn first_slot(
        &self,
        name: &str,
        slot_counts: &mut HashMap<String, u16>,
        chain: &mut Vec<String>,
    ) -> Result<u16> {
        let (_, iface) = self
            .interfaces
            .get(name)
            .ok_or_else(|| IdlError::undefined_type(name, "base interface chain"))?;

        let base = iface.base.as_deref().ok_or_else(|| {
            IdlError::semantic(format!("interface {} must derive from IUnknown", name))
        })?;

        if chain.iter().any(|c| c == name) {
            return Err(IdlError::semantic(format!(
                "interface {} inherits from itself",
                name
            )));
        }

        if let Some(count) = slot_counts.get(base) {
            return Ok(*count);
        }

        if !self.interfaces.contains_key(base) {
            let context = if self.forwards.contains(base) {
                format!("base of {} (forward declarations have no layout)", name)
            } else {
                format!("base of {}", name)
            };
            return Err(IdlError::undefined_type(base, context));
        }

        chain.push(name.to_string());
        let base_first = self.first_slot(base, slot_counts, chain)?;
        chain.pop();

        let (_, base_iface) = self.interfaces[base];
        let total = slot_offset(base_first, base_iface.methods.len())
            .ok_or_else(|| IdlError::semantic(format!("too many vtable slots in base of {}", name)))?;
        slot_counts.insert(base.to_string(), total);
        Ok(total)
    }

    fn check_type(&self, ty: &Type, context: &str) -> Result<()> {
        if PRIMITIVE_TYPES.contains(&ty.name.as_str()) {
            return Ok(());
        }
        if self.is_interface(&ty.name) {
            if ty.is_pointer() {
                return Ok(());
            }
            return Err(IdlError::semantic(format!(
                "interface type {} must be passed by pointer in {}",
                ty.name, context
            )));
        }
        Err(IdlError::undefined_type(&ty.name, context))
    }
}

/// `first + count`, or `None` past the last addressable slot
fn slot_offset(first: u16, count: usize) -> Option<u16> {
    u16::try_from(count).ok().and_then(|count| first.checked_add(count))
}

fn analyze_interface(iface: &Interface, first_slot: u16, scope: &Scope<'_, '_>) -> Result<CompiledInterface> {
    let target = format!("interface {}", iface.name);

    if !iface.is_object() {
        return Err(IdlError::missing_attribute("object", &target));
    }

    let uuid = iface
        .uuid()
        .ok_or_else(|| IdlError::missing_attribute("uuid", &target))?;
    let iid: Guid = uuid.parse()?;
    if iid.is_nil() {
        return Err(IdlError::PlaceholderIdentifier {
            interface: iface.name.clone(),
        });
    }

    let mut seen = BTreeSet::new();
    let mut methods = Vec::with_capacity(iface.methods.len());

    for (index, method) in iface.methods.iter().enumerate() {
        let context = format!("{}::{}", iface.name, method.name);
        if !seen.insert(method.name.as_str()) {
            return Err(IdlError::duplicate(context));
        }

        scope.check_type(&method.return_type, &context)?;

        let mut param_names = BTreeSet::new();
        let mut params = Vec::with_capacity(method.params.len());
        for param in &method.params {
            let param_context = format!("{}({})", context, param.name);
            if !param_names.insert(param.name.as_str()) {
                return Err(IdlError::duplicate(param_context));
            }
            if param.ty.is_void() {
                return Err(IdlError::semantic(format!("void parameter in {}", param_context)));
            }
            scope.check_type(&param.ty, &param_context)?;

            let direction = param.direction();
            if direction != ParamDirection::In && !param.ty.is_pointer() {
                return Err(IdlError::semantic(format!(
                    "[out] parameter must be a pointer in {}",
                    param_context
                )));
            }

            params.push(CompiledParam {
                name: param.name.clone(),
                ty: param.ty.clone(),
                direction,
            });
        }

        methods.push(CompiledMethod {
            name: method.name.clone(),
            slot: slot_offset(first_slot, index)
                .ok_or_else(|| IdlError::semantic(format!("too many vtable slots in {}", context)))?,
            return_type: method.return_type.clone(),
            params,
        });
    }

    Ok(CompiledInterface {
        name: iface.name.clone(),
        iid,
        base: iface.base.clone().unwrap_or_default(),
        first_slot,
        methods,
    })
}
