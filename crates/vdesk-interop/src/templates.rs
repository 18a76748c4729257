//! Interface definition templates
//!
//! Templates are IDL sources named `Build<version>.<Interface>.idl`. Each one
//! declares its interface with the placeholder identifier, which is replaced
//! with the IID resolved for the running system before compilation. The
//! module descriptor template is always compiled and carries markers for the
//! live module version, OS build and interface version.

use crate::artifact::ModuleVersion;
use crate::version::{BuildNumber, InterfaceVersion};
use std::collections::BTreeMap;
use tracing::warn;
use vdesk_idl::Guid;

/// Resource name of the module descriptor template
pub const DESCRIPTOR: &str = "ModuleDescriptor.idl";

/// Identifier every interface template is written with
pub const PLACEHOLDER_IID: &str = "00000000-0000-0000-0000-000000000000";

pub const MODULE_VERSION_MARKER: &str = "$MODULE_VERSION$";
pub const OS_BUILD_MARKER: &str = "$OS_BUILD$";
pub const INTERFACE_VERSION_MARKER: &str = "$INTERFACE_VERSION$";

/// Source of raw template text, enumerable by resource name
pub trait TemplateStore: Send + Sync {
    /// Every resource name, in ascending order
    fn names(&self) -> Vec<String>;

    fn get(&self, name: &str) -> Option<String>;
}

/// Version and interface encoded in a template resource name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateName {
    pub version: InterfaceVersion,
    pub interface: String,
}

impl TemplateName {
    /// Parse `Build<version>.<Interface>.idl`
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("Build")?.strip_suffix(".idl")?;
        let (digits, interface) = rest.split_once('.')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if interface.is_empty() || interface.contains('.') {
            return None;
        }
        Some(Self {
            version: InterfaceVersion(digits.parse().ok()?),
            interface: interface.to_string(),
        })
    }

    pub fn file_name(&self) -> String {
        format!("Build{}.{}.idl", self.version, self.interface)
    }
}

/// Fill the descriptor markers with live values
pub fn render_descriptor(
    text: &str,
    module_version: ModuleVersion,
    build: BuildNumber,
    interface_version: InterfaceVersion,
) -> String {
    text.replace(MODULE_VERSION_MARKER, &module_version.to_string())
        .replace(OS_BUILD_MARKER, &build.to_string())
        .replace(INTERFACE_VERSION_MARKER, &interface_version.to_string())
}

/// Replace the placeholder identifier with `iid`
pub fn substitute_iid(name: &str, text: &str, iid: Guid) -> String {
    if !text.contains(PLACEHOLDER_IID) {
        warn!("template {} has no placeholder identifier", name);
    }
    text.replace(PLACEHOLDER_IID, &iid.to_string())
}

macro_rules! embedded {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../templates/", $name)))),*]
    };
}

/// Templates compiled into the crate
static EMBEDDED: &[(&str, &str)] = embedded![
    "Build10240.IVirtualDesktop.idl",
    "Build10240.IVirtualDesktopManagerInternal.idl",
    "Build10240.IVirtualDesktopNotification.idl",
    "Build10240.IVirtualDesktopNotificationService.idl",
    "Build10240.IVirtualDesktopPinnedApps.idl",
    "Build20231.IVirtualDesktop.idl",
    "Build20231.IVirtualDesktopManagerInternal.idl",
    "Build20231.IVirtualDesktopNotification.idl",
    "Build20231.IVirtualDesktopNotificationService.idl",
    "Build20231.IVirtualDesktopPinnedApps.idl",
    "Build21313.IVirtualDesktop.idl",
    "Build21313.IVirtualDesktopManagerInternal.idl",
    "Build21313.IVirtualDesktopNotification.idl",
    "Build21313.IVirtualDesktopNotificationService.idl",
    "Build21313.IVirtualDesktopPinnedApps.idl",
    "Build22449.IVirtualDesktop.idl",
    "Build22449.IVirtualDesktopManagerInternal.idl",
    "Build22449.IVirtualDesktopNotification.idl",
    "Build22449.IVirtualDesktopNotificationService.idl",
    "Build22449.IVirtualDesktopPinnedApps.idl",
    "ModuleDescriptor.idl",
];

/// Templates shipped inside the binary
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedTemplates;

impl TemplateStore for EmbeddedTemplates {
    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = EMBEDDED.iter().map(|(n, _)| n.to_string()).collect();
        names.sort();
        names
    }

    fn get(&self, name: &str) -> Option<String> {
        EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| text.to_string())
    }
}

/// Mutable in-memory template set
#[derive(Clone, Debug, Default)]
pub struct MemoryTemplates {
    templates: BTreeMap<String, String>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every template of `store`
    pub fn from_store(store: &dyn TemplateStore) -> Self {
        let mut templates = BTreeMap::new();
        for name in store.names() {
            if let Some(text) = store.get(&name) {
                templates.insert(name, text);
            }
        }
        Self { templates }
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.templates.insert(name.into(), text.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.templates.remove(name)
    }
}

impl TemplateStore for MemoryTemplates {
    fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<String> {
        self.templates.get(name).cloned()
    }
}
