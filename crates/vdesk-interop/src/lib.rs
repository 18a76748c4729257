//! Version-matched bindings for the virtual desktop COM interfaces
//!
//! The shell's virtual desktop interfaces are undocumented and change layout
//! (and IID) between OS builds. This crate picks the interface version for
//! the running build, looks for a previously synthesized binding on disk and
//! otherwise compiles one from the embedded templates and caches it, so the
//! expensive path runs at most once per build.
//!
//! # Components
//!
//! - [`VersionResolver`]: build number to interface version
//! - [`Locator`]: finds a trusted artifact across prioritized directories
//! - [`Synthesizer`]: templates plus IIDs to a compiled, persisted artifact
//! - [`BindingProvider`]: ties the above together
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vdesk_interop::{BindingConfig, BindingProvider, EmbeddedTemplates, FixedBuild, IidTable, Synthesizer};
//!
//! let iids = IidTable::new().with("IVirtualDesktop", "3f07f4be-b107-441a-af0f-39d82529072c".parse()?);
//! let synthesizer = Synthesizer::new(Arc::new(iids), Arc::new(EmbeddedTemplates));
//! let provider = BindingProvider::new(&BindingConfig::default(), Arc::new(FixedBuild::new(22631)), synthesizer);
//!
//! let binding = provider.binding()?;
//! println!("{:?} from {}", binding.origin, binding.artifact.path.display());
//! ```

pub mod artifact;
pub mod config;
mod error;
pub mod locator;
pub mod lookup;
pub mod os_build;
pub mod provider;
pub mod registry;
pub mod synthesizer;
pub mod templates;
pub mod version;
#[cfg(windows)]
mod winreg;

pub use artifact::{
    ArtifactHeader, BindingArtifact, LoadedBinding, ModuleVersion, MIN_REQUIRED_VERSION, MODULE_VERSION,
};
pub use config::{default_data_dir, BindingConfig};
pub use error::{InteropError, Result};
pub use locator::{Locator, SearchPath};
pub use lookup::{IidLookup, IidTable};
pub use os_build::{BuildSource, FixedBuild};
pub use provider::{Binding, BindingProvider, Origin};
pub use registry::{InterfaceRegistry, SHELL_INTERFACES};
pub use synthesizer::{CompileSet, Synthesizer};
pub use templates::{EmbeddedTemplates, MemoryTemplates, TemplateStore};
pub use version::{BuildNumber, InterfaceVersion, VersionResolver, KNOWN_VERSIONS};

#[cfg(windows)]
pub use lookup::RegistryIidLookup;
#[cfg(windows)]
pub use os_build::WindowsBuild;

pub use vdesk_idl::{CompiledModule, Guid};
