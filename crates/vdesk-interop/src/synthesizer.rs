//! Binding synthesis
//!
//! Runs after the locator finds nothing usable:
//!
//! 1. Resolve the interface version for the build
//! 2. Enumerate the interfaces registered for that version
//! 3. Resolve their IIDs, dropping names that have none
//! 4. Render the module descriptor
//! 5. Select templates for exactly that version and substitute the IIDs
//! 6. Compile every unit into one module
//! 7. Persist the encoded artifact and load it back
//!
//! A failed compile writes nothing and leaves existing artifacts alone.

use crate::artifact::{self, LoadedBinding, ModuleVersion, MODULE_VERSION};
use crate::error::{InteropError, Result};
use crate::lookup::IidLookup;
use crate::registry::{InterfaceRegistry, SHELL_INTERFACES};
use crate::templates::{self, TemplateName, TemplateStore, DESCRIPTOR};
use crate::version::{BuildNumber, InterfaceVersion, VersionResolver};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vdesk_idl::{CompiledModule, SourceUnit};

/// Source units ready for compilation
#[derive(Clone, Debug)]
pub struct CompileSet {
    pub version: InterfaceVersion,
    /// Descriptor first, then interfaces in template name order
    pub units: Vec<SourceUnit>,
}

impl CompileSet {
    /// Number of interface units, excluding the descriptor
    pub fn interface_count(&self) -> usize {
        self.units.len().saturating_sub(1)
    }
}

/// Produces binding artifacts from templates
#[derive(Clone)]
pub struct Synthesizer {
    resolver: VersionResolver,
    registry: InterfaceRegistry,
    lookup: Arc<dyn IidLookup>,
    templates: Arc<dyn TemplateStore>,
    module_version: ModuleVersion,
}

impl Synthesizer {
    pub fn new(lookup: Arc<dyn IidLookup>, templates: Arc<dyn TemplateStore>) -> Self {
        Self {
            resolver: VersionResolver::default(),
            registry: SHELL_INTERFACES,
            lookup,
            templates,
            module_version: MODULE_VERSION,
        }
    }

    pub fn with_resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_registry(mut self, registry: InterfaceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Stamp produced modules with a different version
    pub fn with_module_version(mut self, version: ModuleVersion) -> Self {
        self.module_version = version;
        self
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// Gather and substitute every source unit for `build`
    pub fn compile_set(&self, build: BuildNumber) -> Result<CompileSet> {
        let version = self.resolver.resolve(build)?;
        info!("build {} uses interface version {}", build, version);

        let names = self.registry.interfaces_for(version);
        let iids = self.lookup.lookup(names);
        for name in names.iter().filter(|n| !iids.contains_key(**n)) {
            debug!("no IID for {} at version {}, dropping it", name, version);
        }

        let descriptor = self
            .templates
            .get(DESCRIPTOR)
            .ok_or_else(|| InteropError::TemplateMissing(DESCRIPTOR.to_string()))?;
        let mut units = vec![SourceUnit::new(
            "ModuleDescriptor",
            templates::render_descriptor(&descriptor, self.module_version, build, version),
        )];

        for resource in self.templates.names() {
            let Some(template) = TemplateName::parse(&resource) else {
                continue;
            };
            if template.version != version {
                continue;
            }
            let Some(iid) = iids.get(&template.interface) else {
                continue;
            };
            let text = self
                .templates
                .get(&resource)
                .ok_or_else(|| InteropError::TemplateMissing(resource.clone()))?;
            debug!("using {} with IID {}", resource, iid);
            units.push(SourceUnit::new(
                template.interface.clone(),
                templates::substitute_iid(&resource, &text, *iid),
            ));
        }

        let set = CompileSet { version, units };
        if set.interface_count() == 0 {
            return Err(InteropError::NoCompilableInterfaces { version: version.get() });
        }
        Ok(set)
    }

    /// Compile the module for `build` without writing anything
    pub fn compile(&self, build: BuildNumber) -> Result<CompiledModule> {
        let set = self.compile_set(build)?;
        let module = vdesk_idl::compile(&set.units).map_err(|diags| {
            warn!("compiling {} units for build {} failed with {} error(s)", set.units.len(), build, diags.len());
            InteropError::from(diags)
        })?;
        info!("compiled {} interfaces for build {}", module.interfaces.len(), build);
        Ok(module)
    }

    /// Compile, persist into `cache_dir` and load the artifact for `build`
    pub fn synthesize(&self, build: BuildNumber, cache_dir: &Path) -> Result<LoadedBinding> {
        // cache_dir is untouched until compilation succeeds
        let module = self.compile(build)?;

        let bytes = artifact::encode(&module)?;
        let path = artifact::persist(cache_dir, build, &bytes)?;

        let loaded = match LoadedBinding::open(&path) {
            Ok(loaded) => loaded,
            Err(e) => {
                remove_output(&path);
                return Err(e);
            }
        };
        if loaded.header.os_build != build {
            remove_output(&path);
            return Err(InteropError::DescriptorMismatch {
                expected: build.to_string(),
                found: loaded.header.os_build.to_string(),
            });
        }

        info!("synthesized binding {}", path.display());
        Ok(loaded)
    }

    /// Rust vtable definitions for `build`
    pub fn generate_rust(&self, build: BuildNumber) -> Result<String> {
        let module = self.compile(build)?;
        vdesk_idl::codegen::generate(&module).map_err(|e| InteropError::CompilationFailed {
            diagnostics: vec![e.to_string()],
        })
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("resolver", &self.resolver)
            .field("registry", &self.registry)
            .field("module_version", &self.module_version)
            .finish_non_exhaustive()
    }
}

fn remove_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::IidTable;
    use crate::templates::{EmbeddedTemplates, MemoryTemplates};
    use vdesk_idl::Guid;

    fn iid(s: &str) -> Guid {
        s.parse().unwrap()
    }

    fn two_interfaces() -> IidTable {
        IidTable::new()
            .with("IVirtualDesktop", iid("3f07f4be-b107-441a-af0f-39d82529072c"))
            .with("IVirtualDesktopPinnedApps", iid("4ce81583-1e4c-4632-a621-07a53543148f"))
    }

    fn synthesizer(lookup: IidTable) -> Synthesizer {
        Synthesizer::new(Arc::new(lookup), Arc::new(EmbeddedTemplates))
    }

    #[test]
    fn test_compile_set_selects_exact_version() {
        let set = synthesizer(two_interfaces()).compile_set(BuildNumber(22631)).unwrap();
        assert_eq!(set.version, InterfaceVersion(22449));
        assert_eq!(set.interface_count(), 2);
        assert_eq!(set.units[0].name, "ModuleDescriptor");
        assert!(set.units[0].text.contains("build(22631)"));
        assert!(set.units[0].text.contains("interface_version(22449)"));
        assert!(set.units.iter().all(|u| !u.text.contains(templates::PLACEHOLDER_IID)));
    }

    #[test]
    fn test_compile_assigns_resolved_iids() {
        let module = synthesizer(two_interfaces()).compile(BuildNumber(21500)).unwrap();
        assert_eq!(module.descriptor.interface_version, 21313);
        assert_eq!(module.interfaces.len(), 2);

        let desktop = module.interface("IVirtualDesktop").unwrap();
        assert_eq!(desktop.iid, iid("3f07f4be-b107-441a-af0f-39d82529072c"));
        assert_eq!(desktop.first_slot, 3);
        assert!(module.opaque.contains(&"IVirtualDesktopManagerInternal".to_string()));
    }

    #[test]
    fn test_every_version_compiles_with_all_interfaces() {
        let mut table = IidTable::new();
        for name in SHELL_INTERFACES.interfaces_for(InterfaceVersion(22449)) {
            table.insert(*name, Guid::new_v4());
        }
        let synth = synthesizer(table);
        for build in [10240, 19045, 20231, 21313, 22000, 22631] {
            let module = synth.compile(BuildNumber(build)).unwrap();
            assert_eq!(module.interfaces.len(), 5, "build {}", build);
        }
    }

    #[test]
    fn test_no_resolvable_iids_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = synthesizer(IidTable::new())
            .synthesize(BuildNumber(22631), dir.path())
            .unwrap_err();
        assert!(matches!(err, InteropError::NoCompilableInterfaces { version: 22449 }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_below_floor_is_an_error() {
        let err = synthesizer(two_interfaces()).compile(BuildNumber(9000)).unwrap_err();
        assert!(matches!(err, InteropError::NoSupportedVersion { build: 9000 }));
    }

    #[test]
    fn test_missing_descriptor() {
        let mut store = MemoryTemplates::from_store(&EmbeddedTemplates);
        store.remove(DESCRIPTOR);
        let synth = Synthesizer::new(Arc::new(two_interfaces()), Arc::new(store));
        let err = synth.compile(BuildNumber(22631)).unwrap_err();
        assert!(matches!(err, InteropError::TemplateMissing(_)));
    }

    #[test]
    fn test_synthesize_writes_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = synthesizer(two_interfaces())
            .synthesize(BuildNumber(22631), dir.path())
            .unwrap();

        assert_eq!(loaded.path, dir.path().join("VirtualDesktop.22631.generated.binding"));
        assert_eq!(loaded.header.module_version, MODULE_VERSION);
        assert_eq!(loaded.module.interfaces.len(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_compile_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryTemplates::from_store(&EmbeddedTemplates);
        store.insert(
            "Build22449.IVirtualDesktop.idl",
            "[object, uuid(00000000-0000-0000-0000-000000000000)]\ninterface IVirtualDesktop : IUnknown {\n    HRESULT GetId([out] GUID* id)\n}\n",
        );
        let synth = Synthesizer::new(Arc::new(two_interfaces()), Arc::new(store));

        let err = synth.synthesize(BuildNumber(22631), dir.path()).unwrap_err();
        match err {
            InteropError::CompilationFailed { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert!(diagnostics[0].starts_with("IVirtualDesktop: "));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_compile_keeps_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let good = synthesizer(two_interfaces())
            .synthesize(BuildNumber(22631), dir.path())
            .unwrap();
        let before = std::fs::read(&good.path).unwrap();

        let mut store = MemoryTemplates::from_store(&EmbeddedTemplates);
        store.insert("Build22449.IVirtualDesktop.idl", "interface IVirtualDesktop : IUnknown {");
        let broken = Synthesizer::new(Arc::new(two_interfaces()), Arc::new(store));

        let err = broken.synthesize(BuildNumber(22631), dir.path()).unwrap_err();
        assert!(matches!(err, InteropError::CompilationFailed { .. }));
        assert_eq!(std::fs::read(&good.path).unwrap(), before);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_generate_rust() {
        let code = synthesizer(two_interfaces()).generate_rust(BuildNumber(22631)).unwrap();
        assert!(code.contains("pub const INTERFACE_VERSION: u32 = 22449"));
        assert!(code.contains("pub struct IVirtualDesktopPinnedApps_Vtbl"));
        assert!(code.contains("IID_IVIRTUALDESKTOP"));
    }
}
