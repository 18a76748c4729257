//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use vdesk_interop::{
    BindingConfig, BindingProvider, BuildNumber, EmbeddedTemplates, FixedBuild, Guid, IidTable,
    ModuleVersion, SearchPath, Synthesizer, TemplateStore,
};

pub const IID_VIRTUAL_DESKTOP: &str = "3f07f4be-b107-441a-af0f-39d82529072c";
pub const IID_PINNED_APPS: &str = "4ce81583-1e4c-4632-a621-07a53543148f";

static INIT: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn iid(s: &str) -> Guid {
    s.parse().expect("valid IID")
}

/// Lookup that resolves exactly two interfaces
pub fn two_interfaces() -> IidTable {
    IidTable::new()
        .with("IVirtualDesktop", iid(IID_VIRTUAL_DESKTOP))
        .with("IVirtualDesktopPinnedApps", iid(IID_PINNED_APPS))
}

pub fn synthesizer() -> Synthesizer {
    Synthesizer::new(Arc::new(two_interfaces()), Arc::new(EmbeddedTemplates))
}

pub fn synthesizer_with(templates: impl TemplateStore + 'static) -> Synthesizer {
    Synthesizer::new(Arc::new(two_interfaces()), Arc::new(templates))
}

/// Provider that only ever looks at `dirs` and writes to `cache_dir`
pub fn provider(cache_dir: &Path, dirs: &[&Path], build: u32, synthesizer: Synthesizer) -> BindingProvider {
    let config = BindingConfig::new().with_override_dir(cache_dir);
    let search: SearchPath = dirs.iter().map(|d| d.to_path_buf()).collect();
    BindingProvider::new(&config, Arc::new(FixedBuild::new(build)), synthesizer).with_search_path(search)
}

/// Synthesize a valid artifact into `dir` and return its path
pub fn write_artifact(dir: &Path, build: u32, version: ModuleVersion) -> PathBuf {
    synthesizer()
        .with_module_version(version)
        .synthesize(BuildNumber(build), dir)
        .expect("synthesis succeeds")
        .path
}

/// Every file in `dir`, sorted
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("readable directory")
        .map(|e| e.expect("directory entry").path())
        .collect();
    files.sort();
    files
}
