//! Top-level binding provider
//!
//! Answers "give me a usable binding for this machine". A cached artifact
//! is always preferred; synthesis runs only after every search directory
//! came up empty. Nothing is remembered between calls except what is on
//! disk.

use crate::artifact::BindingArtifact;
use crate::config::BindingConfig;
use crate::error::Result;
use crate::locator::{Locator, SearchPath};
use crate::os_build::BuildSource;
use crate::synthesizer::Synthesizer;
use crate::version::BuildNumber;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vdesk_idl::CompiledModule;

/// How a binding was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Loaded from an existing artifact
    Cached,
    /// Compiled during this call
    Synthesized,
}

/// Loaded binding plus where it came from
#[derive(Clone, Debug)]
pub struct Binding {
    pub artifact: BindingArtifact,
    pub module: CompiledModule,
    pub origin: Origin,
}

impl Binding {
    pub fn build(&self) -> BuildNumber {
        self.artifact.build
    }

    pub fn is_cached(&self) -> bool {
        self.origin == Origin::Cached
    }
}

pub struct BindingProvider {
    build_source: Arc<dyn BuildSource>,
    locator: Locator,
    synthesizer: Synthesizer,
    search_path: SearchPath,
    cache_dir: PathBuf,
    // Serializes synthesis within the process
    synth_lock: Mutex<()>,
}

impl BindingProvider {
    pub fn new(config: &BindingConfig, build_source: Arc<dyn BuildSource>, synthesizer: Synthesizer) -> Self {
        Self {
            build_source,
            locator: Locator::new(),
            synthesizer,
            search_path: config.search_path(),
            cache_dir: config.cache_dir(),
            synth_lock: Mutex::new(()),
        }
    }

    /// Provider wired to the registry and the embedded templates
    #[cfg(windows)]
    pub fn for_current_system(config: &BindingConfig) -> Self {
        use crate::lookup::RegistryIidLookup;
        use crate::os_build::WindowsBuild;
        use crate::templates::EmbeddedTemplates;

        let synthesizer = Synthesizer::new(Arc::new(RegistryIidLookup), Arc::new(EmbeddedTemplates));
        Self::new(config, Arc::new(WindowsBuild), synthesizer)
    }

    /// Replace the directories searched.
    ///
    /// The cache directory is appended when missing so a synthesized
    /// artifact is always found again.
    pub fn with_search_path(mut self, mut search_path: SearchPath) -> Self {
        search_path.push(self.cache_dir.clone());
        self.search_path = search_path;
        self
    }

    pub fn with_locator(mut self, locator: Locator) -> Self {
        self.locator = locator;
        self
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn cache_dir(&self) -> &std::path::Path {
        &self.cache_dir
    }

    /// Binding for the running build, synthesizing it on a cache miss
    pub fn binding(&self) -> Result<Binding> {
        let build = self.build_source.build_number()?;
        // Fail fast below the floor, before touching the disk
        self.synthesizer.resolver().resolve(build)?;

        if let Some(binding) = self.cached(build) {
            return Ok(binding);
        }

        let _guard = self.synth_lock.lock();
        // Another thread may have finished while we waited
        if let Some(binding) = self.cached(build) {
            return Ok(binding);
        }

        info!("no usable binding for build {}, synthesizing into {}", build, self.cache_dir.display());
        let loaded = self.synthesizer.synthesize(build, &self.cache_dir)?;
        Ok(Binding {
            artifact: loaded.artifact(),
            module: loaded.module,
            origin: Origin::Synthesized,
        })
    }

    fn cached(&self, build: BuildNumber) -> Option<Binding> {
        let artifact = self.locator.find_existing(build, self.search_path.dirs())?;
        match artifact.load() {
            Ok(loaded) => {
                debug!("using cached binding {}", artifact.path.display());
                Some(Binding {
                    artifact,
                    module: loaded.module,
                    origin: Origin::Cached,
                })
            }
            Err(e) => {
                warn!("cached binding failed to load: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for BindingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingProvider")
            .field("locator", &self.locator)
            .field("synthesizer", &self.synthesizer)
            .field("search_path", &self.search_path)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}
