//! Binding cache configuration
//!
//! ## Search order (highest to lowest)
//!
//! 1. Override directory, when configured
//! 2. Current working directory
//! 3. Directory of the running executable
//! 4. Default data directory (`<local data>/VirtualDesktop/bindings`)
//!
//! Newly synthesized bindings are written to the override directory when
//! one is set, otherwise to the default data directory.

use crate::locator::SearchPath;
use std::path::{Path, PathBuf};

/// Per-user directory that holds synthesized bindings
///
/// Returns `%LOCALAPPDATA%\VirtualDesktop\bindings` on Windows and
/// `~/.local/share/VirtualDesktop/bindings` on Linux.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("VirtualDesktop")
        .join("bindings")
}

/// Binding provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingConfig {
    /// Directory searched first and written to instead of the default
    pub override_dir: Option<PathBuf>,
}

impl BindingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.override_dir = Some(dir.into());
        self
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Directory new artifacts are persisted to
    pub fn cache_dir(&self) -> PathBuf {
        self.override_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Prioritized directories the locator scans
    pub fn search_path(&self) -> SearchPath {
        SearchPath::standard(self.override_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BindingConfig::default();
        assert!(config.override_dir().is_none());
        assert_eq!(config.cache_dir(), default_data_dir());
        assert!(default_data_dir().ends_with("VirtualDesktop/bindings"));
    }

    #[test]
    fn test_override_dir_comes_first() {
        let config = BindingConfig::new().with_override_dir("/tmp/vdesk-override");
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/vdesk-override"));

        let search = config.search_path();
        assert_eq!(search.dirs()[0], PathBuf::from("/tmp/vdesk-override"));
        assert_eq!(search.dirs().last(), Some(&default_data_dir()));
    }
}
