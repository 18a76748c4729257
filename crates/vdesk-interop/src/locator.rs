//! Binding cache locator
//!
//! Finds an already synthesized artifact for the running build. Directories
//! are scanned in priority order and files inside a directory in
//! lexicographic name order; the first valid artifact wins. Any file that
//! cannot be validated is skipped, and the locator never writes.

use crate::artifact::{parse_file_name, ArtifactHeader, BindingArtifact, ModuleVersion, MIN_REQUIRED_VERSION};
use crate::config::default_data_dir;
use crate::error::{InteropError, Result};
use crate::version::BuildNumber;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ordered, duplicate-free list of directories to search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override, working directory, executable directory, default data directory
    pub fn standard(override_dir: Option<&Path>) -> Self {
        let mut path = Self::new();
        if let Some(dir) = override_dir {
            path.push(dir);
        }
        if let Ok(cwd) = std::env::current_dir() {
            path.push(cwd);
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            path.push(exe_dir);
        }
        path.push(default_data_dir());
        path
    }

    /// Append `dir` unless it is already present
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.dirs.contains(&dir) {
            self.dirs.push(dir);
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for SearchPath {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut path = Self::new();
        for dir in iter {
            path.push(dir);
        }
        path
    }
}

/// Scans directories for a trusted artifact
#[derive(Debug, Clone)]
pub struct Locator {
    min_version: ModuleVersion,
}

impl Locator {
    pub fn new() -> Self {
        Self {
            min_version: MIN_REQUIRED_VERSION,
        }
    }

    /// Locator with a different version floor
    pub fn with_min_version(min_version: ModuleVersion) -> Self {
        Self { min_version }
    }

    pub fn min_version(&self) -> ModuleVersion {
        self.min_version
    }

    /// First valid artifact for `build` across `dirs`, in order
    pub fn find_existing(&self, build: BuildNumber, dirs: &[PathBuf]) -> Option<BindingArtifact> {
        for dir in dirs {
            match self.scan_dir(build, dir) {
                Ok(Some(artifact)) => {
                    info!("found binding for build {} at {}", build, artifact.path.display());
                    return Some(artifact);
                }
                Ok(None) => {}
                Err(e) => debug!("skipping search directory: {}", e),
            }
        }

        debug!("no cached binding for build {} in {} directories", build, dirs.len());
        None
    }

    /// Scan one directory.
    ///
    /// Fails only with `MissingDirectory`; unreadable files are skipped.
    pub fn scan_dir(&self, build: BuildNumber, dir: &Path) -> Result<Option<BindingArtifact>> {
        let entries = std::fs::read_dir(dir).map_err(|_| InteropError::MissingDirectory(dir.to_path_buf()))?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| parse_file_name(name) == Some(build.0))
            .collect();
        names.sort();

        for name in names {
            let path = dir.join(&name);
            match self.check_candidate(build, &path) {
                Ok(artifact) => return Ok(Some(artifact)),
                Err(e) => debug!("skipping candidate: {}", e),
            }
        }

        Ok(None)
    }

    fn check_candidate(&self, build: BuildNumber, path: &Path) -> Result<BindingArtifact> {
        let header = ArtifactHeader::read(path)?;

        if header.os_build != build {
            return Err(InteropError::unreadable(
                path,
                format!("header names build {}, expected {}", header.os_build, build),
            ));
        }

        if header.module_version < self.min_version {
            return Err(InteropError::unreadable(
                path,
                format!(
                    "module version {} is below required {}",
                    header.module_version, self.min_version
                ),
            ));
        }

        Ok(BindingArtifact::from_header(path.to_path_buf(), &header))
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new()
    }
}
