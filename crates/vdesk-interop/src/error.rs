//! Binding cache error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for binding operations
pub type Result<T> = std::result::Result<T, InteropError>;

/// Errors raised while resolving, locating or synthesizing a binding
#[derive(Error, Debug)]
pub enum InteropError {
    /// Build number lies below every known interface version
    #[error("no supported interface version for OS build {build}")]
    NoSupportedVersion { build: u32 },

    /// Cached artifact could not be read or failed validation
    #[error("unreadable binding artifact {}: {reason}", .path.display())]
    UnreadableArtifact { path: PathBuf, reason: String },

    /// Search directory does not exist or cannot be listed
    #[error("missing directory: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// Interface templates failed to compile
    #[error("binding compilation failed:\n{}", .diagnostics.join("\n"))]
    CompilationFailed { diagnostics: Vec<String> },

    /// Nothing left to compile after IID resolution and template selection
    #[error("no compilable interfaces for interface version {version}")]
    NoCompilableInterfaces { version: u32 },

    /// Template store has no resource with this name
    #[error("template not found: {0}")]
    TemplateMissing(String),

    /// OS build number could not be determined
    #[error("OS build unavailable: {0}")]
    BuildUnavailable(String),

    /// Loaded module does not describe the expected build
    #[error("descriptor mismatch: expected {expected}, found {found}")]
    DescriptorMismatch { expected: String, found: String },

    /// Version boundary table is empty or not ascending
    #[error("invalid version table: {0}")]
    InvalidVersionTable(String),

    /// Buffer underflow (not enough data)
    #[error("buffer underflow: need {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// Malformed artifact content
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InteropError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnreadableArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub(crate) fn underflow(needed: usize, have: usize) -> Self {
        Self::BufferUnderflow { needed, have }
    }
}

impl From<vdesk_idl::Diagnostics> for InteropError {
    fn from(diags: vdesk_idl::Diagnostics) -> Self {
        Self::CompilationFailed {
            diagnostics: diags.messages(),
        }
    }
}
