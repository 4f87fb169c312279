// Error types for the resolver bridge

use std::path::PathBuf;
use thiserror::Error;

/// Failures contained inside the resolver bridge.
///
/// None of these cross the host boundary from the top-level entry points:
/// callers of [`crate::YoutubeResolver`] observe only fallback values
/// (unchanged input, empty string, empty sequence) plus log entries.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Network failure while fetching an archive or a page
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed or unreadable zip archive
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetch/extract finished but the package tree is unusable
    #[error("provisioning failed for {}: {}", .path.display(), .reason)]
    Provisioning { path: PathBuf, reason: String },

    /// Runtime probe, driver render, or import check failed during session startup
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    /// A single resolve invocation raised inside the runtime
    #[error("resolver call failed: {0}")]
    Call(String),

    /// Driver produced output the host could not decode
    #[error("parse error: {0}")]
    Parse(String),
}

impl ResolveError {
    /// Category label used in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Archive(_) => "archive",
            Self::Io(_) => "io",
            Self::Provisioning { .. } => "provisioning",
            Self::Bootstrap(_) => "bootstrap",
            Self::Call(_) => "call",
            Self::Parse(_) => "parse",
        }
    }
}
