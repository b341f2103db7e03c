//! Error types for navigation resolution.

use std::fmt;
use std::path::PathBuf;

/// Error returned while resolving a navigation tree.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// A navigation node has an unsupported shape (e.g., a multi-key mapping).
    #[error("Malformed navigation node: {0}")]
    MalformedNode(String),

    /// An include payload is not a valid source locator.
    #[error("Invalid include locator: {0}")]
    InvalidLocator(String),

    /// A required locator query parameter is absent.
    #[error("Missing parameter '{name}' in include locator: {locator}")]
    MissingParameter {
        /// Parameter name (`ref` or `nav_path`).
        name: &'static str,
        /// The offending locator.
        locator: String,
    },

    /// `nav_path` must be a relative path inside the included content.
    #[error("Invalid nav_path '{0}': must be a relative path without '..'")]
    InvalidNavPath(String),

    /// No `nav.yml`/`nav.yaml` exists where `nav_path` points.
    #[error("Navigation file not found: {}", .0.display())]
    NavFileNotFound(PathBuf),

    /// The navigation file exists but could not be loaded.
    #[error("Failed to load navigation file {}: {kind}: {message}", path.display())]
    NavFileLoad {
        /// Path of the navigation file.
        path: PathBuf,
        /// Failure category.
        kind: LoadErrorKind,
        /// Underlying error message.
        message: String,
    },

    /// The source fetch collaborator failed.
    #[error("Failed to fetch include source: {0}")]
    Fetch(#[from] FetchError),

    /// No handler is registered for a marker.
    #[error("No include handler registered for marker '{0}'")]
    HandlerNotRegistered(String),
}

/// Category of a navigation file load failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// File does not exist.
    NotFound,
    /// File exists but cannot be read.
    PermissionDenied,
    /// Path exists but is a directory or other non-file.
    NotAFile,
    /// Content is not a valid navigation file.
    Decode,
    /// Any other I/O failure.
    Other,
}

impl LoadErrorKind {
    /// Classify an I/O error.
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::IsADirectory => Self::NotAFile,
            std::io::ErrorKind::InvalidData => Self::Decode,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::NotAFile => "not a file",
            Self::Decode => "decode error",
            Self::Other => "I/O error",
        };
        f.write_str(s)
    }
}

/// Error reported by a [`SourceFetcher`](crate::SourceFetcher).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The remote does not exist or is not a repository.
    #[error("Invalid remote '{url}': {message}")]
    InvalidRemote {
        /// Repository URL.
        url: String,
        /// Details from the backend.
        message: String,
    },

    /// The remote rejected the credentials.
    #[error("Authentication failed for '{url}': {message}")]
    AuthFailure {
        /// Repository URL.
        url: String,
        /// Details from the backend.
        message: String,
    },

    /// The revision does not exist in the repository.
    #[error("Revision '{revision}' not found in '{url}'")]
    RefNotFound {
        /// Repository URL.
        url: String,
        /// Requested revision.
        revision: String,
    },

    /// Network or backend failure.
    #[error("Transport error for '{url}': {message}")]
    Transport {
        /// Repository URL.
        url: String,
        /// Details from the backend.
        message: String,
    },

    /// Local filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned when registering an include handler.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The named handler kind does not exist.
    #[error("Handler '{handler}' bound to marker '{marker}' is not an include handler")]
    TypeMismatch {
        /// Marker being registered.
        marker: String,
        /// Requested handler kind.
        handler: String,
    },

    /// Markers must be non-empty and free of whitespace.
    #[error("Invalid include marker '{0}'")]
    InvalidMarker(String),
}
