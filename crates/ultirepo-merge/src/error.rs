//! Merge error types.

use std::io;
use std::path::{Path, PathBuf};

/// Error returned by [`Merger::merge`](crate::Merger::merge).
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The destination holds files that a previous merge did not write.
    #[error(
        "Destination {} is not empty and was not created by a previous merge",
        .0.display()
    )]
    DestinationNotEmpty(PathBuf),

    /// A provenance alias would place files outside the destination.
    #[error(
        "Include alias '{}' must be a relative path of plain directory names",
        .0.display()
    )]
    InvalidAlias(PathBuf),
}

impl MergeError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
