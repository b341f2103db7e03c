//! Source fetch abstraction.

use std::path::PathBuf;

use crate::error::FetchError;

/// Makes remote repository content available on local disk.
///
/// Implementations must be idempotent: fetching a locator that is already
/// present locally updates it to `revision` instead of fetching it again.
pub trait SourceFetcher: Send + Sync {
    /// Ensure a local directory holds `locator` at `revision`.
    ///
    /// # Arguments
    ///
    /// * `locator` - Repository URL without query parameters
    /// * `revision` - Branch, tag, or commit to check out
    ///
    /// Returns the local content directory.
    fn fetch(&self, locator: &str, revision: &str) -> Result<PathBuf, FetchError>;
}
