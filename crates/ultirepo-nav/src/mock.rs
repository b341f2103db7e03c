//! Mock source fetcher for testing.
//!
//! Provides [`MockFetcher`] for exercising include handlers without git or
//! network access.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FetchError;
use crate::fetch::SourceFetcher;

/// Fetcher that maps repository URLs to prepared local directories.
///
/// # Example
///
/// ```ignore
/// use ultirepo_nav::{MockFetcher, SourceFetcher};
///
/// let fetcher = MockFetcher::new()
///     .with_repo("https://example.com/org/repo.git", "/tmp/repo");
///
/// let dir = fetcher.fetch("https://example.com/org/repo.git", "main")?;
/// assert_eq!(fetcher.calls(), vec![("https://example.com/org/repo.git".into(), "main".into())]);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    repos: HashMap<String, PathBuf>,
    calls: RwLock<Vec<(String, String)>>,
}

impl MockFetcher {
    /// Create a fetcher with no repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `url` from `dir`.
    #[must_use]
    pub fn with_repo(mut self, url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.repos.insert(url.into(), dir.into());
        self
    }

    /// Recorded `(locator, revision)` pairs, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.read().unwrap().clone()
    }
}

impl SourceFetcher for MockFetcher {
    fn fetch(&self, locator: &str, revision: &str) -> Result<PathBuf, FetchError> {
        self.calls
            .write()
            .unwrap()
            .push((locator.to_owned(), revision.to_owned()));

        self.repos
            .get(locator)
            .cloned()
            .ok_or_else(|| FetchError::InvalidRemote {
                url: locator.to_owned(),
                message: "repository not registered with MockFetcher".to_owned(),
            })
    }
}
