//! Git-backed source fetching for ultirepo includes.
//!
//! [`GitFetcher`] implements [`SourceFetcher`](ultirepo_nav::SourceFetcher)
//! by cloning repositories into a cache directory and checking out the
//! requested revision. Repositories already present in the cache are updated
//! in place instead of cloned again.
//!
//! Network operations shell out to the `git` CLI so that the user's
//! credential helpers and SSH configuration apply. Local repository
//! inspection uses `gix`.

mod command;
mod fetcher;

pub use fetcher::{DEFAULT_TIMEOUT, GitFetcher};
