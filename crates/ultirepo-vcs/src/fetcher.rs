//! Git source fetcher.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use ultirepo_nav::{FetchError, SourceFetcher};

use crate::command::{CommandError, GitCommand};

/// Default timeout for a single git command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Fetches repositories into a local cache with the `git` CLI.
///
/// Every `(url, revision)` pair gets its own checkout at
/// `<cache_dir>/<repo-name>-<url-hash>/<revision>`, where the name is the last
/// URL segment without `.git`. Directories returned for earlier fetches keep
/// their content when another revision, or another repository with the same
/// name, is fetched later. Fetching a pair that is already cached runs
/// `git fetch` in the existing checkout instead of cloning.
///
/// An existing cache entry is only replaced when it is a git checkout; any
/// other non-empty directory at that path is left alone and reported as an
/// error.
///
/// # Example
///
/// ```ignore
/// use ultirepo_nav::SourceFetcher;
/// use ultirepo_vcs::GitFetcher;
///
/// let fetcher = GitFetcher::new(".ultirepo/repos");
/// let dir = fetcher.fetch("https://example.com/org/guide.git", "v1")?;
/// ```
#[derive(Clone, Debug)]
pub struct GitFetcher {
    cache_dir: PathBuf,
    timeout: Duration,
}

impl GitFetcher {
    /// Create a fetcher that clones into `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-command timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cache root.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Local checkout directory for `revision` of `url`.
    pub fn checkout_dir(&self, url: &str, revision: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}-{}", repo_name(url), short_hash(url)))
            .join(revision_dir(revision))
    }

    fn git(&self) -> GitCommand {
        GitCommand::new(self.timeout)
    }

    /// Whether `target` is the top-level work tree of a git repository.
    fn is_checkout(target: &Path) -> bool {
        let Ok(repo) = gix::open(target) else {
            return false;
        };
        let Some(workdir) = repo.workdir() else {
            return false;
        };
        match (workdir.canonicalize(), target.canonicalize()) {
            (Ok(workdir), Ok(target)) => workdir == target,
            _ => false,
        }
    }

    /// Whether the cached checkout at `target` was cloned from `url`.
    fn has_origin(&self, target: &Path, url: &str) -> bool {
        self.git()
            .current_dir(target)
            .args(["remote", "get-url", "origin"])
            .run()
            .is_ok_and(|origin| origin.trim() == url)
    }

    /// Whether `origin/<revision>` exists, i.e. the revision names a branch.
    fn is_remote_branch(target: &Path, revision: &str) -> bool {
        gix::open(target).is_ok_and(|repo| {
            repo.find_reference(format!("refs/remotes/origin/{revision}").as_str())
                .is_ok()
        })
    }

    fn clone_into(&self, url: &str, target: &Path) -> Result<(), FetchError> {
        if target.exists() {
            if Self::is_checkout(target) {
                tracing::warn!(
                    path = %target.display(),
                    "Replacing cached checkout of a different repository"
                );
                fs::remove_dir_all(target)?;
            } else if !is_empty_dir(target)? {
                return Err(FetchError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "{} exists and is not a git checkout, refusing to replace it",
                        target.display()
                    ),
                )));
            }
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(url, path = %target.display(), "Cloning repository");
        self.git()
            .arg("clone")
            .arg("--")
            .arg(url)
            .arg(target)
            .run()
            .map_err(|e| classify(e, url, None))?;
        Ok(())
    }

    fn update(&self, url: &str, target: &Path) -> Result<(), FetchError> {
        tracing::info!(url, path = %target.display(), "Updating cached repository");
        self.git()
            .current_dir(target)
            .args(["fetch", "--tags", "origin"])
            .run()
            .map_err(|e| classify(e, url, None))?;
        Ok(())
    }

    fn checkout(&self, url: &str, target: &Path, revision: &str) -> Result<(), FetchError> {
        self.git()
            .current_dir(target)
            .args(["checkout", "--force", revision])
            .run()
            .map_err(|e| classify(e, url, Some(revision)))?;

        if Self::is_remote_branch(target, revision) {
            self.git()
                .current_dir(target)
                .args(["reset", "--hard"])
                .arg(format!("origin/{revision}"))
                .run()
                .map_err(|e| classify(e, url, Some(revision)))?;
        }
        Ok(())
    }
}

impl SourceFetcher for GitFetcher {
    fn fetch(&self, locator: &str, revision: &str) -> Result<PathBuf, FetchError> {
        let target = self.checkout_dir(locator, revision);

        if Self::is_checkout(&target) && self.has_origin(&target, locator) {
            self.update(locator, &target)?;
        } else {
            self.clone_into(locator, &target)?;
        }
        self.checkout(locator, &target, revision)?;

        tracing::debug!(
            url = locator,
            revision,
            path = %target.display(),
            "Repository ready"
        );
        Ok(target)
    }
}

/// Repository name for a URL: last path segment without `.git`.
fn repo_name(url: &str) -> &str {
    let url = url.trim_end_matches('/');
    let name = url.rsplit(['/', ':']).next().unwrap_or(url);
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() { "repo" } else { name }
}

/// First 12 hex digits of the SHA-256 of `value`.
fn short_hash(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..6])
}

/// Directory name for a revision.
///
/// Revisions made only of `[A-Za-z0-9._-]` that do not start with `.` are used
/// as is. Anything else is sanitized and suffixed with a hash, so `feature/x`
/// and `feature_x` never share a checkout.
fn revision_dir(revision: &str) -> String {
    let sanitized: String = revision
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !revision.is_empty() && sanitized == revision && !revision.starts_with('.') {
        sanitized
    } else {
        format!(
            "{}-{}",
            sanitized.trim_start_matches('.'),
            short_hash(revision)
        )
    }
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Map a failed git command to a fetch error kind.
fn classify(err: CommandError, url: &str, revision: Option<&str>) -> FetchError {
    let (operation, stderr) = match err {
        CommandError::Io(e) => return FetchError::Io(e),
        timed_out @ CommandError::TimedOut { .. } => {
            return FetchError::Transport {
                url: url.to_owned(),
                message: timed_out.to_string(),
            };
        }
        CommandError::Failed { operation, stderr } => (operation, stderr),
    };
    let lower = stderr.to_lowercase();

    if [
        "authentication failed",
        "could not read username",
        "could not read password",
        "permission denied (publickey",
        "terminal prompts disabled",
    ]
    .iter()
    .any(|p| lower.contains(p))
    {
        return FetchError::AuthFailure {
            url: url.to_owned(),
            message: stderr,
        };
    }

    if let Some(revision) = revision
        && [
            "did not match any file(s) known to git",
            "unknown revision",
            "invalid reference",
            "couldn't find remote ref",
        ]
        .iter()
        .any(|p| lower.contains(p))
    {
        return FetchError::RefNotFound {
            url: url.to_owned(),
            revision: revision.to_owned(),
        };
    }

    if [
        "does not exist",
        "not found",
        "does not appear to be a git repository",
        "not a git repository",
    ]
    .iter()
    .any(|p| lower.contains(p))
    {
        return FetchError::InvalidRemote {
            url: url.to_owned(),
            message: stderr,
        };
    }

    FetchError::Transport {
        url: url.to_owned(),
        message: format!("git {operation}: {stderr}"),
    }
}
