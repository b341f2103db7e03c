//! Fetch-based include handler (`!include`).

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;

use super::nav_file::{include_nav, validate_nav_path};
use crate::context::Resolved;
use crate::error::NavError;
use crate::fetch::SourceFetcher;
use crate::registry::{IncludeHandler, IncludeRequest};
use crate::resolver::Resolver;

/// `<scheme>://<host>/<path>/<repo>.git[?query]`
static LOCATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<url>(?:https?|ssh|git|file)://[^/?#\s]*(?:/[^/?#\s]+)*/[^/?#\s]+\.git)(?:\?(?P<query>[^#\s]*))?$",
    )
    .unwrap()
});

/// Parsed `!include` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    /// Repository URL without the query.
    pub url: String,
    /// Branch, tag, or commit (`ref` parameter).
    pub revision: String,
    /// Navigation file or directory inside the repository (`nav_path`).
    pub nav_path: PathBuf,
}

impl Locator {
    /// Parse and validate an include payload.
    ///
    /// # Errors
    ///
    /// - [`NavError::InvalidLocator`] if the payload does not match the
    ///   locator grammar
    /// - [`NavError::MissingParameter`] if `ref` or `nav_path` is absent
    /// - [`NavError::InvalidNavPath`] if `nav_path` is absolute or escapes
    ///   the repository
    pub fn parse(payload: &str) -> Result<Self, NavError> {
        let captures = LOCATOR_RE
            .captures(payload)
            .ok_or_else(|| NavError::InvalidLocator(payload.to_owned()))?;
        let url = captures["url"].to_owned();
        let query = captures.name("query").map_or("", |m| m.as_str());

        let param = |name: &'static str| {
            query_param(query, name).ok_or_else(|| NavError::MissingParameter {
                name,
                locator: payload.to_owned(),
            })
        };
        let revision = param("ref")?;
        let nav_path = validate_nav_path(&param("nav_path")?)?;

        Ok(Self {
            url,
            revision,
            nav_path,
        })
    }
}

/// First non-empty value of `name` in a query string, percent-decoded.
fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode_str(key).decode_utf8_lossy() == name)
                .then(|| percent_decode_str(value).decode_utf8_lossy().into_owned())
        })
        .find(|value| !value.is_empty())
}

/// Includes a navigation file from a repository fetched by a [`SourceFetcher`].
pub struct GitInclude {
    fetcher: Arc<dyn SourceFetcher>,
}

impl GitInclude {
    /// Create a handler that fetches through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self { fetcher }
    }
}

impl IncludeHandler for GitInclude {
    fn name(&self) -> &str {
        "git"
    }

    fn execute(
        &self,
        request: IncludeRequest<'_>,
        resolver: &Resolver<'_>,
    ) -> Result<Resolved, NavError> {
        let locator = Locator::parse(request.payload)?;
        tracing::info!(
            url = %locator.url,
            revision = %locator.revision,
            nav_path = %locator.nav_path.display(),
            "Fetching include source"
        );

        let content_dir = self.fetcher.fetch(&locator.url, &locator.revision)?;
        include_nav(&content_dir, &locator.nav_path, &request.context, resolver)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::context::{Provenance, ResolveContext};
    use crate::error::FetchError;
    use crate::mock::MockFetcher;
    use crate::node::NavNode;
    use crate::registry::HandlerRegistry;

    const REPO: &str = "https://example.com/org/repo.git";

    #[test]
    fn test_parse_accepts_full_locator() {
        let locator =
            Locator::parse("https://example.com/org/repo.git?ref=main&nav_path=docs/nav.yml")
                .unwrap();
        assert_eq!(
            locator,
            Locator {
                url: REPO.to_owned(),
                revision: "main".to_owned(),
                nav_path: PathBuf::from("docs/nav.yml"),
            }
        );
    }

    #[test]
    fn test_parse_accepts_other_schemes() {
        for payload in [
            "ssh://git@example.com/org/repo.git?ref=v1&nav_path=site",
            "git://example.com/repo.git?ref=v1&nav_path=site",
            "file:///srv/git/repo.git?ref=v1&nav_path=site",
        ] {
            assert!(Locator::parse(payload).is_ok(), "{payload}");
        }
    }

    #[test]
    fn test_parse_decodes_query() {
        let locator = Locator::parse(
            "https://example.com/org/repo.git?nav_path=user%20guide%2Fnav.yml&ref=release%2F1.0",
        )
        .unwrap();
        assert_eq!(locator.revision, "release/1.0");
        assert_eq!(locator.nav_path, PathBuf::from("user guide/nav.yml"));
    }

    #[test]
    fn test_parse_rejects_invalid_locators() {
        for payload in [
            "",
            "docs/nav.yml",
            "ftp://example.com/org/repo.git?ref=main&nav_path=docs",
            "https://example.com/org/repo?ref=main&nav_path=docs",
            "https://example.com/org/repo.git extra",
        ] {
            assert!(
                matches!(Locator::parse(payload), Err(NavError::InvalidLocator(_))),
                "{payload}"
            );
        }
    }

    #[test]
    fn test_parse_missing_ref() {
        let err = Locator::parse("https://example.com/org/repo.git?nav_path=docs").unwrap_err();
        assert!(matches!(err, NavError::MissingParameter { name: "ref", .. }));
    }

    #[test]
    fn test_parse_missing_nav_path() {
        let err = Locator::parse("https://example.com/org/repo.git?ref=main").unwrap_err();
        assert!(matches!(
            err,
            NavError::MissingParameter {
                name: "nav_path",
                ..
            }
        ));

        let err = Locator::parse("https://example.com/org/repo.git?ref=main&nav_path=").unwrap_err();
        assert!(matches!(
            err,
            NavError::MissingParameter {
                name: "nav_path",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_absolute_nav_path() {
        let err = Locator::parse("https://example.com/org/repo.git?ref=main&nav_path=/abs/path")
            .unwrap_err();
        assert!(matches!(err, NavError::InvalidNavPath(p) if p == "/abs/path"));
    }

    fn resolve_include(
        fetcher: MockFetcher,
        payload: &str,
    ) -> (Result<Resolved, NavError>, Vec<(String, String)>) {
        let fetcher = Arc::new(fetcher);
        let handler = GitInclude::new(Arc::clone(&fetcher) as Arc<dyn SourceFetcher>);
        let registry = HandlerRegistry::new();
        let resolver = Resolver::new(&registry);
        let request = IncludeRequest {
            marker: "!include",
            payload,
            context: ResolveContext::new(1).child(Path::new("guide")),
        };
        (handler.execute(request, &resolver), fetcher.calls())
    }

    #[test]
    fn test_execute_fetches_and_resolves() {
        let repo = TempDir::new().unwrap();
        fs::create_dir(repo.path().join("site")).unwrap();
        fs::write(
            repo.path().join("site/nav.yaml"),
            "nav:\n  - intro.md\n  - Usage: usage.md\n",
        )
        .unwrap();

        let (result, calls) = resolve_include(
            MockFetcher::new().with_repo(REPO, repo.path()),
            "https://example.com/org/repo.git?ref=v1&nav_path=site/nav.yaml",
        );
        let resolved = result.unwrap();

        assert_eq!(calls, vec![(REPO.to_owned(), "v1".to_owned())]);
        assert_eq!(
            resolved.nav,
            vec![
                NavNode::leaf("guide/intro.md"),
                NavNode::mapping("Usage", NavNode::leaf("guide/usage.md")),
            ]
        );
        assert_eq!(
            resolved.provenance,
            vec![Provenance {
                orig_docs_dir: repo.path().to_path_buf(),
                orig_docs_sub_dir: PathBuf::from("site"),
                alias: PathBuf::from("guide"),
            }]
        );
    }

    #[test]
    fn test_execute_propagates_fetch_error() {
        let (result, _) = resolve_include(
            MockFetcher::new(),
            "https://example.com/org/repo.git?ref=v1&nav_path=site",
        );
        assert!(matches!(
            result,
            Err(NavError::Fetch(FetchError::InvalidRemote { .. }))
        ));
    }

    #[test]
    fn test_execute_missing_nav_file() {
        let repo = TempDir::new().unwrap();
        let (result, _) = resolve_include(
            MockFetcher::new().with_repo(REPO, repo.path()),
            "https://example.com/org/repo.git?ref=v1&nav_path=site",
        );
        assert!(matches!(result, Err(NavError::NavFileNotFound(_))));
    }

    #[test]
    fn test_invalid_locator_does_not_fetch() {
        let (result, calls) = resolve_include(MockFetcher::new(), "not a locator");
        assert!(matches!(result, Err(NavError::InvalidLocator(_))));
        assert!(calls.is_empty());
    }
}
