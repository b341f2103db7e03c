//! Host site configuration and navigation resolution shared by commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use serde_yaml::{Mapping, Value};
use ultirepo_config::{CliSettings, Config};
use ultirepo_nav::{
    HandlerRegistry, NavNode, ResolveContext, Resolved, Resolver, SourceFetcher, nav_to_yaml,
};
use ultirepo_vcs::GitFetcher;

use crate::error::CliError;

/// Docs directory MkDocs uses when the site config names none.
const DEFAULT_DOCS_DIR: &str = "docs";

/// Arguments shared by every command.
#[derive(Args)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover ultirepo.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MkDocs site configuration file (overrides config).
    #[arg(long)]
    site: Option<PathBuf>,

    /// Maximum include nesting depth (overrides config).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Enable verbose output (log fetches and skipped includes).
    #[arg(short, long)]
    pub verbose: bool,
}

impl SiteArgs {
    /// Load configuration with these arguments layered over `settings`.
    pub(crate) fn load_config(&self, settings: CliSettings) -> Result<Config, CliError> {
        let settings = CliSettings {
            site_file: self.site.clone(),
            max_depth: self.max_depth,
            ..settings
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

/// A parsed MkDocs site configuration.
///
/// Only `nav` and `docs_dir` are interpreted; every other key is carried
/// through to the derived config untouched.
#[derive(Debug)]
pub(crate) struct SiteFile {
    path: PathBuf,
    config: Mapping,
}

impl SiteFile {
    pub(crate) fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Validation(format!(
                "Failed to read site config {}: {e}",
                path.display()
            ))
        })?;
        let config = match serde_yaml::from_str(&content)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => {
                return Err(CliError::Validation(format!(
                    "Site config {} must be a YAML mapping",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    /// Directory holding the site config; local includes resolve against it.
    pub(crate) fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Host docs directory.
    pub(crate) fn docs_dir(&self) -> PathBuf {
        let docs_dir = self
            .config
            .get("docs_dir")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_DOCS_DIR);
        self.dir().join(docs_dir)
    }

    /// Navigation root, or `None` when the site defines no `nav`.
    pub(crate) fn nav(&self) -> Result<Option<Vec<NavNode>>, CliError> {
        let Some(nav) = self.config.get("nav") else {
            return Ok(None);
        };
        Ok(Some(NavNode::root_from_yaml(nav.clone())?))
    }

    /// Site config pointing at the merged docs, with `nav` replaced.
    pub(crate) fn derive(&self, nav: Option<&[NavNode]>, docs_dir: &Path) -> Mapping {
        let mut config = self.config.clone();
        if let Some(nav) = nav {
            config.insert("nav".into(), nav_to_yaml(nav));
        }
        config.insert(
            "docs_dir".into(),
            Value::String(docs_dir.to_string_lossy().into_owned()),
        );
        config
    }
}

/// Fetcher cloning repositories into the configured cache.
pub(crate) fn git_fetcher(config: &Config) -> Arc<dyn SourceFetcher> {
    Arc::new(
        GitFetcher::new(config.fetch_resolved.cache_dir.clone())
            .with_timeout(config.fetch_resolved.timeout()),
    )
}

/// Registry with the built-in handlers plus the configured marker bindings.
pub(crate) fn build_registry(
    config: &Config,
    fetcher: Arc<dyn SourceFetcher>,
    project_root: &Path,
) -> Result<HandlerRegistry, CliError> {
    let mut registry = HandlerRegistry::with_defaults(fetcher, project_root.to_path_buf());
    for binding in &config.includes {
        registry.register_named(&binding.marker, &binding.handler)?;
    }
    tracing::debug!(markers = ?registry.all_markers(), "Include handlers registered");
    Ok(registry)
}

/// Resolve the site navigation, if it has one.
pub(crate) fn resolve_site(
    config: &Config,
    site: &SiteFile,
    registry: &HandlerRegistry,
) -> Result<Option<Resolved>, CliError> {
    let Some(nav) = site.nav()? else {
        tracing::info!(site = %site.path.display(), "Site config has no nav, nothing to resolve");
        return Ok(None);
    };
    let ctx = ResolveContext::new(config.resolve.max_depth);
    Ok(Some(Resolver::new(registry).resolve(&nav, &ctx)?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use ultirepo_config::IncludeBinding;
    use ultirepo_nav::MockFetcher;

    use super::*;

    fn write_site(dir: &Path, content: &str) -> SiteFile {
        let path = dir.join("mkdocs.yml");
        std::fs::write(&path, content).unwrap();
        SiteFile::load(&path).unwrap()
    }

    #[test]
    fn test_docs_dir_defaults_to_docs() {
        let temp_dir = TempDir::new().unwrap();
        let site = write_site(temp_dir.path(), "site_name: Portal\n");

        assert_eq!(site.dir(), temp_dir.path());
        assert_eq!(site.docs_dir(), temp_dir.path().join("docs"));
        assert!(site.nav().unwrap().is_none());
    }

    #[test]
    fn test_docs_dir_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let site = write_site(temp_dir.path(), "docs_dir: content\n");

        assert_eq!(site.docs_dir(), temp_dir.path().join("content"));
    }

    #[test]
    fn test_empty_site_config() {
        let temp_dir = TempDir::new().unwrap();
        let site = write_site(temp_dir.path(), "");

        assert!(site.nav().unwrap().is_none());
    }

    #[test]
    fn test_non_mapping_site_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mkdocs.yml");
        std::fs::write(&path, "- a\n- b\n").unwrap();

        assert!(matches!(
            SiteFile::load(&path),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_site_config() {
        let temp_dir = TempDir::new().unwrap();
        let err = SiteFile::load(&temp_dir.path().join("mkdocs.yml")).unwrap_err();

        assert!(err.to_string().contains("Failed to read site config"));
    }

    #[test]
    fn test_derive_preserves_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let site = write_site(
            temp_dir.path(),
            "site_name: Portal\nnav:\n  - index.md\ntheme:\n  name: material\n",
        );

        let derived = site.derive(
            Some(&[NavNode::leaf("index.md"), NavNode::leaf("guide/intro.md")]),
            Path::new("/out/docs"),
        );

        let expected: Value = serde_yaml::from_str(
            "site_name: Portal\nnav:\n  - index.md\n  - guide/intro.md\ntheme:\n  name: material\ndocs_dir: /out/docs\n",
        )
        .unwrap();
        assert_eq!(Value::Mapping(derived), expected);
    }

    #[test]
    fn test_derive_without_nav_keeps_nav_absent() {
        let temp_dir = TempDir::new().unwrap();
        let site = write_site(temp_dir.path(), "site_name: Portal\n");

        let derived = site.derive(None, Path::new("/out/docs"));

        assert!(derived.get("nav").is_none());
        assert_eq!(
            derived.get("docs_dir"),
            Some(&Value::String("/out/docs".to_owned()))
        );
    }

    #[test]
    fn test_build_registry_adds_configured_bindings() {
        let mut config = Config::default();
        config.includes.push(IncludeBinding {
            marker: "@team".to_owned(),
            handler: "local".to_owned(),
        });

        let registry =
            build_registry(&config, Arc::new(MockFetcher::new()), Path::new(".")).unwrap();

        assert_eq!(registry.all_markers(), vec!["!include", "%include", "@team"]);
    }

    #[test]
    fn test_resolve_site_with_local_include() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("team")).unwrap();
        std::fs::write(root.join("team/nav.yml"), "nav:\n  - members.md\n").unwrap();
        let site = write_site(root, "nav:\n  - index.md\n  - Team: \"%include team\"\n");
        let config = Config::default();
        let registry = build_registry(&config, Arc::new(MockFetcher::new()), site.dir()).unwrap();

        let resolved = resolve_site(&config, &site, &registry).unwrap().unwrap();

        assert_eq!(
            resolved.nav,
            vec![
                NavNode::leaf("index.md"),
                NavNode::mapping("Team", NavNode::leaf("team/members.md")),
            ]
        );
        assert_eq!(resolved.provenance.len(), 1);
        assert_eq!(resolved.provenance[0].alias, PathBuf::from("team"));
    }

    #[test]
    fn test_resolve_site_respects_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("team")).unwrap();
        std::fs::write(root.join("team/nav.yml"), "nav:\n  - members.md\n").unwrap();
        let site = write_site(root, "nav:\n  - Team: \"%include team\"\n");
        let mut config = Config::default();
        config.resolve.max_depth = 0;
        let registry = build_registry(&config, Arc::new(MockFetcher::new()), site.dir()).unwrap();

        let resolved = resolve_site(&config, &site, &registry).unwrap().unwrap();

        assert_eq!(
            resolved.nav,
            vec![NavNode::mapping("Team", NavNode::leaf("%include team"))]
        );
        assert!(resolved.provenance.is_empty());
    }
}
