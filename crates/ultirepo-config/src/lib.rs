//! Configuration management for ultirepo.
//!
//! Parses `ultirepo.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [site]
//! config_file = "mkdocs.yml"
//!
//! [resolve]
//! max_depth = 1
//!
//! [fetch]
//! cache_dir = ".ultirepo/repos"
//! timeout_secs = 300
//!
//! [merge]
//! destination_dir = ".ultirepo/docs"
//!
//! [[include]]
//! marker = "@git"
//! handler = "git"
//! ```
//!
//! Relative paths are resolved against the directory holding the config
//! file. CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Path values support `${VAR}` (error if unset) and `${VAR:-default}`.
//!
//! Expanded fields:
//! - `site.config_file`
//! - `fetch.cache_dir`
//! - `merge.destination_dir`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override host site configuration file.
    pub site_file: Option<PathBuf>,
    /// Override maximum include depth.
    pub max_depth: Option<usize>,
    /// Override merged docs destination.
    pub destination_dir: Option<PathBuf>,
    /// Override repository cache directory.
    pub cache_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ultirepo.toml";

/// Largest accepted `resolve.max_depth`.
pub const MAX_RESOLVE_DEPTH: usize = 32;

/// Include handler kinds that `[[include]]` bindings may name.
pub const HANDLER_KINDS: [&str; 2] = ["git", "local"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    site: SiteConfigRaw,
    /// Resolution settings.
    pub resolve: ResolveConfig,
    fetch: FetchConfigRaw,
    merge: MergeConfigRaw,
    /// Additional include marker bindings.
    #[serde(rename = "include")]
    pub includes: Vec<IncludeBinding>,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Resolved fetch configuration (set after loading).
    #[serde(skip)]
    pub fetch_resolved: FetchConfig,
    /// Resolved merge configuration (set after loading).
    #[serde(skip)]
    pub merge_resolved: MergeConfig,
    /// Project directory for ultirepo data (`.ultirepo/`).
    #[serde(skip)]
    pub project_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    config_file: Option<String>,
}

/// Host site settings.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// MkDocs configuration file of the host site.
    pub config_file: PathBuf,
}

/// Navigation resolution settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Maximum include nesting depth.
    pub max_depth: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self { max_depth: 1 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FetchConfigRaw {
    cache_dir: Option<String>,
    timeout_secs: Option<u64>,
}

/// Repository fetch settings.
#[derive(Debug)]
pub struct FetchConfig {
    /// Directory repositories are cloned into.
    pub cache_dir: PathBuf,
    /// Timeout for a single git command, in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::new(),
            timeout_secs: 300,
        }
    }
}

impl FetchConfig {
    /// Git command timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MergeConfigRaw {
    destination_dir: Option<String>,
}

/// Merge stage settings.
#[derive(Debug, Default)]
pub struct MergeConfig {
    /// Directory the merged docs tree is written to.
    pub destination_dir: PathBuf,
}

/// Binds an include marker to a handler kind.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct IncludeBinding {
    /// Marker text (e.g., `@git`).
    pub marker: String,
    /// Handler kind, one of [`HANDLER_KINDS`].
    pub handler: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`fetch.cache_dir`").
        field: String,
        /// Error message (e.g., "${`CACHE_ROOT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ultirepo.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(site_file) = &settings.site_file {
            self.site_resolved.config_file.clone_from(site_file);
        }
        if let Some(max_depth) = settings.max_depth {
            self.resolve.max_depth = max_depth;
        }
        if let Some(destination_dir) = &settings.destination_dir {
            self.merge_resolved.destination_dir.clone_from(destination_dir);
        }
        if let Some(cache_dir) = &settings.cache_dir {
            self.fetch_resolved.cache_dir.clone_from(cache_dir);
        }
    }

    /// Directory holding the host site configuration file.
    #[must_use]
    pub fn site_dir(&self) -> &Path {
        self.site_resolved
            .config_file
            .parent()
            .unwrap_or(Path::new("."))
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let project_dir = base.join(".ultirepo");
        Self {
            site: SiteConfigRaw::default(),
            resolve: ResolveConfig::default(),
            fetch: FetchConfigRaw::default(),
            merge: MergeConfigRaw::default(),
            includes: Vec::new(),
            site_resolved: SiteConfig {
                config_file: base.join("mkdocs.yml"),
            },
            fetch_resolved: FetchConfig {
                cache_dir: project_dir.join("repos"),
                ..FetchConfig::default()
            },
            merge_resolved: MergeConfig {
                destination_dir: project_dir.join("docs"),
            },
            project_dir,
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolve.max_depth > MAX_RESOLVE_DEPTH {
            return Err(ConfigError::Validation(format!(
                "resolve.max_depth cannot exceed {MAX_RESOLVE_DEPTH}"
            )));
        }
        if self.fetch_resolved.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        for binding in &self.includes {
            binding.validate()?;
        }
        Ok(())
    }

    /// Expand environment variable references in configured paths.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref file) = self.site.config_file {
            self.site.config_file = Some(expand::expand_env(file, "site.config_file")?);
        }
        if let Some(ref dir) = self.fetch.cache_dir {
            self.fetch.cache_dir = Some(expand::expand_env(dir, "fetch.cache_dir")?);
        }
        if let Some(ref dir) = self.merge.destination_dir {
            self.merge.destination_dir = Some(expand::expand_env(dir, "merge.destination_dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let project_dir = config_dir.join(".ultirepo");
        let resolve = |path: Option<&str>, default: PathBuf| {
            path.map_or(default, |p| config_dir.join(p))
        };

        self.site_resolved = SiteConfig {
            config_file: resolve(self.site.config_file.as_deref(), config_dir.join("mkdocs.yml")),
        };
        self.fetch_resolved = FetchConfig {
            cache_dir: resolve(self.fetch.cache_dir.as_deref(), project_dir.join("repos")),
            timeout_secs: self.fetch.timeout_secs.unwrap_or(300),
        };
        self.merge_resolved = MergeConfig {
            destination_dir: resolve(
                self.merge.destination_dir.as_deref(),
                project_dir.join("docs"),
            ),
        };
        self.project_dir = project_dir;
    }
}

impl IncludeBinding {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() || self.marker.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "include.marker '{}' must be non-empty and contain no whitespace",
                self.marker
            )));
        }
        if !HANDLER_KINDS.contains(&self.handler.as_str()) {
            return Err(ConfigError::Validation(format!(
                "include.handler '{}' for marker '{}' must be one of: {}",
                self.handler,
                self.marker,
                HANDLER_KINDS.join(", ")
            )));
        }
        Ok(())
    }
}
