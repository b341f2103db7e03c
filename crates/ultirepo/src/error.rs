//! CLI error types.

use ultirepo_config::ConfigError;
use ultirepo_merge::MergeError;
use ultirepo_nav::{NavError, RegistryError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Nav(#[from] NavError),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Merge(#[from] MergeError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
