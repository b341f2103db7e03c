//! `${VAR}` expansion for configured paths.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a path value.
///
/// Values without `${` are returned as is, so a literal `$` in a directory
/// name survives.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a referenced variable that is not set.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_prefix() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("ULTIREPO_TEST_CACHE_ROOT", "/var/cache");
        }
        let result = expand_env("${ULTIREPO_TEST_CACHE_ROOT}/repos", "fetch.cache_dir").unwrap();
        assert_eq!(result, "/var/cache/repos");
        unsafe {
            std::env::remove_var("ULTIREPO_TEST_CACHE_ROOT");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("ULTIREPO_TEST_UNSET_OUT");
        }
        let result =
            expand_env("${ULTIREPO_TEST_UNSET_OUT:-build}/docs", "merge.destination_dir").unwrap();
        assert_eq!(result, "build/docs");
    }

    #[test]
    fn test_expand_unset_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("ULTIREPO_TEST_MISSING");
        }
        let err = expand_env("${ULTIREPO_TEST_MISSING}", "site.config_file").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("ULTIREPO_TEST_MISSING"));
        assert!(err.to_string().contains("site.config_file"));
    }

    #[test]
    fn test_literal_dollar_unchanged() {
        assert_eq!(expand_env("docs/$draft", "x").unwrap(), "docs/$draft");
        assert_eq!(expand_env("mkdocs.yml", "x").unwrap(), "mkdocs.yml");
    }
}
