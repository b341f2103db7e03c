//! `ultirepo build` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use ultirepo_config::{CliSettings, Config};
use ultirepo_merge::{MergeReport, Merger};
use ultirepo_nav::SourceFetcher;

use super::site::{SiteArgs, SiteFile, build_registry, git_fetcher, resolve_site};
use crate::error::CliError;
use crate::output::Output;

/// File name of the derived site config, written next to the host config so
/// relative keys (`theme.custom_dir`, `hooks`, `INHERIT`) keep resolving.
const DERIVED_SITE_FILE: &str = "mkdocs.ultirepo.yml";

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Merged docs destination directory (overrides config).
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Repository cache directory (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, resolution, or merging fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.site.load_config(CliSettings {
            destination_dir: self.destination,
            cache_dir: self.cache_dir,
            ..CliSettings::default()
        })?;

        output.info(&format!(
            "Site config: {}",
            config.site_resolved.config_file.display()
        ));
        let outcome = build(&config, git_fetcher(&config))?;

        for duplicate in &outcome.report.duplicates {
            output.warning(&format!(
                "Skipped duplicate {} from {} (kept copy from {})",
                duplicate.path.display(),
                duplicate.skipped_from.display(),
                duplicate.kept_from.display()
            ));
        }
        output.success(&format!(
            "Merged {} files into {}",
            outcome.report.files.len(),
            outcome.report.destination.display()
        ));
        output.info(&format!(
            "Derived site config: {}",
            outcome.site_config.display()
        ));
        Ok(())
    }
}

/// Result of a build.
#[derive(Debug)]
pub(crate) struct BuildOutcome {
    /// Path of the derived site config.
    pub site_config: PathBuf,
    /// Merge report.
    pub report: MergeReport,
}

/// Resolve the site navigation, merge every docs source and write the
/// derived site config beside the host site config.
pub(crate) fn build(
    config: &Config,
    fetcher: Arc<dyn SourceFetcher>,
) -> Result<BuildOutcome, CliError> {
    let site = SiteFile::load(&config.site_resolved.config_file)?;
    let registry = build_registry(config, fetcher, site.dir())?;
    let resolved = resolve_site(config, &site, &registry)?;

    ensure_project_dir(&config.project_dir)?;

    let provenance = resolved
        .as_ref()
        .map_or(&[][..], |r| r.provenance.as_slice());
    let report = Merger::new(config.merge_resolved.destination_dir.clone())
        .merge(Some(&site.docs_dir()), provenance)?;

    let derived = site.derive(
        resolved.as_ref().map(|r| r.nav.as_slice()),
        &report.destination,
    );
    let site_config = site.dir().join(DERIVED_SITE_FILE);
    std::fs::write(&site_config, serde_yaml::to_string(&derived)?)?;
    tracing::info!(path = %site_config.display(), "Wrote derived site config");

    Ok(BuildOutcome {
        site_config,
        report,
    })
}

/// Ensure the `.ultirepo/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir).map_err(|e| {
        CliError::Validation(format!("Failed to create project directory: {e}"))
    })?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by ultirepo\n*\n");
    }

    Ok(())
}
