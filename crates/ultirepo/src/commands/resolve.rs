//! `ultirepo resolve` command implementation.

use clap::Args;
use ultirepo_config::CliSettings;
use ultirepo_nav::{Resolved, nav_to_yaml};

use super::site::{SiteArgs, SiteFile, build_registry, git_fetcher, resolve_site};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Print the navigation and its provenance records as JSON.
    #[arg(long)]
    json: bool,
}

impl ResolveArgs {
    /// Execute the resolve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, fetching or resolution fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.site.load_config(CliSettings::default())?;
        let site = SiteFile::load(&config.site_resolved.config_file)?;
        let registry = build_registry(&config, git_fetcher(&config), site.dir())?;

        let resolved = resolve_site(&config, &site, &registry)?.unwrap_or_default();
        output.data(&render(&resolved, self.json)?)?;
        Ok(())
    }
}

fn render(resolved: &Resolved, json: bool) -> Result<String, CliError> {
    if json {
        Ok(serde_json::to_string_pretty(resolved)?)
    } else {
        Ok(serde_yaml::to_string(&nav_to_yaml(&resolved.nav))?)
    }
}
