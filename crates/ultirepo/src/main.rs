//! Ultirepo CLI - multi-repository MkDocs site assembly.
//!
//! Provides commands for:
//! - `resolve`: Expand include directives in the site navigation
//! - `build`: Resolve, merge all docs sources and write a derived site config

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ResolveArgs};
use output::Output;

/// Ultirepo - assemble one MkDocs site from many repositories.
#[derive(Parser)]
#[command(name = "ultirepo", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the site navigation and print it.
    Resolve(ResolveArgs),
    /// Resolve the navigation and merge all documentation sources.
    Build(BuildArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = match &cli.command {
        Commands::Resolve(args) => args.site.verbose,
        Commands::Build(args) => args.site.verbose,
    };
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Resolve(args) => args.execute(),
        Commands::Build(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
