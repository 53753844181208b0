//! Pagelint CLI - quality control for scanned comic archives.
//!
//! Pagelint checks episode folders against the page-width and byte-size
//! limits of their content type, zero-pads page numbers, and can downsample
//! oversized pages in place.
//!
//! # Usage
//!
//! ```bash
//! # Check an archive and print a report
//! pagelint check ./scans
//!
//! # Stream a machine-readable report
//! pagelint check ./scans --format jsonl --output report.jsonl
//!
//! # Check, then shrink oversized pages
//! pagelint resize ./scans --content-type magazine_comic
//!
//! # Only normalize page numbering
//! pagelint rename ./scans
//!
//! # View configuration
//! pagelint config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Pagelint - quality control for scanned comic archives.
#[derive(Parser, Debug)]
#[command(name = "pagelint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check episode folders and report findings
    Check(cli::check::CheckArgs),

    /// Check, then downsample oversized pages and write them back
    Resize(cli::resize::ResizeArgs),

    /// Zero-pad page numbers without checking anything
    Rename(cli::rename::RenameArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Loaded once. A broken file still lets `config path` and `config init`
    // run; every other command fails on it.
    let loaded = pagelint_core::Config::load();
    let log_config = loaded.as_ref().cloned().unwrap_or_default();
    logging::init_from_config(&log_config, cli.verbose, cli.json_logs);

    tracing::debug!("Pagelint v{}", pagelint_core::VERSION);

    match cli.command {
        Commands::Check(args) => cli::check::execute(args, loaded?).await,
        Commands::Resize(args) => cli::resize::execute(args, loaded?).await,
        Commands::Rename(args) => cli::rename::execute(args, loaded?).await,
        Commands::Config(args) => cli::config::execute(args, loaded).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_with_global_flags() {
        let cli = Cli::parse_from(["pagelint", "check", "/scans", "--format", "json", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.root, "/scans");
                assert_eq!(args.format, Some(cli::check::OutputFormat::Json));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
