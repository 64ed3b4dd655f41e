//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::config_cmd::{self, ConfigCommands};
use super::export_cmd::{self, ExportArgs};
use super::output::{Output, OutputFormat};
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "logseq-md")]
#[command(author, version, about = "Export outliner pages as clean Markdown")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file layered over the global and project configs
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a page (or a focused block's children) as Markdown
    Export(ExportArgs),

    /// List the attachments an export would reference
    Assets(ExportArgs),

    /// Inspect or write configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    output.verbose_ctx(
        "config",
        &format!("Loaded config from {} file(s)", config.sources.len()),
    );

    let debug = match &cli.command {
        Commands::Export(args) | Commands::Assets(args) => args.debug || config.export.debug,
        Commands::Config(_) => false,
    };
    init_tracing(cli.verbose || debug);

    match cli.command {
        Commands::Export(args) => export_cmd::export(&args, &config, &output)?,
        Commands::Assets(args) => export_cmd::assets(&args, &config, &output)?,
        Commands::Config(cmd) => config_cmd::run(cmd, &config, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Installs the stderr subscriber; `RUST_LOG` overrides the default level
fn init_tracing(debug: bool) {
    let default = if debug { "warn,logseq_md=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
