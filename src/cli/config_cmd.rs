//! Config CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::output::Output;
use crate::storage::{Config, PROJECT_CONFIG_FILE};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,

    /// Show the config file locations
    Path,

    /// Write the effective configuration to a config file
    Init {
        /// Write `.logseq-md.toml` in the current directory instead of the global file
        #[arg(long)]
        project: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, config: &Config, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config, output),
        ConfigCommands::Path => path(output),
        ConfigCommands::Init { project, force } => init(config, output, project, force),
    }
}

fn show(config: &Config, output: &Output) -> Result<()> {
    if output.is_json() {
        output.data(&serde_json::json!({
            "sources": config.sources,
            "export": config.export,
        }));
        return Ok(());
    }

    if config.sources.is_empty() {
        println!("# defaults (no config files found)");
    }
    for source in &config.sources {
        println!("# {}", source.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

fn path(output: &Output) -> Result<()> {
    let global = Config::global_config_path();
    let project = Config::find_project_config();

    if output.is_json() {
        output.data(&serde_json::json!({
            "global": global,
            "project": project,
        }));
        return Ok(());
    }

    let display = |p: &Option<std::path::PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    output.row(&["global", display(&global).as_str()]);
    output.row(&["project", display(&project).as_str()]);
    Ok(())
}

fn init(config: &Config, output: &Output, project: bool, force: bool) -> Result<()> {
    let target = if project {
        std::env::current_dir()?.join(PROJECT_CONFIG_FILE)
    } else {
        match Config::global_config_path() {
            Some(path) => path,
            None => bail!("Could not determine config directory"),
        }
    };

    if target.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            target.display()
        );
    }

    output.verbose_ctx("config", &format!("Writing {}", target.display()));
    let written = if project {
        config.save_to(&target)?;
        target
    } else {
        config.save_global()?
    };

    output.success(&format!("Wrote {}", written.display()));
    Ok(())
}
