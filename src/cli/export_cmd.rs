//! Export and asset listing commands

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::output::Output;
use crate::domain::{AssetRegistry, ExportOptions};
use crate::export::{ExportOutput, Exporter};
use crate::host::MemoryHost;
use crate::storage::{Config, GraphSnapshot};

/// Selects what to export and overrides configured options
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Graph snapshot to read (JSON or YAML)
    #[arg(long, short = 'g', env = "LOGSEQ_MD_GRAPH")]
    pub graph: PathBuf,

    /// Page to export, by name or uuid (defaults to the snapshot's current page)
    #[arg(long, conflicts_with = "block")]
    pub page: Option<String>,

    /// Export the children of this block instead of a page
    #[arg(long)]
    pub block: Option<String>,

    /// Write the Markdown to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Keep #tags in the body
    #[arg(long)]
    pub include_tags: bool,

    /// Emit YAML frontmatter from page properties
    #[arg(long)]
    pub include_properties: bool,

    /// Leave [[id]], ((id)) and bare identifiers unresolved
    #[arg(long)]
    pub no_block_refs: bool,

    /// Render children as nested list items
    #[arg(long)]
    pub nested: bool,

    /// Keep task keywords, priorities and macros
    #[arg(long)]
    pub keep_syntax: bool,

    /// Only resolve bracketed identifiers
    #[arg(long)]
    pub no_plain_uuids: bool,

    /// Omit the page title heading
    #[arg(long)]
    pub no_page_name: bool,

    /// Destination directory for attachments
    #[arg(long)]
    pub asset_path: Option<String>,

    /// Trace export internals on stderr
    #[arg(long)]
    pub debug: bool,
}

impl ExportArgs {
    /// Applies command-line overrides on top of configured options
    pub fn apply(&self, mut options: ExportOptions) -> ExportOptions {
        if self.include_tags {
            options.include_tags = true;
        }
        if self.include_properties {
            options.include_properties = true;
        }
        if self.no_block_refs {
            options.preserve_block_refs = false;
        }
        if self.nested {
            options.flatten_nested = false;
        }
        if self.keep_syntax {
            options.remove_logseq_syntax = false;
        }
        if self.no_plain_uuids {
            options.resolve_plain_uuids = false;
        }
        if self.no_page_name {
            options.include_page_name = false;
        }
        if let Some(path) = &self.asset_path {
            options.asset_path = path.clone();
        }
        if self.debug {
            options.debug = true;
        }
        options
    }
}

fn run_export(args: &ExportArgs, config: &Config, output: &Output) -> Result<ExportOutput> {
    let options = args.apply(config.export.clone());
    output.verbose_ctx("export", &format!("Options: {:?}", options));

    let snapshot = GraphSnapshot::load(&args.graph)?;
    output.verbose_ctx(
        "export",
        &format!(
            "Loaded {} pages and {} attachments from {}",
            snapshot.pages.len(),
            snapshot.assets.len(),
            args.graph.display()
        ),
    );

    let mut host = MemoryHost::new(snapshot);
    if let Some(current) = args.page.as_ref().or(args.block.as_ref()) {
        host = host.with_current(current.clone());
    }

    let result = Exporter::new(&host, options).export();

    for (severity, message) in host.take_notifications() {
        output.notify(severity, &message);
    }

    result.context("Export failed")
}

/// Exports a page and prints or writes the Markdown
pub fn export(args: &ExportArgs, config: &Config, output: &Output) -> Result<()> {
    let result = run_export(args, config, output)?;

    if let Some(path) = &args.output {
        let mut markdown = result.markdown.clone();
        markdown.push('\n');
        fs::write(path, markdown)
            .with_context(|| format!("Failed to write output: {}", path.display()))?;

        if output.is_json() {
            output.data(&serde_json::json!({
                "path": path.display().to_string(),
                "title": result.title,
                "assets": result.assets,
            }));
        } else {
            output.success(&format!(
                "Exported {} to {} ({} attachments)",
                result.title.as_deref().unwrap_or("block"),
                path.display(),
                result.assets.len()
            ));
        }
        return Ok(());
    }

    if output.is_json() {
        output.data(&result);
    } else {
        println!("{}", result.markdown);
    }

    Ok(())
}

/// Runs an export and lists the attachments it discovered
pub fn assets(args: &ExportArgs, config: &Config, output: &Output) -> Result<()> {
    let result = run_export(args, config, output)?;
    print_assets(&result.assets, output);
    Ok(())
}

fn print_assets(assets: &AssetRegistry, output: &Output) {
    if output.is_json() {
        output.data(assets);
        return;
    }

    if assets.is_empty() {
        println!("No attachments referenced");
        return;
    }

    for info in assets.iter() {
        let source = info
            .source_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        output.row(&[
            info.uuid.as_str(),
            info.asset_type.as_str(),
            info.export_path.as_str(),
            source.as_str(),
            info.title.as_str(),
        ]);
    }
}
