//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `export` | Export a page or focused block from a graph snapshot |
//! | `assets` | List the attachments an export references |
//! | `config show\|path\|init` | Inspect or write configuration |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Markdown or human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! logseq-md --verbose export --graph notes.json --page "Weekly Review"
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod config_cmd;
mod export_cmd;
mod output;

pub use app::{run, Cli, Commands};
pub use export_cmd::ExportArgs;
pub use output::{Output, OutputFormat};
