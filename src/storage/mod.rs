//! # Storage Layer
//!
//! File-backed inputs of the exporter.
//!
//! ## Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Global config | TOML | `~/.config/logseq-md/config.toml` |
//! | Project config | TOML | nearest `.logseq-md.toml` |
//! | Graph snapshot | JSON or YAML | anywhere, passed with `--graph` |
//!
//! ## Key Types
//!
//! - [`Config`] - Layered export configuration
//! - [`GraphSnapshot`] - Pages, attachments and property titles of a graph

mod config;
mod snapshot;

pub use config::{Config, ConfigError, ConfigFile, PROJECT_CONFIG_FILE};
pub use snapshot::{GraphSnapshot, PageRecord};
