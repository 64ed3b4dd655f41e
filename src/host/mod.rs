//! # Host Seam
//!
//! The exporter never talks to the outliner directly. Everything it needs is
//! behind the [`Host`] trait: entity lookups, the page block tree, the graph
//! root, structured queries and user notifications.
//!
//! ## Error Contract
//!
//! Every method returns a [`HostResult`]. The export engine treats any
//! [`HostError`] raised while resolving a reference as "this strategy found
//! nothing" and moves on to the next strategy. Only a missing export root is
//! fatal.
//!
//! ## Implementations
//!
//! | Type | Backing data |
//! |------|--------------|
//! | [`MemoryHost`] | A [`GraphSnapshot`](crate::storage::GraphSnapshot) loaded from JSON or YAML |

mod memory;
mod query;

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::domain::{Block, Entity};

pub use memory::MemoryHost;
pub use query::Query;

/// Failure of a single host call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Host API call failed: {0}")]
    Api(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Severity of a user notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Capabilities the exporter consumes from the outliner
pub trait Host {
    /// The page being viewed, or the focused block if one is being edited.
    ///
    /// A focused block is recognised by its parent page reference.
    fn current_page_or_focused_block(&self) -> HostResult<Option<Entity>>;

    /// Looks up a page (or any page-like entity) by uuid or name
    fn page(&self, id: &str) -> HostResult<Option<Entity>>;

    /// Looks up a block by uuid
    fn block(&self, id: &str, include_children: bool) -> HostResult<Option<Block>>;

    /// Top-level blocks of a page with their full subtrees
    fn page_blocks_tree(&self, page_id: &str) -> HostResult<Vec<Block>>;

    /// Directory of the current graph on disk
    fn graph_root(&self) -> HostResult<Option<PathBuf>>;

    /// Runs a structured query; see [`Query`] for the row shape of each variant
    fn query(&self, query: &Query) -> HostResult<Vec<Value>>;

    /// Shows a message to the user
    fn notify(&self, message: &str, severity: Severity);
}
