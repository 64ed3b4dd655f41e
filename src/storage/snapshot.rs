//! Graph snapshots
//!
//! A snapshot is a JSON or YAML dump of the parts of a graph an export needs:
//! pages with their block trees, attachment entities and property titles.
//! It backs [`MemoryHost`](crate::host::MemoryHost).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{Block, Entity};

/// A page together with its block tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(flatten)]
    pub entity: Entity,

    /// Top-level blocks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl PageRecord {
    /// Creates a page record with the given id, name and blocks
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            entity: Entity::page(uuid, name),
            blocks,
        }
    }
}

/// In-memory copy of a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSnapshot {
    /// Directory of the graph on disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_root: Option<PathBuf>,

    /// Uuid or name of the active page or focused block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,

    /// Pages with their block trees
    pub pages: Vec<PageRecord>,

    /// Attachment entities
    pub assets: Vec<Entity>,

    /// Property ident -> human title
    pub properties: BTreeMap<String, String>,
}

impl GraphSnapshot {
    /// Loads a snapshot, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph snapshot: {}", path.display()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
        .with_context(|| format!("Failed to parse graph snapshot: {}", path.display()))
    }

    /// Parses a JSON snapshot
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid JSON snapshot")
    }

    /// Parses a YAML snapshot
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid YAML snapshot")
    }
}
