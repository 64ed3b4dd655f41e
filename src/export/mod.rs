//! # Export Engine
//!
//! Turns a page (or the children of a focused block) into a single Markdown
//! document.
//!
//! ## Pipeline
//!
//! ```text
//! current page/block ──► page tree ──► drop property-value blocks
//!                                        │
//!                         pre-warm reference cache
//!                                        │
//!      frontmatter (optional) + "# Title" (optional) + formatted blocks
//!                                        │
//!                              whitespace normalisation
//! ```
//!
//! ## Per-Export State
//!
//! An [`Exporter`] owns its resolution cache, the set of emitted block ids,
//! the attachment registry and the property-title map. All of them are reset
//! at the start of every [`Exporter::export`] call. Overlapping exports need
//! separate exporters.
//!
//! ## Components
//!
//! | File | Role |
//! |------|------|
//! | `syntax.rs` | Identifier shapes, markup stripping, slugs, whitespace |
//! | `assets.rs` | Attachment detection and registration |
//! | `resolver.rs` | `[[id]]`, `((id))` and bare id resolution |
//! | `frontmatter.rs` | Property bag to YAML |
//! | `formatter.rs` | Block tree walk |
//! | `yaml.rs` | YAML emission |

mod assets;
mod formatter;
mod frontmatter;
mod resolver;
mod syntax;
mod yaml;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{AssetRegistry, Block, Entity, ExportOptions};
use crate::host::{Host, HostError, Severity};

pub use assets::DetectedAsset;
pub use syntax::{is_property_only, is_uuid, normalize_markdown, short_id, slugify, strip_logseq_syntax};
pub use yaml::frontmatter as render_frontmatter;

/// Failure of a whole export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("NO_ACTIVE_PAGE: no page or block is currently open")]
    NoActivePage,

    #[error("Failed to read page blocks: {0}")]
    Host(#[from] HostError),
}

impl ExportError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::NoActivePage => "NO_ACTIVE_PAGE",
            ExportError::Host(_) => "HOST_ERROR",
        }
    }
}

/// Result of one export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportOutput {
    /// Title of the exported page, if it has one
    pub title: Option<String>,

    /// Final Markdown document
    pub markdown: String,

    /// Attachments referenced by the document
    pub assets: AssetRegistry,
}

#[derive(Debug, Default)]
struct ExportState {
    /// Identifier -> resolved text or Markdown link
    cache: HashMap<String, String>,

    /// Blocks already emitted
    processed: HashSet<String>,

    assets: AssetRegistry,

    /// Property ident -> human title, loaded on first use
    property_titles: Option<HashMap<String, String>>,

    /// Graph root, looked up on first use
    graph_root: Option<Option<PathBuf>>,
}

/// Exports pages from a [`Host`] as Markdown
pub struct Exporter<'h, H: Host + ?Sized> {
    host: &'h H,
    options: ExportOptions,
    state: ExportState,
}

impl<'h, H: Host + ?Sized> Exporter<'h, H> {
    /// Creates an exporter over `host`
    pub fn new(host: &'h H, options: ExportOptions) -> Self {
        Self {
            host,
            options,
            state: ExportState::default(),
        }
    }

    /// Attachments discovered since the last reset
    pub fn assets(&self) -> &AssetRegistry {
        &self.state.assets
    }

    /// Clears the cache, the emitted-block set and the attachment registry
    pub fn reset(&mut self) {
        self.state = ExportState::default();
    }

    /// Exports the host's current page or focused block.
    ///
    /// Fails with [`ExportError::NoActivePage`] (after notifying the user) if
    /// nothing is open.
    pub fn export(&mut self) -> Result<ExportOutput, ExportError> {
        self.reset();

        let current = match self.host.current_page_or_focused_block() {
            Ok(Some(entity)) => entity,
            Ok(None) => return Err(self.no_active_page()),
            Err(e) => {
                self.trace("export", &format!("Current page lookup failed: {}", e));
                return Err(self.no_active_page());
            }
        };

        self.export_entity(&current)
    }

    /// Exports a specific page or block entity
    pub fn export_entity(&mut self, entity: &Entity) -> Result<ExportOutput, ExportError> {
        self.reset();

        if entity.is_block() {
            self.export_focused_block(entity)
        } else {
            self.export_page(entity)
        }
    }

    fn no_active_page(&self) -> ExportError {
        let err = ExportError::NoActivePage;
        self.host.notify(&err.to_string(), Severity::Error);
        err
    }

    fn export_page(&mut self, page: &Entity) -> Result<ExportOutput, ExportError> {
        let title = page.display_name().map(str::to_string);
        self.trace(
            "export",
            &format!("Exporting page {} ({})", title.as_deref().unwrap_or("?"), page.uuid),
        );

        let blocks = self.content_blocks(self.host.page_blocks_tree(&page.uuid)?);
        self.prewarm(&blocks);

        let mut parts = Vec::new();

        if self.options.include_properties {
            let yaml = self.generate_frontmatter(page);
            if !yaml.is_empty() {
                parts.push(yaml);
            }
        }

        if self.options.include_page_name {
            if let Some(name) = &title {
                parts.push(format!("# {}", name));
            }
        }

        let body = normalize_markdown(&self.format_blocks(&blocks, 0));
        if !body.is_empty() {
            parts.push(body);
        }

        Ok(self.finish(title, parts))
    }

    fn export_focused_block(&mut self, entity: &Entity) -> Result<ExportOutput, ExportError> {
        self.trace("export", &format!("Exporting children of block {}", entity.uuid));

        let children = match self.host.block(&entity.uuid, true) {
            Ok(Some(block)) => block.children,
            Ok(None) => Vec::new(),
            Err(e) => {
                self.trace("export", &format!("Block lookup failed: {}", e));
                Vec::new()
            }
        };

        let blocks = self.content_blocks(children);
        self.prewarm(&blocks);

        let body = normalize_markdown(&self.format_blocks(&blocks, 0));
        let parts = if body.is_empty() { vec![] } else { vec![body] };

        Ok(self.finish(None, parts))
    }

    fn finish(&mut self, title: Option<String>, parts: Vec<String>) -> ExportOutput {
        self.trace(
            "export",
            &format!(
                "Done: {} cached references, {} blocks, {} attachments",
                self.state.cache.len(),
                self.state.processed.len(),
                self.state.assets.len()
            ),
        );

        ExportOutput {
            title,
            markdown: parts.join("\n\n"),
            assets: self.state.assets.clone(),
        }
    }

    /// Drops top-level blocks that only hold a property value
    fn content_blocks(&self, blocks: Vec<Block>) -> Vec<Block> {
        blocks
            .into_iter()
            .filter(|b| {
                let keep = !b.is_property_value();
                if !keep {
                    self.trace("export", &format!("Skipping property value block {}", b.uuid));
                }
                keep
            })
            .collect()
    }

    /// Graph root, fetched once per export
    fn graph_root(&mut self) -> Option<PathBuf> {
        if self.state.graph_root.is_none() {
            let root = self.host.graph_root().unwrap_or_else(|e| {
                self.trace("export", &format!("Graph root lookup failed: {}", e));
                None
            });
            self.state.graph_root = Some(root);
        }
        self.state.graph_root.clone().flatten()
    }

    /// Emits a debug trace when `debug` is enabled
    fn trace(&self, context: &str, message: &str) {
        if self.options.debug {
            tracing::debug!(context, "{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::storage::{GraphSnapshot, PageRecord};

    fn host(blocks: Vec<Block>) -> MemoryHost {
        MemoryHost::new(GraphSnapshot {
            pages: vec![PageRecord::new("p1", "Test Page", blocks)],
            ..Default::default()
        })
        .with_current("p1")
    }

    #[test]
    fn exports_title_and_body() {
        let host = host(vec![Block::new("b1", "Hello World")]);
        let output = Exporter::new(&host, ExportOptions::default()).export().unwrap();

        assert_eq!(output.title.as_deref(), Some("Test Page"));
        assert_eq!(output.markdown, "# Test Page\n\nHello World");
    }

    #[test]
    fn no_active_page_notifies() {
        let host = MemoryHost::new(GraphSnapshot::default());
        let err = Exporter::new(&host, ExportOptions::default()).export().unwrap_err();

        assert!(matches!(err, ExportError::NoActivePage));
        assert_eq!(err.code(), "NO_ACTIVE_PAGE");
        let notes = host.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, Severity::Error);
    }

    #[test]
    fn property_value_blocks_are_dropped() {
        let host = host(vec![
            Block::new("b1", "42").with_attr("logseq.property/created-from-property", 7),
            Block::new("b2", "Visible"),
        ]);
        let options = ExportOptions {
            include_page_name: false,
            ..Default::default()
        };
        let output = Exporter::new(&host, options).export().unwrap();
        assert_eq!(output.markdown, "Visible");
    }

    #[test]
    fn state_resets_between_exports() {
        let host = host(vec![Block::new("b1", "Once")]);
        let mut exporter = Exporter::new(&host, ExportOptions::default());

        let first = exporter.export().unwrap();
        let second = exporter.export().unwrap();
        assert_eq!(first.markdown, second.markdown);
    }
}
