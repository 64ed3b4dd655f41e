//! logseq-md - Export outliner pages as portable Markdown
//!
//! Walks a page's block tree, resolves `[[id]]`, `((id))` and bare identifier
//! references into plain text, turns the page's property bag into YAML
//! frontmatter and collects the attachments the document links to.
//!
//! The outliner itself sits behind the [`host::Host`] trait; [`host::MemoryHost`]
//! serves a graph snapshot loaded from disk.

pub mod cli;
pub mod domain;
pub mod export;
pub mod host;
pub mod storage;

pub use domain::{AssetInfo, AssetRegistry, Block, Entity, ExportOptions};
pub use export::{ExportError, ExportOutput, Exporter};
pub use host::{Host, HostError, MemoryHost};
