//! Export options

use serde::{Deserialize, Serialize};

/// Options controlling a single export.
///
/// Field names accept both snake_case and the camelCase spelling used by the
/// host's settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Keep hashtag-style tags in the body
    #[serde(alias = "includeTags")]
    pub include_tags: bool,

    /// Emit YAML frontmatter from page properties
    #[serde(alias = "includeProperties")]
    pub include_properties: bool,

    /// Resolve `[[id]]`, `((id))` and bare identifiers
    #[serde(alias = "preserveBlockRefs")]
    pub preserve_block_refs: bool,

    /// Emit children as paragraphs instead of nested list items
    #[serde(alias = "flattenNested")]
    pub flatten_nested: bool,

    /// Strip outliner-specific markup (task keywords, priorities, macros)
    #[serde(alias = "removeLogseqSyntax")]
    pub remove_logseq_syntax: bool,

    /// Also resolve identifiers that are not wrapped in brackets
    #[serde(alias = "resolvePlainUuids")]
    pub resolve_plain_uuids: bool,

    /// Emit the page title as an H1
    #[serde(alias = "includePageName")]
    pub include_page_name: bool,

    /// Destination directory prefix for attachments
    #[serde(alias = "assetPath")]
    pub asset_path: String,

    /// Trace export internals
    pub debug: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_tags: false,
            include_properties: false,
            preserve_block_refs: true,
            flatten_nested: true,
            remove_logseq_syntax: true,
            resolve_plain_uuids: true,
            include_page_name: true,
            asset_path: "assets/".to_string(),
            debug: false,
        }
    }
}

impl ExportOptions {
    /// Asset path normalised to end with `/` (empty stays empty)
    pub fn asset_prefix(&self) -> String {
        let path = self.asset_path.trim();
        if path.is_empty() || path.ends_with('/') {
            path.to_string()
        } else {
            format!("{}/", path)
        }
    }
}
