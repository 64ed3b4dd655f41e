//! Attachment descriptors and the per-export attachment registry

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File types rendered with Markdown image syntax
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp"];

/// A resolved binary attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Identifier of the attachment
    pub uuid: String,

    /// Display title
    pub title: String,

    /// File-type extension without the dot
    #[serde(rename = "type")]
    pub asset_type: String,

    /// Destination path relative to the exported Markdown
    pub export_path: String,

    /// Location of the file inside the graph, when the graph root is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl AssetInfo {
    /// Builds the descriptor for an attachment stored as `<uuid>.<type>`
    pub fn new(
        uuid: impl Into<String>,
        title: impl Into<String>,
        asset_type: impl Into<String>,
        asset_prefix: &str,
        graph_root: Option<&PathBuf>,
    ) -> Self {
        let uuid = uuid.into();
        let asset_type = asset_type.into().to_lowercase();
        let file_name = format!("{}.{}", uuid, asset_type);
        Self::for_file(uuid, title, asset_type, &file_name, asset_prefix, graph_root)
    }

    /// Builds the descriptor for an attachment stored under an explicit file name
    pub fn for_file(
        uuid: impl Into<String>,
        title: impl Into<String>,
        asset_type: impl Into<String>,
        file_name: &str,
        asset_prefix: &str,
        graph_root: Option<&PathBuf>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            title: title.into(),
            asset_type: asset_type.into().to_lowercase(),
            export_path: format!("{}{}", asset_prefix, file_name),
            source_path: graph_root.map(|root| root.join("assets").join(file_name)),
        }
    }

    /// Returns true if the attachment is an image
    pub fn is_image(&self) -> bool {
        IMAGE_EXTENSIONS.contains(&self.asset_type.as_str())
    }

    /// Markdown link to the exported file (`![..](..)` for images)
    pub fn markdown_link(&self) -> String {
        let bang = if self.is_image() { "!" } else { "" };
        format!("{}[{}]({})", bang, self.title, self.export_path)
    }
}

/// Attachments discovered during one export, keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRegistry(BTreeMap<String, AssetInfo>);

impl AssetRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an attachment; the first registration for an id wins
    pub fn register(&mut self, info: AssetInfo) -> &AssetInfo {
        self.0.entry(info.uuid.clone()).or_insert(info)
    }

    /// Gets an attachment by id
    pub fn get(&self, uuid: &str) -> Option<&AssetInfo> {
        self.0.get(uuid)
    }

    /// Returns true if nothing was registered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of attachments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over attachments ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &AssetInfo> {
        self.0.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_link_uses_bang() {
        let info = AssetInfo::new("abc", "My Image", "PNG", "images/", None);
        assert_eq!(info.export_path, "images/abc.png");
        assert_eq!(info.markdown_link(), "![My Image](images/abc.png)");
    }

    #[test]
    fn document_link_is_plain() {
        let root = PathBuf::from("/graphs/notes");
        let info = AssetInfo::new("abc", "Report", "pdf", "assets/", Some(&root));
        assert_eq!(info.markdown_link(), "[Report](assets/abc.pdf)");
        assert_eq!(info.source_path, Some(PathBuf::from("/graphs/notes/assets/abc.pdf")));
    }

    #[test]
    fn registry_keeps_first_entry() {
        let mut registry = AssetRegistry::new();
        registry.register(AssetInfo::new("abc", "First", "png", "a/", None));
        registry.register(AssetInfo::new("abc", "Second", "png", "a/", None));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("abc").unwrap().title, "First");
    }
}
