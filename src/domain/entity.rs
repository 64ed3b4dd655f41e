//! Entities as returned by the host: pages, attachments, focused blocks

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::properties::{probe, PropertyBag};

/// Attribute locations for an attachment's file type
const ASSET_TYPE_PATHS: &[&[&str]] = &[
    &["properties", "logseq.property.asset/type"],
    &["logseq.property.asset/type"],
    &["asset/type"],
];

/// Alternate spellings of the title property
const TITLE_PROPERTY_PATHS: &[&[&str]] = &[&["block/title"], &["properties", "title"]];

/// Reference from one entity to another (e.g. a block's page)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "db/id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub db_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A page, attachment, or block as returned by an entity lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    #[serde(default)]
    pub uuid: String,

    /// Internal numeric id in the host's graph
    #[serde(rename = "db/id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub db_id: Option<i64>,

    /// Normalised (lowercase) page name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Page name as the user typed it
    #[serde(
        rename = "original-name",
        alias = "originalName",
        alias = "original_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_name: Option<String>,

    /// Entity title (attachments, DB-version pages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Block content, when the entity is a block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Parent page reference; present only on block-shaped entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<EntityRef>,

    /// Property bag
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,

    /// Every other attribute the host attached
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl Entity {
    /// Creates a page entity with the given id and name
    pub fn page(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uuid: uuid.into(),
            name: Some(name.to_lowercase()),
            original_name: Some(name),
            ..Default::default()
        }
    }

    /// Returns true if this entity is a block (it points at a parent page)
    pub fn is_block(&self) -> bool {
        self.page.is_some()
    }

    /// Human-readable name: original name, then name, then title
    pub fn display_name(&self) -> Option<&str> {
        [&self.original_name, &self.name, &self.title]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
    }

    /// File type if this entity is an attachment
    pub fn asset_type(&self) -> Option<&str> {
        probe(&self.attrs, &self.properties, ASSET_TYPE_PATHS)
            .and_then(Value::as_str)
            .map(|s| s.trim().trim_start_matches('.'))
            .filter(|s| !s.is_empty())
    }

    /// Title for an attachment link: title field, title properties, then name
    pub fn asset_title(&self) -> Option<&str> {
        let non_empty = |s: &&str| !s.trim().is_empty();

        self.title
            .as_deref()
            .filter(non_empty)
            .or_else(|| {
                probe(&self.attrs, &self.properties, TITLE_PROPERTY_PATHS)
                    .and_then(Value::as_str)
                    .filter(non_empty)
            })
            .or_else(|| self.original_name.as_deref().filter(non_empty))
            .or_else(|| self.name.as_deref().filter(non_empty))
    }

    /// Text for a dereferenced entity: display name, then block content
    pub fn text(&self) -> Option<&str> {
        self.display_name()
            .or_else(|| self.content.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_shaped_entity() {
        let entity: Entity = serde_json::from_value(json!({
            "uuid": "b1",
            "content": "focused",
            "page": {"id": 3}
        }))
        .unwrap();

        assert!(entity.is_block());
        assert_eq!(entity.page.unwrap().db_id, Some(3));
    }

    #[test]
    fn display_name_prefers_original() {
        let page = Entity::page("p1", "My Page");
        assert_eq!(page.display_name(), Some("My Page"));
        assert!(!page.is_block());
    }

    #[test]
    fn asset_type_and_title() {
        let entity: Entity = serde_json::from_value(json!({
            "uuid": "a1",
            ":block/title": "Diagram",
            "properties": {"logseq.property.asset/type": "png"}
        }))
        .unwrap();

        assert_eq!(entity.asset_type(), Some("png"));
        assert_eq!(entity.asset_title(), Some("Diagram"));
    }

    #[test]
    fn asset_title_falls_back_to_name() {
        let mut entity = Entity::page("a2", "scan");
        entity.original_name = None;
        assert_eq!(entity.asset_title(), Some("scan"));

        let bare = Entity::default();
        assert_eq!(bare.asset_title(), None);
    }
}
