//! Block domain model
//!
//! Blocks are the nodes of a page's content tree. Display attributes (heading
//! level, quote/code display type, code language) move around between host
//! versions, so they are read through ordered probes rather than fixed fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::EntityRef;
use super::properties::{keyword, probe, PropertyBag};

/// Attribute locations for the heading level, most specific first
const HEADING_PATHS: &[&[&str]] = &[
    &["logseq.property/heading"],
    &["properties", "heading"],
    &["heading"],
];

/// Attribute locations for the display type (`quote`, `code`, ...)
const DISPLAY_TYPE_PATHS: &[&[&str]] = &[
    &["logseq.property.node/display-type"],
    &["properties", "logseq.property.node/display-type"],
    &["block/properties", "logseq.property.node/display-type"],
    &["display-type"],
];

/// Attribute locations for the code block language
const CODE_LANG_PATHS: &[&[&str]] = &[
    &["logseq.property.code/lang"],
    &["properties", "logseq.property.code/lang"],
    &["block/properties", "logseq.property.code/lang"],
    &["lang"],
];

/// Markers that identify a block holding the value of a page property
const PROPERTY_VALUE_PATHS: &[&[&str]] = &[
    &["logseq.property/created-from-property"],
    &["block/created-from-property"],
];

/// A node in a page's block tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique identifier
    pub uuid: String,

    /// Raw block text, possibly multi-line
    #[serde(default)]
    pub content: String,

    /// Internal numeric id in the host's graph
    #[serde(rename = "db/id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub db_id: Option<i64>,

    /// Owning page (only set on blocks fetched individually)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<EntityRef>,

    /// Ordered child blocks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,

    /// Block-level property bag
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,

    /// Every other attribute the host attached
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl Block {
    /// Creates a block with the given id and content
    pub fn new(uuid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Adds a child block (builder style)
    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    /// Sets a raw attribute (builder style)
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Heading level 1-6, if the block is marked as a heading.
    ///
    /// Values of the wrong type or out of range count as absent.
    pub fn heading_level(&self) -> Option<u8> {
        let value = probe(&self.attrs, &self.properties, HEADING_PATHS)?;
        let level = match value {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse::<u64>().ok()?,
            _ => return None,
        };
        (1..=6).contains(&level).then_some(level as u8)
    }

    /// Normalised display type, e.g. `quote` or `code`
    pub fn display_type(&self) -> Option<String> {
        probe(&self.attrs, &self.properties, DISPLAY_TYPE_PATHS).and_then(keyword)
    }

    /// Returns true if the block is displayed as a quote
    pub fn is_quote(&self) -> bool {
        self.display_type().as_deref() == Some("quote")
    }

    /// Returns true if the block is displayed as a code block
    pub fn is_code(&self) -> bool {
        self.display_type().as_deref() == Some("code")
    }

    /// Language tag attached to a code block
    pub fn code_lang(&self) -> Option<&str> {
        probe(&self.attrs, &self.properties, CODE_LANG_PATHS)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns true if this block only exists to hold a property value
    pub fn is_property_value(&self) -> bool {
        probe(&self.attrs, &self.properties, PROPERTY_VALUE_PATHS).is_some()
    }
}
