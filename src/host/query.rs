//! Structured queries issued against the host's data graph

use std::fmt;

/// A structured query and the shape of the rows it returns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// File type of an attachment. Rows: `[type, entity]`
    AssetType { uuid: String },

    /// Human titles of every property. Rows: `[ident, title]`
    PropertyTitles,

    /// Attachments with a given title. Rows: `[uuid, type, entity]`
    AssetByTitle { title: String },

    /// Pull of an entity by internal numeric id. Rows: `[entity]`
    EntityById { id: i64 },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::AssetType { uuid } => write!(f, "asset-type({})", uuid),
            Query::PropertyTitles => write!(f, "property-titles"),
            Query::AssetByTitle { title } => write!(f, "asset-by-title({})", title),
            Query::EntityById { id } => write!(f, "entity({})", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_compact() {
        assert_eq!(Query::EntityById { id: 42 }.to_string(), "entity(42)");
    }
}
