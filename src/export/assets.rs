//! Attachment detection
//!
//! An identifier denotes an attachment when the host knows a file type for
//! it. Two strategies are tried: a structured query, then a plain entity
//! lookup. Host failures count as "not an attachment".

use std::borrow::Cow;

use regex::Captures;
use serde_json::Value;

use super::syntax::{short_id, RELATIVE_ASSET_LINK};
use super::Exporter;
use crate::domain::{AssetInfo, Entity};
use crate::host::{Host, Query};

/// An attachment found by the detector
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedAsset {
    /// File-type extension
    pub asset_type: String,

    /// The matched entity, used for its title
    pub entity: Entity,
}

impl<H: Host + ?Sized> Exporter<'_, H> {
    /// Determines whether `id` denotes an attachment
    pub fn detect_asset(&self, id: &str) -> Option<DetectedAsset> {
        self.detect_by_query(id).or_else(|| self.detect_by_entity(id))
    }

    fn detect_by_query(&self, id: &str) -> Option<DetectedAsset> {
        let query = Query::AssetType {
            uuid: id.to_string(),
        };

        match self.host.query(&query) {
            Ok(rows) => rows.iter().find_map(parse_asset_type_row),
            Err(e) => {
                self.trace("assets", &format!("{} failed: {}", query, e));
                None
            }
        }
    }

    fn detect_by_entity(&self, id: &str) -> Option<DetectedAsset> {
        let entity = match self.host.page(id) {
            Ok(Some(entity)) => entity,
            Ok(None) => return None,
            Err(e) => {
                self.trace("assets", &format!("Entity lookup for {} failed: {}", id, e));
                return None;
            }
        };

        let asset_type = entity.asset_type()?.to_string();
        Some(DetectedAsset { asset_type, entity })
    }

    /// Registered attachment for `id`, detecting and registering it on first use
    pub(crate) fn asset_for(&mut self, id: &str) -> Option<AssetInfo> {
        if id.is_empty() {
            return None;
        }
        if let Some(info) = self.state.assets.get(id) {
            return Some(info.clone());
        }

        let detected = self.detect_asset(id)?;
        let title = detected
            .entity
            .asset_title()
            .map(str::to_string)
            .unwrap_or_else(|| format!("asset-{}", short_id(id)));

        self.trace("assets", &format!("{} is a {} attachment", id, detected.asset_type));
        Some(self.register_asset(id, title, detected.asset_type))
    }

    /// Attachment whose title equals `title`
    pub(crate) fn asset_by_title(&mut self, title: &str) -> Option<AssetInfo> {
        let query = Query::AssetByTitle {
            title: title.to_string(),
        };

        let rows = match self.host.query(&query) {
            Ok(rows) => rows,
            Err(e) => {
                self.trace("assets", &format!("{} failed: {}", query, e));
                return None;
            }
        };

        let (uuid, asset_type) = rows.iter().find_map(parse_asset_title_row)?;
        if let Some(info) = self.state.assets.get(&uuid) {
            return Some(info.clone());
        }
        Some(self.register_asset(&uuid, title.to_string(), asset_type))
    }

    /// Registers an attachment entity that was reached some other way
    pub(crate) fn register_entity_asset(&mut self, entity: &Entity) -> Option<AssetInfo> {
        let asset_type = entity.asset_type()?.to_string();
        if let Some(info) = self.state.assets.get(&entity.uuid) {
            return Some(info.clone());
        }

        let title = entity
            .asset_title()
            .map(str::to_string)
            .unwrap_or_else(|| format!("asset-{}", short_id(&entity.uuid)));
        Some(self.register_asset(&entity.uuid, title, asset_type))
    }

    fn register_asset(&mut self, uuid: &str, title: String, asset_type: String) -> AssetInfo {
        let prefix = self.options.asset_prefix();
        let root = self.graph_root();
        let info = AssetInfo::new(uuid, title, asset_type, &prefix, root.as_ref());
        self.state.assets.register(info).clone()
    }

    /// Rewrites `../assets/...` links to the configured asset path and
    /// registers the files they point at
    pub(crate) fn track_asset_links(&mut self, text: &str) -> String {
        if !text.contains("../assets/") {
            return text.to_string();
        }

        let prefix = self.options.asset_prefix();
        let root = self.graph_root();
        let mut found = Vec::new();

        let rewritten: Cow<'_, str> = RELATIVE_ASSET_LINK.replace_all(text, |caps: &Captures| {
            let bang = &caps[1];
            let alt = &caps[2];
            let file_name = &caps[3];

            let (stem, ext) = match file_name.rsplit_once('.') {
                Some((stem, ext)) => (stem, ext),
                None => (file_name, ""),
            };
            let title = if alt.trim().is_empty() { stem } else { alt };

            let info = AssetInfo::for_file(stem, title, ext, file_name, &prefix, root.as_ref());
            let link = format!("{}[{}]({})", bang, alt, info.export_path);
            found.push(info);
            link
        });
        let rewritten = rewritten.into_owned();

        for info in found {
            self.trace("assets", &format!("Linked attachment {}", info.export_path));
            self.state.assets.register(info);
        }

        rewritten
    }
}

/// Row shape `[type, entity]`, also accepting `{type, entity}`
fn parse_asset_type_row(row: &Value) -> Option<DetectedAsset> {
    let (asset_type, entity) = match row {
        Value::Array(cols) => (cols.first()?, cols.get(1)),
        Value::Object(map) => (map.get("type")?, map.get("entity")),
        _ => return None,
    };

    let asset_type = asset_type.as_str()?.trim().trim_start_matches('.');
    if asset_type.is_empty() {
        return None;
    }

    let entity = entity
        .and_then(|e| serde_json::from_value::<Entity>(e.clone()).ok())
        .unwrap_or_default();

    Some(DetectedAsset {
        asset_type: asset_type.to_string(),
        entity,
    })
}

/// Row shape `[uuid, type, entity]`
fn parse_asset_title_row(row: &Value) -> Option<(String, String)> {
    let cols = row.as_array()?;
    let uuid = cols.first()?.as_str()?;
    let asset_type = cols.get(1)?.as_str()?;
    if uuid.is_empty() || asset_type.is_empty() {
        return None;
    }
    Some((uuid.to_string(), asset_type.to_string()))
}
