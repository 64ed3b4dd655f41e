//! YAML frontmatter from a page's property bag
//!
//! Property keys are internal idents (`user.property/status-x1y2`); their
//! human labels come from a metadata query run once per export. Values are
//! resolved by shape: link strings, bare identifiers, internal numeric
//! references, arrays and sets.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::syntax::{is_uuid, slugify};
use super::yaml;
use super::Exporter;
use crate::domain::Entity;
use crate::host::{Host, Query};

/// System properties exported even though they are not user-defined
const ALLOWED_SYSTEM_KEYS: &[(&str, &str)] = &[
    ("block/tags", "tags"),
    ("block/alias", "alias"),
    ("logseq.property/description", "description"),
    ("logseq.property/status", "status"),
];

const USER_NAMESPACE: &str = "user.property/";

/// Keys under which a set-like value keeps its members
const SET_KEYS: &[&str] = &["#set", "set", "~#set"];

impl<H: Host + ?Sized> Exporter<'_, H> {
    /// Builds the `---` fenced frontmatter for `page`; "" when there is
    /// nothing to emit
    pub fn generate_frontmatter(&mut self, page: &Entity) -> String {
        let page = self.refetch_page(page);
        let mut fields: Vec<(String, Value)> = Vec::new();

        if let Some(name) = page.display_name() {
            fields.push(("title".to_string(), Value::String(name.to_string())));
            fields.push(("slug".to_string(), Value::String(slugify(name))));
        }

        let labelled = self.labelled_properties(&page);

        let mut tags: Vec<String> = Vec::new();
        let tag_sources = labelled
            .iter()
            .filter(|(label, _)| label.eq_ignore_ascii_case("tags"))
            .chain(labelled.iter().filter(|(label, _)| is_tag_like(label)));
        for (label, value) in tag_sources {
            for tag in self.tag_values(value) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
            self.trace("frontmatter", &format!("Merged tags from {}", label));
        }

        for (label, value) in &labelled {
            if label.eq_ignore_ascii_case("tags") || is_tag_like(label) {
                continue;
            }
            let Some(resolved) = self.resolve_property_value(value) else {
                continue;
            };
            let key = if label.eq_ignore_ascii_case("title") {
                "title".to_string()
            } else {
                label.clone()
            };
            upsert(&mut fields, key, resolved);
        }

        if !tags.is_empty() {
            upsert(
                &mut fields,
                "tags".to_string(),
                Value::Array(tags.into_iter().map(Value::String).collect()),
            );
        }

        yaml::frontmatter(&fields)
    }

    fn refetch_page(&self, page: &Entity) -> Entity {
        match self.host.page(&page.uuid) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => page.clone(),
            Err(e) => {
                self.trace("frontmatter", &format!("Page refetch failed: {}", e));
                page.clone()
            }
        }
    }

    /// Exportable properties paired with their labels, in bag order
    fn labelled_properties(&mut self, page: &Entity) -> Vec<(String, Value)> {
        self.load_property_titles();
        let empty = HashMap::new();
        let titles = self.state.property_titles.as_ref().unwrap_or(&empty);

        page.properties
            .iter()
            .filter(|(_, value)| !value.is_null())
            .filter_map(|(key, value)| {
                let key = key.trim_start_matches(':');
                match property_label(key, titles) {
                    Some(label) => Some((label, value.clone())),
                    None => {
                        self.trace("frontmatter", &format!("Skipping property {}", key));
                        None
                    }
                }
            })
            .collect()
    }

    /// Queries the property ident -> title map once per export
    fn load_property_titles(&mut self) {
        if self.state.property_titles.is_some() {
            return;
        }

        let titles = match self.host.query(&Query::PropertyTitles) {
            Ok(rows) => rows.iter().filter_map(parse_title_row).collect(),
            Err(e) => {
                self.trace("frontmatter", &format!("Property title query failed: {}", e));
                HashMap::new()
            }
        };
        self.state.property_titles = Some(titles);
    }

    fn tag_values(&mut self, value: &Value) -> Vec<String> {
        match self.resolve_property_value(value) {
            Some(Value::Array(items)) => items.iter().filter_map(tag_text).collect(),
            Some(other) => tag_text(&other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Resolves one property value by its shape; `None` means "omit"
    pub(crate) fn resolve_property_value(&mut self, value: &Value) -> Option<Value> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Value::String(self.resolve_property_string(s))),
            Value::Number(n) => Some(
                n.as_i64()
                    .and_then(|id| self.dereference(id))
                    .unwrap_or_else(|| value.clone()),
            ),
            Value::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .filter_map(|item| self.resolve_property_value(item))
                    .collect(),
            )),
            Value::Object(map) => Some(self.resolve_property_object(map, value)),
            Value::Bool(_) => Some(value.clone()),
        }
    }

    fn resolve_property_string(&mut self, s: &str) -> String {
        let trimmed = s.trim();

        if let Some(inner) = trimmed
            .strip_prefix("[[")
            .and_then(|rest| rest.strip_suffix("]]"))
        {
            if is_uuid(inner) {
                if let Some(asset) = self.asset_for(inner) {
                    return asset.export_path;
                }
                if let Some(name) = self.page_name(inner) {
                    return name;
                }
            }
            return inner.to_string();
        }

        if is_uuid(trimmed) {
            if let Some(asset) = self
                .asset_for(trimmed)
                .or_else(|| self.asset_by_title(trimmed))
            {
                return asset.export_path;
            }
        }

        s.to_string()
    }

    fn resolve_property_object(&mut self, map: &Map<String, Value>, original: &Value) -> Value {
        if let Some(id) = reference_id(map) {
            return self.dereference(id).unwrap_or_else(|| original.clone());
        }

        if let Some(members) = SET_KEYS.iter().find_map(|k| map.get(*k)) {
            let members = match members {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            return Value::Array(
                members
                    .iter()
                    .filter_map(|item| self.resolve_property_value(item))
                    .collect(),
            );
        }

        original.clone()
    }

    /// Looks up an internal numeric reference: attachments give their
    /// export path, anything else its text
    fn dereference(&mut self, id: i64) -> Option<Value> {
        let query = Query::EntityById { id };
        let rows = match self.host.query(&query) {
            Ok(rows) => rows,
            Err(e) => {
                self.trace("frontmatter", &format!("{} failed: {}", query, e));
                return None;
            }
        };

        let entity = rows.iter().find_map(parse_entity_row)?;
        if let Some(asset) = self.register_entity_asset(&entity) {
            return Some(Value::String(asset.export_path));
        }
        entity.text().map(|t| Value::String(t.to_string()))
    }
}

/// Human label for a property key, or `None` if the key is not exported
fn property_label(key: &str, titles: &HashMap<String, String>) -> Option<String> {
    if let Some(title) = titles.get(key).filter(|t| !t.trim().is_empty()) {
        let allowed = key.starts_with(USER_NAMESPACE)
            || !key.contains('/')
            || ALLOWED_SYSTEM_KEYS.iter().any(|(k, _)| *k == key);
        return allowed.then(|| title.clone());
    }

    if let Some((_, label)) = ALLOWED_SYSTEM_KEYS.iter().find(|(k, _)| *k == key) {
        return Some(label.to_string());
    }

    (!key.contains('/') && !key.is_empty()).then(|| key.to_string())
}

fn is_tag_like(label: &str) -> bool {
    let label = label.to_lowercase();
    label == "tag" || label.ends_with("-tags") || label.ends_with(" tags") || label.ends_with("_tags")
}

fn tag_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn upsert(fields: &mut Vec<(String, Value)>, key: String, value: Value) {
    match fields.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => fields.push((key, value)),
    }
}

/// `{"db/id": N}` or `{"id": N}` with nothing else in it
fn reference_id(map: &Map<String, Value>) -> Option<i64> {
    if map.len() != 1 {
        return None;
    }
    map.get("db/id")
        .or_else(|| map.get(":db/id"))
        .or_else(|| map.get("id"))
        .and_then(Value::as_i64)
}

/// Row shape `[ident, title]`, also accepting `{ident, title}`
fn parse_title_row(row: &Value) -> Option<(String, String)> {
    let (ident, title) = match row {
        Value::Array(cols) => (cols.first()?, cols.get(1)?),
        Value::Object(map) => (map.get("ident")?, map.get("title")?),
        _ => return None,
    };
    let ident = ident.as_str()?.trim_start_matches(':');
    let title = title.as_str()?;
    Some((ident.to_string(), title.to_string()))
}

/// Row shape `[entity]`, also accepting a bare entity
fn parse_entity_row(row: &Value) -> Option<Entity> {
    let value = match row {
        Value::Array(cols) => cols.first()?,
        other => other,
    };
    serde_json::from_value(value.clone()).ok()
}
