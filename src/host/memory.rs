//! Host backed by an in-memory graph snapshot

use std::cell::RefCell;
use std::path::PathBuf;

use serde_json::{json, Value};

use super::{Host, HostError, HostResult, Query, Severity};
use crate::domain::{Block, Entity, EntityRef};
use crate::storage::{GraphSnapshot, PageRecord};

/// [`Host`] implementation answering every call from a [`GraphSnapshot`]
#[derive(Debug, Default)]
pub struct MemoryHost {
    snapshot: GraphSnapshot,

    /// Notifications shown to the user, oldest first
    notifications: RefCell<Vec<(Severity, String)>>,
}

impl MemoryHost {
    /// Creates a host over the given snapshot
    pub fn new(snapshot: GraphSnapshot) -> Self {
        Self {
            snapshot,
            notifications: RefCell::new(Vec::new()),
        }
    }

    /// Selects the active page or focused block by uuid or page name
    pub fn with_current(mut self, current: impl Into<String>) -> Self {
        self.snapshot.current = Some(current.into());
        self
    }

    /// Returns the underlying snapshot
    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    /// Drains the notifications recorded so far
    pub fn take_notifications(&self) -> Vec<(Severity, String)> {
        self.notifications.take()
    }

    fn find_page(&self, id: &str) -> Option<&PageRecord> {
        self.snapshot.pages.iter().find(|p| {
            p.entity.uuid == id
                || [&p.entity.original_name, &p.entity.name]
                    .into_iter()
                    .flatten()
                    .any(|name| name.eq_ignore_ascii_case(id))
        })
    }

    fn find_block(&self, id: &str) -> Option<(&PageRecord, &Block)> {
        fn search<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
            blocks.iter().find_map(|b| {
                if b.uuid == id {
                    Some(b)
                } else {
                    search(&b.children, id)
                }
            })
        }

        self.snapshot
            .pages
            .iter()
            .find_map(|page| search(&page.blocks, id).map(|b| (page, b)))
    }

    fn find_block_by_db_id(&self, db_id: i64) -> Option<(&PageRecord, &Block)> {
        fn search(blocks: &[Block], db_id: i64) -> Option<&Block> {
            blocks.iter().find_map(|b| {
                if b.db_id == Some(db_id) {
                    Some(b)
                } else {
                    search(&b.children, db_id)
                }
            })
        }

        self.snapshot
            .pages
            .iter()
            .find_map(|page| search(&page.blocks, db_id).map(|b| (page, b)))
    }

    fn find_asset(&self, id: &str) -> Option<&Entity> {
        self.snapshot.assets.iter().find(|a| a.uuid == id)
    }

    fn page_ref(page: &PageRecord) -> EntityRef {
        EntityRef {
            db_id: page.entity.db_id,
            uuid: Some(page.entity.uuid.clone()),
            name: page.entity.display_name().map(str::to_string),
        }
    }

    fn block_entity(page: &PageRecord, block: &Block) -> Entity {
        Entity {
            uuid: block.uuid.clone(),
            db_id: block.db_id,
            content: Some(block.content.clone()),
            page: Some(Self::page_ref(page)),
            properties: block.properties.clone(),
            attrs: block.attrs.clone(),
            ..Default::default()
        }
    }

    fn to_row_value(entity: &Entity) -> HostResult<Value> {
        serde_json::to_value(entity).map_err(|e| HostError::Decode(e.to_string()))
    }

    fn entity_by_db_id(&self, db_id: i64) -> Option<Entity> {
        if let Some(page) = self
            .snapshot
            .pages
            .iter()
            .find(|p| p.entity.db_id == Some(db_id))
        {
            return Some(page.entity.clone());
        }

        if let Some(asset) = self.snapshot.assets.iter().find(|a| a.db_id == Some(db_id)) {
            return Some(asset.clone());
        }

        self.find_block_by_db_id(db_id)
            .map(|(page, block)| Self::block_entity(page, block))
    }
}

impl Host for MemoryHost {
    fn current_page_or_focused_block(&self) -> HostResult<Option<Entity>> {
        let current = match &self.snapshot.current {
            Some(c) => c,
            None => return Ok(None),
        };

        if let Some(page) = self.find_page(current) {
            return Ok(Some(page.entity.clone()));
        }

        Ok(self
            .find_block(current)
            .map(|(page, block)| Self::block_entity(page, block)))
    }

    fn page(&self, id: &str) -> HostResult<Option<Entity>> {
        Ok(self
            .find_page(id)
            .map(|p| p.entity.clone())
            .or_else(|| self.find_asset(id).cloned()))
    }

    fn block(&self, id: &str, include_children: bool) -> HostResult<Option<Block>> {
        Ok(self.find_block(id).map(|(page, block)| {
            let mut block = block.clone();
            block.page = Some(Self::page_ref(page));
            if !include_children {
                block.children.clear();
            }
            block
        }))
    }

    fn page_blocks_tree(&self, page_id: &str) -> HostResult<Vec<Block>> {
        self.find_page(page_id)
            .map(|p| p.blocks.clone())
            .ok_or_else(|| HostError::NotFound(page_id.to_string()))
    }

    fn graph_root(&self) -> HostResult<Option<PathBuf>> {
        Ok(self.snapshot.graph_root.clone())
    }

    fn query(&self, query: &Query) -> HostResult<Vec<Value>> {
        match query {
            Query::AssetType { uuid } => self
                .find_asset(uuid)
                .and_then(|a| a.asset_type().map(|t| (t, a)))
                .map(|(t, a)| Ok(json!([t, Self::to_row_value(a)?])))
                .into_iter()
                .collect(),

            Query::PropertyTitles => Ok(self
                .snapshot
                .properties
                .iter()
                .map(|(ident, title)| json!([ident, title]))
                .collect()),

            Query::AssetByTitle { title } => self
                .snapshot
                .assets
                .iter()
                .filter(|a| a.asset_title() == Some(title.as_str()))
                .filter_map(|a| a.asset_type().map(|t| (t, a)))
                .map(|(t, a)| Ok(json!([a.uuid, t, Self::to_row_value(a)?])))
                .collect(),

            Query::EntityById { id } => self
                .entity_by_db_id(*id)
                .map(|e| Ok(json!([Self::to_row_value(&e)?])))
                .into_iter()
                .collect(),
        }
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notifications
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}
