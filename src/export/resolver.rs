//! Reference resolution
//!
//! Three syntaxes are rewritten, always in this order:
//!
//! 1. `[[UUID]]` - left as-is when unresolved
//! 2. `((UUID))` - replaced by a visible `[Unresolved: xxxxxxxx...]` marker
//! 3. bare `UUID` - only when `resolve_plain_uuids` is on and the id is not
//!    directly preceded by `/`, `-` or `_`
//!
//! Each pass collects every match first, resolves them, then splices the
//! replacements back from the last offset to the first. Text spliced in by
//! one pass is never rescanned by a later one.
//!
//! An identifier resolves to, in priority order: an attachment link, a page
//! name, or the (one level deep) resolved content of a block.

use std::collections::HashSet;
use std::ops::Range;

use regex::Regex;

use super::syntax::{
    is_property_only, preceded_by_separator, short_id, strip_logseq_syntax, BARE_UUID, BLOCK_REF,
    PAGE_REF,
};
use super::Exporter;
use crate::domain::Block;
use crate::host::Host;

/// How deep block content is resolved when it is itself transcluded
const MAX_BLOCK_DEPTH: usize = 1;

/// What to put in place of an unresolved match
#[derive(Debug, Clone, Copy)]
enum Fallback {
    KeepOriginal,
    Placeholder,
}

impl<H: Host + ?Sized> Exporter<'_, H> {
    /// Rewrites every recognised reference in `text`
    pub fn resolve_references(&mut self, text: &str) -> String {
        self.resolve_references_at(text, 0)
    }

    /// Resolves a single identifier, caching successful results
    pub fn resolve_uuid(&mut self, id: &str) -> Option<String> {
        self.resolve_uuid_at(id, 0)
    }

    pub(crate) fn resolve_references_at(&mut self, text: &str, depth: usize) -> String {
        let mut inserted = Vec::new();
        let text = self.substitute(
            text,
            &PAGE_REF,
            depth,
            Fallback::KeepOriginal,
            false,
            &mut inserted,
        );
        let text = self.substitute(
            &text,
            &BLOCK_REF,
            depth,
            Fallback::Placeholder,
            false,
            &mut inserted,
        );

        if self.options.resolve_plain_uuids {
            self.substitute(
                &text,
                &BARE_UUID,
                depth,
                Fallback::KeepOriginal,
                true,
                &mut inserted,
            )
        } else {
            text
        }
    }

    /// Runs one pass over `text`. Matches overlapping `inserted` (spans
    /// written by an earlier pass) are left alone; on return `inserted`
    /// holds the spans of this pass too, in output offsets.
    fn substitute(
        &mut self,
        text: &str,
        pattern: &Regex,
        depth: usize,
        fallback: Fallback,
        guard_separators: bool,
        inserted: &mut Vec<Range<usize>>,
    ) -> String {
        let matches: Vec<(Range<usize>, String)> = pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if guard_separators && preceded_by_separator(text, whole.start()) {
                    return None;
                }
                if inserted.iter().any(|span| overlaps(span, &whole.range())) {
                    return None;
                }
                Some((whole.range(), caps.get(1)?.as_str().to_string()))
            })
            .collect();

        if matches.is_empty() {
            return text.to_string();
        }

        let replacements: Vec<(Range<usize>, String)> = matches
            .into_iter()
            .filter_map(|(range, id)| match self.resolve_uuid_at(&id, depth) {
                Some(resolved) => Some((range, resolved)),
                None => match fallback {
                    Fallback::KeepOriginal => None,
                    Fallback::Placeholder => {
                        Some((range, format!("[Unresolved: {}...]", short_id(&id))))
                    }
                },
            })
            .collect();

        let mut out = text.to_string();
        let mut spans = Vec::with_capacity(replacements.len());
        for (range, replacement) in replacements.into_iter().rev() {
            let growth = replacement.len() as isize - range.len() as isize;
            for span in inserted.iter_mut().chain(spans.iter_mut()) {
                if span.start >= range.end {
                    *span = shift(span, growth);
                }
            }
            spans.push(range.start..range.start + replacement.len());
            out.replace_range(range, &replacement);
        }
        inserted.extend(spans);
        out
    }

    pub(crate) fn resolve_uuid_at(&mut self, id: &str, depth: usize) -> Option<String> {
        if let Some(hit) = self.state.cache.get(id) {
            return Some(hit.clone());
        }

        if let Some(asset) = self.asset_for(id) {
            return Some(self.remember(id, asset.markdown_link()));
        }

        if let Some(name) = self.page_name(id) {
            return Some(self.remember(id, name));
        }

        let block = self.lookup_block(id)?;
        let content = if depth < MAX_BLOCK_DEPTH {
            self.resolve_references_at(&block.content, depth + 1)
        } else {
            block.content
        };
        let text = strip_logseq_syntax(&content, self.options.include_tags);
        if text.is_empty() {
            return None;
        }

        if depth == 0 {
            Some(self.remember(id, text))
        } else {
            Some(text)
        }
    }

    fn remember(&mut self, id: &str, value: String) -> String {
        self.trace("resolve", &format!("{} -> {}", id, value));
        self.state.cache.insert(id.to_string(), value.clone());
        value
    }

    /// Display name of the page with this id
    pub(crate) fn page_name(&self, id: &str) -> Option<String> {
        match self.host.page(id) {
            Ok(Some(page)) if !page.is_block() => page.display_name().map(str::to_string),
            Ok(_) => None,
            Err(e) => {
                self.trace("resolve", &format!("Page lookup for {} failed: {}", id, e));
                None
            }
        }
    }

    fn lookup_block(&self, id: &str) -> Option<Block> {
        match self.host.block(id, false) {
            Ok(Some(block)) if !block.content.trim().is_empty() => Some(block),
            Ok(_) => None,
            Err(e) => {
                self.trace("resolve", &format!("Block lookup for {} failed: {}", id, e));
                None
            }
        }
    }

    /// Resolves every identifier referenced in the tree up front
    pub(crate) fn prewarm(&mut self, blocks: &[Block]) {
        if !self.options.preserve_block_refs {
            return;
        }

        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        collect_ids(blocks, self.options.resolve_plain_uuids, &mut seen, &mut ids);

        self.trace("resolve", &format!("Pre-warming {} references", ids.len()));
        for id in ids {
            self.resolve_uuid_at(&id, 0);
        }
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn shift(span: &Range<usize>, by: isize) -> Range<usize> {
    let move_by = |at: usize| (at as isize + by) as usize;
    move_by(span.start)..move_by(span.end)
}

fn collect_ids(blocks: &[Block], plain: bool, seen: &mut HashSet<String>, ids: &mut Vec<String>) {
    for block in blocks {
        // Code and property-only content is never resolved when formatted
        if !block.is_code() && !is_property_only(&block.content) {
            let text = &block.content;
            let mut push = |id: &str| {
                if seen.insert(id.to_string()) {
                    ids.push(id.to_string());
                }
            };

            for caps in PAGE_REF.captures_iter(text).chain(BLOCK_REF.captures_iter(text)) {
                push(&caps[1]);
            }
            if plain {
                for m in BARE_UUID.find_iter(text) {
                    if !preceded_by_separator(text, m.start()) {
                        push(m.as_str());
                    }
                }
            }
        }

        collect_ids(&block.children, plain, seen, ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, ExportOptions};
    use crate::host::MemoryHost;
    use crate::storage::{GraphSnapshot, PageRecord};
    use serde_json::json;

    const PAGE: &str = "11111111-1111-1111-1111-111111111111";
    const IMG: &str = "22222222-2222-2222-2222-222222222222";
    const BLOCK: &str = "33333333-3333-3333-3333-333333333333";
    const NESTED: &str = "44444444-4444-4444-4444-444444444444";
    const MISSING: &str = "99999999-9999-9999-9999-999999999999";

    fn host() -> MemoryHost {
        let asset: Entity = serde_json::from_value(json!({
            "uuid": IMG,
            "title": "My Image",
            "properties": {"logseq.property.asset/type": "png"}
        }))
        .unwrap();

        MemoryHost::new(GraphSnapshot {
            pages: vec![
                PageRecord::new(PAGE, "Referenced Page", vec![]),
                PageRecord::new(
                    "p2",
                    "Source",
                    vec![
                        Block::new(BLOCK, format!("TODO quote of (({}))", NESTED)),
                        Block::new(NESTED, format!("deep [[{}]]", PAGE)),
                    ],
                ),
            ],
            assets: vec![asset],
            ..Default::default()
        })
    }

    fn exporter(host: &MemoryHost) -> Exporter<'_, MemoryHost> {
        Exporter::new(host, ExportOptions::default())
    }

    #[test]
    fn page_refs() {
        let host = host();
        let mut ex = exporter(&host);

        assert_eq!(
            ex.resolve_references(&format!("see [[{}]]", PAGE)),
            "see Referenced Page"
        );
        let missing = format!("see [[{}]]", MISSING);
        assert_eq!(ex.resolve_references(&missing), missing);
    }

    #[test]
    fn block_refs_and_placeholder() {
        let host = host();
        let mut ex = exporter(&host);

        assert_eq!(
            ex.resolve_references(&format!("(({}))", NESTED)),
            "deep Referenced Page"
        );
        assert_eq!(
            ex.resolve_references(&format!("x (({})) y", MISSING)),
            "x [Unresolved: 99999999...] y"
        );
    }

    #[test]
    fn block_resolution_is_one_level_deep() {
        let host = host();
        let options = ExportOptions {
            resolve_plain_uuids: false,
            ..Default::default()
        };
        let mut ex = Exporter::new(&host, options);

        // BLOCK -> NESTED is resolved, NESTED's own [[PAGE]] is not
        assert_eq!(
            ex.resolve_uuid(BLOCK).unwrap(),
            format!("quote of deep [[{}]]", PAGE)
        );
    }

    #[test]
    fn attachments_win() {
        let host = host();
        let mut ex = exporter(&host);

        assert_eq!(
            ex.resolve_references(&format!("[[{}]]", IMG)),
            format!("![My Image](assets/{}.png)", IMG)
        );
        assert!(ex.assets().get(IMG).is_some());
    }

    #[test]
    fn inserted_text_is_not_rescanned() {
        let host = host();
        let options = ExportOptions {
            asset_path: String::new(),
            ..Default::default()
        };
        let mut ex = Exporter::new(&host, options);

        assert_eq!(
            ex.resolve_references(&format!("[[{}]]", IMG)),
            format!("![My Image]({}.png)", IMG)
        );
        // NESTED's [[PAGE]] arrives through the block pass and stays put
        assert_eq!(
            ex.resolve_references(&format!("(({}))", BLOCK)),
            format!("quote of deep [[{}]]", PAGE)
        );
    }

    #[test]
    fn bare_ids_respect_boundary() {
        let host = host();
        let mut ex = exporter(&host);

        let text = format!("{} /{} -{} _{}", PAGE, PAGE, PAGE, PAGE);
        assert_eq!(
            ex.resolve_references(&text),
            format!("Referenced Page /{} -{} _{}", PAGE, PAGE, PAGE)
        );
    }

    #[test]
    fn bare_ids_can_be_disabled() {
        let host = host();
        let options = ExportOptions {
            resolve_plain_uuids: false,
            ..Default::default()
        };
        let mut ex = Exporter::new(&host, options);

        assert_eq!(ex.resolve_references(PAGE), PAGE);
    }

    #[test]
    fn multiple_replacements_keep_offsets() {
        let host = host();
        let mut ex = exporter(&host);

        let text = format!("[[{}]] and [[{}]] and (({}))", PAGE, IMG, MISSING);
        assert_eq!(
            ex.resolve_references(&text),
            format!(
                "Referenced Page and ![My Image](assets/{}.png) and [Unresolved: 99999999...]",
                IMG
            )
        );
    }

    #[test]
    fn prewarm_collects_ids() {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        let blocks = vec![Block::new("a", format!("[[{}]] (({})) {}", PAGE, BLOCK, PAGE))
            .with_child(Block::new("b", format!("x/{} {}", IMG, NESTED)))];

        collect_ids(&blocks, true, &mut seen, &mut ids);
        assert_eq!(ids, vec![PAGE.to_string(), BLOCK.to_string(), NESTED.to_string()]);
    }

    #[test]
    fn prewarm_skips_unformatted_content() {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        let blocks = vec![
            Block::new("a", format!("cover:: [[{}]]", IMG)),
            Block::new("b", format!("[[{}]]", IMG)).with_attr("display-type", "code"),
            Block::new("c", "Body").with_child(Block::new("d", format!("[[{}]]", PAGE))),
        ];

        collect_ids(&blocks, true, &mut seen, &mut ids);
        assert_eq!(ids, vec![PAGE.to_string()]);
    }
}
