//! Block tree walk
//!
//! Each block is classified once, in this order: already emitted, attachment,
//! property-only, empty, quote, code, heading, plain. Plain blocks become
//! paragraphs when flattening, otherwise root blocks are paragraphs and
//! deeper blocks are list items indented two spaces per level.

use super::syntax::{is_property_only, strip_logseq_syntax};
use super::Exporter;
use crate::domain::Block;
use crate::host::Host;

impl<H: Host + ?Sized> Exporter<'_, H> {
    /// Formats `block` and its subtree at `depth`
    pub fn format_block(&mut self, block: &Block, depth: usize) -> String {
        if !block.uuid.is_empty() && !self.state.processed.insert(block.uuid.clone()) {
            self.trace("format", &format!("Block {} already emitted", block.uuid));
            return String::new();
        }

        let child_depth = if self.options.flatten_nested {
            depth
        } else {
            depth + 1
        };

        if let Some(asset) = self.asset_for(&block.uuid) {
            let mut out = self.emit(&asset.markdown_link(), depth);
            out.push_str(&self.format_blocks(&block.children, child_depth));
            return out;
        }

        if is_property_only(&block.content) {
            return self.format_blocks(&block.children, depth);
        }

        if block.is_code() {
            let mut out = code_fence(&block.content, block.code_lang());
            out.push_str(&self.format_blocks(&block.children, child_depth));
            return out;
        }

        let content = self.prepare_content(&block.content);
        if content.is_empty() {
            return self.format_blocks(&block.children, depth);
        }

        if block.is_quote() {
            let mut out = quote(&content);
            out.push_str(&self.format_blocks(&block.children, depth + 1));
            return out;
        }

        if self.options.flatten_nested {
            if let Some(level) = block.heading_level() {
                let mut out = format!("{} {}\n\n", "#".repeat(level as usize), content);
                out.push_str(&self.format_blocks(&block.children, child_depth));
                return out;
            }
        }

        let mut out = self.emit(&content, depth);
        let children = self.format_blocks(&block.children, child_depth);
        if !children.is_empty() {
            out.push_str(&children);
            if depth == 0 && !self.options.flatten_nested {
                out.push('\n');
            }
        }
        out
    }

    pub(crate) fn format_blocks(&mut self, blocks: &[Block], depth: usize) -> String {
        blocks
            .iter()
            .map(|block| self.format_block(block, depth))
            .collect()
    }

    fn prepare_content(&mut self, raw: &str) -> String {
        let mut text = if self.options.preserve_block_refs {
            self.resolve_references(raw)
        } else {
            raw.to_string()
        };

        if self.options.remove_logseq_syntax {
            text = strip_logseq_syntax(&text, self.options.include_tags);
        }

        self.track_asset_links(&text).trim().to_string()
    }

    /// Paragraph, or list item when nested below the root
    fn emit(&self, content: &str, depth: usize) -> String {
        if self.options.flatten_nested || depth == 0 {
            return format!("{}\n\n", content);
        }

        let indent = "  ".repeat(depth - 1);
        let mut out = String::new();
        for (i, line) in content.lines().enumerate() {
            let marker = if i == 0 { "- " } else { "  " };
            out.push_str(&format!("{}{}{}\n", indent, marker, line));
        }
        out
    }
}

fn quote(content: &str) -> String {
    let mut out: String = content.lines().map(|line| format!("> {}\n", line)).collect();
    out.push('\n');
    out
}

fn code_fence(content: &str, lang: Option<&str>) -> String {
    let body = content.trim_matches('\n');
    if body.trim().is_empty() {
        return String::new();
    }
    if body.trim_start().starts_with("```") {
        return format!("{}\n\n", body);
    }
    format!("```{}\n{}\n```\n\n", lang.unwrap_or(""), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, ExportOptions};
    use crate::export::normalize_markdown;
    use crate::host::MemoryHost;
    use crate::storage::{GraphSnapshot, PageRecord};
    use serde_json::json;

    const IMG: &str = "22222222-2222-2222-2222-222222222222";

    fn host() -> MemoryHost {
        let asset: Entity = serde_json::from_value(json!({
            "uuid": IMG,
            "title": "Chart",
            "properties": {"logseq.property.asset/type": "pdf"}
        }))
        .unwrap();

        MemoryHost::new(GraphSnapshot {
            pages: vec![PageRecord::new("p1", "Page", vec![])],
            assets: vec![asset],
            ..Default::default()
        })
    }

    fn render(options: ExportOptions, blocks: &[Block]) -> String {
        let host = host();
        let mut ex = Exporter::new(&host, options);
        normalize_markdown(&ex.format_blocks(blocks, 0))
    }

    fn nested() -> ExportOptions {
        ExportOptions {
            flatten_nested: false,
            ..Default::default()
        }
    }

    fn tree() -> Vec<Block> {
        vec![
            Block::new("a", "Root").with_child(
                Block::new("b", "Child\nsecond line").with_child(Block::new("c", "Grandchild")),
            ),
            Block::new("d", "Next"),
        ]
    }

    #[test]
    fn flattened_paragraphs() {
        assert_eq!(
            render(ExportOptions::default(), &tree()),
            "Root\n\nChild\nsecond line\n\nGrandchild\n\nNext"
        );
    }

    #[test]
    fn nested_lists() {
        assert_eq!(
            render(nested(), &tree()),
            "Root\n\n- Child\n  second line\n  - Grandchild\n\nNext"
        );
    }

    #[test]
    fn headings_only_when_flattening() {
        let blocks = vec![Block::new("h", "Subtitle").with_attr("heading", 2)];

        assert_eq!(render(ExportOptions::default(), &blocks), "## Subtitle");
        assert_eq!(render(nested(), &blocks), "Subtitle");
    }

    #[test]
    fn quotes_keep_children_nested() {
        let blocks = vec![Block::new("q", "Line one\nLine two")
            .with_attr("logseq.property.node/display-type", "quote")
            .with_attr("heading", 1)
            .with_child(Block::new("c", "under"))];

        assert_eq!(
            render(ExportOptions::default(), &blocks),
            "> Line one\n> Line two\n\nunder"
        );
        assert_eq!(render(nested(), &blocks), "> Line one\n> Line two\n\n- under");
    }

    #[test]
    fn code_blocks_are_verbatim() {
        let code = Block::new("k", "TODO let x = [[y]];")
            .with_attr("display-type", "code")
            .with_attr("lang", "rust");
        let fenced = Block::new("f", "```sh\necho hi\n```").with_attr("display-type", "code");

        assert_eq!(
            render(ExportOptions::default(), &[code, fenced]),
            "```rust\nTODO let x = [[y]];\n```\n\n```sh\necho hi\n```"
        );
    }

    #[test]
    fn property_only_and_empty_blocks_pass_through_children() {
        let blocks = vec![
            Block::new("p", "status:: done\n\ntype:: note").with_child(Block::new("c1", "kept")),
            Block::new("e", "   ").with_child(Block::new("c2", "also kept")),
        ];

        assert_eq!(render(nested(), &blocks), "kept\n\nalso kept");
    }

    #[test]
    fn duplicate_blocks_are_emitted_once() {
        let shared = Block::new("s", "Shared");
        let blocks = vec![
            Block::new("a", "A").with_child(shared.clone()),
            Block::new("b", "B").with_child(shared),
        ];

        assert_eq!(render(ExportOptions::default(), &blocks), "A\n\nShared\n\nB");
    }

    #[test]
    fn attachment_blocks_become_links() {
        let blocks = vec![Block::new(IMG, "")];
        assert_eq!(
            render(ExportOptions::default(), &blocks),
            format!("[Chart](assets/{}.pdf)", IMG)
        );
    }

    #[test]
    fn syntax_removal_can_be_disabled() {
        let blocks = vec![Block::new("t", "TODO [#A] ship #release")];

        assert_eq!(render(ExportOptions::default(), &blocks), "ship");

        let keep = ExportOptions {
            remove_logseq_syntax: false,
            ..Default::default()
        };
        assert_eq!(render(keep, &blocks), "TODO [#A] ship #release");
    }
}
