//! HTML → text blocks for the builtin engine.
//!
//! The builtin engine does not implement CSS or a box model. It reads the
//! HTML produced by the Markdown stage as a flat sequence of block-level
//! elements (headings, paragraphs, list items, quotes, code, rules, table
//! rows) and hands those to the page writer in [`super::render`].
//!
//! Inline markup (`<em>`, `<strong>`, `<a>`, `<code>`, …) is dropped and its
//! text kept. `<head>`, `<script>` and `<style>` contents are skipped.
//! Parsing and entity decoding happen in [`super::dom`].

use super::dom::{parse_html, Handle, Node, NodeData};
use once_cell::sync::Lazy;
use regex::Regex;

/// What kind of block a run of text belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// `<h1>`–`<h6>`; the level is 1-based.
    Heading(u8),
    Paragraph,
    /// A list item with its marker (`•` or `3.`).
    ListItem { marker: String },
    Quote,
    /// Preformatted text; whitespace and line breaks are kept.
    Code,
    /// A table row; cells joined with ` | `.
    TableRow,
    /// `<hr>`
    Rule,
}

/// A laid-out unit of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Text content. `\n` marks a forced line break.
    pub text: String,
    /// Nesting depth (lists and block quotes).
    pub indent: u8,
}

// HTML whitespace only; U+00A0 must survive.
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\n\x0C]+").unwrap());

/// Split an HTML document into [`Block`]s in document order.
pub fn html_to_blocks(html: &str) -> Vec<Block> {
    let document = parse_html(html);
    let mut builder = BlockBuilder::default();
    walk(&document, &mut builder);
    builder.finish()
}

fn walk(node: &Handle, builder: &mut BlockBuilder) {
    match &node.data {
        NodeData::Text(text) => builder.text(&text.borrow()),
        NodeData::Other => {}
        NodeData::Document | NodeData::Element { .. } => {
            let tag = node.tag();
            if let Some(tag) = tag {
                builder.open(tag, node);
            }
            for child in node.children.borrow().iter() {
                walk(child, builder);
            }
            if let Some(tag) = tag {
                builder.close(tag);
            }
        }
    }
}

#[derive(Debug)]
struct ListState {
    ordered: bool,
    next: u64,
}

#[derive(Debug, Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: Option<BlockKind>,
    buf: String,
    lists: Vec<ListState>,
    quote_depth: u8,
    skip_depth: usize,
    in_pre: bool,
}

impl BlockBuilder {
    fn indent(&self) -> u8 {
        (self.lists.len() as u8).saturating_add(self.quote_depth)
    }

    fn open(&mut self, name: &str, node: &Node) {
        match name {
            "head" | "script" | "style" | "title" | "template" => self.skip_depth += 1,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = name.as_bytes()[1] - b'0';
                self.current = Some(BlockKind::Heading(level));
            }
            "p" => {
                // `<li><p>…` (loose lists) keeps the item's marker.
                let continues_item =
                    matches!(self.current, Some(BlockKind::ListItem { .. })) && self.buf.is_empty();
                if !continues_item {
                    self.flush();
                    self.current = Some(self.paragraph_kind());
                }
            }
            "ul" | "ol" => {
                self.flush();
                let next = node
                    .attr("start")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(1);
                self.lists.push(ListState {
                    ordered: name == "ol",
                    next,
                });
            }
            "li" => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(list) if list.ordered => {
                        let m = format!("{}.", list.next);
                        list.next += 1;
                        m
                    }
                    _ => "\u{2022}".to_string(),
                };
                self.current = Some(BlockKind::ListItem { marker });
            }
            "blockquote" => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_add(1);
            }
            "pre" => {
                self.flush();
                self.in_pre = true;
                self.current = Some(BlockKind::Code);
            }
            "tr" => {
                self.flush();
                self.current = Some(BlockKind::TableRow);
            }
            "td" | "th" => {
                if self.current != Some(BlockKind::TableRow) {
                    self.flush();
                    self.current = Some(BlockKind::TableRow);
                }
                if !self.buf.is_empty() {
                    self.buf.push_str(" | ");
                }
            }
            "hr" => {
                self.flush();
                self.blocks.push(Block {
                    kind: BlockKind::Rule,
                    text: String::new(),
                    indent: self.indent(),
                });
            }
            "br" => {
                if self.current.is_none() {
                    self.current = Some(self.paragraph_kind());
                }
                self.buf.push('\n');
            }
            "img" => {
                if let Some(alt) = node.attr("alt").filter(|a| !a.trim().is_empty()) {
                    self.text(&format!("[{alt}]"));
                }
            }
            "div" | "table" | "thead" | "tbody" | "body" | "dl" | "dt" | "dd" | "section" => {
                self.flush()
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "head" | "script" | "style" | "title" | "template" => {
                self.skip_depth = self.skip_depth.saturating_sub(1)
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "blockquote" => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            "pre" => {
                self.flush();
                self.in_pre = false;
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "li" | "tr" | "div" | "table"
            | "dt" | "dd" | "section" => self.flush(),
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skip_depth > 0 || raw.is_empty() {
            return;
        }
        if self.in_pre {
            self.buf.push_str(raw);
            return;
        }
        let collapsed = RE_WHITESPACE.replace_all(raw, " ");
        let at_line_start = self.buf.is_empty() || self.buf.ends_with(' ') || self.buf.ends_with('\n');
        let piece = if at_line_start {
            collapsed.trim_start()
        } else {
            &*collapsed
        };
        if piece.is_empty() {
            return;
        }
        if self.current.is_none() {
            self.current = Some(self.paragraph_kind());
        }
        self.buf.push_str(piece);
    }

    fn paragraph_kind(&self) -> BlockKind {
        if self.quote_depth > 0 {
            BlockKind::Quote
        } else {
            BlockKind::Paragraph
        }
    }

    fn flush(&mut self) {
        let Some(kind) = self.current.take() else {
            self.buf.clear();
            return;
        };
        let mut text = std::mem::take(&mut self.buf);
        if kind == BlockKind::Code {
            if text.ends_with('\n') {
                text.pop();
            }
        } else {
            let joined = text.split('\n').map(str::trim).collect::<Vec<_>>().join("\n");
            text = joined.trim_matches('\n').to_string();
        }
        if text.is_empty() && kind != BlockKind::Code {
            return;
        }
        // A list item's own indent is one level less than the list depth.
        let indent = match kind {
            BlockKind::ListItem { .. } => self.indent().saturating_sub(1),
            _ => self.indent(),
        };
        self.blocks.push(Block { kind, text, indent });
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::markdown::render_document;

    fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind.clone()).collect()
    }

    #[test]
    fn head_is_skipped_and_heading_found() {
        let blocks = html_to_blocks(
            "<html><head><meta charset=\"utf-8\"><title>T</title></head><body><h1>Hi</h1>\n</body></html>",
        );
        assert_eq!(
            blocks,
            vec![Block {
                kind: BlockKind::Heading(1),
                text: "Hi".into(),
                indent: 0
            }]
        );
    }

    #[test]
    fn inline_markup_is_flattened() {
        let blocks = html_to_blocks("<p>Some <em>emphasis</em> and\n<a href=\"x\">a link</a>.</p>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Some emphasis and a link.");
    }

    #[test]
    fn lists_get_markers_and_indent() {
        let html = "<ol start=\"3\"><li>three</li><li>four<ul><li>nested</li></ul></li></ol>";
        let blocks = html_to_blocks(html);
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::ListItem { marker: "3.".into() },
                BlockKind::ListItem { marker: "4.".into() },
                BlockKind::ListItem {
                    marker: "\u{2022}".into()
                },
            ]
        );
        assert_eq!(blocks[0].indent, 0);
        assert_eq!(blocks[2].indent, 1);
        assert_eq!(blocks[2].text, "nested");
    }

    #[test]
    fn loose_list_paragraph_keeps_marker() {
        let blocks = html_to_blocks("<ul>\n<li>\n<p>first</p>\n</li>\n</ul>");
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::ListItem {
                marker: "\u{2022}".into()
            }]
        );
        assert_eq!(blocks[0].text, "first");
    }

    #[test]
    fn pre_keeps_whitespace() {
        let blocks = html_to_blocks("<pre><code>fn main() {\n    x &lt; 1;\n}\n</code></pre>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Code);
        assert_eq!(blocks[0].text, "fn main() {\n    x < 1;\n}");
    }

    #[test]
    fn blockquote_and_rule() {
        let blocks = html_to_blocks("<blockquote>\n<p>quoted</p>\n</blockquote>\n<hr />\n<p>after</p>");
        assert_eq!(
            kinds(&blocks),
            vec![BlockKind::Quote, BlockKind::Rule, BlockKind::Paragraph]
        );
        assert_eq!(blocks[0].indent, 1);
    }

    #[test]
    fn table_cells_are_joined() {
        let html = "<table><thead><tr><th>a</th><th>b</th></tr></thead>\
                    <tbody><tr><td>1</td><td>2</td></tr></tbody></table>";
        let blocks = html_to_blocks(html);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["a | b", "1 | 2"]);
    }

    #[test]
    fn br_forces_line_break() {
        let blocks = html_to_blocks("<p>one<br />\ntwo</p>");
        assert_eq!(blocks[0].text, "one\ntwo");
    }

    #[test]
    fn entities_are_decoded_by_the_parser() {
        let html = render_document("<div>caf&eacute; &ouml; &frac12; &nbsp</div>\n", false);
        let blocks = html_to_blocks(&html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "caf\u{e9} \u{f6} \u{bd} \u{a0}");
    }

    #[test]
    fn numeric_references_and_unknown_names() {
        let blocks = html_to_blocks("<p>a &amp; b &lt;c&gt; &#65;&#x42; &bogus;</p>");
        assert_eq!(blocks[0].text, "a & b <c> AB &bogus;");
    }

    #[test]
    fn image_alt_text_is_kept() {
        let blocks = html_to_blocks(r#"<p>see <img src="x.png" alt="diagram"> here</p>"#);
        assert_eq!(blocks[0].text, "see [diagram] here");
    }

    #[test]
    fn empty_body_gives_no_blocks() {
        assert!(html_to_blocks("<html><head></head><body></body></html>").is_empty());
    }

    #[test]
    fn comments_are_ignored() {
        let blocks = html_to_blocks("<!-- note --><p>x</p>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "x");
    }
}
