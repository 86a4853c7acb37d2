//! HTML → PDF: the [`PdfEngine`] seam and the builtin lopdf engine.
//!
//! ## Builtin engine
//!
//! [`BuiltinEngine`] turns the block stream from [`super::layout`] into A4
//! pages of text set in the PDF base-14 fonts (Helvetica family for prose,
//! Courier for code), with greedy word wrapping and page breaks. It carries
//! no CSS and embeds no assets. Output is deterministic: the same HTML always
//! produces the same bytes, because no timestamps or random IDs are written.
//!
//! For faithful HTML/CSS rendering use [`super::external::ExternalEngine`].

use super::layout::{html_to_blocks, Block, BlockKind};
use crate::error::RenderError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::io::Write;
use tracing::debug;

pub use super::external::{ExternalEngine, INPUT_PLACEHOLDER};

/// Renders an HTML document to PDF bytes written to `sink`.
///
/// Returning `Err` marks the document as failed; the crawl continues.
/// Implementations must be `Send + Sync` so they can live in a shared
/// [`crate::config::ConversionConfig`].
pub trait PdfEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Render `html` and write the PDF to `sink`.
    fn render(&self, html: &str, sink: &mut dyn Write) -> Result<(), RenderError>;
}

// A4 in PostScript points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const INDENT_STEP: i64 = 18;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const FONT_MONO: &str = "F3";
const FONT_ITALIC: &str = "F4";

/// Pure-Rust engine: plain paginated text via lopdf.
#[derive(Debug, Default, Clone)]
pub struct BuiltinEngine;

impl PdfEngine for BuiltinEngine {
    fn name(&self) -> &str {
        "builtin"
    }

    fn render(&self, html: &str, sink: &mut dyn Write) -> Result<(), RenderError> {
        let blocks = html_to_blocks(html);
        let title = blocks.iter().find_map(|b| match b.kind {
            BlockKind::Heading(_) => Some(b.text.replace('\n', " ")),
            _ => None,
        });

        let mut writer = PageWriter::new();
        for block in &blocks {
            writer.block(block);
        }
        let pages = writer.finish();
        debug!("builtin engine: {} blocks on {} pages", blocks.len(), pages.len());

        let bytes = build_pdf(pages, title.as_deref())?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }
}

struct Style {
    font: &'static str,
    size: i64,
    space_before: i64,
    /// Average glyph advance as a fraction of the font size.
    advance: f32,
}

fn style_for(kind: &BlockKind) -> Style {
    match kind {
        BlockKind::Heading(level) => {
            let size = match level {
                1 => 22,
                2 => 18,
                3 => 15,
                4 => 13,
                _ => 12,
            };
            Style {
                font: FONT_BOLD,
                size,
                space_before: size,
                advance: 0.56,
            }
        }
        BlockKind::Code => Style {
            font: FONT_MONO,
            size: 10,
            space_before: 8,
            advance: 0.6,
        },
        BlockKind::Quote => Style {
            font: FONT_ITALIC,
            size: 11,
            space_before: 8,
            advance: 0.5,
        },
        BlockKind::ListItem { .. } => Style {
            font: FONT_REGULAR,
            size: 11,
            space_before: 3,
            advance: 0.5,
        },
        BlockKind::Paragraph | BlockKind::TableRow | BlockKind::Rule => Style {
            font: FONT_REGULAR,
            size: 11,
            space_before: 8,
            advance: 0.5,
        },
    }
}

fn line_height(size: i64) -> i64 {
    size + size / 3 + 1
}

/// Accumulates content-stream operations page by page.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: i64,
    at_top: bool,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
            at_top: true,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = PAGE_HEIGHT - MARGIN;
        self.at_top = true;
    }

    fn ensure_room(&mut self, height: i64) {
        if self.y - height < MARGIN && !self.at_top {
            self.new_page();
        }
    }

    fn block(&mut self, block: &Block) {
        let style = style_for(&block.kind);
        if !self.at_top {
            self.y -= style.space_before;
        }
        let x = MARGIN + i64::from(block.indent) * INDENT_STEP;

        if block.kind == BlockKind::Rule {
            self.ensure_room(12);
            self.y -= 6;
            self.ops.extend([
                Operation::new("w", vec![Object::Integer(1)]),
                Operation::new("m", vec![x.into(), self.y.into()]),
                Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), self.y.into()]),
                Operation::new("S", vec![]),
            ]);
            self.y -= 6;
            self.at_top = false;
            return;
        }

        let glyph = style.size as f32 * style.advance;
        let (prefix, hang) = match &block.kind {
            BlockKind::ListItem { marker } => {
                let prefix = format!("{marker} ");
                let hang = (prefix.chars().count() as f32 * glyph).ceil() as i64;
                (prefix, hang)
            }
            _ => (String::new(), 0),
        };
        let avail = (PAGE_WIDTH - MARGIN - x - hang).max(1);
        let max_chars = ((avail as f32 / glyph) as usize).max(1);
        let lines = wrap(&block.text, max_chars, block.kind == BlockKind::Code);

        let lh = line_height(style.size);
        for (i, line) in lines.iter().enumerate() {
            self.ensure_room(lh);
            self.y -= lh;
            let (lx, text) = if i == 0 && !prefix.is_empty() {
                (x, format!("{prefix}{line}"))
            } else {
                (x + hang, line.clone())
            };
            if !text.is_empty() {
                self.text_line(style.font, style.size, lx, &text);
            }
            self.at_top = false;
        }
    }

    fn text_line(&mut self, font: &str, size: i64, x: i64, text: &str) {
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), self.y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

/// Greedy word wrap at `max_chars`. `\n` always breaks.
///
/// With `preserve` set, whitespace is kept and over-long lines are split
/// at the column limit instead of at word boundaries.
fn wrap(text: &str, max_chars: usize, preserve: bool) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.split('\n') {
        if preserve {
            let expanded: Vec<char> = raw.replace('\t', "    ").chars().collect();
            if expanded.is_empty() {
                out.push(String::new());
            }
            for chunk in expanded.chunks(max_chars) {
                out.push(chunk.iter().collect());
            }
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        for word in raw.split(' ').filter(|w| !w.is_empty()) {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() > max_chars {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                let mut pieces = chars.chunks(max_chars).peekable();
                while let Some(piece) = pieces.next() {
                    if pieces.peek().is_some() {
                        out.push(piece.iter().collect());
                    } else {
                        current = piece.iter().collect();
                        current_len = piece.len();
                    }
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_len = chars.len();
            } else if current_len + 1 + chars.len() <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + chars.len();
            } else {
                out.push(std::mem::replace(&mut current, word.to_string()));
                current_len = chars.len();
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

/// Encode text for a base-14 font with `WinAnsiEncoding`.
/// Characters outside the code page become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ => match c {
                '\u{20ac}' => 0x80,
                '\u{201a}' => 0x82,
                '\u{0192}' => 0x83,
                '\u{201e}' => 0x84,
                '\u{2026}' => 0x85,
                '\u{2020}' => 0x86,
                '\u{2021}' => 0x87,
                '\u{02c6}' => 0x88,
                '\u{2030}' => 0x89,
                '\u{0160}' => 0x8a,
                '\u{2039}' => 0x8b,
                '\u{0152}' => 0x8c,
                '\u{017d}' => 0x8e,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201c}' => 0x93,
                '\u{201d}' => 0x94,
                '\u{2022}' => 0x95,
                '\u{2013}' => 0x96,
                '\u{2014}' => 0x97,
                '\u{02dc}' => 0x98,
                '\u{2122}' => 0x99,
                '\u{0161}' => 0x9a,
                '\u{203a}' => 0x9b,
                '\u{0153}' => 0x9c,
                '\u{017e}' => 0x9e,
                '\u{0178}' => 0x9f,
                _ => b'?',
            },
        })
        .collect()
}

/// Encode a PDF text string (document metadata) as UTF-16BE with a BOM.
fn text_string(text: &str) -> Vec<u8> {
    let mut out = vec![0xfe, 0xff];
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

fn base14_font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Assemble the page content streams into a PDF document.
fn build_pdf(pages: Vec<Vec<Operation>>, title: Option<&str>) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(base14_font("Helvetica"));
    let bold = doc.add_object(base14_font("Helvetica-Bold"));
    let mono = doc.add_object(base14_font("Courier"));
    let italic = doc.add_object(base14_font("Helvetica-Oblique"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular,
            FONT_BOLD => bold,
            FONT_MONO => mono,
            FONT_ITALIC => italic,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(PAGE_WIDTH),
        Object::Integer(PAGE_HEIGHT),
    ];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = dictionary! {
        "Producer" => Object::string_literal("edgequake-md2pdf"),
    };
    if let Some(title) = title {
        info.set("Title", Object::String(text_string(title), StringFormat::Hexadecimal));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::markdown::render_document;

    fn render(html: &str) -> Vec<u8> {
        let mut out = Vec::new();
        BuiltinEngine.render(html, &mut out).unwrap();
        out
    }

    fn page_count(pdf: &[u8]) -> usize {
        Document::load_mem(pdf).unwrap().get_pages().len()
    }

    #[test]
    fn renders_a_valid_pdf() {
        let pdf = render(&render_document("# Hi", false));
        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&pdf), 1);
    }

    #[test]
    fn empty_document_still_has_one_page() {
        let pdf = render(&render_document("", false));
        assert_eq!(page_count(&pdf), 1);
    }

    #[test]
    fn output_is_deterministic() {
        let html = render_document("# Title\n\nSome *text*.\n\n- a\n- b\n", false);
        assert_eq!(render(&html), render(&html));
    }

    #[test]
    fn long_documents_paginate() {
        let md: String = (0..200).map(|i| format!("Paragraph number {i}.\n\n")).collect();
        let pdf = render(&render_document(&md, false));
        assert!(page_count(&pdf) > 1);
    }

    #[test]
    fn title_comes_from_first_heading() {
        let pdf = render(&render_document("intro\n\n## Guide\n\n# Later", false));
        let doc = Document::load_mem(&pdf).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(
            info.get(b"Title").unwrap().as_str().unwrap(),
            text_string("Guide").as_slice()
        );
    }

    fn decode_utf16be(bytes: &[u8]) -> String {
        assert_eq!(&bytes[..2], &[0xfe, 0xff], "missing BOM");
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).unwrap()
    }

    #[test]
    fn title_keeps_characters_outside_latin1() {
        let title = "Caf\u{e9} \u{2022} \u{201c}\u{4e2d}\u{6587}\u{201d} \u{1f600}";
        let pdf = render(&render_document(&format!("# {title}"), false));
        let doc = Document::load_mem(&pdf).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        let raw = info.get(b"Title").unwrap().as_str().unwrap();
        assert_eq!(decode_utf16be(raw), title);
    }

    #[test]
    fn wrap_breaks_at_words() {
        assert_eq!(
            wrap("the quick brown fox", 10, false),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn wrap_splits_overlong_words() {
        assert_eq!(wrap("abcdefghij xy", 4, false), vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn wrap_preserves_code_whitespace() {
        assert_eq!(wrap("a\n\n\tb", 80, true), vec!["a", "", "    b"]);
    }

    #[test]
    fn win_ansi_maps_typographic_chars() {
        assert_eq!(encode_win_ansi("a\u{2022}\u{e9}\u{4e2d}"), vec![b'a', 0x95, 0xe9, b'?']);
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("sink closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_errors_are_render_errors() {
        let err = BuiltinEngine
            .render(&render_document("x", false), &mut FailingSink)
            .unwrap_err();
        assert!(matches!(err, RenderError::Write(_)));
    }
}
