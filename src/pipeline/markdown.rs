//! Markdown → HTML: parse with pulldown-cmark and wrap in the document shell.

use pulldown_cmark::{html, Options, Parser};

/// Render Markdown text to an HTML fragment.
///
/// With `extensions == false` only CommonMark is recognised. With
/// `extensions == true` tables, strikethrough, task lists and footnotes are
/// enabled as well.
pub fn markdown_to_html(markdown: &str, extensions: bool) -> String {
    let options = if extensions {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
    } else {
        Options::empty()
    };
    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// Wrap an HTML fragment in a minimal document declaring UTF-8.
///
/// The fragment is inserted verbatim.
pub fn wrap_document(fragment: &str) -> String {
    format!(
        "<html><head><meta charset=\"utf-8\"></head><body>{}</body></html>",
        fragment
    )
}

/// Markdown text → complete HTML document.
pub fn render_document(markdown: &str, extensions: bool) -> String {
    wrap_document(&markdown_to_html(markdown, extensions))
}
