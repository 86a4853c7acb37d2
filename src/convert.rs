//! Single-document conversion: Markdown file → PDF file.
//!
//! Only the render step is allowed to fail softly. A source that cannot be
//! read or decoded, or a destination that cannot be created, is a fatal
//! [`Md2PdfError`]; an engine failure is reported as `Ok(false)`.

use crate::config::ConversionConfig;
use crate::error::{Md2PdfError, RenderError};
use crate::pipeline::markdown;
use crate::pipeline::render::PdfEngine;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Convert the Markdown file at `source` to a PDF at `destination`.
///
/// The destination is created or overwritten.
///
/// # Returns
/// `Ok(true)` when the engine rendered the document, `Ok(false)` when the
/// engine reported an error (the destination may be left empty or partial).
///
/// # Errors
/// Returns `Err(Md2PdfError)` only for fatal errors:
/// - source missing, unreadable, or not UTF-8
/// - destination cannot be created
pub fn convert(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<bool, Md2PdfError> {
    let engine = config.resolve_engine();
    let outcome = convert_with_engine(
        source.as_ref(),
        destination.as_ref(),
        engine.as_ref(),
        config.markdown_extensions,
    )?;
    Ok(outcome.is_ok())
}

/// Convert `source` to the PDF path derived by [`pdf_destination`].
pub fn convert_file(source: impl AsRef<Path>, config: &ConversionConfig) -> Result<bool, Md2PdfError> {
    let source = source.as_ref();
    convert(source, pdf_destination(source), config)
}

/// Shared by [`convert`] and the crawler, which resolves the engine once.
///
/// The outer `Result` is fatal; the inner one is the engine's verdict.
pub(crate) fn convert_with_engine(
    source: &Path,
    destination: &Path,
    engine: &dyn PdfEngine,
    extensions: bool,
) -> Result<Result<(), RenderError>, Md2PdfError> {
    let start = Instant::now();

    let text = fs::read_to_string(source).map_err(|e| Md2PdfError::from_read(source, e))?;
    let html = markdown::render_document(&text, extensions);
    debug!(
        "{}: {} bytes markdown → {} bytes html",
        source.display(),
        text.len(),
        html.len()
    );

    let file = File::create(destination).map_err(|e| Md2PdfError::OutputCreateFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;
    let mut sink = BufWriter::new(file);
    let outcome = engine.render(&html, &mut sink);

    match &outcome {
        Ok(()) => debug!(
            "{} rendered by {} in {}ms",
            destination.display(),
            engine.name(),
            start.elapsed().as_millis()
        ),
        Err(e) => warn!("{} failed to render {}: {}", engine.name(), source.display(), e),
    }
    Ok(outcome)
}

/// Whether `path` names a Markdown file: its file name ends in `.md`,
/// compared case-insensitively.
pub fn is_markdown_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase().ends_with(".md"))
        .unwrap_or(false)
}

/// Destination PDF path for a Markdown source: same directory and base
/// name, extension replaced by `.pdf`.
pub fn pdf_destination(source: impl AsRef<Path>) -> PathBuf {
    source.as_ref().with_extension("pdf")
}
