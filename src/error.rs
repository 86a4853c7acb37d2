//! Error types for the edgequake-md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`] is **fatal**: the batch cannot proceed (source file
//!   unreadable or not UTF-8, destination cannot be created, bad config).
//!   Returned as `Err(Md2PdfError)` and halts the crawl.
//!
//! * [`RenderError`] is **non-fatal**: the PDF engine failed on one document.
//!   [`crate::convert::convert`] maps it to `Ok(false)` and the crawl moves
//!   on to the next file.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-md2pdf library.
///
/// Per-document render failures use [`RenderError`] and never surface here.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source Markdown file was not found.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the source file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The source file is not valid UTF-8.
    #[error("Markdown file '{path}' is not valid UTF-8: {detail}")]
    InvalidUtf8 { path: PathBuf, detail: String },

    /// Any other read failure on the source file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or truncate the destination PDF file.
    #[error("Failed to create output file '{path}': {source}")]
    OutputCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Md2PdfError {
    /// Classify an I/O error raised while reading `path`.
    pub(crate) fn from_read(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Md2PdfError::SourceNotFound { path },
            std::io::ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied { path },
            std::io::ErrorKind::InvalidData => Md2PdfError::InvalidUtf8 {
                path,
                detail: err.to_string(),
            },
            _ => Md2PdfError::ReadFailed { path, source: err },
        }
    }
}

/// A non-fatal error reported by a PDF engine for a single document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The PDF object graph could not be serialised.
    #[error("PDF encoding failed: {0}")]
    Encode(String),

    /// Writing PDF bytes to the sink failed.
    #[error("failed to write PDF bytes: {0}")]
    Write(#[from] std::io::Error),

    /// The HTML could not be staged for an external engine.
    #[error("failed to stage HTML for '{program}': {source}")]
    Staging {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external engine could not be started.
    #[error("failed to start '{program}': {source}\nIs it installed and on PATH?")]
    EngineSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external engine exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    EngineFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn not_found_is_classified() {
        let e = Md2PdfError::from_read("docs/a.md", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, Md2PdfError::SourceNotFound { .. }));
        assert!(e.to_string().contains("docs/a.md"), "got: {e}");
    }

    #[test]
    fn invalid_data_maps_to_utf8_error() {
        let e = Md2PdfError::from_read(
            "b.md",
            io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
        );
        assert!(matches!(e, Md2PdfError::InvalidUtf8 { .. }));
        assert!(e.to_string().contains("UTF-8"));
    }

    #[test]
    fn other_io_errors_keep_source() {
        let e = Md2PdfError::from_read("c.md", io::Error::other("disk on fire"));
        match e {
            Md2PdfError::ReadFailed { ref source, .. } => {
                assert!(source.to_string().contains("disk on fire"))
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn engine_failed_display() {
        let e = RenderError::EngineFailed {
            program: "wkhtmltopdf".into(),
            status: "exit status: 1".into(),
            stderr: "bad html".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("wkhtmltopdf"));
        assert!(msg.contains("bad html"));
    }
}
