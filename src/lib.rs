//! # edgequake-md2pdf
//!
//! Batch-convert a tree of Markdown documents into PDFs, one PDF beside each
//! source file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! docs/
//!  │
//!  ├─ 1. Crawl    walk the tree, keep files whose name ends in .md (any case)
//!  ├─ 2. Read     whole file as UTF-8 (failure here stops the batch)
//!  ├─ 3. HTML     pulldown-cmark → fragment → <html><head><meta charset…>
//!  ├─ 4. Render   PdfEngine: builtin lopdf layout, or an external command
//!  └─ 5. Report   "Converting a.md -> a.pdf" / "Failed to convert a.md"
//! ```
//!
//! Conversion is sequential. Only the render step may fail softly; a failed
//! render is reported and the crawl continues with the next file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{crawl_and_convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let summary = crawl_and_convert("docs", &config)?;
//!     eprintln!("{}/{} converted", summary.converted(), summary.attempted());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod crawl;
pub mod error;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, EngineKind};
pub use convert::{convert, convert_file, is_markdown_file, pdf_destination};
pub use crawl::{crawl_and_convert, find_markdown_files, ConversionRecord, CrawlSummary};
pub use error::{Md2PdfError, RenderError};
pub use pipeline::external::ExternalEngine;
pub use pipeline::render::{BuiltinEngine, PdfEngine};
pub use progress::{
    ConsoleProgress, CrawlProgressCallback, NoopProgressCallback, ProgressCallback,
};
