//! Progress-callback trait for per-file crawl events.
//!
//! Inject an [`Arc<dyn CrawlProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the crawler works through the tree. The default,
//! [`ConsoleProgress`], prints the two status lines the `md2pdf` binary shows
//! on stdout.
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{ConversionConfig, CrawlProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: AtomicUsize,
//! }
//!
//! impl CrawlProgressCallback for CountingCallback {
//!     fn on_convert_failed(&self, _source: &Path) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { failed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the crawler as it processes each Markdown file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait CrawlProgressCallback: Send + Sync {
    /// Called just before a file is converted.
    fn on_convert_start(&self, source: &Path, destination: &Path) {
        let _ = (source, destination);
    }

    /// Called when the PDF engine reported an error for `source`.
    fn on_convert_failed(&self, source: &Path) {
        let _ = source;
    }

    /// Called when a file converted successfully.
    fn on_convert_complete(&self, source: &Path, destination: &Path) {
        let _ = (source, destination);
    }

    /// Called once after the walk is exhausted.
    ///
    /// Not called when a fatal error halts the crawl.
    fn on_crawl_complete(&self, attempted: usize, converted: usize) {
        let _ = (attempted, converted);
    }
}

/// A no-op implementation for library callers that want silence.
pub struct NoopProgressCallback;

impl CrawlProgressCallback for NoopProgressCallback {}

/// Prints `Converting <src> -> <dst>` and `Failed to convert <src>` to stdout.
///
/// This is the default callback.
pub struct ConsoleProgress;

impl CrawlProgressCallback for ConsoleProgress {
    fn on_convert_start(&self, source: &Path, destination: &Path) {
        println!("{}", converting_line(source, destination));
    }

    fn on_convert_failed(&self, source: &Path) {
        println!("{}", failed_line(source));
    }
}

pub(crate) fn converting_line(source: &Path, destination: &Path) -> String {
    format!("Converting {} -> {}", source.display(), destination.display())
}

pub(crate) fn failed_line(source: &Path) -> String {
    format!("Failed to convert {}", source.display())
}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn CrawlProgressCallback>;
