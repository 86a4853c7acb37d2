//! Directory crawl: find every Markdown file under a root and convert each.
//!
//! Files are visited in directory-walk order (not sorted) and converted one
//! at a time. A render failure is reported and the crawl moves on; a fatal
//! [`Md2PdfError`] from any file stops the crawl and is returned.

use crate::config::ConversionConfig;
use crate::convert::{convert_with_engine, is_markdown_file, pdf_destination};
use crate::error::Md2PdfError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of one conversion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub success: bool,
    /// Engine error message when `success` is false.
    pub error: Option<String>,
}

/// Every attempt made by one crawl, in visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub records: Vec<ConversionRecord>,
}

impl CrawlSummary {
    /// Number of conversion attempts.
    pub fn attempted(&self) -> usize {
        self.records.len()
    }

    /// Number of successful conversions.
    pub fn converted(&self) -> usize {
        self.records.iter().filter(|r| r.success).count()
    }

    /// Sources whose render failed.
    pub fn failed(&self) -> impl Iterator<Item = &Path> {
        self.records
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.source.as_path())
    }
}

/// Recursively list Markdown files under `root` in walk order.
///
/// Only entries below `root` are visited, so a missing root or a root that
/// is a plain file yields an empty list. Entries that cannot be read are
/// skipped with a warning.
pub fn find_markdown_files(root: impl AsRef<Path>) -> Vec<PathBuf> {
    walk_markdown(root.as_ref()).collect()
}

fn walk_markdown(root: &Path) -> impl Iterator<Item = PathBuf> {
    let root_missing = !root.exists();
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(e) => Some(e),
            // Walking a missing root is an empty walk, not an error.
            Err(_) if root_missing => None,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| is_regular_file(e) && is_markdown_file(e.path()))
        .map(|e| e.into_path())
}

/// Regular files, including symlinks that resolve to one.
fn is_regular_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Convert every Markdown file under `root` to a PDF beside it.
///
/// For each file the configured progress callback receives
/// `on_convert_start`, then `on_convert_complete` or `on_convert_failed`.
/// With the default [`crate::progress::ConsoleProgress`] this prints
/// `Converting <src> -> <dst>` and, on failure, `Failed to convert <src>`.
///
/// # Errors
/// The first fatal error (unreadable source, uncreatable destination) halts
/// the crawl. Files converted before it keep their PDFs.
pub fn crawl_and_convert(
    root: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<CrawlSummary, Md2PdfError> {
    let root = root.as_ref();
    let start = Instant::now();
    let engine = config.resolve_engine();
    let progress = &config.progress_callback;
    info!("Crawling {} with the {} engine", root.display(), engine.name());

    let mut summary = CrawlSummary::default();
    for source in walk_markdown(root) {
        let destination = pdf_destination(&source);
        progress.on_convert_start(&source, &destination);

        let outcome = convert_with_engine(
            &source,
            &destination,
            engine.as_ref(),
            config.markdown_extensions,
        )?;

        let error = match outcome {
            Ok(()) => {
                progress.on_convert_complete(&source, &destination);
                None
            }
            Err(e) => {
                progress.on_convert_failed(&source);
                Some(e.to_string())
            }
        };
        summary.records.push(ConversionRecord {
            success: error.is_none(),
            source,
            destination,
            error,
        });
    }

    debug!("walk of {} exhausted", root.display());
    info!(
        "Crawl complete: {}/{} converted in {}ms",
        summary.converted(),
        summary.attempted(),
        start.elapsed().as_millis()
    );
    progress.on_crawl_complete(summary.attempted(), summary.converted());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_markdown_files(dir.path().join("does-not-exist")).is_empty());
    }

    #[test]
    fn finds_nested_markdown_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join("B.MD"), "").unwrap();
        fs::write(dir.path().join("note.txt"), "").unwrap();
        fs::write(dir.path().join("sub/deeper/c.Md"), "").unwrap();
        // Directories named like Markdown files are not files.
        fs::create_dir(dir.path().join("folder.md")).unwrap();

        let mut found = find_markdown_files(dir.path());
        found.sort();
        assert_eq!(
            found,
            vec![
                dir.path().join("B.MD"),
                dir.path().join("a.md"),
                dir.path().join("sub/deeper/c.Md"),
            ]
        );
    }

    #[test]
    fn file_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.md");
        fs::write(&file, "").unwrap();
        assert!(find_markdown_files(&file).is_empty());
    }

    #[test]
    fn file_root_crawl_makes_no_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.md");
        fs::write(&file, "# Only").unwrap();
        let config = ConversionConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();

        let summary = crawl_and_convert(&file, &config).unwrap();

        assert_eq!(summary.attempted(), 0);
        assert!(!dir.path().join("only.pdf").exists());
    }

    #[test]
    fn summary_counts() {
        let summary = CrawlSummary {
            records: vec![
                ConversionRecord {
                    source: "a.md".into(),
                    destination: "a.pdf".into(),
                    success: true,
                    error: None,
                },
                ConversionRecord {
                    source: "b.md".into(),
                    destination: "b.pdf".into(),
                    success: false,
                    error: Some("boom".into()),
                },
            ],
        };
        assert_eq!(summary.attempted(), 2);
        assert_eq!(summary.converted(), 1);
        assert_eq!(summary.failed().collect::<Vec<_>>(), vec![Path::new("b.md")]);
    }
}
