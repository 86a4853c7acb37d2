//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The root directory is *not* part of
//! the config; it is passed explicitly to [`crate::crawl::crawl_and_convert`].

use crate::error::Md2PdfError;
use crate::pipeline::render::{BuiltinEngine, ExternalEngine, PdfEngine, INPUT_PLACEHOLDER};
use crate::progress::{ConsoleProgress, CrawlProgressCallback, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a Markdown-to-PDF conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::{ConversionConfig, EngineKind};
///
/// let config = ConversionConfig::builder()
///     .engine_kind(EngineKind::wkhtmltopdf())
///     .markdown_extensions(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Which PDF engine to construct. Default: [`EngineKind::Builtin`].
    pub engine_kind: EngineKind,

    /// Pre-constructed engine. Takes precedence over `engine_kind`.
    pub engine: Option<Arc<dyn PdfEngine>>,

    /// Enable GFM extensions (tables, strikethrough, task lists, footnotes)
    /// in the Markdown parser. Default: false (plain CommonMark).
    pub markdown_extensions: bool,

    /// Receives per-file crawl events. Default: [`ConsoleProgress`].
    pub progress_callback: ProgressCallback,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            engine_kind: EngineKind::default(),
            engine: None,
            markdown_extensions: false,
            progress_callback: Arc::new(ConsoleProgress),
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("engine_kind", &self.engine_kind)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("markdown_extensions", &self.markdown_extensions)
            .field("progress_callback", &"<dyn CrawlProgressCallback>")
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the engine to render with: the injected one, else one built
    /// from `engine_kind`.
    pub fn resolve_engine(&self) -> Arc<dyn PdfEngine> {
        if let Some(ref engine) = self.engine {
            return Arc::clone(engine);
        }
        match &self.engine_kind {
            EngineKind::Builtin => Arc::new(BuiltinEngine::default()),
            EngineKind::External { program, args } => {
                Arc::new(ExternalEngine::new(program.clone(), args.clone()))
            }
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn engine_kind(mut self, kind: EngineKind) -> Self {
        self.config.engine_kind = kind;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn markdown_extensions(mut self, v: bool) -> Self {
        self.config.markdown_extensions = v;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn CrawlProgressCallback>) -> Self {
        self.config.progress_callback = cb;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        if self.config.engine.is_none() {
            if let EngineKind::External { program, args } = &self.config.engine_kind {
                if program.trim().is_empty() {
                    return Err(Md2PdfError::InvalidConfig(
                        "External engine program must not be empty".into(),
                    ));
                }
                if !args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
                    return Err(Md2PdfError::InvalidConfig(format!(
                        "External engine args must contain the {INPUT_PLACEHOLDER} placeholder, got {args:?}"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The HTML-to-PDF engine to construct when none is injected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineKind {
    /// Pure-Rust text layout written with lopdf. (default)
    #[default]
    Builtin,
    /// An HTML-to-PDF command. `{input}` in `args` is replaced by the path of
    /// a temporary HTML file; the PDF is read from the child's stdout.
    External { program: String, args: Vec<String> },
}

impl EngineKind {
    /// `wkhtmltopdf --quiet --encoding utf-8 {input} -`
    pub fn wkhtmltopdf() -> Self {
        EngineKind::External {
            program: "wkhtmltopdf".into(),
            args: Self::wkhtmltopdf_args(),
        }
    }

    /// Arguments that make wkhtmltopdf read `{input}` and write to stdout.
    pub fn wkhtmltopdf_args() -> Vec<String> {
        ["--quiet", "--encoding", "utf-8", INPUT_PLACEHOLDER, "-"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}
