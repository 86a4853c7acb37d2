//! External HTML-to-PDF engine (wkhtmltopdf, weasyprint, …).
//!
//! The HTML document is staged in a temporary `.html` file whose path
//! replaces [`INPUT_PLACEHOLDER`] in the configured arguments. The engine must
//! write the PDF to stdout (`-` as the output path for both wkhtmltopdf and
//! weasyprint). The temporary file is removed when the render returns.

use super::render::PdfEngine;
use crate::error::RenderError;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Replaced by the staged HTML file path in [`ExternalEngine`] arguments.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Runs an HTML-to-PDF command per document.
#[derive(Debug, Clone)]
pub struct ExternalEngine {
    program: String,
    args: Vec<String>,
}

impl ExternalEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn stage(&self, html: &str) -> Result<tempfile::NamedTempFile, RenderError> {
        let staging = |source| RenderError::Staging {
            program: self.program.clone(),
            source,
        };
        let mut file = tempfile::Builder::new()
            .prefix("md2pdf-")
            .suffix(".html")
            .tempfile()
            .map_err(staging)?;
        file.write_all(html.as_bytes()).map_err(staging)?;
        file.flush().map_err(staging)?;
        Ok(file)
    }
}

impl PdfEngine for ExternalEngine {
    fn name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.program.as_str())
    }

    fn render(&self, html: &str, sink: &mut dyn Write) -> Result<(), RenderError> {
        let staged = self.stage(html)?;
        let input = staged.path().to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, &input))
            .collect();
        debug!("running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RenderError::EngineSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::EngineFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(RenderError::EngineFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: "no PDF bytes on stdout".into(),
            });
        }

        sink.write_all(&output.stdout)?;
        sink.flush()?;
        Ok(())
    }
}
