//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, crawls the root directory, and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_md2pdf::{crawl_and_convert, ConversionConfig, EngineKind};
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert ./docs next to the md2pdf executable
  md2pdf

  # Convert a specific tree
  md2pdf path/to/handbook

  # Use wkhtmltopdf for full HTML/CSS rendering
  md2pdf --engine external handbook

  # Use weasyprint instead
  md2pdf --engine external --engine-program weasyprint \
         --engine-arg {input} --engine-arg - handbook

  # GFM tables, strikethrough, task lists and footnotes
  md2pdf --extensions handbook

  # Machine-readable summary after the status lines
  md2pdf --json handbook > summary.txt

ENGINES:
  builtin    Pure Rust. Plain paginated text in the PDF base-14 fonts.
  external   Runs an HTML-to-PDF command per file. {input} in the arguments
             is replaced by a temporary HTML file; the PDF is read from the
             command's stdout. Default: wkhtmltopdf --quiet --encoding utf-8 {input} -
             Default arguments only apply to wkhtmltopdf; any other
             --engine-program must be given its --engine-arg list.

ENVIRONMENT VARIABLES:
  MD2PDF_ENGINE, MD2PDF_ENGINE_PROGRAM, MD2PDF_EXTENSIONS, MD2PDF_JSON,
  MD2PDF_VERBOSE, MD2PDF_QUIET    Defaults for the matching flags
  RUST_LOG                        Overrides the log filter (logs go to stderr)
"#;

/// Convert every Markdown file under a directory to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert every Markdown file under a directory to a PDF beside it",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Root directory to crawl. Default: `docs` next to the executable.
    root: Option<PathBuf>,

    /// PDF engine: builtin or external.
    #[arg(long, env = "MD2PDF_ENGINE", value_enum, default_value = "builtin")]
    engine: EngineArg,

    /// Program for the external engine. Default: wkhtmltopdf. Any other
    /// program also needs its arguments via --engine-arg.
    #[arg(long, env = "MD2PDF_ENGINE_PROGRAM")]
    engine_program: Option<String>,

    /// Argument for the external engine (repeatable; `{input}` is the HTML
    /// file). Default for wkhtmltopdf: --quiet --encoding utf-8 {input} -
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Enable GFM extensions (tables, strikethrough, task lists, footnotes).
    #[arg(long, env = "MD2PDF_EXTENSIONS")]
    extensions: bool,

    /// Print a JSON summary of every conversion after the crawl.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EngineArg {
    Builtin,
    External,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout carries the status lines; logs go to stderr.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let root = match cli.root.clone() {
        Some(root) => root,
        None => default_root()?,
    };
    let config = build_config(&cli)?;
    debug!("config: {:?}", config);

    let summary = crawl_and_convert(&root, &config)
        .with_context(|| format!("Conversion of '{}' aborted", root.display()))?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    }

    Ok(())
}

/// `docs` beside the running executable.
fn default_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate the md2pdf executable")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(dir.join("docs"))
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let engine_kind = match cli.engine {
        EngineArg::Builtin => EngineKind::Builtin,
        EngineArg::External => {
            let program = cli
                .engine_program
                .clone()
                .unwrap_or_else(|| "wkhtmltopdf".to_string());
            let args = if !cli.engine_args.is_empty() {
                cli.engine_args.clone()
            } else if is_wkhtmltopdf(&program) {
                EngineKind::wkhtmltopdf_args()
            } else {
                bail!(
                    "--engine-program {program} needs its arguments: pass --engine-arg \
                     once per argument, with {{input}} where the HTML file goes"
                );
            };
            EngineKind::External { program, args }
        }
    };

    ConversionConfig::builder()
        .engine_kind(engine_kind)
        .markdown_extensions(cli.extensions)
        .build()
        .context("Invalid configuration")
}

/// Whether `program` names wkhtmltopdf, with or without a directory or `.exe`.
fn is_wkhtmltopdf(program: &str) -> bool {
    std::path::Path::new(program)
        .file_stem()
        .is_some_and(|stem| stem.eq_ignore_ascii_case("wkhtmltopdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_builtin_engine() {
        let cli = Cli::parse_from(["md2pdf", "handbook"]);
        assert_eq!(cli.root, Some(PathBuf::from("handbook")));
        let config = build_config(&cli).unwrap();
        assert_eq!(config.engine_kind, EngineKind::Builtin);
        assert!(!config.markdown_extensions);
    }

    #[test]
    fn external_engine_uses_wkhtmltopdf_args_by_default() {
        let cli = Cli::parse_from(["md2pdf", "--engine", "external"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.engine_kind, EngineKind::wkhtmltopdf());
    }

    #[test]
    fn custom_engine_args_are_kept() {
        let cli = Cli::parse_from([
            "md2pdf",
            "--engine",
            "external",
            "--engine-program",
            "weasyprint",
            "--engine-arg",
            "{input}",
            "--engine-arg",
            "-",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(
            config.engine_kind,
            EngineKind::External {
                program: "weasyprint".into(),
                args: vec!["{input}".into(), "-".into()],
            }
        );
    }

    #[test]
    fn engine_args_without_placeholder_are_rejected() {
        let cli = Cli::parse_from(["md2pdf", "--engine", "external", "--engine-arg", "-"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn other_program_without_args_is_rejected() {
        let cli = Cli::parse_from([
            "md2pdf",
            "--engine",
            "external",
            "--engine-program",
            "weasyprint",
        ]);
        let err = build_config(&cli).unwrap_err();
        assert!(err.to_string().contains("weasyprint"), "{err}");
    }

    #[test]
    fn wkhtmltopdf_path_keeps_default_args() {
        let cli = Cli::parse_from([
            "md2pdf",
            "--engine",
            "external",
            "--engine-program",
            "/opt/bin/wkhtmltopdf",
        ]);
        let config = build_config(&cli).unwrap();
        match config.engine_kind {
            EngineKind::External { program, args } => {
                assert_eq!(program, "/opt/bin/wkhtmltopdf");
                assert!(args.contains(&"{input}".to_string()));
            }
            EngineKind::Builtin => panic!("expected an external engine"),
        }
    }

    #[test]
    fn default_root_is_docs_beside_executable() {
        let root = default_root().unwrap();
        assert_eq!(root.file_name().unwrap(), "docs");
    }
}
