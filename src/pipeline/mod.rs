//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! markdown ──▶ html document ──▶ PdfEngine ──▶ sink (destination file)
//!  (pulldown-cmark)          (builtin lopdf | external command)
//! ```
//!
//! 1. [`markdown`]: Markdown text → HTML fragment → minimal UTF-8 document
//! 2. [`render`]: the [`render::PdfEngine`] seam and the builtin engine
//! 3. [`layout`]: HTML → text blocks, used only by the builtin engine
//!    (parsed into a [`dom`] tree by html5ever first)
//! 4. [`external`]: engine that shells out to an HTML-to-PDF command

pub mod dom;
pub mod external;
pub mod layout;
pub mod markdown;
pub mod render;
