// src/core/report/mod.rs
//! Report assembly and rendering
//!
//! The assembler attaches declaration metadata to enumerator output; the
//! renderers turn the assembled reports into text (tera) or JSON (serde_json).

mod assembler;
mod text;
mod tree;

pub use assembler::{ChainReport, ListReport, ReportAssembler, TreeReport};
pub use text::TextRenderer;
pub use tree::{render_list as render_list_json, render_tree};
