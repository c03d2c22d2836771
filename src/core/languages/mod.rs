//! Language-specific parsers for different programming languages
//!
//! Each language gets its own module with a consistent interface for turning
//! source code into the declarations the analyzer resolves.

mod java;

pub use java::JavaParser;

use crate::error::Result;
use super::parser::ParsedSource;

/// Trait that all language parsers must implement
pub trait LanguageParser {
    /// Parse source code and extract package, imports and type declarations
    fn parse(&mut self, content: &str, file_path: &std::path::Path) -> Result<ParsedSource>;

    /// Get the file extensions this parser handles
    fn file_extensions(&self) -> &[&str];

    /// Get the language name
    fn language_name(&self) -> &str;
}
