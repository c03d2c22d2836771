use std::path::PathBuf;
use thiserror::Error;

/// Main error type for callertrace operations
#[derive(Error, Debug)]
pub enum CallerTraceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "No parsable source files under {} ({discovered} found, {skipped} skipped)",
        root.display()
    )]
    NoSourceFiles { root: PathBuf, discovered: usize, skipped: usize },

    #[error("No method found in class {class} containing line {line}")]
    TargetNotFound { class: String, line: usize },

    #[error("Unable to resolve target method: {0}")]
    UnresolvedTarget(String),
}

impl CallerTraceError {
    /// Process exit status reported for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CallerTraceError::InvalidArgument(_) => 1,
            CallerTraceError::NoSourceFiles { .. } => 2,
            CallerTraceError::TargetNotFound { .. } => 3,
            CallerTraceError::UnresolvedTarget(_) => 4,
            _ => 100,
        }
    }
}

pub type Result<T> = std::result::Result<T, CallerTraceError>;
