use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::TraversalPolicy;
use crate::error::{CallerTraceError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source code parsing configuration
    pub parsing: ParsingConfig,

    /// Fan-out, cycle scope, output format and visit budget
    pub policy: TraversalPolicy,

    /// Entry point detection
    pub entry_points: EntryPointConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// File extensions to parse
    pub file_extensions: Vec<String>,

    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,

    /// Honour .gitignore files while walking the source root
    pub respect_gitignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryPointConfig {
    /// Method names treated as program start, in addition to graph roots
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Include method source text in reports
    pub include_source: bool,

    /// Include comments and javadoc in reports
    pub include_comments: bool,

    /// Custom tera template for the text chain report
    pub text_template: Option<PathBuf>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            file_extensions: vec!["java".to_string()],
            max_file_size: 1024 * 1024, // 1MB
            respect_gitignore: true,
        }
    }
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            names: vec!["main".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_source: true,
            include_comments: true,
            text_template: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CallerTraceError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Err(CallerTraceError::Config(format!(
                        "configuration file {} does not exist",
                        p.as_ref().display()
                    )))
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Callertrace.toml",
                    "callertrace.toml",
                    ".callertrace.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CycleScope, FanOutPolicy};

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("callertrace.toml");
        std::fs::write(
            &path,
            "[policy]\nfan_out = \"first-only\"\n\n[entry_points]\nnames = [\"main\", \"run\"]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.policy.fan_out, FanOutPolicy::FirstOnly);
        assert_eq!(config.policy.cycle_scope, CycleScope::PathLocal);
        assert_eq!(config.entry_points.names, vec!["main", "run"]);
        assert_eq!(config.parsing.file_extensions, vec!["java"]);
        assert!(config.output.include_source);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let result = Config::load_or_default(Some("/definitely/not/here.toml"));
        assert!(matches!(result, Err(CallerTraceError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[policy\nfan_out = ").unwrap();
        assert!(matches!(Config::load(&path), Err(CallerTraceError::Config(_))));
    }
}
