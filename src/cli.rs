// src/cli.rs
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::core::{AnalysisRequest, CycleScope, Engine, FanOutPolicy, OutputFormat, QueryKind};
use crate::error::{CallerTraceError, Result};

#[derive(Parser, Debug)]
#[command(name = "callertrace")]
#[command(about = "Find every call chain that leads to a Java method")]
#[command(version)]
pub struct Cli {
    /// Fully-qualified name of the class declaring the target method
    #[arg(value_name = "CLASS")]
    pub class_name: String,

    /// Line number inside the target method (1-based)
    #[arg(value_name = "LINE")]
    pub line: String,

    /// Root directory of the Java sources
    #[arg(value_name = "SOURCE_ROOT")]
    pub source_root: PathBuf,

    /// Package prefix; only methods under it become graph nodes
    #[arg(value_name = "SCOPE")]
    pub scope: String,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Report format: caller chains as text, or the descendant tree as JSON
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// How interface calls expand onto implementations
    #[arg(long, value_enum)]
    pub fan_out: Option<FanOutPolicy>,

    /// Track visited methods per branch or across the whole traversal
    #[arg(long, value_enum)]
    pub cycle_scope: Option<CycleScope>,

    /// Print the transitive-ancestor set instead of chains
    #[arg(long)]
    pub ancestors: bool,

    /// Print only the direct callers of the target
    #[arg(long, conflicts_with = "ancestors")]
    pub callers: bool,

    /// Node-visit budget for chain and tree enumeration (0 = unlimited)
    #[arg(long)]
    pub max_visits: Option<usize>,

    /// Omit method source text from reports
    #[arg(long)]
    pub no_source: bool,
}

impl Cli {
    /// The LINE argument as a positive line number
    pub fn line_number(&self) -> Result<usize> {
        match self.line.trim().parse::<usize>() {
            Ok(line) if line > 0 => Ok(line),
            _ => Err(CallerTraceError::InvalidArgument(format!(
                "LINE must be a positive integer, got '{}'",
                self.line
            ))),
        }
    }

    /// Command-line options take precedence over the configuration file
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(format) = self.format {
            config.policy.output_format = format;
        }
        if let Some(fan_out) = self.fan_out {
            config.policy.fan_out = fan_out;
        }
        if let Some(cycle_scope) = self.cycle_scope {
            config.policy.cycle_scope = cycle_scope;
        }
        if let Some(max_visits) = self.max_visits {
            config.policy.max_visits = max_visits;
        }
        if self.no_source {
            config.output.include_source = false;
        }
    }

    pub fn request(&self, config: &Config) -> Result<AnalysisRequest> {
        Ok(AnalysisRequest {
            class_name: self.class_name.trim().to_string(),
            line: self.line_number()?,
            source_root: self.source_root.clone(),
            scope: self.scope.clone(),
            query: QueryKind::from_flags(self.ancestors, self.callers, config.policy.output_format),
        })
    }

    /// Load configuration, run the request and return the rendered report
    pub fn execute(self) -> Result<String> {
        self.line_number()?;

        let mut config = Config::load_or_default(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        let request = self.request(&config)?;
        debug!("Request: {:?}", request);

        Engine::new(config).run(&request)
    }
}
