// src/core/call_graph/policy.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a call through an interface method is expanded onto its implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FanOutPolicy {
    /// Edge to every known implementation (sound over-approximation)
    #[default]
    All,
    /// Edge to the first implementation only
    FirstOnly,
}

/// Where "already visited" is tracked during chain and tree traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CycleScope {
    /// Per traversal branch; a signature may reappear in sibling branches
    #[default]
    PathLocal,
    /// Across the whole traversal; a signature is expanded at most once
    Global,
}

/// Shape of the report produced for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Caller chains as plain text
    #[default]
    Text,
    /// Descendant tree as JSON
    Tree,
}

/// Traversal configuration shared by the graph builder and the chain enumerator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalPolicy {
    pub fan_out: FanOutPolicy,
    pub cycle_scope: CycleScope,
    pub output_format: OutputFormat,
    /// Node-visit budget for chain and tree enumeration, 0 means unlimited
    pub max_visits: usize,
}

pub const DEFAULT_MAX_VISITS: usize = 1_000_000;

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            fan_out: FanOutPolicy::All,
            cycle_scope: CycleScope::PathLocal,
            output_format: OutputFormat::Text,
            max_visits: DEFAULT_MAX_VISITS,
        }
    }
}

impl TraversalPolicy {
    pub fn visit_budget(&self) -> Option<usize> {
        (self.max_visits > 0).then_some(self.max_visits)
    }
}
