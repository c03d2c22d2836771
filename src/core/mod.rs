// src/core/mod.rs
mod engine;
mod parser;
mod symbols;
mod analyzer;
mod locator;

// Call graph and traversal
mod call_graph;

// Language-specific parsers
mod languages;

// Report assembly and rendering
mod report;

pub use analyzer::SourceAnalyzer;
pub use locator::locate_target;

pub use call_graph::{
    CallGraph, ChainEnumerator, CycleScope, EntryPointDetector, FanOutPolicy, ImplementationMap,
    OutputFormat, Scope, TraversalPolicy,
};

pub use report::{render_list_json, render_tree, ListReport, ReportAssembler, TextRenderer};

// Export the main engine
pub use engine::{AnalysisRequest, Engine, QueryKind};
