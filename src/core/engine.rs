// src/core/engine.rs
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use super::{
    locate_target, render_list_json, render_tree, CallGraph, ChainEnumerator, EntryPointDetector,
    ImplementationMap, ListReport, OutputFormat, ReportAssembler, Scope, SourceAnalyzer,
    TextRenderer,
};

/// Which traversal a request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Ordered caller chains, rendered as text
    Chains,
    /// Descendant tree from the entry points, rendered as JSON
    Tree,
    /// Transitive-ancestor set
    Ancestors,
    /// Immediate callers only
    Callers,
}

impl QueryKind {
    pub fn from_flags(ancestors: bool, callers: bool, format: OutputFormat) -> Self {
        match (ancestors, callers, format) {
            (true, _, _) => QueryKind::Ancestors,
            (_, true, _) => QueryKind::Callers,
            (_, _, OutputFormat::Tree) => QueryKind::Tree,
            (_, _, OutputFormat::Text) => QueryKind::Chains,
        }
    }
}

/// One analysis request: a target position plus the code base to search
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Fully-qualified class name, nested types as `pkg.Outer.Inner`
    pub class_name: String,
    /// 1-based line inside the target method
    pub line: usize,
    pub source_root: PathBuf,
    /// Package prefix limiting the graph
    pub scope: String,
    pub query: QueryKind,
}

/// Main orchestration engine
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        debug!("Loaded configuration: {:?}", config);
        Self { config }
    }

    /// Run a request end to end and return the rendered report
    pub fn run(&self, request: &AnalysisRequest) -> Result<String> {
        let scope = Scope::new(request.scope.as_str());
        let policy = self.config.policy;

        let mut analyzer = SourceAnalyzer::new(&self.config.parsing)?;
        let snapshot = analyzer.analyze(&request.source_root, &scope)?;

        let target = locate_target(&snapshot, &request.class_name, request.line)?;
        info!(
            "Target method: {} ({}:{}-{})",
            target.signature,
            target.file.display(),
            target.line_range.0,
            target.line_range.1
        );

        let implementations = ImplementationMap::build(&snapshot.types, &scope);
        let graph = CallGraph::build(&snapshot.edges, &implementations, &scope, policy.fan_out);
        let stats = graph.get_statistics();
        debug!(
            "Graph shape: {} roots, max in-degree {}, max out-degree {}",
            stats.roots, stats.max_in_degree, stats.max_out_degree
        );
        if !graph.contains(&target.signature) {
            info!("{} has no call edges inside scope '{}'", target.signature, scope.prefix());
        }

        let detector = EntryPointDetector::new(self.config.entry_points.names.clone());
        let enumerator = ChainEnumerator::new(&graph, detector, policy);
        let assembler = ReportAssembler::new(&snapshot, &implementations, &self.config.output);

        match request.query {
            QueryKind::Chains => {
                let chains = enumerator.caller_chains(&target.signature);
                info!("Found {} caller chains ({} nodes visited)", chains.chains.len(), chains.visits);
                let report = assembler.chain_report(&target.signature, &chains);
                let renderer = TextRenderer::new(self.config.output.text_template.as_deref())?;
                renderer.render_chains(&report)
            }
            QueryKind::Tree => {
                let tree = enumerator.descendant_tree(&target.signature);
                info!(
                    "Built descendant tree from {} entry points ({} nodes visited)",
                    tree.entry_points.len(),
                    tree.visits
                );
                render_tree(&assembler.tree_report(&target.signature, &tree))
            }
            QueryKind::Ancestors => {
                let ancestors = enumerator.ancestors(&target.signature);
                info!("Found {} transitive ancestors", ancestors.len());
                self.render_list(&assembler.list_report(&target.signature, &ancestors))
            }
            QueryKind::Callers => {
                let callers = enumerator.direct_callers(&target.signature);
                info!("Found {} direct callers", callers.len());
                self.render_list(&assembler.list_report(&target.signature, &callers))
            }
        }
    }

    fn render_list(&self, report: &ListReport) -> Result<String> {
        match self.config.policy.output_format {
            OutputFormat::Text => Ok(TextRenderer::default().render_list(report)),
            OutputFormat::Tree => render_list_json(report),
        }
    }
}
