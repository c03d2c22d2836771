// src/core/call_graph/call_graph.rs
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, enabled, info, Level};

use super::{FanOutPolicy, ImplementationMap, MethodSignature, Scope};

/// Edge in the call graph representing a resolved method call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallEdge {
    /// Method making the call
    pub caller: MethodSignature,
    /// Method being called
    pub callee: MethodSignature,
}

impl CallEdge {
    pub fn new(caller: MethodSignature, callee: MethodSignature) -> Self {
        Self { caller, callee }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphStats {
    pub total_methods: usize,
    /// Distinct edges taken straight from resolved calls
    pub direct_edges: usize,
    /// Extra edges from callers and interface methods to selected implementations
    pub fan_out_edges: usize,
    /// Input edges discarded because an end lies outside the scope
    pub dropped_edges: usize,
    pub roots: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
}

/// Forward and reverse adjacency over method signatures.
///
/// `callee ∈ forward[caller]` holds exactly when `caller ∈ reverse[callee]`, and
/// every signature touched by an edge is a key of both maps.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    forward: BTreeMap<MethodSignature, BTreeSet<MethodSignature>>,
    reverse: BTreeMap<MethodSignature, BTreeSet<MethodSignature>>,
    stats: CallGraphStats,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from resolved call edges
    pub fn build(
        edges: &[CallEdge],
        implementations: &ImplementationMap,
        scope: &Scope,
        fan_out: FanOutPolicy,
    ) -> Self {
        let mut graph = Self::new();
        let mut stats = CallGraphStats::default();

        let mut direct = BTreeSet::new();
        for edge in edges {
            if !scope.contains(&edge.caller) || !scope.contains(&edge.callee) {
                stats.dropped_edges += 1;
                debug!("Dropping out-of-scope edge {} -> {}", edge.caller, edge.callee);
                continue;
            }
            direct.insert(edge);
        }

        for edge in &direct {
            graph.add_edge(edge.caller.clone(), edge.callee.clone());
        }
        stats.direct_edges = graph.edge_count();

        // Second pass, once every direct edge is in place
        for edge in &direct {
            let targets: Vec<&MethodSignature> = match fan_out {
                FanOutPolicy::All => implementations
                    .implementations_of(&edge.callee)
                    .into_iter()
                    .flatten()
                    .collect(),
                FanOutPolicy::FirstOnly => implementations
                    .first_implementation(&edge.callee)
                    .into_iter()
                    .collect(),
            };
            for implementation in targets {
                graph.add_edge(edge.caller.clone(), implementation.clone());
                // Dispatch edge: the interface method reaches each selected implementation
                graph.add_edge(edge.callee.clone(), implementation.clone());
            }
        }
        stats.fan_out_edges = graph.edge_count() - stats.direct_edges;

        stats.total_methods = graph.forward.len();
        stats.roots = graph.roots().len();
        stats.max_in_degree = graph.reverse.values().map(BTreeSet::len).max().unwrap_or(0);
        stats.max_out_degree = graph.forward.values().map(BTreeSet::len).max().unwrap_or(0);
        graph.stats = stats;

        info!(
            "Call graph: {} methods, {} direct edges, {} fan-out edges, {} dropped",
            graph.stats.total_methods,
            graph.stats.direct_edges,
            graph.stats.fan_out_edges,
            graph.stats.dropped_edges
        );
        graph.debug_dump();

        graph
    }

    /// Insert an edge, returning false when it was already present
    pub fn add_edge(&mut self, caller: MethodSignature, callee: MethodSignature) -> bool {
        self.forward.entry(callee.clone()).or_default();
        self.reverse.entry(caller.clone()).or_default();

        let inserted = self
            .forward
            .entry(caller.clone())
            .or_default()
            .insert(callee.clone());
        self.reverse.entry(callee).or_default().insert(caller);
        inserted
    }

    /// Get all methods called by a given method
    pub fn get_callees(&self, method: &MethodSignature) -> Option<&BTreeSet<MethodSignature>> {
        self.forward.get(method)
    }

    /// Get all methods that call a given method
    pub fn get_callers(&self, method: &MethodSignature) -> Option<&BTreeSet<MethodSignature>> {
        self.reverse.get(method)
    }

    pub fn in_degree(&self, method: &MethodSignature) -> usize {
        self.get_callers(method).map_or(0, BTreeSet::len)
    }

    pub fn out_degree(&self, method: &MethodSignature) -> usize {
        self.get_callees(method).map_or(0, BTreeSet::len)
    }

    pub fn contains(&self, method: &MethodSignature) -> bool {
        self.forward.contains_key(method)
    }

    /// The graph's own copy of a signature
    pub fn node(&self, method: &MethodSignature) -> Option<&MethodSignature> {
        self.forward.get_key_value(method).map(|(node, _)| node)
    }

    /// All signatures in the graph, in signature order
    pub fn nodes(&self) -> impl Iterator<Item = &MethodSignature> {
        self.forward.keys()
    }

    /// Methods nobody calls
    pub fn roots(&self) -> Vec<&MethodSignature> {
        self.reverse
            .keys()
            .filter(|method| self.in_degree(method) == 0)
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    pub fn get_statistics(&self) -> &CallGraphStats {
        &self.stats
    }

    /// Log the full forward adjacency at debug level
    fn debug_dump(&self) {
        if !enabled!(Level::DEBUG) {
            return;
        }
        for (caller, callees) in &self.forward {
            for callee in callees {
                debug!("  {} -> {}", caller, callee);
            }
        }
    }
}
