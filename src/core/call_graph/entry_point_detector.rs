// src/core/call_graph/entry_point_detector.rs
use std::collections::{BTreeMap, HashSet};
use serde::{Serialize, Deserialize};

use super::{CallGraph, MethodSignature};

/// Finds the methods descendant trees are grown from
pub struct EntryPointDetector {
    /// Method names treated as program start
    known_entry_patterns: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub signature: MethodSignature,
    pub entry_type: EntryPointType,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryPointType {
    /// No incoming edges in the graph
    GraphRoot,
    /// Name matches a configured entry name such as `main`
    NamedEntry,
}

impl EntryPointDetector {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_entry_patterns: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_entry_name(&self, method: &MethodSignature) -> bool {
        self.known_entry_patterns.contains(&method.method_name)
    }

    /// Detect all entry points in the call graph, in signature order
    pub fn detect_entry_points(&self, call_graph: &CallGraph) -> Vec<EntryPoint> {
        let mut entry_points: BTreeMap<&MethodSignature, EntryPoint> = BTreeMap::new();

        // Primary strategy: nobody calls it
        for root in call_graph.roots() {
            entry_points.insert(
                root,
                EntryPoint {
                    signature: root.clone(),
                    entry_type: EntryPointType::GraphRoot,
                    reasoning: format!("No callers; calls {} methods", call_graph.out_degree(root)),
                },
            );
        }

        // Secondary strategy: conventional names, even when something calls them
        for method in call_graph.nodes().filter(|m| self.is_entry_name(m)) {
            entry_points.entry(method).or_insert_with(|| EntryPoint {
                signature: method.clone(),
                entry_type: EntryPointType::NamedEntry,
                reasoning: format!("Method name '{}' marks an entry point", method.method_name),
            });
        }

        entry_points.into_values().collect()
    }
}

impl Default for EntryPointDetector {
    fn default() -> Self {
        Self::new(["main"])
    }
}
