// src/core/report/assembler.rs
use serde::{Deserialize, Serialize};

use crate::config::OutputConfig;
use crate::core::analyzer::{AnalysisSnapshot, MethodRecord};
use crate::core::call_graph::{CallTree, CallTreeNode, ChainSet, ImplementationMap, MethodSignature};

/// Marker used wherever a signature has no declaration metadata
pub const UNAVAILABLE: &str = "unavailable";
pub const MISSING_BODY: &str = "// Method body not available (external or unresolved)";
pub const ABSTRACT_BODY: &str = "// Abstract method or interface method - no body";
pub const SYNTHETIC_ROOT: &str = "ROOT";

/// One method as it appears in a chain report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub signature: String,
    pub name: String,
    /// `path:start-end`, or the unavailable marker
    pub location: String,
    pub file: Option<String>,
    pub line_range: Option<(usize, usize)>,
    pub source: Option<String>,
    pub comments: Option<String>,
    /// Interface relatives of this method, excluding itself
    pub probable_implementations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainBlock {
    /// Furthest ancestor first, target last
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub target: String,
    pub truncated: bool,
    pub chains: Vec<ChainBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNodeReport {
    pub method: String,
    pub file: String,
    pub line: usize,
    pub children: Vec<TreeNodeReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub name: String,
    pub signature: String,
    pub body: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeReport {
    pub target: String,
    pub generated_at: String,
    pub truncated: bool,
    pub dag_tree: TreeNodeReport,
    pub methods: Vec<MethodSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub signature: String,
    pub file: Option<String>,
    pub line: Option<usize>,
}

/// Flat list of signatures, used for ancestor and direct-caller queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListReport {
    pub target: String,
    pub methods: Vec<ListEntry>,
}

/// Pairs enumerator output with declaration metadata from the snapshot
pub struct ReportAssembler<'a> {
    snapshot: &'a AnalysisSnapshot,
    implementations: &'a ImplementationMap,
    output: &'a OutputConfig,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        snapshot: &'a AnalysisSnapshot,
        implementations: &'a ImplementationMap,
        output: &'a OutputConfig,
    ) -> Self {
        Self { snapshot, implementations, output }
    }

    pub fn method_entry(&self, signature: &MethodSignature) -> MethodEntry {
        let record = self.snapshot.record(signature);

        let probable_implementations = self
            .implementations
            .siblings(signature)
            .into_iter()
            .filter(|related| related != signature)
            .map(|related| related.to_string())
            .collect();

        let source = self.output.include_source.then(|| {
            record
                .map(|r| r.source.clone())
                .unwrap_or_else(|| MISSING_BODY.to_string())
        });

        MethodEntry {
            signature: signature.to_string(),
            name: signature.display_name(),
            location: record.map_or_else(|| UNAVAILABLE.to_string(), location),
            file: record.map(|r| r.file.display().to_string()),
            line_range: record.map(|r| r.line_range),
            source,
            comments: self.comments(record),
            probable_implementations,
        }
    }

    /// Chains reordered from the furthest ancestor down to the target
    pub fn chain_report(&self, target: &MethodSignature, chains: &ChainSet) -> ChainReport {
        ChainReport {
            target: target.to_string(),
            truncated: chains.truncated,
            chains: chains
                .chains
                .iter()
                .map(|chain| ChainBlock {
                    methods: chain.from_root().map(|m| self.method_entry(m)).collect(),
                })
                .collect(),
        }
    }

    pub fn tree_report(&self, target: &MethodSignature, tree: &CallTree) -> TreeReport {
        let methods = tree
            .root
            .signatures()
            .into_iter()
            .map(|signature| self.method_summary(signature))
            .collect();

        TreeReport {
            target: target.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            truncated: tree.truncated,
            dag_tree: self.tree_node(&tree.root),
            methods,
        }
    }

    pub fn list_report<'s, I>(&self, target: &MethodSignature, signatures: I) -> ListReport
    where
        I: IntoIterator<Item = &'s MethodSignature>,
    {
        ListReport {
            target: target.to_string(),
            methods: signatures
                .into_iter()
                .map(|signature| {
                    let record = self.snapshot.record(signature);
                    ListEntry {
                        signature: signature.to_string(),
                        file: record.map(|r| r.file.display().to_string()),
                        line: record.map(|r| r.line_range.0),
                    }
                })
                .collect(),
        }
    }

    fn tree_node(&self, root: &CallTreeNode) -> TreeNodeReport {
        // Pre-order flattening: every node lands after its parent
        let mut order: Vec<(&CallTreeNode, Vec<usize>)> = Vec::new();
        let mut stack = vec![(root, None::<usize>)];
        while let Some((node, parent)) = stack.pop() {
            let index = order.len();
            order.push((node, Vec::new()));
            if let Some(parent) = parent {
                order[parent].1.push(index);
            }
            stack.extend(node.children.iter().rev().map(|child| (child, Some(index))));
        }

        let mut built: Vec<Option<TreeNodeReport>> = (0..order.len()).map(|_| None).collect();
        for index in (0..order.len()).rev() {
            let (node, child_indices) = &order[index];
            let children = child_indices
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[index] = Some(self.tree_node_report(node, children));
        }

        built[0].take().unwrap_or_else(|| self.tree_node_report(root, Vec::new()))
    }

    fn tree_node_report(&self, node: &CallTreeNode, children: Vec<TreeNodeReport>) -> TreeNodeReport {
        let Some(signature) = &node.signature else {
            return TreeNodeReport {
                method: SYNTHETIC_ROOT.to_string(),
                file: String::new(),
                line: 0,
                children,
            };
        };

        let record = self.snapshot.record(signature);
        TreeNodeReport {
            method: signature.to_string(),
            file: record.map_or_else(|| UNAVAILABLE.to_string(), |r| r.file.display().to_string()),
            line: record.map_or(0, |r| r.line_range.0),
            children,
        }
    }

    fn method_summary(&self, signature: &MethodSignature) -> MethodSummary {
        let record = self.snapshot.record(signature);

        let body = self.output.include_source.then(|| match record {
            Some(r) if r.body.is_some() => r.source.clone(),
            Some(_) => ABSTRACT_BODY.to_string(),
            None => MISSING_BODY.to_string(),
        });

        MethodSummary {
            name: signature.display_name(),
            signature: signature.to_string(),
            body,
            comments: self.comments(record),
        }
    }

    fn comments(&self, record: Option<&MethodRecord>) -> Option<String> {
        if !self.output.include_comments {
            return None;
        }
        record.and_then(|r| r.comments.clone())
    }
}

fn location(record: &MethodRecord) -> String {
    format!(
        "{}:{}-{}",
        record.file.display(),
        record.line_range.0,
        record.line_range.1
    )
}
