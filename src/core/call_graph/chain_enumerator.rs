// src/core/call_graph/chain_enumerator.rs
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CallGraph, CycleScope, EntryPointDetector, MethodSignature, TraversalPolicy};

/// One backward chain, starting at the target and ending at a method with no further callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPath {
    pub methods: Vec<MethodSignature>,
}

impl ChainPath {
    pub fn new(methods: Vec<MethodSignature>) -> Self {
        Self { methods }
    }

    /// Methods ordered from the furthest ancestor down to the target
    pub fn from_root(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.iter().rev()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSet {
    pub chains: Vec<ChainPath>,
    pub truncated: bool,
    pub visits: usize,
}

/// Node of a descendant tree; the synthetic root carries no signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTreeNode {
    pub signature: Option<MethodSignature>,
    pub children: Vec<CallTreeNode>,
}

impl CallTreeNode {
    pub fn synthetic_root(children: Vec<CallTreeNode>) -> Self {
        Self { signature: None, children }
    }

    /// Signatures in pre-order, each listed once
    pub fn signatures(&self) -> Vec<&MethodSignature> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            if let Some(signature) = &node.signature {
                if seen.insert(signature) {
                    ordered.push(signature);
                }
            }
            stack.extend(node.children.iter().rev());
        }

        ordered
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTree {
    pub root: CallTreeNode,
    /// Entry points whose subtree reaches the target
    pub entry_points: Vec<MethodSignature>,
    pub used_fallback: bool,
    pub truncated: bool,
    pub visits: usize,
}

impl CallTree {
    fn empty() -> Self {
        Self {
            root: CallTreeNode::synthetic_root(Vec::new()),
            entry_points: Vec::new(),
            used_fallback: false,
            truncated: false,
            visits: 0,
        }
    }
}

/// Counts frame pushes against the configured node-visit limit
struct VisitBudget {
    limit: Option<usize>,
    used: usize,
    exhausted: bool,
}

impl VisitBudget {
    fn new(limit: Option<usize>) -> Self {
        Self { limit, used: 0, exhausted: false }
    }

    fn take(&mut self) -> bool {
        if self.limit.map_or(false, |limit| self.used >= limit) {
            self.exhausted = true;
            return false;
        }
        self.used += 1;
        true
    }
}

struct ChainFrame<'g> {
    path: Vec<&'g MethodSignature>,
    /// Path-local copy; left empty under the global cycle scope
    visited: BTreeSet<&'g MethodSignature>,
}

struct TreeSlot<'g> {
    signature: &'g MethodSignature,
    parent: Option<usize>,
    children: Vec<usize>,
    reaches_target: bool,
}

struct TreeFrame<'g> {
    slot: usize,
    visited: BTreeSet<&'g MethodSignature>,
}

/// Enumerates callers, caller chains and descendant trees over an immutable graph
pub struct ChainEnumerator<'g> {
    graph: &'g CallGraph,
    detector: EntryPointDetector,
    policy: TraversalPolicy,
}

impl<'g> ChainEnumerator<'g> {
    pub fn new(graph: &'g CallGraph, detector: EntryPointDetector, policy: TraversalPolicy) -> Self {
        Self { graph, detector, policy }
    }

    /// Every signature that can reach the target.
    ///
    /// The target itself is included only when it lies on a cycle.
    pub fn ancestors(&self, target: &MethodSignature) -> BTreeSet<MethodSignature> {
        let mut visited: BTreeSet<&MethodSignature> = BTreeSet::new();
        let mut worklist = vec![target];

        while let Some(current) = worklist.pop() {
            let Some(callers) = self.graph.get_callers(current) else {
                continue;
            };
            for caller in callers {
                if visited.insert(caller) {
                    worklist.push(caller);
                }
            }
        }

        debug!("{} ancestors of {}", visited.len(), target);
        visited.into_iter().cloned().collect()
    }

    /// Immediate callers in signature order
    pub fn direct_callers(&self, target: &MethodSignature) -> Vec<MethodSignature> {
        self.graph
            .get_callers(target)
            .map(|callers| callers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All backward chains from the target, depth-first in signature order
    pub fn caller_chains(&self, target: &MethodSignature) -> ChainSet {
        let mut result = ChainSet::default();
        let Some(target) = self.graph.node(target) else {
            return result;
        };

        let path_local = self.policy.cycle_scope == CycleScope::PathLocal;
        let mut budget = VisitBudget::new(self.policy.visit_budget());
        let mut global: BTreeSet<&MethodSignature> = BTreeSet::from([target]);

        budget.take();
        let mut stack = vec![ChainFrame {
            path: vec![target],
            visited: if path_local { BTreeSet::from([target]) } else { BTreeSet::new() },
        }];

        'walk: while let Some(frame) = stack.pop() {
            let Some(&current) = frame.path.last() else {
                continue;
            };
            let callers = self.graph.get_callers(current);

            let mut extended = false;
            for caller in callers.into_iter().flatten().rev() {
                let blocked = if path_local {
                    frame.visited.contains(caller)
                } else {
                    global.contains(caller)
                };
                if blocked {
                    continue;
                }
                if !budget.take() {
                    result.truncated = true;
                    break 'walk;
                }

                let mut path = frame.path.clone();
                path.push(caller);
                let visited = if path_local {
                    let mut visited = frame.visited.clone();
                    visited.insert(caller);
                    visited
                } else {
                    global.insert(caller);
                    BTreeSet::new()
                };
                stack.push(ChainFrame { path, visited });
                extended = true;
            }

            if !extended {
                result
                    .chains
                    .push(ChainPath::new(frame.path.into_iter().cloned().collect()));
            }
        }

        result.visits = budget.used;
        if result.truncated {
            warn!(
                "Visit budget of {} exhausted while enumerating chains for {}; output is partial",
                budget.used, target
            );
        }
        debug!("{} caller chains for {}", result.chains.len(), target);
        result
    }

    /// Forward tree from the entry points, pruned to branches that reach the target
    pub fn descendant_tree(&self, target: &MethodSignature) -> CallTree {
        let mut tree = CallTree::empty();
        if !self.graph.contains(target) {
            return tree;
        }

        let mut budget = VisitBudget::new(self.policy.visit_budget());
        let mut kept = Vec::new();

        for entry in self.detector.detect_entry_points(self.graph) {
            if let Some(node) = self.grow(&entry.signature, target, &mut budget) {
                debug!(
                    "Entry point {} ({:?}: {}) reaches {}",
                    entry.signature, entry.entry_type, entry.reasoning, target
                );
                tree.entry_points.push(entry.signature);
                kept.push(node);
            }
            if budget.exhausted {
                break;
            }
        }

        if kept.is_empty() && !budget.exhausted {
            warn!(
                "No entry point reaches {}; falling back to the first method that does",
                target
            );
            for candidate in self.graph.nodes() {
                if let Some(node) = self.grow(candidate, target, &mut budget) {
                    tree.entry_points.push(candidate.clone());
                    tree.used_fallback = true;
                    kept.push(node);
                    break;
                }
                if budget.exhausted {
                    break;
                }
            }
        }

        tree.root = if kept.len() == 1 {
            kept.remove(0)
        } else {
            CallTreeNode::synthetic_root(kept)
        };
        tree.truncated = budget.exhausted;
        tree.visits = budget.used;
        if tree.truncated {
            warn!(
                "Visit budget of {} exhausted while building the tree for {}; output is partial",
                budget.used, target
            );
        }
        tree
    }

    /// Forward DFS from one entry; None when nothing below it reaches the target
    fn grow(
        &self,
        entry: &MethodSignature,
        target: &MethodSignature,
        budget: &mut VisitBudget,
    ) -> Option<CallTreeNode> {
        let entry = self.graph.node(entry)?;
        if !budget.take() {
            return None;
        }

        let path_local = self.policy.cycle_scope == CycleScope::PathLocal;
        let mut global: BTreeSet<&MethodSignature> = BTreeSet::from([entry]);
        let mut arena = vec![TreeSlot {
            signature: entry,
            parent: None,
            children: Vec::new(),
            reaches_target: false,
        }];
        let mut stack = vec![TreeFrame {
            slot: 0,
            visited: if path_local { BTreeSet::from([entry]) } else { BTreeSet::new() },
        }];

        'walk: while let Some(frame) = stack.pop() {
            let current = arena[frame.slot].signature;

            if current == target {
                let mut cursor = Some(frame.slot);
                while let Some(index) = cursor {
                    if arena[index].reaches_target {
                        break;
                    }
                    arena[index].reaches_target = true;
                    cursor = arena[index].parent;
                }
                continue;
            }

            let mut pushed = Vec::new();
            for callee in self.graph.get_callees(current).into_iter().flatten() {
                let blocked = if path_local {
                    frame.visited.contains(callee)
                } else {
                    global.contains(callee)
                };
                if blocked {
                    continue;
                }
                if !budget.take() {
                    break;
                }

                let index = arena.len();
                arena.push(TreeSlot {
                    signature: callee,
                    parent: Some(frame.slot),
                    children: Vec::new(),
                    reaches_target: false,
                });
                arena[frame.slot].children.push(index);

                let visited = if path_local {
                    let mut visited = frame.visited.clone();
                    visited.insert(callee);
                    visited
                } else {
                    global.insert(callee);
                    BTreeSet::new()
                };
                pushed.push(TreeFrame { slot: index, visited });
            }

            stack.extend(pushed.into_iter().rev());
            if budget.exhausted {
                break 'walk;
            }
        }

        if !arena[0].reaches_target {
            return None;
        }

        // Children always sit after their parent, so building back to front sees them first
        let mut built: Vec<Option<CallTreeNode>> = (0..arena.len()).map(|_| None).collect();
        for index in (0..arena.len()).rev() {
            let slot = &arena[index];
            if !slot.reaches_target {
                continue;
            }
            let children = slot
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[index] = Some(CallTreeNode {
                signature: Some(slot.signature.clone()),
                children,
            });
        }
        built[0].take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call_graph::{CallEdge, FanOutPolicy, ImplementationMap, Scope};

    fn sig(text: &str) -> MethodSignature {
        text.parse().unwrap()
    }

    fn graph(edges: &[(&str, &str)]) -> CallGraph {
        let mut graph = CallGraph::new();
        for (caller, callee) in edges {
            graph.add_edge(sig(caller), sig(callee));
        }
        graph
    }

    fn enumerator(graph: &CallGraph, policy: TraversalPolicy) -> ChainEnumerator<'_> {
        ChainEnumerator::new(graph, EntryPointDetector::default(), policy)
    }

    fn chain_strings(set: &ChainSet) -> Vec<Vec<String>> {
        set.chains
            .iter()
            .map(|c| c.methods.iter().map(|m| m.to_string()).collect())
            .collect()
    }

    fn names(set: &BTreeSet<MethodSignature>) -> Vec<String> {
        set.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_policy_is_path_local() {
        // Pins the documented defaults
        assert_eq!(TraversalPolicy::default().cycle_scope, CycleScope::PathLocal);
        assert_eq!(TraversalPolicy::default().fan_out, FanOutPolicy::All);
    }

    #[test]
    fn test_path_local_keeps_shared_ancestor_in_both_chains() {
        let g = graph(&[
            ("p.A.a()", "p.T.t()"),
            ("p.B.b()", "p.T.t()"),
            ("p.C.c()", "p.A.a()"),
            ("p.C.c()", "p.B.b()"),
        ]);

        let chains = enumerator(&g, TraversalPolicy::default()).caller_chains(&sig("p.T.t()"));
        assert!(!chains.truncated);
        assert_eq!(
            chain_strings(&chains),
            vec![
                vec!["p.T.t()", "p.A.a()", "p.C.c()"],
                vec!["p.T.t()", "p.B.b()", "p.C.c()"],
            ]
        );
    }

    #[test]
    fn test_global_scope_suppresses_sibling_chain() {
        let g = graph(&[
            ("p.A.a()", "p.T.t()"),
            ("p.B.b()", "p.T.t()"),
            ("p.C.c()", "p.A.a()"),
            ("p.C.c()", "p.B.b()"),
        ]);
        let policy = TraversalPolicy { cycle_scope: CycleScope::Global, ..Default::default() };

        let chains = enumerator(&g, policy).caller_chains(&sig("p.T.t()"));
        assert_eq!(
            chain_strings(&chains),
            vec![vec!["p.T.t()", "p.A.a()", "p.C.c()"], vec!["p.T.t()", "p.B.b()"]]
        );
    }

    #[test]
    fn test_cycle_ends_chain_where_it_would_close() {
        let g = graph(&[("p.A.a()", "p.T.t()"), ("p.B.b()", "p.A.a()"), ("p.A.a()", "p.B.b()")]);
        let chains = enumerator(&g, TraversalPolicy::default()).caller_chains(&sig("p.T.t()"));
        assert_eq!(chain_strings(&chains), vec![vec!["p.T.t()", "p.A.a()", "p.B.b()"]]);
    }

    #[test]
    fn test_target_without_callers_yields_trivial_chain() {
        let g = graph(&[("p.T.t()", "p.U.u()")]);
        let chains = enumerator(&g, TraversalPolicy::default()).caller_chains(&sig("p.T.t()"));
        assert_eq!(chain_strings(&chains), vec![vec!["p.T.t()"]]);
    }

    #[test]
    fn test_missing_target_is_empty_everywhere() {
        let g = graph(&[("p.A.a()", "p.B.b()")]);
        let e = enumerator(&g, TraversalPolicy::default());
        let missing = sig("p.Nope.none()");

        assert!(e.ancestors(&missing).is_empty());
        assert!(e.caller_chains(&missing).chains.is_empty());
        assert!(e.direct_callers(&missing).is_empty());
        let tree = e.descendant_tree(&missing);
        assert!(tree.root.signature.is_none());
        assert!(tree.root.children.is_empty());
    }

    #[test]
    fn test_self_recursion_terminates_everywhere() {
        let g = graph(&[("p.T.t()", "p.T.t()"), ("p.M.main()", "p.T.t()")]);
        let e = enumerator(&g, TraversalPolicy::default());
        let target = sig("p.T.t()");

        assert_eq!(names(&e.ancestors(&target)), vec!["p.M.main()", "p.T.t()"]);
        assert_eq!(chain_strings(&e.caller_chains(&target)), vec![vec!["p.T.t()", "p.M.main()"]]);

        let tree = e.descendant_tree(&target);
        assert_eq!(tree.root.signature, Some(sig("p.M.main()")));
        assert_eq!(tree.root.children.len(), 1);
        assert!(tree.root.children[0].children.is_empty());
    }

    #[test]
    fn test_ancestors_never_repeat_with_cycles() {
        let g = graph(&[
            ("p.A.a()", "p.B.b()"),
            ("p.B.b()", "p.A.a()"),
            ("p.B.b()", "p.T.t()"),
        ]);
        let ancestors = enumerator(&g, TraversalPolicy::default()).ancestors(&sig("p.T.t()"));
        assert_eq!(names(&ancestors), vec!["p.A.a()", "p.B.b()"]);
    }

    #[test]
    fn test_direct_callers_in_signature_order() {
        let g = graph(&[("p.Z.z()", "p.T.t()"), ("p.A.a()", "p.T.t()"), ("p.Q.q()", "p.A.a()")]);
        let callers = enumerator(&g, TraversalPolicy::default()).direct_callers(&sig("p.T.t()"));
        assert_eq!(callers, vec![sig("p.A.a()"), sig("p.Z.z()")]);
    }

    #[test]
    fn test_tree_prunes_branches_that_miss_the_target() {
        let g = graph(&[
            ("p.App.main()", "p.A.a()"),
            ("p.App.main()", "p.B.b()"),
            ("p.A.a()", "p.T.t()"),
            ("p.B.b()", "p.C.c()"),
            ("p.T.t()", "p.D.d()"),
        ]);
        let tree = enumerator(&g, TraversalPolicy::default()).descendant_tree(&sig("p.T.t()"));

        assert!(!tree.used_fallback);
        let root = &tree.root;
        assert_eq!(root.signature, Some(sig("p.App.main()")));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].signature, Some(sig("p.A.a()")));
        let target = &root.children[0].children[0];
        assert_eq!(target.signature, Some(sig("p.T.t()")));
        assert!(target.children.is_empty());

        let listed: Vec<String> = root.signatures().iter().map(|s| s.to_string()).collect();
        assert_eq!(listed, vec!["p.App.main()", "p.A.a()", "p.T.t()"]);
    }

    #[test]
    fn test_tree_with_several_entries_gets_synthetic_root() {
        let g = graph(&[("p.One.main()", "p.T.t()"), ("p.Two.main()", "p.T.t()")]);
        let tree = enumerator(&g, TraversalPolicy::default()).descendant_tree(&sig("p.T.t()"));
        assert!(tree.root.signature.is_none());
        assert_eq!(tree.root.children.len(), 2);
        assert_eq!(tree.entry_points, vec![sig("p.One.main()"), sig("p.Two.main()")]);
    }

    #[test]
    fn test_tree_falls_back_when_no_entry_reaches_target() {
        let g = graph(&[
            ("p.A.x()", "p.B.y()"),
            ("p.B.y()", "p.A.x()"),
            ("p.B.y()", "p.C.target()"),
        ]);
        let tree = enumerator(&g, TraversalPolicy::default()).descendant_tree(&sig("p.C.target()"));

        assert!(tree.used_fallback);
        assert_eq!(tree.root.signature, Some(sig("p.A.x()")));
        let y = &tree.root.children[0];
        assert_eq!(y.signature, Some(sig("p.B.y()")));
        assert_eq!(y.children.len(), 1);
        assert_eq!(y.children[0].signature, Some(sig("p.C.target()")));
    }

    #[test]
    fn test_budget_exhaustion_truncates() {
        let g = graph(&[
            ("p.A.a()", "p.T.t()"),
            ("p.B.b()", "p.T.t()"),
            ("p.C.c()", "p.T.t()"),
        ]);
        let policy = TraversalPolicy { max_visits: 2, ..Default::default() };
        let e = enumerator(&g, policy);

        let chains = e.caller_chains(&sig("p.T.t()"));
        assert!(chains.truncated);
        assert!(chains.chains.len() < 3);
        assert_eq!(chains.visits, 2);

        let unlimited = TraversalPolicy { max_visits: 0, ..Default::default() };
        assert_eq!(enumerator(&g, unlimited).caller_chains(&sig("p.T.t()")).chains.len(), 3);
    }

    #[test]
    fn test_helper_scenario_follows_actual_edges() {
        let edges: Vec<CallEdge> = [
            ("p.TestSample.main(java.lang.String[])", "p.TestSample.methodA()"),
            ("p.TestSample.methodA()", "p.TestSample.methodB()"),
            ("p.TestSample.methodB()", "p.TestSample.methodC()"),
            ("p.TestSample.methodC()", "p.Helper.helperMethod(int)"),
            ("p.HelperImpl2.helperMethod(int)", "p.InnerHelper.innerHelperMethod(int, int)"),
            (
                "p.InnerHelperImpl2.innerHelperMethod(int, int)",
                "p.InnerHelperImpl2.innerHelperMethod(int)",
            ),
            (
                "p.InnerHelperImpl2.innerHelperMethod(int)",
                "p.InnerHelperImpl2.innerHelperMethod(int, int, int)",
            ),
            (
                "p.InnerHelperImpl2.innerHelperMethod(int, int, int)",
                "p.InnerHelperImpl2.innerHelperMethod(int, int, int, int)",
            ),
        ]
        .iter()
        .map(|(caller, callee)| CallEdge::new(sig(caller), sig(callee)))
        .collect();

        let mut map = ImplementationMap::default();
        map.insert(sig("p.Helper.helperMethod(int)"), sig("p.HelperImpl.helperMethod(int)"));
        map.insert(sig("p.Helper.helperMethod(int)"), sig("p.HelperImpl2.helperMethod(int)"));
        map.insert(
            sig("p.InnerHelper.innerHelperMethod(int, int)"),
            sig("p.InnerHelperImpl2.innerHelperMethod(int, int)"),
        );

        let g = CallGraph::build(&edges, &map, &Scope::new("p"), FanOutPolicy::All);
        let ancestors = enumerator(&g, TraversalPolicy::default())
            .ancestors(&sig("p.InnerHelperImpl2.innerHelperMethod(int, int, int, int)"));

        let expected: BTreeSet<MethodSignature> = [
            "p.InnerHelperImpl2.innerHelperMethod(int, int, int)",
            "p.InnerHelperImpl2.innerHelperMethod(int)",
            "p.InnerHelperImpl2.innerHelperMethod(int, int)",
            "p.HelperImpl2.helperMethod(int)",
            "p.TestSample.methodC()",
            "p.TestSample.methodB()",
            "p.TestSample.methodA()",
            "p.TestSample.main(java.lang.String[])",
            "p.Helper.helperMethod(int)",
            "p.InnerHelper.innerHelperMethod(int, int)",
        ]
        .iter()
        .map(|s| sig(s))
        .collect();

        assert_eq!(ancestors, expected);
        // The sibling implementation is never on a path to the target
        assert!(!ancestors.contains(&sig("p.HelperImpl.helperMethod(int)")));
    }
}
