// src/core/call_graph/mod.rs
//! Call graph over canonical method signatures
//!
//! Resolved call edges and interface implementations are folded into a
//! forward/reverse adjacency graph, which the chain enumerator walks to find
//! callers, caller chains and descendant trees for a target method.

mod signature;
mod policy;
mod implementation_map;
mod call_graph;
mod entry_point_detector;
mod chain_enumerator;

pub use signature::{MethodSignature, Scope};
pub use policy::{CycleScope, FanOutPolicy, OutputFormat, TraversalPolicy};
pub use implementation_map::ImplementationMap;
pub use call_graph::{CallGraph, CallEdge};
pub use entry_point_detector::EntryPointDetector;
pub use chain_enumerator::{ChainEnumerator, ChainSet, CallTree, CallTreeNode};
