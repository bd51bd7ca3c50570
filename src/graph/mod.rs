//! Graph discovery: walk the live node structure from the head node into a
//! snapshot grouped by job.

use crate::error::{DagError, DagResult};
use crate::node::{Node, State};
use crate::session::Session;

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use tracing::debug;

/// Discovery aborts beyond this many nodes (cycle or corrupt memory guard).
pub const MAX_NODES: usize = 500;

/// A discovered node and its out-edges, read once per discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub node: Node,
    pub edges: Vec<Node>,
}

/// Nodes sharing one job address. Job 0 holds ungrouped nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cluster {
    pub job: u32,
    pub nodes: Vec<GraphNode>,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub head: Option<u32>,
    pub clusters: BTreeMap<u32, Cluster>,
    /// DOT edge statements accumulated during discovery.
    pub edge_text: String,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Rebuild the snapshot from `head`. On failure the previous snapshot is
    /// left untouched.
    pub fn populate(&mut self, s: &Session, head: u32) -> DagResult<()> {
        let mut fresh = Graph {
            head: Some(head),
            ..Graph::default()
        };
        let mut visited = HashSet::new();
        fresh.discover(s, Node::new(head), &mut visited)?;
        debug!(
            build = %s.build,
            head = %format!("{:#x}", head),
            nodes = visited.len(),
            edges = fresh.nodes().map(|n| n.edges.len()).sum::<usize>(),
            clusters = fresh.clusters.len(),
            "populated graph"
        );
        *self = fresh;
        Ok(())
    }

    fn discover(&mut self, s: &Session, node: Node, visited: &mut HashSet<u32>) -> DagResult<()> {
        if !visited.insert(node.address) {
            return Ok(());
        }
        if visited.len() > MAX_NODES {
            return Err(DagError::MaxSizeExceeded { limit: MAX_NODES });
        }

        let job = node.job(s)?;
        let edges = node.children(s)?;
        for child in &edges {
            let _ = writeln!(
                self.edge_text,
                "\t\"{:x}\" -> \"{:x}\"",
                node.address, child.address
            );
        }

        self.clusters
            .entry(job)
            .or_insert_with(|| Cluster {
                job,
                nodes: Vec::new(),
            })
            .nodes
            .push(GraphNode {
                node,
                edges: edges.clone(),
            });

        for child in edges {
            if !visited.contains(&child.address) {
                self.discover(s, child, visited)?;
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.clusters.values().flat_map(|c| c.nodes.iter())
    }

    pub fn node_count(&self) -> usize {
        self.clusters.values().map(|c| c.nodes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Put every discovered node back to its baseline: Available for roots,
    /// Unavailable otherwise. Nothing cascades.
    pub fn reset(&self, s: &Session) -> DagResult<()> {
        for entry in self.nodes() {
            let state = if entry.node.num_parents(s)? == 0 {
                State::Available
            } else {
                State::Unavailable
            };
            entry.node.set_state(s, state)?;
        }
        Ok(())
    }
}
