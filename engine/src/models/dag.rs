//! Dependency graph model.
//!
//! Nodes are stored densely; a node's id is its position in the node list.
//! The edge list is unordered, duplicate edges are permitted at construction
//! and tolerated by every consumer. Invariant: both endpoints of an edge
//! appear in the node set.

use serde::{Deserialize, Serialize};

/// Granularity of graph construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphScope {
    File,
    Function,
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphNodeType {
    File,
    Function,
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphEdgeType {
    Call,
    Import,
    Reference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: GraphNodeType,
    pub file: String,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: u32,
    pub to: u32,
    #[serde(rename = "type")]
    pub edge_type: GraphEdgeType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: String,
        node_type: GraphNodeType,
        file: String,
        line: u32,
    ) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(GraphNode {
            id,
            name,
            node_type,
            file,
            line,
        });
        id
    }

    /// Self-loops are discarded; duplicates are kept.
    pub fn add_edge(&mut self, from: u32, to: u32, edge_type: GraphEdgeType) {
        if from == to {
            return;
        }
        debug_assert!((from as usize) < self.nodes.len());
        debug_assert!((to as usize) < self.nodes.len());
        self.edges.push(GraphEdge {
            from,
            to,
            edge_type,
        });
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing adjacency, indexed by node id.
    pub fn out_adjacency(&self) -> Vec<Vec<u32>> {
        let mut adj = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adj[edge.from as usize].push(edge.to);
        }
        adj
    }

    /// Incoming adjacency, indexed by node id.
    pub fn in_adjacency(&self) -> Vec<Vec<u32>> {
        let mut adj = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adj[edge.to as usize].push(edge.from);
        }
        adj
    }
}
