//! # Graph Projection
//!
//! Converts a network into a directed multigraph for graph algorithms.
//!
//! Vertices are node keys (every node, including isolated ones). Each edge
//! row becomes one graph edge carrying its non-endpoint columns, so parallel
//! edges stay distinct.

use crate::network::NetworkModel;
use crate::table::TabularRelation;
use crate::{NodeKey, SttnError, Value};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeMap;

/// Column name -> value map attached to each graph edge.
pub type EdgeAttributes = BTreeMap<String, Value>;

/// Directed multigraph keyed by node key.
#[derive(Debug, Clone)]
pub struct MultiGraph {
    graph: DiGraph<NodeKey, EdgeAttributes>,
    index: BTreeMap<NodeKey, NodeIndex>,
}

impl MultiGraph {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertices in node table order.
    pub fn vertices(&self) -> impl Iterator<Item = &NodeKey> {
        self.graph.node_weights()
    }

    /// `(source, target, attributes)` in edge table order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeKey, &NodeKey, &EdgeAttributes)> {
        let graph = &self.graph;
        graph
            .edge_references()
            .map(move |edge| (&graph[edge.source()], &graph[edge.target()], edge.weight()))
    }

    /// Graph index of the vertex for `key`.
    #[must_use]
    pub fn node_index(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    /// Attributes of every edge from `source` to `target`.
    pub fn edges_between(&self, source: &NodeKey, target: &NodeKey) -> Vec<&EdgeAttributes> {
        match (self.node_index(source), self.node_index(target)) {
            (Some(a), Some(b)) => self
                .graph
                .edges_connecting(a, b)
                .map(|edge| edge.weight())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Attributes of one edge by its graph index.
    #[must_use]
    pub fn edge_attributes(&self, edge: EdgeIndex) -> Option<&EdgeAttributes> {
        self.graph.edge_weight(edge)
    }

    #[must_use]
    pub fn as_petgraph(&self) -> &DiGraph<NodeKey, EdgeAttributes> {
        &self.graph
    }

    #[must_use]
    pub fn into_petgraph(self) -> DiGraph<NodeKey, EdgeAttributes> {
        self.graph
    }

    /// Undirected copy with the same vertex and edge indices.
    #[must_use]
    pub fn to_undirected(&self) -> UnGraph<NodeKey, EdgeAttributes> {
        self.graph.clone().into_edge_type()
    }
}

impl NetworkModel {
    /// Project the network into a directed multigraph.
    pub fn to_multigraph(&self) -> Result<MultiGraph, SttnError> {
        let (nodes, edges) = self.shape();
        let mut graph = DiGraph::with_capacity(nodes, edges);
        let mut index = BTreeMap::new();
        for key in self.nodes().keys() {
            index.insert(key.clone(), graph.add_node(key.clone()));
        }

        let (origin, destination) = self.endpoint_positions();
        let names: Vec<&str> = self.edges().schema().names().collect();
        for row in self.edges().rows() {
            let (from, to) = self.endpoint_keys(row)?;
            let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) else {
                return Err(SttnError::DanglingReference {
                    column: self.origin_column().to_string(),
                    missing: 1,
                    sample: vec![format!("{} -> {}", from, to)],
                });
            };
            let attributes = names
                .iter()
                .zip(row)
                .enumerate()
                .filter(|(i, _)| *i != origin && *i != destination)
                .map(|(_, (name, value))| ((*name).to_string(), value.clone()))
                .collect();
            graph.add_edge(a, b, attributes);
        }

        Ok(MultiGraph { graph, index })
    }
}

// =============================================================================
// TESTS
// =============================================================================
