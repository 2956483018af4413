//! # Node and Edge Filters
//!
//! Filtering nodes cascades to edges: an edge survives only if both of its
//! endpoints do. Filtering edges never touches the node table.

use crate::network::NetworkModel;
use crate::table::{RowView, TabularRelation};
use crate::SttnError;
use std::collections::BTreeSet;
use std::sync::Arc;

impl NetworkModel {
    /// Keep the nodes whose mask entry is `true`, and the edges between them.
    pub fn filter_nodes(&self, mask: &[bool]) -> Result<Self, SttnError> {
        let nodes = self.nodes().mask(mask)?;
        let kept: BTreeSet<_> = nodes.keys().collect();

        let mut edge_mask = Vec::with_capacity(self.edges().num_rows());
        for row in self.edges().rows() {
            let (from, to) = self.endpoint_keys(row)?;
            edge_mask.push(kept.contains(&from) && kept.contains(&to));
        }
        let edges = self.edges().mask(&edge_mask)?;

        Self::from_shared(Arc::new(nodes), Arc::new(edges), self.columns().clone())
    }

    /// Keep the nodes matching `predicate`, and the edges between them.
    pub fn filter_nodes_by<F>(&self, predicate: F) -> Result<Self, SttnError>
    where
        F: FnMut(RowView<'_>) -> bool,
    {
        let mask: Vec<bool> = self.nodes().iter_rows().map(predicate).collect();
        self.filter_nodes(&mask)
    }

    /// Keep the edges whose mask entry is `true`. The node table is shared.
    pub fn filter_edges(&self, mask: &[bool]) -> Result<Self, SttnError> {
        let edges = self.edges().mask(mask)?;
        Self::from_shared(self.shared_nodes(), Arc::new(edges), self.columns().clone())
    }

    /// Keep the edges matching `predicate`. The node table is shared.
    pub fn filter_edges_by<F>(&self, predicate: F) -> Result<Self, SttnError>
    where
        F: FnMut(RowView<'_>) -> bool,
    {
        let mask: Vec<bool> = self.edges().iter_rows().map(predicate).collect();
        self.filter_edges(&mask)
    }
}

// =============================================================================
// TESTS
// =============================================================================
