//! # Edge Aggregation
//!
//! Collapses edges that share endpoints.
//!
//! - `agg_parallel_edges` merges edges with the same (origin, destination)
//!   pair, optionally split further by a key column, and returns a new
//!   network sharing the node table.
//! - `agg_adjacent_edges` rolls edges up per node and returns a plain table.
//!
//! Both emit rows in ascending grouping order.

use crate::network::NetworkModel;
use crate::reducer::Reducer;
use crate::table::{TabularRelation, Table};
use crate::SttnError;
use std::sync::Arc;

/// Which endpoint an edge is attributed to when rolling up per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Group by origin.
    #[default]
    Outgoing,
    /// Group by destination.
    Incoming,
}

impl NetworkModel {
    /// Merge parallel edges.
    ///
    /// Output edge columns are origin, destination, `key` (if given), then
    /// one column per reducer in the order supplied. Every other edge column
    /// is dropped.
    pub fn agg_parallel_edges<S: AsRef<str>>(
        &self,
        reducers: &[(S, Reducer)],
        key: Option<&str>,
    ) -> Result<Self, SttnError> {
        let mut keys = vec![self.origin_column(), self.destination_column()];
        keys.extend(key);

        let edges = self.edges().as_table().group_by(&keys, reducers)?;
        Self::from_shared(
            self.shared_nodes(),
            Arc::new(edges.into()),
            self.columns().clone(),
        )
    }

    /// Roll edges up per node.
    ///
    /// With `include_cycles == false`, self-loops are dropped first. The
    /// first output column is the grouping endpoint renamed to the node key
    /// name; nodes without a qualifying edge do not appear.
    pub fn agg_adjacent_edges<S: AsRef<str>>(
        &self,
        reducers: &[(S, Reducer)],
        direction: Direction,
        include_cycles: bool,
    ) -> Result<Table, SttnError> {
        let (origin, destination) = self.endpoint_positions();
        let edges = self.edges().as_table();
        let kept;
        let source = if include_cycles {
            edges
        } else {
            kept = edges.filter_rows(|row| row.values()[origin] != row.values()[destination]);
            &kept
        };

        let endpoint = match direction {
            Direction::Outgoing => self.origin_column(),
            Direction::Incoming => self.destination_column(),
        };
        source
            .group_by(&[endpoint], reducers)?
            .rename_column(endpoint, self.node_key_name())
    }
}

// =============================================================================
// TESTS
// =============================================================================
