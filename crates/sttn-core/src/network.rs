//! # Network Model
//!
//! The spatio-temporal network: one node table, one edge table, and the
//! names of the node key, origin and destination columns.
//!
//! A `NetworkModel` is validated eagerly on every construction and never
//! mutated afterwards. Transformations (in `aggregate`, `grouping`,
//! `filter`, `labels`, `spatial`) build a fresh model through the same
//! validation path. Tables are held behind `Arc`, so a table a
//! transformation leaves untouched is shared rather than copied; tables have
//! no interior mutability, so sharing is never observable.

use crate::edge_table::EdgeTable;
use crate::node_table::NodeTable;
use crate::primitives::{
    DANGLING_SAMPLE_LIMIT, DEFAULT_DESTINATION, DEFAULT_NODE_KEY, DEFAULT_ORIGIN,
};
use crate::table::{Row, TabularRelation};
use crate::{NodeKey, SttnError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// COLUMN NAMES
// =============================================================================

/// Names of the three identifying columns of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Key column of the node table.
    pub node_key: String,
    /// Edge column referencing the source node.
    pub origin: String,
    /// Edge column referencing the target node.
    pub destination: String,
}

impl ColumnNames {
    #[must_use]
    pub fn new(
        node_key: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            node_key: node_key.into(),
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_KEY, DEFAULT_ORIGIN, DEFAULT_DESTINATION)
    }
}

// =============================================================================
// NETWORK MODEL
// =============================================================================

/// A validated spatio-temporal network.
///
/// Invariants (checked in this order on every construction):
/// 1. `origin` and `destination` exist in the edge schema.
/// 2. The node table is indexed, under `node_key`.
/// 3. Origin, destination and node key share one type.
/// 4. Every origin and destination value is a node key.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    nodes: Arc<NodeTable>,
    edges: Arc<EdgeTable>,
    columns: ColumnNames,
    origin: usize,
    destination: usize,
}

impl NetworkModel {
    /// Build a network using the default column names
    /// (`id`, `origin`, `destination`).
    pub fn new(nodes: NodeTable, edges: impl Into<EdgeTable>) -> Result<Self, SttnError> {
        Self::with_columns(nodes, edges, ColumnNames::default())
    }

    /// Build a network with explicit column names.
    pub fn with_columns(
        nodes: NodeTable,
        edges: impl Into<EdgeTable>,
        columns: ColumnNames,
    ) -> Result<Self, SttnError> {
        Self::from_shared(Arc::new(nodes), Arc::new(edges.into()), columns)
    }

    /// Validate and assemble a model from possibly shared tables.
    pub(crate) fn from_shared(
        nodes: Arc<NodeTable>,
        edges: Arc<EdgeTable>,
        columns: ColumnNames,
    ) -> Result<Self, SttnError> {
        let (origin, destination) = validate(&nodes, &edges, &columns)?;
        Ok(Self {
            nodes,
            edges,
            columns,
            origin,
            destination,
        })
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    #[must_use]
    pub fn columns(&self) -> &ColumnNames {
        &self.columns
    }

    #[must_use]
    pub fn node_key_name(&self) -> &str {
        &self.columns.node_key
    }

    #[must_use]
    pub fn origin_column(&self) -> &str {
        &self.columns.origin
    }

    #[must_use]
    pub fn destination_column(&self) -> &str {
        &self.columns.destination
    }

    /// `(node count, edge count)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nodes.num_rows(), self.edges.num_rows())
    }

    /// Whether `other` shares this model's node table allocation.
    #[must_use]
    pub fn shares_nodes_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    pub(crate) fn shared_nodes(&self) -> Arc<NodeTable> {
        Arc::clone(&self.nodes)
    }

    pub(crate) fn shared_edges(&self) -> Arc<EdgeTable> {
        Arc::clone(&self.edges)
    }

    /// Schema positions of the origin and destination columns.
    pub(crate) fn endpoint_positions(&self) -> (usize, usize) {
        (self.origin, self.destination)
    }

    /// Origin and destination keys of an edge row of this model.
    pub(crate) fn endpoint_keys(&self, row: &Row) -> Result<(NodeKey, NodeKey), SttnError> {
        Ok((
            NodeKey::try_from(&row[self.origin])?,
            NodeKey::try_from(&row[self.destination])?,
        ))
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

fn validate(
    nodes: &NodeTable,
    edges: &EdgeTable,
    columns: &ColumnNames,
) -> Result<(usize, usize), SttnError> {
    let schema = edges.schema();
    let origin = schema.require(&columns.origin, EdgeTable::KIND)?;
    let destination = schema.require(&columns.destination, EdgeTable::KIND)?;

    let index_name = nodes.index_name().ok_or(SttnError::NotIndexed)?;
    if index_name != columns.node_key {
        return Err(SttnError::IndexMismatch {
            expected: columns.node_key.clone(),
            found: index_name.to_string(),
        });
    }
    let key_type = nodes.key_type().ok_or(SttnError::NotIndexed)?;

    let origin_type = schema.fields()[origin].data_type;
    let destination_type = schema.fields()[destination].data_type;
    if origin_type != destination_type {
        return Err(SttnError::TypeMismatch(format!(
            "origin column '{}' is {} but destination column '{}' is {}",
            columns.origin, origin_type, columns.destination, destination_type
        )));
    }
    if origin_type != key_type {
        return Err(SttnError::TypeMismatch(format!(
            "edge endpoints are {} but node keys ('{}') are {}",
            origin_type, columns.node_key, key_type
        )));
    }

    check_references(nodes, edges, origin, &columns.origin)?;
    check_references(nodes, edges, destination, &columns.destination)?;

    Ok((origin, destination))
}

/// Fail if any value of edge column `position` is not a node key.
///
/// The error lists distinct offending values in first-seen order, bounded by
/// `DANGLING_SAMPLE_LIMIT`, plus the total number of distinct offenders.
fn check_references(
    nodes: &NodeTable,
    edges: &EdgeTable,
    position: usize,
    column: &str,
) -> Result<(), SttnError> {
    let mut missing = BTreeSet::new();
    let mut sample = Vec::new();

    for row in edges.rows() {
        let value = &row[position];
        let known = NodeKey::try_from(value).is_ok_and(|key| nodes.contains_key(&key));
        if known {
            continue;
        }
        let rendered = value.to_string();
        if missing.insert(rendered.clone()) && sample.len() < DANGLING_SAMPLE_LIMIT {
            sample.push(rendered);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SttnError::DanglingReference {
            column: column.to_string(),
            missing: missing.len(),
            sample,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, Table, Value};
    use geo::Point;

    fn nodes(ids: &[i64]) -> Table {
        Table::from_columns(vec![
            (
                "id",
                DataType::Int64,
                ids.iter().map(|&i| Value::Int64(i)).collect(),
            ),
            (
                "geometry",
                DataType::Geometry,
                ids.iter()
                    .map(|&i| Value::Geometry(Point::new(i as f64, 1.0).into()))
                    .collect(),
            ),
        ])
        .expect("nodes")
    }

    fn edges(pairs: &[(i64, i64)]) -> Table {
        Table::from_columns(vec![
            (
                "origin",
                DataType::Int64,
                pairs.iter().map(|&(o, _)| Value::Int64(o)).collect(),
            ),
            (
                "destination",
                DataType::Int64,
                pairs.iter().map(|&(_, d)| Value::Int64(d)).collect(),
            ),
        ])
        .expect("edges")
    }

    fn indexed(ids: &[i64]) -> NodeTable {
        NodeTable::indexed(nodes(ids), "geometry", "id").expect("indexed")
    }

    #[test]
    fn valid_network_reports_shape() {
        let model = NetworkModel::new(indexed(&[1, 2, 3]), edges(&[(1, 2), (2, 2)]))
            .expect("model");
        assert_eq!(model.shape(), (3, 2));
        assert_eq!(model.node_key_name(), "id");
        assert_eq!(model.origin_column(), "origin");
        assert_eq!(model.destination_column(), "destination");
    }

    #[test]
    fn unindexed_nodes_rejected() {
        let unindexed = NodeTable::new(nodes(&[1, 2]), "geometry").expect("nodes");
        let result = NetworkModel::new(unindexed, edges(&[(1, 2)]));
        assert!(matches!(result, Err(SttnError::NotIndexed)));
    }

    #[test]
    fn index_under_other_name_rejected() {
        let columns = ColumnNames::new("zone", "origin", "destination");
        let result = NetworkModel::with_columns(indexed(&[1, 2]), edges(&[(1, 2)]), columns);
        assert!(matches!(
            result,
            Err(SttnError::IndexMismatch { expected, found }) if expected == "zone" && found == "id"
        ));
    }

    #[test]
    fn missing_origin_checked_before_index() {
        let unindexed = NodeTable::new(nodes(&[1, 2]), "geometry").expect("nodes");
        let columns = ColumnNames::new("id", "origin_2", "destination");
        let result = NetworkModel::with_columns(unindexed, edges(&[(1, 2)]), columns);
        assert!(matches!(
            result,
            Err(SttnError::MissingColumn { column, .. }) if column == "origin_2"
        ));
    }

    #[test]
    fn dangling_sample_is_bounded() {
        let pairs: Vec<(i64, i64)> = (10..20).map(|d| (1, d)).collect();
        let result = NetworkModel::new(indexed(&[1]), edges(&pairs));
        match result {
            Err(SttnError::DanglingReference {
                column,
                missing,
                sample,
            }) => {
                assert_eq!(column, "destination");
                assert_eq!(missing, 10);
                assert_eq!(sample, vec!["10", "11", "12", "13", "14"]);
            }
            other => unreachable!("expected dangling reference, got {:?}", other),
        }
    }

    #[test]
    fn dangling_sample_is_distinct() {
        let result = NetworkModel::new(indexed(&[1]), edges(&[(1, 9), (1, 9), (1, 8)]));
        assert!(matches!(
            result,
            Err(SttnError::DanglingReference { missing: 2, sample, .. }) if sample == vec!["9", "8"]
        ));
    }

    #[test]
    fn column_names_deserialize_with_defaults() {
        let columns: ColumnNames =
            from_pairs(&[("origin", "from")]).expect("columns");
        assert_eq!(columns.node_key, "id");
        assert_eq!(columns.origin, "from");
        assert_eq!(columns.destination, "destination");
    }

    /// Deserialize `ColumnNames` from string pairs through serde's value
    /// deserializer.
    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ColumnNames, serde::de::value::Error> {
        use serde::de::IntoDeserializer;
        use std::collections::BTreeMap;
        let map: BTreeMap<&str, &str> = pairs.iter().copied().collect();
        ColumnNames::deserialize(map.into_deserializer())
    }
}
