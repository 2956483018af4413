//! # Node Grouping
//!
//! Dissolves nodes into coarser regions and remaps edges onto them.
//!
//! ## Unassigned nodes
//!
//! A node with no partition (null label, or absent from every explicit
//! partition) is dropped, and so is every edge touching it. No error is
//! raised and nothing is reported; compare `shape()` before and after if
//! the loss matters.

use crate::geometry::union_all;
use crate::network::NetworkModel;
use crate::table::{Field, Row, Schema, TabularRelation, Table};
use crate::{DataType, Geometry, NodeKey, NodeTable, SttnError, Value};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

/// How nodes are assigned to partitions.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupingSpec {
    /// Partition id is the value of this node column (integer or string).
    ByColumn(String),
    /// Explicit partitions of node keys; the partition id is the position of
    /// the partition in the list, as `Int64`.
    ByPartition(Vec<Vec<NodeKey>>),
}

impl NetworkModel {
    /// Group nodes into partitions.
    ///
    /// The new node table holds one row per partition with the node key
    /// column (partition ids, sorted) and the dissolved geometry. Every other
    /// node column is dropped. Edges keep all columns; intra-partition edges
    /// become self-loops.
    pub fn group_nodes(&self, spec: &GroupingSpec) -> Result<Self, SttnError> {
        let (assignment, partition_type) = self.resolve_partitions(spec)?;

        let nodes = self.dissolve(&assignment, partition_type)?;
        let edges = self.remap_edges(&assignment, partition_type)?;

        Self::from_shared(
            Arc::new(nodes),
            Arc::new(edges.into()),
            self.columns().clone(),
        )
    }

    /// Map every assigned node key to its partition id.
    fn resolve_partitions(
        &self,
        spec: &GroupingSpec,
    ) -> Result<(BTreeMap<NodeKey, NodeKey>, DataType), SttnError> {
        let nodes = self.nodes();
        let mut assignment = BTreeMap::new();

        match spec {
            GroupingSpec::ByColumn(name) => {
                let column = nodes.column(name)?;
                let data_type = column.data_type();
                if !data_type.is_key_type() {
                    return Err(SttnError::TypeMismatch(format!(
                        "column '{}' of type {} cannot label partitions",
                        name, data_type
                    )));
                }
                for (key, label) in nodes.keys().zip(column.iter()) {
                    if label.is_null() {
                        continue;
                    }
                    assignment.insert(key.clone(), NodeKey::try_from(label)?);
                }
                Ok((assignment, data_type))
            }
            GroupingSpec::ByPartition(partitions) => {
                for (id, members) in (0i64..).zip(partitions) {
                    for key in members {
                        if !nodes.contains_key(key) {
                            continue;
                        }
                        match assignment.entry(key.clone()) {
                            Entry::Vacant(slot) => {
                                slot.insert(NodeKey::Int64(id));
                            }
                            Entry::Occupied(slot) if *slot.get() != NodeKey::Int64(id) => {
                                return Err(SttnError::DuplicateKey(format!(
                                    "node {} is listed in partitions {} and {}",
                                    key,
                                    slot.get(),
                                    id
                                )));
                            }
                            Entry::Occupied(_) => {}
                        }
                    }
                }
                Ok((assignment, DataType::Int64))
            }
        }
    }

    fn dissolve(
        &self,
        assignment: &BTreeMap<NodeKey, NodeKey>,
        partition_type: DataType,
    ) -> Result<NodeTable, SttnError> {
        let nodes = self.nodes();
        let mut members: BTreeMap<&NodeKey, Vec<&Geometry>> = BTreeMap::new();
        for (key, row) in nodes.keyed_rows() {
            if let Some(partition) = assignment.get(key) {
                members
                    .entry(partition)
                    .or_default()
                    .push(nodes.row_geometry(row)?);
            }
        }

        let rows: Vec<Row> = members
            .into_iter()
            .map(|(partition, parts)| {
                vec![partition.to_value(), Value::Geometry(union_all(&parts))]
            })
            .collect();
        let schema = Schema::new(vec![
            Field::new(self.node_key_name(), partition_type),
            Field::new(nodes.geometry_column(), DataType::Geometry),
        ])?;

        NodeTable::indexed(
            Table::new(schema, rows)?,
            nodes.geometry_column(),
            self.node_key_name(),
        )
    }

    fn remap_edges(
        &self,
        assignment: &BTreeMap<NodeKey, NodeKey>,
        partition_type: DataType,
    ) -> Result<Table, SttnError> {
        let (origin, destination) = self.endpoint_positions();

        let mut fields = self.edges().schema().fields().to_vec();
        fields[origin].data_type = partition_type;
        fields[destination].data_type = partition_type;

        let mut rows = Vec::with_capacity(self.edges().num_rows());
        for row in self.edges().rows() {
            let (from, to) = self.endpoint_keys(row)?;
            let (Some(from), Some(to)) = (assignment.get(&from), assignment.get(&to)) else {
                continue;
            };
            let mut remapped = row.clone();
            remapped[origin] = from.to_value();
            remapped[destination] = to.to_value();
            rows.push(remapped);
        }

        Table::new(Schema::new(fields)?, rows)
    }
}

// =============================================================================
// TESTS
// =============================================================================
