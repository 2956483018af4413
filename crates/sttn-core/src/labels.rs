//! # Node Label Join
//!
//! Left join of an attribute table onto the node table by node key.

use crate::network::NetworkModel;
use crate::table::{Field, Schema, TabularRelation, Table};
use crate::{NodeKey, NodeTable, SttnError, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

impl NetworkModel {
    /// Attach the columns of `labels` to the nodes.
    ///
    /// `labels` must carry the node key column, typed like the node keys.
    /// Keys absent from the node table are ignored; nodes absent from
    /// `labels` get nulls. A label key may appear only once and label
    /// columns may not reuse node column names. The edge table is shared.
    pub fn join_node_labels(&self, labels: &Table) -> Result<Self, SttnError> {
        let nodes = self.nodes();
        let key_name = self.node_key_name();
        let key_position = labels.schema().require(key_name, "label table")?;

        let label_type = labels.schema().fields()[key_position].data_type;
        if nodes.key_type() != Some(label_type) {
            return Err(SttnError::TypeMismatch(format!(
                "label key '{}' is {} but node keys are {}",
                key_name,
                label_type,
                nodes.key_type().map_or("unindexed", |t| t.name())
            )));
        }

        let mut fields = nodes.schema().fields().to_vec();
        let mut carried = Vec::new();
        for (position, field) in labels.schema().fields().iter().enumerate() {
            if position == key_position {
                continue;
            }
            if nodes.schema().contains(&field.name) {
                return Err(SttnError::DuplicateColumn(field.name.clone()));
            }
            fields.push(field.clone());
            carried.push(position);
        }

        let mut by_key: BTreeMap<NodeKey, &[Value]> = BTreeMap::new();
        for row in labels.rows() {
            let value = &row[key_position];
            if value.is_null() {
                continue;
            }
            let key = NodeKey::try_from(value)?;
            if by_key.insert(key.clone(), row).is_some() {
                return Err(SttnError::DuplicateKey(key.to_string()));
            }
        }

        let rows = nodes
            .keyed_rows()
            .map(|(key, row)| {
                let label = by_key.get(key);
                let mut joined = row.values().to_vec();
                joined.extend(
                    carried
                        .iter()
                        .map(|&i| label.map_or(Value::Null, |cells| cells[i].clone())),
                );
                joined
            })
            .collect();

        let table = Table::new(Schema::new(fields)?, rows)?;
        let joined = NodeTable::indexed(table, nodes.geometry_column(), key_name)?;
        Self::from_shared(Arc::new(joined), self.shared_edges(), self.columns().clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================
