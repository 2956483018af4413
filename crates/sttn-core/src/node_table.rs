//! # Node Table
//!
//! A table of nodes with a required geometry column and, once indexed, a
//! unique key column.
//!
//! Building a `NodeTable` from a relation without a geometry column fails
//! with `TypeMismatch`: such a relation is not a node table at all. An
//! unindexed node table is a valid container but is rejected by
//! `NetworkModel` construction with `NotIndexed`.

use crate::table::{Column, Row, RowView, Schema, TabularRelation, Table, masked_rows};
use crate::{DataType, Geometry, NodeKey, SttnError};
use std::collections::BTreeMap;

/// Key index over the rows of a node table.
#[derive(Debug, Clone, PartialEq)]
struct NodeIndex {
    name: String,
    data_type: DataType,
    /// Keys in row order.
    keys: Vec<NodeKey>,
    /// Key -> row position.
    positions: BTreeMap<NodeKey, usize>,
}

/// Node rows with geometry, optionally indexed by a unique key column.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTable {
    table: Table,
    geometry: String,
    geometry_column: usize,
    index: Option<NodeIndex>,
}

impl NodeTable {
    /// Wrap `table` as an unindexed node table.
    ///
    /// `geometry_column` must exist, be typed `Geometry`, and hold no nulls.
    pub fn new(table: Table, geometry_column: &str) -> Result<Self, SttnError> {
        let Some(position) = table.schema().index_of(geometry_column) else {
            return Err(SttnError::TypeMismatch(format!(
                "relation has no geometry column '{}' and is not a node table",
                geometry_column
            )));
        };
        let data_type = table.schema().fields()[position].data_type;
        if data_type != DataType::Geometry {
            return Err(SttnError::TypeMismatch(format!(
                "geometry column '{}' has type {}",
                geometry_column, data_type
            )));
        }
        if let Some(row) = table.rows().iter().position(|row| row[position].is_null()) {
            return Err(SttnError::TypeMismatch(format!(
                "node row {} has a null geometry",
                row
            )));
        }

        Ok(Self {
            table,
            geometry: geometry_column.to_string(),
            geometry_column: position,
            index: None,
        })
    }

    /// Wrap `table` and index it by `key_column` in one step.
    pub fn indexed(table: Table, geometry_column: &str, key_column: &str) -> Result<Self, SttnError> {
        Self::new(table, geometry_column)?.set_index(key_column)
    }

    /// Index the table by `column`, which must hold unique non-null keys of
    /// an integer or string type.
    pub fn set_index(self, column: &str) -> Result<Self, SttnError> {
        let position = self.table.schema().require(column, Self::KIND)?;
        let data_type = self.table.schema().fields()[position].data_type;
        if !data_type.is_key_type() {
            return Err(SttnError::TypeMismatch(format!(
                "column '{}' of type {} cannot index a node table",
                column, data_type
            )));
        }

        let mut keys = Vec::with_capacity(self.table.num_rows());
        let mut positions = BTreeMap::new();
        for (row, values) in self.table.rows().iter().enumerate() {
            let key = NodeKey::try_from(&values[position])?;
            if positions.insert(key.clone(), row).is_some() {
                return Err(SttnError::DuplicateKey(key.to_string()));
            }
            keys.push(key);
        }

        Ok(Self {
            index: Some(NodeIndex {
                name: column.to_string(),
                data_type,
                keys,
                positions,
            }),
            ..self
        })
    }

    /// Name of the key column, `None` if unindexed.
    #[must_use]
    pub fn index_name(&self) -> Option<&str> {
        self.index.as_ref().map(|i| i.name.as_str())
    }

    /// Type of the key column, `None` if unindexed.
    #[must_use]
    pub fn key_type(&self) -> Option<DataType> {
        self.index.as_ref().map(|i| i.data_type)
    }

    /// Key column view, `None` if unindexed.
    #[must_use]
    pub fn key_column(&self) -> Option<Column<'_>> {
        let index = self.index.as_ref()?;
        self.column(&index.name).ok()
    }

    #[must_use]
    pub fn geometry_column(&self) -> &str {
        &self.geometry
    }

    #[must_use]
    pub fn contains_key(&self, key: &NodeKey) -> bool {
        self.index
            .as_ref()
            .is_some_and(|i| i.positions.contains_key(key))
    }

    /// Row for `key`.
    #[must_use]
    pub fn get(&self, key: &NodeKey) -> Option<RowView<'_>> {
        let position = *self.index.as_ref()?.positions.get(key)?;
        self.row(position)
    }

    /// Geometry of the node with `key`.
    #[must_use]
    pub fn geometry(&self, key: &NodeKey) -> Option<&Geometry> {
        let position = *self.index.as_ref()?.positions.get(key)?;
        self.table.rows()[position][self.geometry_column].as_geometry()
    }

    /// Keys in row order. Empty when unindexed.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.index.iter().flat_map(|i| i.keys.iter())
    }

    /// `(key, row)` pairs in row order. Empty when unindexed.
    pub fn keyed_rows(&self) -> impl Iterator<Item = (&NodeKey, RowView<'_>)> {
        self.keys().zip(self.iter_rows())
    }

    /// Geometry stored in `row`, which must come from this table.
    pub(crate) fn row_geometry<'a>(&self, row: RowView<'a>) -> Result<&'a Geometry, SttnError> {
        row.values()[self.geometry_column].as_geometry().ok_or_else(|| {
            SttnError::TypeMismatch(format!("column '{}' holds a non-geometry value", self.geometry))
        })
    }

    #[must_use]
    pub fn as_table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn into_table(self) -> Table {
        self.table
    }
}

impl TabularRelation for NodeTable {
    const KIND: &'static str = "node table";

    fn schema(&self) -> &Schema {
        self.table.schema()
    }

    fn rows(&self) -> &[Row] {
        self.table.rows()
    }

    fn mask(&self, mask: &[bool]) -> Result<Self, SttnError> {
        let rows = masked_rows(self.table.rows(), mask)?;
        let table = Table::new(self.table.schema().clone(), rows)?;
        let nodes = Self::new(table, &self.geometry)?;
        match &self.index {
            Some(index) => nodes.set_index(&index.name),
            None => Ok(nodes),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
