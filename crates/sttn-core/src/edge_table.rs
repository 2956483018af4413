//! # Edge Table
//!
//! Ordered edge rows. Which columns hold the origin and destination is a
//! property of the `NetworkModel`, not of the table.

use crate::table::{Row, Schema, TabularRelation, Table, masked_rows};
use crate::SttnError;

/// Ordered sequence of edge rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeTable(Table);

impl EdgeTable {
    #[must_use]
    pub fn new(table: Table) -> Self {
        Self(table)
    }

    #[must_use]
    pub fn as_table(&self) -> &Table {
        &self.0
    }

    #[must_use]
    pub fn into_table(self) -> Table {
        self.0
    }
}

impl From<Table> for EdgeTable {
    fn from(table: Table) -> Self {
        Self(table)
    }
}

impl TabularRelation for EdgeTable {
    const KIND: &'static str = "edge table";

    fn schema(&self) -> &Schema {
        self.0.schema()
    }

    fn rows(&self) -> &[Row] {
        self.0.rows()
    }

    fn mask(&self, mask: &[bool]) -> Result<Self, SttnError> {
        let rows = masked_rows(self.0.rows(), mask)?;
        Ok(Self(Table::new(self.0.schema().clone(), rows)?))
    }
}
