//! # Tabular Relations
//!
//! Typed, schema-checked tables underlying the network model.
//!
//! The `TabularRelation` trait is the contract every container honours:
//! schema access, typed column access, row views and boolean masking.
//! `Table` is the generic implementation and also carries the relational
//! operations the transformations are built from (group-by/aggregate,
//! column rename, column append).
//!
//! Row order is preserved by every operation except `group_by`, which emits
//! groups in ascending key order so identical input always yields identical
//! output.

use crate::reducer::Reducer;
use crate::{DataType, SortKey, SttnError, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One table row, aligned with its table's schema.
pub type Row = Vec<Value>;

// =============================================================================
// SCHEMA
// =============================================================================

/// A named, typed column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create a schema, rejecting duplicate column names.
    pub fn new(fields: Vec<Field>) -> Result<Self, SttnError> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SttnError::DuplicateColumn(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the named column.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Position of the named column, or `MissingColumn` naming `relation`.
    pub(crate) fn require(&self, name: &str, relation: &'static str) -> Result<usize, SttnError> {
        self.index_of(name).ok_or_else(|| SttnError::MissingColumn {
            relation,
            column: name.to_string(),
        })
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// Read-only view over one column of a relation.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    field: &'a Field,
    index: usize,
    rows: &'a [Row],
}

impl<'a> Column<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.field.name
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.field.data_type
    }

    /// Position of this column in its schema.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&'a Value> {
        self.rows.get(position).map(|row| &row[self.index])
    }

    pub fn iter(self) -> impl Iterator<Item = &'a Value> + 'a {
        let index = self.index;
        self.rows.iter().map(move |row| &row[index])
    }
}

/// Read-only view over one row of a relation.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    schema: &'a Schema,
    row: &'a Row,
}

impl<'a> RowView<'a> {
    /// Value of the named column, `None` if the column does not exist.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.schema.index_of(name).map(|i| &self.row[i])
    }

    #[must_use]
    pub fn values(&self) -> &'a [Value] {
        self.row
    }

    #[must_use]
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }
}

// =============================================================================
// TABULAR RELATION TRAIT
// =============================================================================

/// Contract shared by every table container.
///
/// Implementors guarantee that every row has exactly `schema().len()` cells
/// and that every non-null cell matches its field's `DataType`.
pub trait TabularRelation {
    /// Relation kind used in error messages.
    const KIND: &'static str;

    fn schema(&self) -> &Schema;

    fn rows(&self) -> &[Row];

    fn num_rows(&self) -> usize {
        self.rows().len()
    }

    fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Typed access to the named column.
    fn column(&self, name: &str) -> Result<Column<'_>, SttnError> {
        let schema = self.schema();
        let index = schema.require(name, Self::KIND)?;
        Ok(Column {
            field: &schema.fields()[index],
            index,
            rows: self.rows(),
        })
    }

    fn row(&self, position: usize) -> Option<RowView<'_>> {
        let schema = self.schema();
        self.rows().get(position).map(|row| RowView { schema, row })
    }

    /// Rows in table order.
    fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        let schema = self.schema();
        self.rows().iter().map(move |row| RowView { schema, row })
    }

    /// Keep the rows whose mask entry is `true`.
    ///
    /// The mask must have exactly one entry per row.
    fn mask(&self, mask: &[bool]) -> Result<Self, SttnError>
    where
        Self: Sized;
}

/// Apply a boolean mask to a row slice.
pub(crate) fn masked_rows(rows: &[Row], mask: &[bool]) -> Result<Vec<Row>, SttnError> {
    if mask.len() != rows.len() {
        return Err(SttnError::ShapeMismatch {
            expected: rows.len(),
            found: mask.len(),
        });
    }
    Ok(rows
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|(row, _)| row.clone())
        .collect())
}

// =============================================================================
// TABLE
// =============================================================================

/// A generic schema-checked table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    /// Create a table, checking row width and cell types.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self, SttnError> {
        for row in &rows {
            if row.len() != schema.len() {
                return Err(SttnError::ShapeMismatch {
                    expected: schema.len(),
                    found: row.len(),
                });
            }
            for (value, field) in row.iter().zip(schema.fields()) {
                if !value.conforms_to(field.data_type) {
                    return Err(SttnError::TypeMismatch(format!(
                        "column '{}' expects {}, found {}",
                        field.name,
                        field.data_type,
                        value.data_type().map_or("null", DataType::name)
                    )));
                }
            }
        }
        Ok(Self { schema, rows })
    }

    /// Create a table with no rows.
    #[must_use]
    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Create a table from `(name, type, values)` column triples.
    ///
    /// All columns must have the same length.
    pub fn from_columns<N: Into<String>>(
        columns: Vec<(N, DataType, Vec<Value>)>,
    ) -> Result<Self, SttnError> {
        let height = columns.first().map_or(0, |(_, _, values)| values.len());
        let mut fields = Vec::with_capacity(columns.len());
        let mut rows: Vec<Row> = (0..height)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();

        for (name, data_type, values) in columns {
            if values.len() != height {
                return Err(SttnError::ShapeMismatch {
                    expected: height,
                    found: values.len(),
                });
            }
            fields.push(Field::new(name, data_type));
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }

        Self::new(Schema::new(fields)?, rows)
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Keep the rows matching `predicate`, in table order.
    #[must_use]
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(RowView<'_>) -> bool,
    {
        let schema = &self.schema;
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(RowView { schema, row }))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Rename a column. Renaming onto an existing other column fails.
    pub fn rename_column(self, from: &str, to: &str) -> Result<Self, SttnError> {
        let index = self.schema.require(from, Self::KIND)?;
        if from == to {
            return Ok(self);
        }
        let mut fields = self.schema.fields;
        fields[index].name = to.to_string();
        Ok(Self {
            schema: Schema::new(fields)?,
            rows: self.rows,
        })
    }

    /// Append a column. `values` must hold one value per row.
    pub fn with_column(self, field: Field, values: Vec<Value>) -> Result<Self, SttnError> {
        if values.len() != self.rows.len() {
            return Err(SttnError::ShapeMismatch {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        let mut fields = self.schema.fields;
        fields.push(field);
        let mut rows = self.rows;
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value);
        }
        Self::new(Schema::new(fields)?, rows)
    }

    /// Group rows by `keys` and reduce the named columns.
    ///
    /// Output columns are the key columns followed by one column per reducer,
    /// in the order given. Groups are emitted in ascending key order; null
    /// key values form their own group and sort first. Within a group,
    /// values reach the reducer in table order.
    pub fn group_by<S: AsRef<str>>(
        &self,
        keys: &[&str],
        reducers: &[(S, Reducer)],
    ) -> Result<Self, SttnError> {
        let key_indices = keys
            .iter()
            .map(|key| self.schema.require(key, Self::KIND))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fields: Vec<Field> = key_indices
            .iter()
            .map(|&i| self.schema.fields[i].clone())
            .collect();
        let mut targets = Vec::with_capacity(reducers.len());
        for (column, reducer) in reducers {
            let column = column.as_ref();
            let index = self.schema.require(column, Self::KIND)?;
            let input = self.schema.fields[index].data_type;
            fields.push(Field::new(column, reducer.output_type(input)?));
            targets.push((index, input, reducer));
        }
        let schema = Schema::new(fields)?;

        let mut groups: BTreeMap<Vec<SortKey>, Vec<usize>> = BTreeMap::new();
        for (position, row) in self.rows.iter().enumerate() {
            let key = key_indices
                .iter()
                .map(|&i| row[i].sort_key())
                .collect::<Result<Vec<_>, _>>()?;
            groups.entry(key).or_default().push(position);
        }

        let mut rows = Vec::with_capacity(groups.len());
        for positions in groups.values() {
            let Some(&head) = positions.first() else {
                continue;
            };
            let mut out: Row = key_indices
                .iter()
                .map(|&i| self.rows[head][i].clone())
                .collect();
            for &(index, input, reducer) in &targets {
                let values: Vec<&Value> = positions.iter().map(|&p| &self.rows[p][index]).collect();
                out.push(reducer.reduce(input, &values)?);
            }
            rows.push(out);
        }

        Self::new(schema, rows)
    }
}

impl TabularRelation for Table {
    const KIND: &'static str = "table";

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn mask(&self, mask: &[bool]) -> Result<Self, SttnError> {
        Ok(Self {
            schema: self.schema.clone(),
            rows: masked_rows(&self.rows, mask)?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
