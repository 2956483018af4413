//! # Core Type Definitions
//!
//! This module contains the cell-level types shared by every table:
//! - Column types (`DataType`) and cell values (`Value`)
//! - Node identifiers (`NodeKey`)
//! - Error types (`SttnError`)
//!
//! ## Ordering Guarantees
//!
//! `NodeKey` implements `Ord` so node indexes and partitions live in
//! `BTreeMap`s. `Value` holds floats and geometries and is therefore only
//! `PartialEq`; grouping goes through [`SortKey`], a totally ordered
//! projection of every groupable value.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Planar geometry attached to every node.
pub type Geometry = geo::Geometry<f64>;

// =============================================================================
// DATA TYPES
// =============================================================================

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    Utf8,
    /// Microseconds since the Unix epoch, UTC.
    Timestamp,
    Geometry,
}

impl DataType {
    /// Whether values of this type can identify a node.
    #[must_use]
    pub const fn is_key_type(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Utf8)
    }

    /// Whether values of this type support arithmetic reducers.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Float64)
    }

    /// Lowercase name used in error messages and CLI output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Utf8 => "utf8",
            Self::Timestamp => "timestamp",
            Self::Geometry => "geometry",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A single table cell.
///
/// Every non-null value must match the `DataType` of its column; tables
/// reject rows that violate this at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    /// Microseconds since the Unix epoch, UTC.
    Timestamp(i64),
    Geometry(Geometry),
}

impl Value {
    /// The type of this value, `None` for `Null`.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(DataType::Boolean),
            Self::Int32(_) => Some(DataType::Int32),
            Self::Int64(_) => Some(DataType::Int64),
            Self::Float64(_) => Some(DataType::Float64),
            Self::Utf8(_) => Some(DataType::Utf8),
            Self::Timestamp(_) => Some(DataType::Timestamp),
            Self::Geometry(_) => Some(DataType::Geometry),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check that this value may be stored in a column of type `expected`.
    #[must_use]
    pub fn conforms_to(&self, expected: DataType) -> bool {
        self.data_type().is_none_or(|actual| actual == expected)
    }

    /// Numeric view used by arithmetic reducers. Booleans count as 0/1.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int32(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view used by integer sums. Booleans count as 0/1.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Boolean(b) => Some(i64::from(*b)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Self::Geometry(g) => Some(g),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Totally ordered projection of this value for grouping and sorting.
    ///
    /// Geometries have no order and are rejected.
    pub fn sort_key(&self) -> Result<SortKey, SttnError> {
        Ok(match self {
            Self::Null => SortKey::Null,
            Self::Boolean(b) => SortKey::Boolean(*b),
            Self::Int32(v) => SortKey::Integer(i64::from(*v)),
            Self::Int64(v) | Self::Timestamp(v) => SortKey::Integer(*v),
            Self::Float64(v) => SortKey::Float(total_order_bits(*v)),
            Self::Utf8(s) => SortKey::Text(s.clone()),
            Self::Geometry(_) => {
                return Err(SttnError::TypeMismatch(
                    "geometry values cannot be grouped or ordered".to_string(),
                ));
            }
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::Utf8(s) => f.write_str(s),
            Self::Timestamp(v) => write!(f, "{}us", v),
            Self::Geometry(g) => write!(f, "{:?}", g),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

impl From<Geometry> for Value {
    fn from(v: Geometry) -> Self {
        Self::Geometry(v)
    }
}

/// Map an `f64` to an `i64` whose integer order equals `f64::total_cmp`.
fn total_order_bits(v: f64) -> i64 {
    let bits = v.to_bits() as i64;
    bits ^ ((((bits >> 63) as u64) >> 1) as i64)
}

/// Totally ordered key derived from a [`Value`].
///
/// Columns are homogeneous, so keys from one column never mix variants
/// except for `Null`, which sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortKey {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(i64),
    Text(String),
}

// =============================================================================
// NODE KEY
// =============================================================================

/// Identifier of a node, referenced by edge origin/destination values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    Int32(i32),
    Int64(i64),
    Utf8(String),
}

impl NodeKey {
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Utf8(_) => DataType::Utf8,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        self.clone().into()
    }
}

impl TryFrom<&Value> for NodeKey {
    type Error = SttnError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int32(v) => Ok(Self::Int32(*v)),
            Value::Int64(v) => Ok(Self::Int64(*v)),
            Value::Utf8(s) => Ok(Self::Utf8(s.clone())),
            Value::Null => Err(SttnError::TypeMismatch(
                "null cannot be used as a node key".to_string(),
            )),
            other => Err(SttnError::TypeMismatch(format!(
                "{} values cannot be used as node keys",
                other.data_type().map_or("null", DataType::name)
            ))),
        }
    }
}

impl From<NodeKey> for Value {
    fn from(key: NodeKey) -> Self {
        match key {
            NodeKey::Int32(v) => Self::Int32(v),
            NodeKey::Int64(v) => Self::Int64(v),
            NodeKey::Utf8(s) => Self::Utf8(s),
        }
    }
}

impl From<i32> for NodeKey {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for NodeKey {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<&str> for NodeKey {
    fn from(v: &str) -> Self {
        Self::Utf8(v.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Utf8(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the network core.
///
/// - No silent failures
/// - Use `Result<T, SttnError>` for fallible operations
/// - The core never panics and never logs; callers present errors
#[derive(Debug, Error)]
pub enum SttnError {
    /// Wrong container kind or incompatible value types.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// A named column is absent from a relation.
    #[error("Column '{column}' not found in {relation}")]
    MissingColumn {
        relation: &'static str,
        column: String,
    },

    /// The node table is keyed under a different name.
    #[error("Node table is indexed by '{found}', expected '{expected}'")]
    IndexMismatch { expected: String, found: String },

    /// The node table has no key column.
    #[error("Node table is not indexed; call set_index first")]
    NotIndexed,

    /// Edge endpoints reference keys absent from the node table.
    #[error(
        "{missing} value(s) in edge column '{column}' are not node keys, e.g. [{}]",
        .sample.join(", ")
    )]
    DanglingReference {
        column: String,
        missing: usize,
        sample: Vec<String>,
    },

    /// A mask or row does not match the length of its table.
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// A key appears more than once where it must be unique.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A column name appears more than once in a schema.
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A reducer name could not be parsed.
    #[error("Unknown reducer: {0}")]
    UnknownReducer(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_sort_keys_follow_total_order() {
        let values = [-3.5, -0.0, 0.0, 1.25, f64::INFINITY];
        let keys: Vec<_> = values
            .iter()
            .map(|v| Value::Float64(*v).sort_key().expect("key"))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn null_sorts_before_everything() {
        let null = Value::Null.sort_key().expect("key");
        let one = Value::Int64(i64::MIN).sort_key().expect("key");
        assert!(null < one);
    }

    #[test]
    fn geometry_has_no_sort_key() {
        let point = Value::Geometry(geo::Point::new(1.0, 2.0).into());
        assert!(matches!(point.sort_key(), Err(SttnError::TypeMismatch(_))));
    }

    #[test]
    fn node_key_conversion_rejects_floats_and_nulls() {
        assert!(NodeKey::try_from(&Value::Float64(1.0)).is_err());
        assert!(NodeKey::try_from(&Value::Null).is_err());
        assert_eq!(
            NodeKey::try_from(&Value::Int32(7)).expect("key"),
            NodeKey::Int32(7)
        );
    }

    #[test]
    fn value_conformance_allows_null() {
        assert!(Value::Null.conforms_to(DataType::Int64));
        assert!(Value::Int64(1).conforms_to(DataType::Int64));
        assert!(!Value::Int32(1).conforms_to(DataType::Int64));
    }

    #[test]
    fn dangling_reference_message_lists_sample() {
        let err = SttnError::DanglingReference {
            column: "destination".to_string(),
            missing: 2,
            sample: vec!["3".to_string(), "4".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "2 value(s) in edge column 'destination' are not node keys, e.g. [3, 4]"
        );
    }
}
