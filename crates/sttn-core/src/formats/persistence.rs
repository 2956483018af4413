//! # Persistence Format
//!
//! Binary encoding of a network as two self-describing columnar tables.
//!
//! File I/O lives in `crate::io`; this module is a pure byte codec.
//!
//! Layout of each table file:
//! ```text
//! [magic "STTN" (4)] [version (1)] [header_len u32 LE (4)] [checksum u64 LE (8)]
//! [TableHeader (postcard)] [Vec<ColumnData> (postcard)]
//! ```
//!
//! ## Validation
//!
//! Before anything is decoded the reader checks, in order: minimum size,
//! maximum payload size (`MAX_PERSISTENCE_PAYLOAD_SIZE`), magic bytes,
//! version, header length, and the FNV-1a checksum over header and column
//! sections together. After decoding it checks column count, column types
//! and that every column holds the declared row count. Rows are allocated
//! only from decoded columns, never from the header count alone.

use crate::network::{ColumnNames, NetworkModel};
use crate::table::{Field, Row, Schema, TabularRelation, Table};
use crate::{DataType, Geometry, NodeTable, SttnError, Value, primitives};
use serde::{Deserialize, Serialize};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted size of one encoded table (500 MB).
///
/// Checked before deserialization so corrupted length prefixes cannot
/// trigger huge allocations.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024;

/// Magic + version.
const PREFIX_SIZE: usize = 5;

/// Magic + version + header length + checksum.
const MIN_FILE_SIZE: usize = PREFIX_SIZE + 4 + 8;

// =============================================================================
// FILE PREFIX
// =============================================================================

/// Fixed prefix of every table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Prefix for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), SttnError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(SttnError::Deserialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(SttnError::Deserialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; PREFIX_SIZE] {
        let mut bytes = [0u8; PREFIX_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SttnError> {
        let Some(prefix) = bytes.get(..PREFIX_SIZE) else {
            return Err(SttnError::Deserialization("Header too short".to_string()));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&prefix[0..4]);
        Ok(Self {
            magic,
            version: prefix[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TABLE HEADER
// =============================================================================

/// Role-specific metadata of a persisted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableMetadata {
    Nodes { index: String, geometry: String },
    Edges { origin: String, destination: String },
}

/// Self-describing header of a persisted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableHeader {
    pub metadata: TableMetadata,
    pub fields: Vec<Field>,
    pub row_count: u64,
}

// =============================================================================
// COLUMN DATA
// =============================================================================

/// One column of cells, typed by variant. `None` is a null cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Boolean(Vec<Option<bool>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
    Timestamp(Vec<Option<i64>>),
    Geometry(Vec<Option<Geometry>>),
}

impl ColumnData {
    /// Encode the cells of column `index` of `rows`, declared as `data_type`.
    fn encode(data_type: DataType, rows: &[Row], index: usize) -> Result<Self, SttnError> {
        let cells = rows.iter().map(|row| &row[index]);
        Ok(match data_type {
            DataType::Boolean => Self::Boolean(collect_cells(cells, |v| match v {
                Value::Boolean(b) => Some(*b),
                _ => None,
            })?),
            DataType::Int32 => Self::Int32(collect_cells(cells, |v| match v {
                Value::Int32(i) => Some(*i),
                _ => None,
            })?),
            DataType::Int64 => Self::Int64(collect_cells(cells, |v| match v {
                Value::Int64(i) => Some(*i),
                _ => None,
            })?),
            DataType::Float64 => Self::Float64(collect_cells(cells, |v| match v {
                Value::Float64(f) => Some(*f),
                _ => None,
            })?),
            DataType::Utf8 => Self::Utf8(collect_cells(cells, |v| v.as_str().map(String::from))?),
            DataType::Timestamp => Self::Timestamp(collect_cells(cells, |v| match v {
                Value::Timestamp(t) => Some(*t),
                _ => None,
            })?),
            DataType::Geometry => {
                Self::Geometry(collect_cells(cells, |v| v.as_geometry().cloned())?)
            }
        })
    }

    fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
            Self::Timestamp(_) => DataType::Timestamp,
            Self::Geometry(_) => DataType::Geometry,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Boolean(c) => c.len(),
            Self::Int32(c) => c.len(),
            Self::Int64(c) | Self::Timestamp(c) => c.len(),
            Self::Float64(c) => c.len(),
            Self::Utf8(c) => c.len(),
            Self::Geometry(c) => c.len(),
        }
    }

    fn into_values(self) -> Vec<Value> {
        fn lift<T>(cells: Vec<Option<T>>, wrap: impl Fn(T) -> Value) -> Vec<Value> {
            cells
                .into_iter()
                .map(|cell| cell.map_or(Value::Null, &wrap))
                .collect()
        }
        match self {
            Self::Boolean(c) => lift(c, Value::Boolean),
            Self::Int32(c) => lift(c, Value::Int32),
            Self::Int64(c) => lift(c, Value::Int64),
            Self::Float64(c) => lift(c, Value::Float64),
            Self::Utf8(c) => lift(c, Value::Utf8),
            Self::Timestamp(c) => lift(c, Value::Timestamp),
            Self::Geometry(c) => lift(c, Value::Geometry),
        }
    }
}

/// Convert cells with `extract`, keeping nulls as `None`.
fn collect_cells<'a, T>(
    cells: impl Iterator<Item = &'a Value>,
    extract: impl Fn(&'a Value) -> Option<T>,
) -> Result<Vec<Option<T>>, SttnError> {
    cells
        .map(|cell| {
            if cell.is_null() {
                return Ok(None);
            }
            extract(cell).map(Some).ok_or_else(|| {
                SttnError::Serialization(format!("cell {} does not match its column type", cell))
            })
        })
        .collect()
}

/// FNV-1a 64-bit hash.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

// =============================================================================
// TABLE CODEC
// =============================================================================

/// Encode one table with its role metadata.
pub fn table_to_bytes(metadata: TableMetadata, table: &Table) -> Result<Vec<u8>, SttnError> {
    let columns = table
        .schema()
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| ColumnData::encode(field.data_type, table.rows(), index))
        .collect::<Result<Vec<_>, _>>()?;

    let data_bytes = postcard::to_allocvec(&columns)
        .map_err(|e| SttnError::Serialization(format!("Columns: {}", e)))?;

    let header = TableHeader {
        metadata,
        fields: table.schema().fields().to_vec(),
        row_count: table.num_rows() as u64,
    };
    frame(&header, &data_bytes)
}

/// Assemble prefix, header and column section into one file image.
fn frame(header: &TableHeader, data_bytes: &[u8]) -> Result<Vec<u8>, SttnError> {
    let header_bytes = postcard::to_allocvec(header)
        .map_err(|e| SttnError::Serialization(format!("Header: {}", e)))?;
    let header_len = u32::try_from(header_bytes.len())
        .map_err(|_| SttnError::Serialization("Header too large".to_string()))?;

    let mut body = Vec::with_capacity(header_bytes.len() + data_bytes.len());
    body.extend_from_slice(&header_bytes);
    body.extend_from_slice(data_bytes);

    let mut result = Vec::with_capacity(MIN_FILE_SIZE + body.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&header_len.to_le_bytes());
    result.extend_from_slice(&checksum(&body).to_le_bytes());
    result.extend_from_slice(&body);
    Ok(result)
}

/// Decode one table and its metadata.
pub fn table_from_bytes(bytes: &[u8]) -> Result<(TableMetadata, Table), SttnError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(SttnError::Deserialization(format!(
            "Data too short: minimum {} bytes required",
            MIN_FILE_SIZE
        )));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(SttnError::Deserialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    PersistenceHeader::from_bytes(bytes)?.validate()?;

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[PREFIX_SIZE..PREFIX_SIZE + 4]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let mut sum_bytes = [0u8; 8];
    sum_bytes.copy_from_slice(&bytes[PREFIX_SIZE + 4..MIN_FILE_SIZE]);
    let stored = u64::from_le_bytes(sum_bytes);

    let body = &bytes[MIN_FILE_SIZE..];
    if header_len > body.len() {
        return Err(SttnError::Deserialization(
            "Data too short for header".to_string(),
        ));
    }
    let computed = checksum(body);
    if computed != stored {
        return Err(SttnError::Deserialization(format!(
            "Checksum mismatch: expected {}, got {}",
            stored, computed
        )));
    }

    let (header_bytes, data_bytes) = body.split_at(header_len);
    let header: TableHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| SttnError::Deserialization(format!("Header: {}", e)))?;

    let columns: Vec<ColumnData> = postcard::from_bytes(data_bytes)
        .map_err(|e| SttnError::Deserialization(format!("Columns: {}", e)))?;
    if columns.len() != header.fields.len() {
        return Err(SttnError::Deserialization(format!(
            "Column count mismatch: header declares {}, found {}",
            header.fields.len(),
            columns.len()
        )));
    }

    for (field, column) in header.fields.iter().zip(&columns) {
        if column.data_type() != field.data_type {
            return Err(SttnError::Deserialization(format!(
                "Column '{}' declared {} but encoded as {}",
                field.name,
                field.data_type,
                column.data_type()
            )));
        }
        if column.len() as u64 != header.row_count {
            return Err(SttnError::Deserialization(format!(
                "Column '{}' has {} rows, header declares {}",
                field.name,
                column.len(),
                header.row_count
            )));
        }
    }
    if columns.is_empty() && header.row_count != 0 {
        return Err(SttnError::Deserialization(format!(
            "Header declares {} rows but no columns",
            header.row_count
        )));
    }

    let row_count = columns.first().map_or(0, ColumnData::len);
    let mut rows: Vec<Row> = (0..row_count)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column.into_values()) {
            row.push(value);
        }
    }

    let table = Table::new(Schema::new(header.fields)?, rows)?;
    Ok((header.metadata, table))
}

// =============================================================================
// NETWORK CODEC
// =============================================================================

/// Encode a network as `(node bytes, edge bytes)`.
pub fn model_to_bytes(model: &NetworkModel) -> Result<(Vec<u8>, Vec<u8>), SttnError> {
    let nodes = table_to_bytes(
        TableMetadata::Nodes {
            index: model.node_key_name().to_string(),
            geometry: model.nodes().geometry_column().to_string(),
        },
        model.nodes().as_table(),
    )?;
    let edges = table_to_bytes(
        TableMetadata::Edges {
            origin: model.origin_column().to_string(),
            destination: model.destination_column().to_string(),
        },
        model.edges().as_table(),
    )?;
    Ok((nodes, edges))
}

/// Decode a network and validate it as a fresh construction would.
pub fn model_from_bytes(nodes: &[u8], edges: &[u8]) -> Result<NetworkModel, SttnError> {
    let (TableMetadata::Nodes { index, geometry }, node_table) = table_from_bytes(nodes)? else {
        return Err(SttnError::Deserialization(
            "Expected a node table file".to_string(),
        ));
    };
    let (TableMetadata::Edges {
        origin,
        destination,
    }, edge_table) = table_from_bytes(edges)?
    else {
        return Err(SttnError::Deserialization(
            "Expected an edge table file".to_string(),
        ));
    };

    let nodes = NodeTable::indexed(node_table, &geometry, &index)?;
    NetworkModel::with_columns(nodes, edge_table, ColumnNames::new(index, origin, destination))
}

/// BLAKE3 hash of the encoded network, as lowercase hex.
///
/// Covers both tables, nodes first. Equal models hash equally because the
/// encoding is deterministic.
#[cfg(feature = "crypto-hash")]
pub fn content_hash(model: &NetworkModel) -> Result<String, SttnError> {
    let (nodes, edges) = model_to_bytes(model)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(&nodes);
    hasher.update(&edges);
    Ok(hasher.finalize().to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
