//! # Formats
//!
//! Byte-level encodings of the network. Pure transformations, no I/O.

pub mod persistence;

#[cfg(feature = "crypto-hash")]
pub use persistence::content_hash;
pub use persistence::{
    ColumnData, MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, TableHeader, TableMetadata,
    checksum, model_from_bytes, model_to_bytes, table_from_bytes, table_to_bytes,
};
