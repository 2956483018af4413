//! # sttn-core
//!
//! The spatio-temporal network model.
//!
//! A network is a node table (keys, geometry, attributes) plus an edge table
//! (origin, destination, attributes) whose endpoints reference node keys.
//! Every `NetworkModel` is validated when it is built and never mutated;
//! transformations return new, re-validated models.
//!
//! ## Operations
//!
//! - Aggregation: `agg_parallel_edges`, `agg_adjacent_edges`
//! - Dissolve: `group_nodes`
//! - Filtering: `filter_nodes`, `filter_edges` and their predicate forms
//! - Enrichment: `join_node_labels`, `edges_with_centroids`, `with_distance`
//! - Projection: `to_multigraph`
//! - Persistence: `write`, `read`
//!
//! ## Architectural Constraints
//!
//! - Pure Rust, synchronous, no network dependencies
//! - Deterministic output order (`BTreeMap` for every index and group-by)
//! - Never logs: failures are returned as [`SttnError`]

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod edge_table;
pub mod filter;
pub mod formats;
pub mod geometry;
pub mod grouping;
pub mod io;
pub mod labels;
pub mod network;
pub mod node_table;
pub mod primitives;
pub mod projection;
pub mod reducer;
pub mod spatial;
pub mod table;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{DataType, Geometry, NodeKey, SortKey, SttnError, Value};

// =============================================================================
// RE-EXPORTS: Tables
// =============================================================================

pub use edge_table::EdgeTable;
pub use node_table::NodeTable;
pub use table::{Column, Field, Row, RowView, Schema, TabularRelation, Table};

// =============================================================================
// RE-EXPORTS: Network
// =============================================================================

pub use aggregate::Direction;
pub use grouping::GroupingSpec;
pub use network::{ColumnNames, NetworkModel};
pub use projection::{EdgeAttributes, MultiGraph};
pub use reducer::{ReduceFn, Reducer};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use formats::content_hash;
pub use formats::{PersistenceHeader, model_from_bytes, model_to_bytes};
pub use io::file_paths;
