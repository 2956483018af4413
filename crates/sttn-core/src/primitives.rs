//! # Primitives
//!
//! Fixed constants for the network core: default column names, file layout
//! and error reporting bounds. These are compiled in and immutable at runtime.

// =============================================================================
// DEFAULT COLUMN NAMES
// =============================================================================

/// Default name of the node key column.
pub const DEFAULT_NODE_KEY: &str = "id";

/// Default name of the edge origin column.
pub const DEFAULT_ORIGIN: &str = "origin";

/// Default name of the edge destination column.
pub const DEFAULT_DESTINATION: &str = "destination";

/// Conventional name of the node geometry column.
pub const DEFAULT_GEOMETRY: &str = "geometry";

/// Centroid coordinate columns appended by `edges_with_centroids`.
pub const LONG_FROM: &str = "long_from";
pub const LAT_FROM: &str = "lat_from";
pub const LONG_TO: &str = "long_to";
pub const LAT_TO: &str = "lat_to";

// =============================================================================
// ERROR REPORTING
// =============================================================================

/// Maximum number of offending values listed in a dangling reference error.
///
/// Edge tables can hold millions of rows; the error names a bounded sample
/// and the total count.
pub const DANGLING_SAMPLE_LIMIT: usize = 5;

// =============================================================================
// PERSISTENCE LAYOUT
// =============================================================================

/// Magic bytes for the STTN columnar file header.
///
/// - File Header = Magic Bytes ("STTN") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"STTN";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 2;

/// Suffix appended to a base path for the node table file.
pub const NODES_FILE_SUFFIX: &str = "-nodes.sttn";

/// Suffix appended to a base path for the edge table file.
pub const EDGES_FILE_SUFFIX: &str = "-edges.sttn";

/// Suffix of the sibling a table file is staged in before being renamed.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";
