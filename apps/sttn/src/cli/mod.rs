//! # sttn CLI Module
//!
//! ## Available Commands
//!
//! - `info` - Show shape, column names and schemas
//! - `aggregate` - Merge parallel edges
//! - `rollup` - Aggregate edges per node
//! - `group` - Dissolve nodes by a label column
//! - `filter-edges` - Keep edges whose column equals a value
//! - `distance` - Append endpoint distances in kilometres
//! - `graph` - Summarize the multigraph projection
//! - `hash` - Compute BLAKE3 content hash of the network

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sttn_core::{Direction, Reducer, SttnError};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// sttn - spatio-temporal network tool
///
/// Reads a network persisted as `<BASE>-nodes.sttn` and `<BASE>-edges.sttn`,
/// applies one transformation and prints or writes the result.
#[derive(Parser, Debug)]
#[command(name = "sttn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base path of the persisted network
    #[arg(short = 'n', long, global = true, default_value = "network")]
    pub network: PathBuf,

    /// Path to a TOML config file (defaults to ./sttn.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show shape, column names and schemas
    Info,

    /// Merge parallel edges sharing origin and destination
    Aggregate {
        /// Column to reduce, optionally `column=reducer` (repeatable)
        #[arg(short, long = "reduce", required = true)]
        reduce: Vec<String>,

        /// Extra edge column that splits parallel groups
        #[arg(short, long)]
        key: Option<String>,

        /// Base path for the aggregated network
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate edges onto their origin (or destination) node
    Rollup {
        /// Column to reduce, optionally `column=reducer` (repeatable)
        #[arg(short, long = "reduce", required = true)]
        reduce: Vec<String>,

        /// Group on destination instead of origin
        #[arg(long)]
        incoming: bool,

        /// Keep self-loops, overriding `include_cycles = false` in the config
        #[arg(long, conflicts_with = "exclude_cycles")]
        include_cycles: bool,

        /// Drop self-loops before aggregating
        #[arg(long)]
        exclude_cycles: bool,
    },

    /// Dissolve nodes sharing a label column
    Group {
        /// Node column holding the group label
        #[arg(short, long)]
        column: String,

        /// Base path for the grouped network
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keep only edges whose column equals a value
    FilterEdges {
        /// Edge column to compare
        #[arg(short, long)]
        column: String,

        /// Value to match, compared in its text form
        #[arg(short, long)]
        equals: String,

        /// Base path for the filtered network
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Append the haversine distance between endpoint centroids
    Distance {
        /// Name of the new column (defaults to the configured distance column)
        #[arg(short, long)]
        column: Option<String>,

        /// Base path for the enriched network
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize the multigraph projection
    Graph,

    /// Compute BLAKE3 content hash of the network
    Hash,
}

// =============================================================================
// ARGUMENT HELPERS
// =============================================================================

/// Parse `column` or `column=reducer`.
///
/// A bare column takes `default_reducer`.
pub fn parse_reducer_spec(
    spec: &str,
    default_reducer: &str,
) -> Result<(String, Reducer), SttnError> {
    let (column, reducer) = match spec.split_once('=') {
        Some((column, reducer)) => (column.trim(), reducer),
        None => (spec.trim(), default_reducer),
    };
    if column.is_empty() {
        return Err(SttnError::MissingColumn {
            relation: "reducer spec",
            column: spec.to_string(),
        });
    }
    Ok((column.to_string(), reducer.parse()?))
}

fn parse_reducer_specs(
    specs: &[String],
    default_reducer: &str,
) -> Result<Vec<(String, Reducer)>, SttnError> {
    specs
        .iter()
        .map(|spec| parse_reducer_spec(spec, default_reducer))
        .collect()
}

/// Self-loop handling for `rollup`: an explicit flag wins over the config.
pub fn resolve_include_cycles(include: bool, exclude: bool, configured: bool) -> bool {
    match (include, exclude) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), SttnError> {
    let config = Config::load(cli.config.as_deref())?;
    let defaults = &config.defaults;
    let network = cli.network.as_path();
    let json_mode = cli.json;

    match cli.command {
        Some(Commands::Info) | None => cmd_info(network, json_mode),
        Some(Commands::Aggregate {
            reduce,
            key,
            output,
        }) => {
            let reducers = parse_reducer_specs(&reduce, &defaults.reducer)?;
            cmd_aggregate(
                network,
                json_mode,
                &reducers,
                key.as_deref(),
                output.as_deref(),
            )
        }
        Some(Commands::Rollup {
            reduce,
            incoming,
            include_cycles,
            exclude_cycles,
        }) => {
            let reducers = parse_reducer_specs(&reduce, &defaults.reducer)?;
            let direction = if incoming {
                Direction::Incoming
            } else {
                Direction::Outgoing
            };
            let include_cycles =
                resolve_include_cycles(include_cycles, exclude_cycles, defaults.include_cycles);
            cmd_rollup(network, json_mode, &reducers, direction, include_cycles)
        }
        Some(Commands::Group { column, output }) => {
            cmd_group(network, json_mode, &column, output.as_deref())
        }
        Some(Commands::FilterEdges {
            column,
            equals,
            output,
        }) => cmd_filter_edges(network, json_mode, &column, &equals, output.as_deref()),
        Some(Commands::Distance { column, output }) => {
            let column = column.unwrap_or_else(|| defaults.distance_column.clone());
            cmd_distance(network, json_mode, &column, output.as_deref())
        }
        Some(Commands::Graph) => cmd_graph(network, json_mode),
        Some(Commands::Hash) => cmd_hash(network, json_mode),
    }
}
