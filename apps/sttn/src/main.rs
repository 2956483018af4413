//! # sttn
//!
//! Command-line tool over persisted spatio-temporal networks.
//!
//! ## Usage
//!
//! ```bash
//! # Inspect a network stored as trips-nodes.sttn / trips-edges.sttn
//! sttn --network trips info
//!
//! # Merge parallel edges, summing `count` and averaging `duration`
//! sttn -n trips aggregate -r count -r duration=mean -o trips-merged
//!
//! # Outgoing totals per node, without self-loops
//! sttn -n trips rollup -r count --exclude-cycles
//! ```
//!
//! Logging goes to stderr via `tracing`; `RUST_LOG` overrides the filter and
//! `STTN_LOG_FORMAT=json` switches to JSON lines.

use clap::Parser;
use sttn::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    let log_format = std::env::var("STTN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose { "sttn=debug" } else { "sttn=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
