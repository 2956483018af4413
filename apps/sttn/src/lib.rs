//! # sttn
//!
//! Command-line operator tool over persisted spatio-temporal networks.
//! The network semantics live in `sttn-core`; this crate parses arguments,
//! loads configuration, logs and prints.

pub mod cli;
pub mod config;
