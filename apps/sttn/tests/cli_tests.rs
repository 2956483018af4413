//! # CLI Tests
//!
//! Argument parsing, config resolution and end-to-end command runs against
//! networks written to a temp directory.

#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use geo::Point;
use std::path::{Path, PathBuf};
use sttn::cli::{Cli, Commands, execute, parse_reducer_spec, resolve_include_cycles};
use sttn::config::Config;
use sttn_core::{
    DataType, NetworkModel, NodeKey, NodeTable, Reducer, SttnError, TabularRelation, Table, Value,
};

// =============================================================================
// FIXTURES
// =============================================================================

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| Value::Int64(v)).collect()
}

/// Three stops on the equator, four trips with two parallel 1->2 edges.
fn write_network(dir: &Path) -> PathBuf {
    let nodes = Table::from_columns(vec![
        ("id", DataType::Int64, ints(&[1, 2, 3])),
        (
            "geometry",
            DataType::Geometry,
            (0..3)
                .map(|i| Value::Geometry(Point::new(i as f64, 0.0).into()))
                .collect(),
        ),
        ("zone", DataType::Utf8, vec!["a".into(), "a".into(), "b".into()]),
    ])
    .unwrap();
    let edges = Table::from_columns(vec![
        ("origin", DataType::Int64, ints(&[1, 1, 2, 3])),
        ("destination", DataType::Int64, ints(&[2, 2, 3, 3])),
        ("count", DataType::Int64, ints(&[4, 6, 1, 2])),
        ("mode", DataType::Utf8, vec!["bus".into(), "car".into(), "bus".into(), "car".into()]),
    ])
    .unwrap();
    let model =
        NetworkModel::new(NodeTable::indexed(nodes, "geometry", "id").unwrap(), edges).unwrap();

    let base = dir.join("trips");
    model.write(&base).unwrap();
    base
}

fn write_config(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("sttn.toml");
    std::fs::write(&path, text).unwrap();
    path
}

fn run(args: &[&str]) -> Result<(), SttnError> {
    execute(Cli::try_parse_from(args).unwrap())
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = Cli::try_parse_from([
        "sttn", "aggregate", "-r", "count", "--network", "trips", "--json", "-v",
    ])
    .unwrap();
    assert_eq!(cli.network, PathBuf::from("trips"));
    assert!(cli.json);
    assert!(cli.verbose);
    match cli.command {
        Some(Commands::Aggregate { reduce, key, output }) => {
            assert_eq!(reduce, vec!["count".to_string()]);
            assert!(key.is_none());
            assert!(output.is_none());
        }
        other => panic!("expected aggregate, got {:?}", other),
    }
}

#[test]
fn network_defaults_to_network() {
    let cli = Cli::try_parse_from(["sttn", "info"]).unwrap();
    assert_eq!(cli.network, PathBuf::from("network"));
    assert!(cli.config.is_none());
}

#[test]
fn aggregate_requires_a_reducer() {
    assert!(Cli::try_parse_from(["sttn", "aggregate"]).is_err());
}

#[test]
fn rollup_flags_parse() {
    let cli = Cli::try_parse_from([
        "sttn",
        "rollup",
        "-r",
        "count=max",
        "--incoming",
        "--exclude-cycles",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Rollup {
            incoming: true,
            exclude_cycles: true,
            ..
        })
    ));
}

#[test]
fn cycle_flags_conflict() {
    let cli = Cli::try_parse_from(["sttn", "rollup", "-r", "count", "--include-cycles"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Rollup {
            include_cycles: true,
            exclude_cycles: false,
            ..
        })
    ));
    assert!(
        Cli::try_parse_from([
            "sttn",
            "rollup",
            "-r",
            "count",
            "--include-cycles",
            "--exclude-cycles",
        ])
        .is_err()
    );
}

#[test]
fn cycle_flags_override_config() {
    assert!(resolve_include_cycles(true, false, false));
    assert!(!resolve_include_cycles(false, true, true));
    assert!(resolve_include_cycles(false, false, true));
    assert!(!resolve_include_cycles(false, false, false));
}

// =============================================================================
// REDUCER SPECS
// =============================================================================

#[test]
fn reducer_spec_with_and_without_reducer() {
    let (column, reducer) = parse_reducer_spec("count", "sum").unwrap();
    assert_eq!(column, "count");
    assert!(matches!(reducer, Reducer::Sum));

    let (column, reducer) = parse_reducer_spec("duration=mean", "sum").unwrap();
    assert_eq!(column, "duration");
    assert!(matches!(reducer, Reducer::Mean));
}

#[test]
fn reducer_spec_rejects_unknown_reducer() {
    let result = parse_reducer_spec("count=median", "sum");
    assert!(matches!(result, Err(SttnError::UnknownReducer(_))));
}

#[test]
fn reducer_spec_rejects_empty_column() {
    let result = parse_reducer_spec("=sum", "sum");
    assert!(matches!(result, Err(SttnError::MissingColumn { .. })));
}

// =============================================================================
// CONFIG
// =============================================================================

#[test]
fn explicit_config_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "[defaults]\nreducer = \"max\"\ndistance_column = \"km\"\ninclude_cycles = false\n",
    );
    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.defaults.reducer, "max");
    assert_eq!(config.defaults.distance_column, "km");
    assert!(!config.defaults.include_cycles);
}

#[test]
fn malformed_config_fails_the_command() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_network(dir.path());
    let config = write_config(dir.path(), "[defaults\n");
    let result = run(&[
        "sttn",
        "--network",
        base.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "info",
    ]);
    assert!(matches!(result, Err(SttnError::Deserialization(_))));
}

// =============================================================================
// END-TO-END
// =============================================================================

#[test]
fn aggregate_writes_merged_network() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_network(dir.path());
    let config = write_config(dir.path(), "");
    let output = dir.path().join("merged");

    run(&[
        "sttn",
        "--network",
        base.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "aggregate",
        "-r",
        "count",
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();

    let merged = NetworkModel::read(&output).unwrap();
    assert_eq!(merged.shape(), (3, 3));
    let counts: Vec<i64> = merged
        .edges()
        .column("count")
        .unwrap()
        .iter()
        .filter_map(Value::as_i64)
        .collect();
    assert_eq!(counts, vec![10, 1, 2]);
}

#[test]
fn configured_reducer_applies_to_bare_columns() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_network(dir.path());
    let config = write_config(dir.path(), "[defaults]\nreducer = \"max\"\n");
    let output = dir.path().join("merged");

    run(&[
        "sttn",
        "-n",
        base.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "aggregate",
        "-r",
        "count",
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();

    let merged = NetworkModel::read(&output).unwrap();
    let first = merged.edges().row(0).unwrap();
    assert_eq!(first.get("count"), Some(&Value::Int64(6)));
}

#[test]
fn group_and_filter_commands_write_networks() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_network(dir.path());
    let config = write_config(dir.path(), "");
    let grouped = dir.path().join("zones");
    let filtered = dir.path().join("bus");

    run(&[
        "sttn",
        "-n",
        base.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "group",
        "-c",
        "zone",
        "-o",
        grouped.to_str().unwrap(),
    ])
    .unwrap();
    let zones = NetworkModel::read(&grouped).unwrap();
    let keys: Vec<_> = zones.nodes().keys().cloned().collect();
    assert_eq!(keys, vec![NodeKey::from("a"), NodeKey::from("b")]);
    assert_eq!(zones.edges().num_rows(), 4);

    run(&[
        "sttn",
        "-n",
        base.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "filter-edges",
        "-c",
        "mode",
        "-e",
        "bus",
        "-o",
        filtered.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(NetworkModel::read(&filtered).unwrap().shape(), (3, 2));
}

#[test]
fn distance_uses_configured_column() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_network(dir.path());
    let config = write_config(dir.path(), "[defaults]\ndistance_column = \"km\"\n");
    let output = dir.path().join("with-km");

    run(&[
        "sttn",
        "-n",
        base.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "distance",
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();

    let enriched = NetworkModel::read(&output).unwrap();
    let km = enriched.edges().row(0).unwrap().get("km").and_then(Value::as_f64);
    // One degree of longitude on the equator.
    assert!(km.is_some_and(|d| (d - 111.2).abs() < 0.5));
}

#[test]
fn read_only_commands_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_network(dir.path());
    let config = write_config(dir.path(), "");
    let base = base.to_str().unwrap();
    let config = config.to_str().unwrap();

    for command in [
        vec!["info"],
        vec!["graph"],
        vec!["hash"],
        vec!["rollup", "-r", "count", "--exclude-cycles"],
        vec!["rollup", "-r", "count", "--include-cycles"],
    ] {
        let mut args = vec!["sttn", "--json", "-n", base, "--config", config];
        args.extend(command);
        run(&args).unwrap();
    }
}

#[test]
fn missing_filter_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_network(dir.path());
    let config = write_config(dir.path(), "");

    let result = run(&[
        "sttn",
        "-n",
        base.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "filter-edges",
        "-c",
        "operator",
        "-e",
        "x",
    ]);
    assert!(matches!(
        result,
        Err(SttnError::MissingColumn { column, .. }) if column == "operator"
    ));
}

#[test]
fn missing_network_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let absent = dir.path().join("absent");

    let result = run(&[
        "sttn",
        "-n",
        absent.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "info",
    ]);
    assert!(matches!(result, Err(SttnError::Io(_))));
}
