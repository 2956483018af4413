//! # CLI Command Implementations
//!
//! Each command reads the network at `--network`, applies one core
//! operation and either prints a summary or writes the result.

use std::path::Path;
use sttn_core::{
    Direction, GroupingSpec, NetworkModel, Reducer, Schema, SttnError, TabularRelation, Table,
    Value, content_hash,
};

// =============================================================================
// SHARED HELPERS
// =============================================================================

fn load_network(path: &Path) -> Result<NetworkModel, SttnError> {
    let model = NetworkModel::read(path)?;
    let (nodes, edges) = model.shape();
    tracing::debug!(path = %path.display(), nodes, edges, "loaded network");
    Ok(model)
}

/// Write `model` to `output` when given.
fn save_network(model: &NetworkModel, output: Option<&Path>) -> Result<(), SttnError> {
    if let Some(output) = output {
        model.write(output)?;
        tracing::info!(path = %output.display(), "wrote network");
    }
    Ok(())
}

/// JSON form of a single cell.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => (*b).into(),
        Value::Int32(v) => (*v).into(),
        Value::Int64(v) | Value::Timestamp(v) => (*v).into(),
        Value::Float64(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Utf8(s) => s.clone().into(),
        Value::Geometry(_) => value.to_string().into(),
    }
}

fn schema_to_json(schema: &Schema) -> serde_json::Value {
    schema
        .fields()
        .iter()
        .map(|field| (field.name.clone(), field.data_type.name().into()))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn table_to_json(table: &Table) -> serde_json::Value {
    table
        .iter_rows()
        .map(|row| {
            row.schema()
                .names()
                .zip(row.values())
                .map(|(name, value)| (name.to_string(), value_to_json(value)))
                .collect::<serde_json::Map<_, _>>()
        })
        .collect::<Vec<_>>()
        .into()
}

fn print_json(output: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

fn print_schema(title: &str, schema: &Schema) {
    println!("{}:", title);
    for field in schema.fields() {
        println!("  {:<20} {}", field.name, field.data_type);
    }
}

fn print_table(table: &Table) {
    let header: Vec<&str> = table.schema().names().collect();
    println!("{}", header.join("\t"));
    for row in table.iter_rows() {
        let cells: Vec<String> = row.values().iter().map(Value::to_string).collect();
        println!("{}", cells.join("\t"));
    }
}

/// Print the shape of a transformed network.
fn report_shape(
    title: &str,
    json_mode: bool,
    before: &NetworkModel,
    after: &NetworkModel,
    output: Option<&Path>,
) {
    let (nodes_before, edges_before) = before.shape();
    let (nodes, edges) = after.shape();

    if json_mode {
        print_json(&serde_json::json!({
            "nodes_before": nodes_before,
            "edges_before": edges_before,
            "nodes": nodes,
            "edges": edges,
            "output": output.map(|p| p.to_string_lossy().into_owned()),
        }));
        return;
    }

    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
    println!("Nodes: {} -> {}", nodes_before, nodes);
    println!("Edges: {} -> {}", edges_before, edges);
    match output {
        Some(path) => println!("Written to: {}", path.display()),
        None => println!("(not written; pass --output to save)"),
    }
}

// =============================================================================
// INFO COMMAND
// =============================================================================

/// Show shape, column names and schemas.
pub fn cmd_info(network: &Path, json_mode: bool) -> Result<(), SttnError> {
    let model = load_network(network)?;
    let (nodes, edges) = model.shape();

    if json_mode {
        let columns = serde_json::to_value(model.columns())
            .map_err(|e| SttnError::Serialization(e.to_string()))?;
        print_json(&serde_json::json!({
            "network": network.to_string_lossy(),
            "nodes": nodes,
            "edges": edges,
            "columns": columns,
            "geometry": model.nodes().geometry_column(),
            "node_schema": schema_to_json(model.nodes().schema()),
            "edge_schema": schema_to_json(model.edges().schema()),
        }));
        return Ok(());
    }

    println!("Network Info");
    println!("============");
    println!("Network:     {}", network.display());
    println!("Nodes:       {}", nodes);
    println!("Edges:       {}", edges);
    println!("Node key:    {}", model.node_key_name());
    println!("Origin:      {}", model.origin_column());
    println!("Destination: {}", model.destination_column());
    println!("Geometry:    {}", model.nodes().geometry_column());
    println!();
    print_schema("Node columns", model.nodes().schema());
    print_schema("Edge columns", model.edges().schema());

    Ok(())
}

// =============================================================================
// AGGREGATION COMMANDS
// =============================================================================

/// Merge parallel edges.
pub fn cmd_aggregate(
    network: &Path,
    json_mode: bool,
    reducers: &[(String, Reducer)],
    key: Option<&str>,
    output: Option<&Path>,
) -> Result<(), SttnError> {
    let model = load_network(network)?;
    tracing::info!(reducers = reducers.len(), key, "aggregating parallel edges");

    let merged = model.agg_parallel_edges(reducers, key)?;
    save_network(&merged, output)?;
    report_shape("Parallel Edge Aggregation", json_mode, &model, &merged, output);

    Ok(())
}

/// Aggregate edges per node and print the result.
pub fn cmd_rollup(
    network: &Path,
    json_mode: bool,
    reducers: &[(String, Reducer)],
    direction: Direction,
    include_cycles: bool,
) -> Result<(), SttnError> {
    let model = load_network(network)?;
    tracing::info!(?direction, include_cycles, "aggregating adjacent edges");

    let rolled = model.agg_adjacent_edges(reducers, direction, include_cycles)?;

    if json_mode {
        print_json(&table_to_json(&rolled));
    } else {
        print_table(&rolled);
    }

    Ok(())
}

// =============================================================================
// STRUCTURE COMMANDS
// =============================================================================

/// Dissolve nodes by a label column.
pub fn cmd_group(
    network: &Path,
    json_mode: bool,
    column: &str,
    output: Option<&Path>,
) -> Result<(), SttnError> {
    let model = load_network(network)?;
    tracing::info!(column, "grouping nodes");

    let grouped = model.group_nodes(&GroupingSpec::ByColumn(column.to_string()))?;
    save_network(&grouped, output)?;
    report_shape("Node Grouping", json_mode, &model, &grouped, output);

    Ok(())
}

/// Keep edges whose `column` renders as `equals`.
pub fn cmd_filter_edges(
    network: &Path,
    json_mode: bool,
    column: &str,
    equals: &str,
    output: Option<&Path>,
) -> Result<(), SttnError> {
    let model = load_network(network)?;
    let position = model.edges().column(column)?.index();
    tracing::info!(column, equals, "filtering edges");

    let filtered = model.filter_edges_by(|row| {
        row.values()
            .get(position)
            .is_some_and(|value| value.to_string() == equals)
    })?;
    save_network(&filtered, output)?;
    report_shape("Edge Filter", json_mode, &model, &filtered, output);

    Ok(())
}

/// Append endpoint distances.
pub fn cmd_distance(
    network: &Path,
    json_mode: bool,
    column: &str,
    output: Option<&Path>,
) -> Result<(), SttnError> {
    let model = load_network(network)?;
    tracing::info!(column, "computing edge distances");

    let enriched = model.with_distance(column)?;
    let distances: Vec<f64> = enriched
        .edges()
        .column(column)?
        .iter()
        .filter_map(Value::as_f64)
        .collect();
    let total: f64 = distances.iter().sum();
    let missing = enriched.edges().num_rows() - distances.len();
    save_network(&enriched, output)?;

    if json_mode {
        print_json(&serde_json::json!({
            "column": column,
            "edges": enriched.edges().num_rows(),
            "missing": missing,
            "total_km": total,
            "output": output.map(|p| p.to_string_lossy().into_owned()),
        }));
        return Ok(());
    }

    println!("Edge Distances");
    println!("==============");
    println!("Column:   {}", column);
    println!("Edges:    {}", enriched.edges().num_rows());
    println!("Missing:  {}", missing);
    println!("Total km: {:.3}", total);
    if let Some(path) = output {
        println!("Written to: {}", path.display());
    }

    Ok(())
}

// =============================================================================
// PROJECTION COMMAND
// =============================================================================

/// Summarize the multigraph projection.
pub fn cmd_graph(network: &Path, json_mode: bool) -> Result<(), SttnError> {
    let model = load_network(network)?;
    let graph = model.to_multigraph()?;
    let petgraph = graph.as_petgraph();

    let isolated = petgraph
        .node_indices()
        .filter(|&index| petgraph.neighbors_undirected(index).next().is_none())
        .count();
    let self_loops = graph.edges().filter(|(from, to, _)| from == to).count();

    if json_mode {
        print_json(&serde_json::json!({
            "vertices": graph.vertex_count(),
            "edges": graph.edge_count(),
            "self_loops": self_loops,
            "isolated": isolated,
        }));
        return Ok(());
    }

    println!("Multigraph");
    println!("==========");
    println!("Vertices:   {}", graph.vertex_count());
    println!("Edges:      {}", graph.edge_count());
    println!("Self-loops: {}", self_loops);
    println!("Isolated:   {}", isolated);

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute BLAKE3 content hash of the network.
pub fn cmd_hash(network: &Path, json_mode: bool) -> Result<(), SttnError> {
    let model = load_network(network)?;
    let hash = content_hash(&model)?;

    if json_mode {
        print_json(&serde_json::json!({
            "hash": hash,
            "algorithm": "BLAKE3",
        }));
    } else {
        println!("BLAKE3: {}", hash);
    }

    Ok(())
}
