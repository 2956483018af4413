//! # File Layer
//!
//! Reads and writes a network as two sibling files next to a base path:
//! `{base}-nodes.sttn` and `{base}-edges.sttn`.
//!
//! Writes go to `.tmp` siblings first and are renamed into place only once
//! both files are on disk, so a failed write never pairs a new node file
//! with an old edge file.

use crate::formats::persistence::{model_from_bytes, model_to_bytes};
use crate::network::NetworkModel;
use crate::primitives::{EDGES_FILE_SUFFIX, NODES_FILE_SUFFIX, TEMP_FILE_SUFFIX};
use crate::SttnError;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// `(node file, edge file)` for `base`.
#[must_use]
pub fn file_paths(base: &Path) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(base.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    (with_suffix(NODES_FILE_SUFFIX), with_suffix(EDGES_FILE_SUFFIX))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

impl NetworkModel {
    /// Write the network to `{base}-nodes.sttn` and `{base}-edges.sttn`.
    ///
    /// Both tables are encoded before either file is touched. An existing
    /// pair at `base` is left intact when writing either temp file fails.
    pub fn write(&self, base: impl AsRef<Path>) -> Result<(), SttnError> {
        let (nodes, edges) = model_to_bytes(self)?;
        let (nodes_path, edges_path) = file_paths(base.as_ref());
        let (nodes_tmp, edges_tmp) = (temp_path(&nodes_path), temp_path(&edges_path));

        let staged = fs::write(&nodes_tmp, nodes).and_then(|()| fs::write(&edges_tmp, edges));
        if let Err(e) = staged {
            let _ = fs::remove_file(&nodes_tmp);
            let _ = fs::remove_file(&edges_tmp);
            return Err(e.into());
        }

        fs::rename(&nodes_tmp, &nodes_path)?;
        fs::rename(&edges_tmp, &edges_path)?;
        Ok(())
    }

    /// Read a network written by [`NetworkModel::write`].
    pub fn read(base: impl AsRef<Path>) -> Result<Self, SttnError> {
        let (nodes_path, edges_path) = file_paths(base.as_ref());
        let nodes = fs::read(nodes_path)?;
        let edges = fs::read(edges_path)?;
        model_from_bytes(&nodes, &edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, NodeTable, Table, TabularRelation, Value};
    use geo::Point;

    fn network(stops: i64) -> NetworkModel {
        let nodes = Table::from_columns(vec![
            ("id", DataType::Int64, (0..stops).map(Value::Int64).collect()),
            (
                "geometry",
                DataType::Geometry,
                (0..stops)
                    .map(|i| Value::Geometry(Point::new(i as f64, 0.0).into()))
                    .collect(),
            ),
        ])
        .expect("nodes");
        let edges = Table::from_columns(vec![
            ("origin", DataType::Int64, vec![Value::Int64(0)]),
            ("destination", DataType::Int64, vec![Value::Int64(stops - 1)]),
        ])
        .expect("edges");
        NetworkModel::new(
            NodeTable::indexed(nodes, "geometry", "id").expect("indexed"),
            edges,
        )
        .expect("model")
    }

    #[test]
    fn suffixes_are_appended_to_the_file_name() {
        let (nodes, edges) = file_paths(Path::new("/data/trips.v2"));
        assert_eq!(nodes, PathBuf::from("/data/trips.v2-nodes.sttn"));
        assert_eq!(edges, PathBuf::from("/data/trips.v2-edges.sttn"));
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = NetworkModel::read(dir.path().join("absent"));
        assert!(matches!(result, Err(SttnError::Io(_))));
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("trips");
        network(3).write(&base).expect("write");

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names.len(), 2);
        assert_eq!(NetworkModel::read(&base).expect("read").shape(), (3, 1));
    }

    #[test]
    fn failed_write_keeps_previous_pair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("trips");
        network(3).write(&base).expect("first write");

        // A directory in the way of the edge temp file makes staging fail.
        let (nodes_path, edges_path) = file_paths(&base);
        fs::create_dir(temp_path(&edges_path)).expect("blocker");

        assert!(matches!(network(5).write(&base), Err(SttnError::Io(_))));
        assert!(!temp_path(&nodes_path).exists());
        assert_eq!(NetworkModel::read(&base).expect("read").shape(), (3, 1));
    }
}
