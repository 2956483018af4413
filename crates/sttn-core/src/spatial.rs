//! # Spatial Enrichment
//!
//! Edge columns derived from endpoint geometry. Node geometries are reduced
//! to their centroid; coordinates are read as longitude (x) and latitude (y).

use crate::network::NetworkModel;
use crate::primitives::{LAT_FROM, LAT_TO, LONG_FROM, LONG_TO};
use crate::table::{Field, TabularRelation, Table};
use crate::{DataType, NodeKey, SttnError, Value};
use geo::{Centroid, Distance, Haversine, Point};
use std::collections::BTreeMap;
use std::sync::Arc;

const METERS_PER_KILOMETER: f64 = 1000.0;

impl NetworkModel {
    /// The edge table with `long_from`, `lat_from`, `long_to` and `lat_to`
    /// appended. Coordinates are null when an endpoint geometry is empty.
    pub fn edges_with_centroids(&self) -> Result<Table, SttnError> {
        let centroids = self.endpoint_centroids()?;

        let mut columns: [Vec<Value>; 4] = Default::default();
        for (from, to) in centroids {
            for (column, value) in columns.iter_mut().zip([
                from.map(|p| p.x()),
                from.map(|p| p.y()),
                to.map(|p| p.x()),
                to.map(|p| p.y()),
            ]) {
                column.push(value.map_or(Value::Null, Value::Float64));
            }
        }

        let [long_from, lat_from, long_to, lat_to] = columns;
        self.edges()
            .as_table()
            .clone()
            .with_column(Field::new(LONG_FROM, DataType::Float64), long_from)?
            .with_column(Field::new(LAT_FROM, DataType::Float64), lat_from)?
            .with_column(Field::new(LONG_TO, DataType::Float64), long_to)?
            .with_column(Field::new(LAT_TO, DataType::Float64), lat_to)
    }

    /// Append a `Float64` edge column holding the great-circle distance in
    /// kilometres between endpoint centroids.
    pub fn with_distance(&self, column: &str) -> Result<Self, SttnError> {
        if self.edges().schema().contains(column) {
            return Err(SttnError::DuplicateColumn(column.to_string()));
        }

        let distances = self
            .endpoint_centroids()?
            .into_iter()
            .map(|pair| match pair {
                (Some(from), Some(to)) => {
                    Value::Float64(Haversine::distance(from, to) / METERS_PER_KILOMETER)
                }
                _ => Value::Null,
            })
            .collect();

        let edges = self
            .edges()
            .as_table()
            .clone()
            .with_column(Field::new(column, DataType::Float64), distances)?;
        Self::from_shared(
            self.shared_nodes(),
            Arc::new(edges.into()),
            self.columns().clone(),
        )
    }

    /// Origin and destination centroid for every edge, in edge order.
    fn endpoint_centroids(&self) -> Result<Vec<(Option<Point<f64>>, Option<Point<f64>>)>, SttnError> {
        let nodes = self.nodes();
        let centroids: BTreeMap<&NodeKey, Option<Point<f64>>> = nodes
            .keyed_rows()
            .map(|(key, row)| Ok((key, nodes.row_geometry(row)?.centroid())))
            .collect::<Result<_, SttnError>>()?;

        self.edges()
            .rows()
            .iter()
            .map(|row| {
                let (from, to) = self.endpoint_keys(row)?;
                Ok((
                    centroids.get(&from).copied().flatten(),
                    centroids.get(&to).copied().flatten(),
                ))
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeTable;
    use geo::{MultiPoint, Rect, coord};

    fn network() -> NetworkModel {
        let square: crate::Geometry =
            Rect::new(coord! { x: 2.0, y: 40.0 }, coord! { x: 4.0, y: 42.0 })
                .to_polygon()
                .into();
        let nodes = Table::from_columns(vec![
            ("id", DataType::Int64, [1, 2, 3].map(Value::Int64).to_vec()),
            (
                "geometry",
                DataType::Geometry,
                vec![
                    Value::Geometry(Point::new(0.0, 0.0).into()),
                    Value::Geometry(square),
                    Value::Geometry(MultiPoint::<f64>::new(Vec::new()).into()),
                ],
            ),
        ])
        .expect("nodes");
        let edges = Table::from_columns(vec![
            ("origin", DataType::Int64, [1, 1, 3].map(Value::Int64).to_vec()),
            (
                "destination",
                DataType::Int64,
                [2, 1, 1].map(Value::Int64).to_vec(),
            ),
        ])
        .expect("edges");
        NetworkModel::new(
            NodeTable::indexed(nodes, "geometry", "id").expect("indexed"),
            edges,
        )
        .expect("model")
    }

    #[test]
    fn centroid_columns_are_appended() {
        let table = network().edges_with_centroids().expect("centroids");
        let names: Vec<_> = table.schema().names().collect();
        assert_eq!(
            names,
            vec!["origin", "destination", "long_from", "lat_from", "long_to", "lat_to"]
        );
        let coords: Vec<f64> = table.rows()[0][2..]
            .iter()
            .filter_map(Value::as_f64)
            .collect();
        let expected = [0.0, 0.0, 3.0, 41.0];
        assert_eq!(coords.len(), expected.len());
        for (got, want) in coords.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {}, want {}", got, want);
        }
        assert_eq!(table.rows()[2][2], Value::Null);
    }

    #[test]
    fn distance_in_kilometres() {
        let base = network();
        let model = base.with_distance("km").expect("distance");
        let column: Vec<_> = model.edges().column("km").expect("km").iter().cloned().collect();

        let first = column[0].as_f64().expect("distance");
        assert!((4500.0..4700.0).contains(&first), "got {}", first);
        assert_eq!(column[1], Value::Float64(0.0));
        assert_eq!(column[2], Value::Null);
        assert!(model.shares_nodes_with(&base));
    }

    #[test]
    fn existing_column_is_not_overwritten() {
        let model = network().with_distance("km").expect("distance");
        assert!(matches!(
            model.with_distance("km"),
            Err(SttnError::DuplicateColumn(c)) if c == "km"
        ));
    }
}
