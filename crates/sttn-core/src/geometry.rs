//! # Geometry Dissolve
//!
//! Union of node geometries used when nodes are grouped into regions.
//!
//! Areal parts (polygons, multipolygons, rectangles, triangles) are merged
//! with boolean union. Point parts are de-duplicated. Linear parts are kept
//! as they are. When more than one kind remains the result is a geometry
//! collection.

use crate::Geometry;
use geo::{BooleanOps, GeometryCollection, MultiPoint, MultiPolygon, Point, Polygon};

/// Dissolve `parts` into a single geometry.
///
/// A single part is returned unchanged. An empty input yields an empty
/// geometry collection.
#[must_use]
pub fn union_all(parts: &[&Geometry]) -> Geometry {
    if let [single] = parts {
        return (*single).clone();
    }

    let mut parts_by_kind = Parts::default();
    for part in parts {
        parts_by_kind.push(part);
    }
    parts_by_kind.finish()
}

#[derive(Default)]
struct Parts {
    areas: Vec<Polygon<f64>>,
    points: Vec<Point<f64>>,
    other: Vec<Geometry>,
}

impl Parts {
    fn push(&mut self, geometry: &Geometry) {
        match geometry {
            Geometry::Polygon(p) => self.areas.push(p.clone()),
            Geometry::MultiPolygon(mp) => self.areas.extend(mp.0.iter().cloned()),
            Geometry::Rect(r) => self.areas.push(r.to_polygon()),
            Geometry::Triangle(t) => self.areas.push(t.to_polygon()),
            Geometry::Point(p) => self.push_point(*p),
            Geometry::MultiPoint(mp) => {
                for p in &mp.0 {
                    self.push_point(*p);
                }
            }
            Geometry::GeometryCollection(gc) => {
                for g in &gc.0 {
                    self.push(g);
                }
            }
            other => self.other.push(other.clone()),
        }
    }

    fn push_point(&mut self, point: Point<f64>) {
        if !self.points.contains(&point) {
            self.points.push(point);
        }
    }

    fn finish(self) -> Geometry {
        let mut pieces = Vec::new();

        if !self.areas.is_empty() {
            let merged = self
                .areas
                .into_iter()
                .fold(MultiPolygon::new(Vec::new()), |acc, polygon| {
                    acc.union(&MultiPolygon::new(vec![polygon]))
                });
            pieces.push(match <[Polygon<f64>; 1]>::try_from(merged.0) {
                Ok([polygon]) => Geometry::Polygon(polygon),
                Err(polygons) => Geometry::MultiPolygon(MultiPolygon::new(polygons)),
            });
        }

        match self.points.as_slice() {
            [] => {}
            [point] => pieces.push(Geometry::Point(*point)),
            _ => pieces.push(Geometry::MultiPoint(MultiPoint::new(self.points))),
        }

        pieces.extend(self.other);

        match <[Geometry; 1]>::try_from(pieces) {
            Ok([piece]) => piece,
            Err(pieces) => Geometry::GeometryCollection(GeometryCollection::new_from(pieces)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
