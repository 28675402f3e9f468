//! Conversion between [`NativeGeometry`] and [`geo`] geometries.
//!
//! `geo` is two-dimensional: Z and M are dropped on the way in and absent on the way out.

use geo::{
    Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon,
};

use crate::native::{Coord, Dimension, NativeGeometry, Shape};

fn line_string_to_geo(coords: &[Coord]) -> LineString {
    LineString::new(coords.iter().map(|c| c.to_geo()).collect())
}

fn polygon_to_geo(rings: &[Vec<Coord>]) -> Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => Polygon::new(
            line_string_to_geo(exterior),
            interiors.iter().map(|r| line_string_to_geo(r)).collect(),
        ),
        None => Polygon::new(LineString::new(vec![]), vec![]),
    }
}

impl Shape {
    /// Convert to a [`geo::Geometry`]. An empty point becomes an empty `MultiPoint`, since `geo`
    /// has no empty point.
    pub fn to_geo(&self) -> Geometry {
        match self {
            Shape::Point(Some(coord)) => Geometry::Point(Point(coord.to_geo())),
            Shape::Point(None) => Geometry::MultiPoint(MultiPoint::new(vec![])),
            Shape::LineString(coords) => Geometry::LineString(line_string_to_geo(coords)),
            Shape::Polygon(rings) => Geometry::Polygon(polygon_to_geo(rings)),
            Shape::MultiPoint(coords) => Geometry::MultiPoint(MultiPoint::new(
                coords
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(|c| Point(c.to_geo()))
                    .collect(),
            )),
            Shape::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString::new(
                lines.iter().map(|l| line_string_to_geo(l)).collect(),
            )),
            Shape::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon::new(
                polygons.iter().map(|p| polygon_to_geo(p)).collect(),
            )),
            Shape::GeometryCollection(shapes) => Geometry::GeometryCollection(
                GeometryCollection(shapes.iter().map(Shape::to_geo).collect()),
            ),
        }
    }

    /// Convert from a [`geo::Geometry`]. `Line`, `Rect` and `Triangle` become a `LineString`
    /// and `Polygon`s respectively.
    pub fn from_geo(geom: &Geometry) -> Self {
        match geom {
            Geometry::Point(p) => Shape::Point(Some(coord_from_geo(p.0))),
            Geometry::Line(line) => {
                Shape::LineString(vec![coord_from_geo(line.start), coord_from_geo(line.end)])
            }
            Geometry::LineString(ls) => Shape::LineString(ring_from_geo(ls)),
            Geometry::Polygon(p) => Shape::Polygon(rings_from_geo(p)),
            Geometry::MultiPoint(mp) => {
                Shape::MultiPoint(mp.iter().map(|p| coord_from_geo(p.0)).collect())
            }
            Geometry::MultiLineString(ml) => {
                Shape::MultiLineString(ml.iter().map(ring_from_geo).collect())
            }
            Geometry::MultiPolygon(mp) => {
                Shape::MultiPolygon(mp.iter().map(rings_from_geo).collect())
            }
            Geometry::GeometryCollection(gc) => {
                Shape::GeometryCollection(gc.iter().map(Shape::from_geo).collect())
            }
            Geometry::Rect(rect) => Shape::Polygon(rings_from_geo(&rect.to_polygon())),
            Geometry::Triangle(triangle) => {
                Shape::Polygon(rings_from_geo(&triangle.to_polygon()))
            }
        }
    }
}

fn coord_from_geo(coord: geo::Coord) -> Coord {
    Coord::xy(coord.x, coord.y)
}

fn ring_from_geo(ls: &LineString) -> Vec<Coord> {
    ls.0.iter().copied().map(coord_from_geo).collect()
}

fn rings_from_geo(polygon: &Polygon) -> Vec<Vec<Coord>> {
    if polygon.exterior().0.is_empty() {
        return vec![];
    }
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_from_geo)
        .collect()
}

impl NativeGeometry {
    /// Convert to a two-dimensional [`geo::Geometry`].
    pub fn to_geo(&self) -> Geometry {
        self.shape().to_geo()
    }

    /// Build an XY geometry from a [`geo::Geometry`].
    pub fn from_geo(geom: &Geometry) -> Self {
        NativeGeometry::new(Shape::from_geo(geom), Dimension::XY)
    }
}

impl From<Geometry> for NativeGeometry {
    fn from(value: Geometry) -> Self {
        NativeGeometry::from_geo(&value)
    }
}
