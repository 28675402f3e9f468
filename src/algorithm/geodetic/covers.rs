use arrow_array::builder::{Int32Builder, ListBuilder};
use arrow_array::{ListArray, OffsetSizeTrait};
use tracing::debug;

use crate::algorithm::geodetic::sphere::{
    arcs_cross, in_ring, midpoint, on_ring, point_on_arc, to_vec3, Vec3,
};
use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::native::{decode, Coord, ParserChecks, Shape};

/// For every geometry of `self`, list the 1-based positions of the geometries of `other` that it
/// covers on the sphere.
///
/// Supported pairs are polygon/point, polygon/line, polygon/polygon, line/point, line/line and
/// point/point; other combinations never cover. A multi-part geometry covers another when one of
/// its parts covers every part of the latter. Null slots of `self` produce null lists; null
/// slots of `other` are never covered.
///
/// Polygons are assumed to enclose less than a hemisphere.
pub trait GeodeticCovers<Rhs = Self> {
    type Output;

    fn geodetic_covers(&self, other: &Rhs) -> Self::Output;
}

impl<O1: OffsetSizeTrait, O2: OffsetSizeTrait> GeodeticCovers<WKBArray<O2>> for WKBArray<O1> {
    type Output = Result<ListArray>;

    fn geodetic_covers(&self, other: &WKBArray<O2>) -> Self::Output {
        debug!(
            operation = "geodetic_covers",
            len = self.len(),
            other_len = other.len(),
            "running operation"
        );
        let left = decode(self, ParserChecks::wkb_default())?
            .into_iter()
            .map(|g| g.map(|g| SphericalShape::new(g.into_shape())))
            .collect::<Vec<_>>();
        let right = decode(other, ParserChecks::wkb_default())?
            .into_iter()
            .map(|g| g.map(|g| SphericalShape::new(g.into_shape())))
            .collect::<Vec<_>>();

        let mut builder = ListBuilder::with_capacity(Int32Builder::new(), left.len());
        for maybe_a in left.iter() {
            let Some(a) = maybe_a else {
                builder.append_null();
                continue;
            };
            for (j, maybe_b) in right.iter().enumerate() {
                if maybe_b.as_ref().is_some_and(|b| a.covers(b)) {
                    let position = i32::try_from(j + 1).map_err(|_| GeoArrowError::Overflow)?;
                    builder.values().append_value(position);
                }
            }
            builder.append(true);
        }
        Ok(builder.finish())
    }
}

/// A single-part geometry with its vertices on the unit sphere.
#[derive(Debug)]
enum Part {
    Point(Vec3),
    Line(Vec<Vec3>),
    Polygon(Vec<Vec<Vec3>>),
}

#[derive(Debug)]
struct SphericalShape {
    parts: Vec<Part>,
}

fn to_vec3s(coords: &[Coord]) -> Vec<Vec3> {
    coords.iter().map(to_vec3).collect()
}

impl SphericalShape {
    fn new(shape: Shape) -> Self {
        let parts = shape
            .into_parts()
            .into_iter()
            .filter(|part| !part.is_empty())
            .filter_map(|part| match part {
                Shape::Point(Some(c)) => Some(Part::Point(to_vec3(&c))),
                Shape::LineString(coords) => Some(Part::Line(to_vec3s(&coords))),
                Shape::Polygon(rings) => Some(Part::Polygon(
                    rings
                        .iter()
                        .filter(|r| !r.is_empty())
                        .map(|r| to_vec3s(r))
                        .collect(),
                )),
                _ => None,
            })
            .collect();
        Self { parts }
    }

    fn covers(&self, other: &SphericalShape) -> bool {
        !other.parts.is_empty()
            && self
                .parts
                .iter()
                .any(|a| other.parts.iter().all(|b| part_covers(a, b)))
    }
}

fn polygon_covers_point(rings: &[Vec<Vec3>], p: &Vec3) -> bool {
    let Some((exterior, holes)) = rings.split_first() else {
        return false;
    };
    if rings.iter().any(|ring| on_ring(p, ring)) {
        return true;
    }
    in_ring(p, exterior) && !holes.iter().any(|hole| in_ring(p, hole))
}

fn polygon_covers_line(rings: &[Vec<Vec3>], line: &[Vec3]) -> bool {
    if !line.iter().all(|p| polygon_covers_point(rings, p)) {
        return false;
    }
    // With every vertex covered, the line can only leave the polygon by crossing a ring
    line.windows(2).all(|seg| {
        !rings.iter().any(|ring| {
            ring.windows(2)
                .any(|edge| arcs_cross(&seg[0], &seg[1], &edge[0], &edge[1]))
        })
    })
}

fn line_covers_point(line: &[Vec3], p: &Vec3) -> bool {
    match line {
        [single] => point_on_arc(p, single, single),
        _ => line.windows(2).any(|w| point_on_arc(p, &w[0], &w[1])),
    }
}

/// Every vertex of `other` and the middle of every one of its segments lies on `line`.
fn line_covers_line(line: &[Vec3], other: &[Vec3]) -> bool {
    other.iter().all(|p| line_covers_point(line, p))
        && other
            .windows(2)
            .all(|seg| line_covers_point(line, &midpoint(&seg[0], &seg[1])))
}

/// Whether the polygon `rings` covers the polygon `other`.
fn polygon_covers_polygon(rings: &[Vec<Vec3>], other: &[Vec<Vec3>]) -> bool {
    let Some((exterior, other_holes)) = other.split_first() else {
        return false;
    };
    // Holes of the covered polygon only remove area
    if !polygon_covers_line(rings, exterior) {
        return false;
    }
    // A hole of the covering polygon must not open up inside the covered one
    let strictly_inside = |p: &Vec3| {
        in_ring(p, exterior)
            && !other_holes
                .iter()
                .any(|hole| in_ring(p, hole) || on_ring(p, hole))
    };
    !rings
        .iter()
        .skip(1)
        .any(|hole| hole.iter().any(|p| strictly_inside(p)))
}

fn part_covers(a: &Part, b: &Part) -> bool {
    match (a, b) {
        (Part::Point(p), Part::Point(q)) => point_on_arc(q, p, p),
        (Part::Line(line), Part::Point(q)) => line_covers_point(line, q),
        (Part::Polygon(rings), Part::Point(q)) => polygon_covers_point(rings, q),
        (Part::Polygon(rings), Part::Line(line)) => polygon_covers_line(rings, line),
        (Part::Line(line), Part::Line(other)) => line_covers_line(line, other),
        (Part::Polygon(rings), Part::Polygon(other)) => polygon_covers_polygon(rings, other),
        _ => false,
    }
}
