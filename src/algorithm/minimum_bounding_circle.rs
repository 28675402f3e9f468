//! The smallest circle enclosing all vertices of a geometry, in planar coordinates.

use std::sync::Arc;

use arrow_array::builder::Float64Builder;
use arrow_array::{ArrayRef, Float64Array, OffsetSizeTrait, StructArray};
use arrow_buffer::NullBuffer;
use arrow_schema::{DataType, Field, Fields};
use geo::{coord, Coord};
use tracing::{debug, warn};

use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::native::{decode, NativeGeometry, ParserChecks};

/// A circle in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Coord,
    pub radius: f64,
}

impl Circle {
    fn from_point(p: Coord) -> Self {
        Self {
            center: p,
            radius: 0.,
        }
    }

    fn from_pair(a: Coord, b: Coord) -> Self {
        let center = coord! { x: (a.x + b.x) / 2., y: (a.y + b.y) / 2. };
        Self {
            center,
            radius: distance(a, center).max(distance(b, center)),
        }
    }

    /// The circumcircle, or `None` for collinear points.
    fn from_triple(a: Coord, b: Coord, c: Coord) -> Option<Self> {
        let (bx, by) = (b.x - a.x, b.y - a.y);
        let (cx, cy) = (c.x - a.x, c.y - a.y);
        let d = 2. * (bx * cy - by * cx);
        if d == 0. {
            return None;
        }
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let center = coord! {
            x: a.x + (cy * b2 - by * c2) / d,
            y: a.y + (bx * c2 - cx * b2) / d,
        };
        let radius = distance(a, center)
            .max(distance(b, center))
            .max(distance(c, center));
        Some(Self { center, radius })
    }

    fn contains(&self, p: Coord) -> bool {
        distance(p, self.center) <= self.radius * (1. + 1e-12) + 1e-12
    }
}

fn distance(a: Coord, b: Coord) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// The smallest circle with `a` and `b` on its boundary that also holds `c`.
fn circle_with_two(a: Coord, b: Coord, c: Coord) -> Circle {
    Circle::from_triple(a, b, c).unwrap_or_else(|| {
        // Collinear: the two points farthest apart span the circle
        [Circle::from_pair(a, c), Circle::from_pair(b, c)]
            .into_iter()
            .fold(Circle::from_pair(a, b), |best, circle| {
                if circle.radius > best.radius {
                    circle
                } else {
                    best
                }
            })
    })
}

/// Welzl's algorithm, in its iterative form.
pub fn minimum_bounding_circle(points: &[Coord]) -> Option<Circle> {
    let (first, rest) = points.split_first()?;
    let mut circle = Circle::from_point(*first);
    for (i, &p) in rest.iter().enumerate() {
        if circle.contains(p) {
            continue;
        }
        // p is on the boundary of the circle of points[..=i + 1]
        circle = Circle::from_point(p);
        for (j, &q) in points[..=i].iter().enumerate() {
            if circle.contains(q) {
                continue;
            }
            circle = Circle::from_pair(p, q);
            for &r in &points[..j] {
                if !circle.contains(r) {
                    circle = circle_with_two(p, q, r);
                }
            }
        }
    }
    Some(circle)
}

fn geometry_circle(geom: &NativeGeometry) -> Result<Circle> {
    let circle = minimum_bounding_circle(&geom.xy_coords()).ok_or_else(|| {
        GeoArrowError::ComputationFailed(
            "could not compute minimum bounding circle of an empty geometry".into(),
        )
    })?;
    if !(circle.center.x.is_finite() && circle.center.y.is_finite() && circle.radius.is_finite())
    {
        return Err(GeoArrowError::ComputationFailed(
            "could not compute minimum bounding circle".into(),
        ));
    }
    Ok(circle)
}

/// The minimum bounding circle of every geometry, as a struct array of
/// `{center: {x, y}, radius}`. Null slots give null rows.
pub trait MinimumBoundingCircle {
    type Output;

    fn minimum_bounding_circle(&self) -> Self::Output;
}

fn center_fields() -> Fields {
    Fields::from(vec![
        Field::new("x", DataType::Float64, false),
        Field::new("y", DataType::Float64, false),
    ])
}

impl<O: OffsetSizeTrait> MinimumBoundingCircle for WKBArray<O> {
    type Output = Result<StructArray>;

    fn minimum_bounding_circle(&self) -> Self::Output {
        debug!(
            operation = "minimum_bounding_circle",
            len = self.len(),
            "running operation"
        );
        let geoms = decode(self, ParserChecks::wkb_default())?;

        let mut x = Float64Builder::with_capacity(geoms.len());
        let mut y = Float64Builder::with_capacity(geoms.len());
        let mut radius = Float64Builder::with_capacity(geoms.len());
        for (i, maybe_geom) in geoms.iter().enumerate() {
            match maybe_geom {
                Some(geom) => {
                    let circle = geometry_circle(geom).map_err(|err| {
                        warn!(
                            operation = "minimum_bounding_circle",
                            index = i,
                            %err,
                            "operation failed"
                        );
                        err.at_index(i)
                    })?;
                    x.append_value(circle.center.x);
                    y.append_value(circle.center.y);
                    radius.append_value(circle.radius);
                }
                // Children of a null struct slot still need a valid value
                None => {
                    x.append_value(0.);
                    y.append_value(0.);
                    radius.append_value(0.);
                }
            }
        }

        let nulls: Option<NullBuffer> = self.nulls().cloned();
        let center = StructArray::try_new(
            center_fields(),
            vec![Arc::new(x.finish()) as ArrayRef, Arc::new(y.finish())],
            nulls.clone(),
        )?;
        let fields = Fields::from(vec![
            Field::new("center", DataType::Struct(center_fields()), true),
            Field::new("radius", DataType::Float64, true),
        ]);
        let radius = radius.finish();
        let radius = Float64Array::new(radius.values().clone(), nulls.clone());
        Ok(StructArray::try_new(
            fields,
            vec![Arc::new(center) as ArrayRef, Arc::new(radius)],
            nulls,
        )?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::multipoint::mp0;
    use crate::test::polygon::p0;
    use crate::test::wkb::wkb_array;
    use approx::assert_relative_eq;
    use arrow_array::cast::AsArray;
    use arrow_array::types::Float64Type;
    use arrow_array::Array;
    use geo::point;

    fn row(result: &StructArray, i: usize) -> (f64, f64, f64) {
        let center = result.column(0).as_struct();
        (
            center.column(0).as_primitive::<Float64Type>().value(i),
            center.column(1).as_primitive::<Float64Type>().value(i),
            result.column(1).as_primitive::<Float64Type>().value(i),
        )
    }

    #[test]
    fn single_point_has_zero_radius() {
        let arr = wkb_array::<i32>(vec![Some(point!(x: 3., y: 4.).into())]);
        let result = arr.minimum_bounding_circle().unwrap();
        assert_eq!(row(&result, 0), (3., 4., 0.));
    }

    #[test]
    fn two_points_span_the_diameter() {
        // (0, 1) and (1, 2)
        let arr = wkb_array::<i32>(vec![Some(mp0().into()), None]);
        let result = arr.minimum_bounding_circle().unwrap();
        let (x, y, r) = row(&result, 0);
        assert_relative_eq!(x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(y, 1.5, epsilon = 1e-12);
        assert_relative_eq!(r, 2f64.sqrt() / 2., epsilon = 1e-12);
        assert!(result.is_null(1));
    }

    #[test]
    fn square() {
        let arr = wkb_array::<i32>(vec![Some(p0().into())]);
        let (x, y, r) = row(&arr.minimum_bounding_circle().unwrap(), 0);
        assert_relative_eq!(x, 5., epsilon = 1e-12);
        assert_relative_eq!(y, 5., epsilon = 1e-12);
        assert_relative_eq!(r, 50f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn encloses_all_points() {
        let points: Vec<Coord> = (0..50)
            .map(|i| {
                let t = i as f64 * 0.7;
                coord! { x: t.cos() * (1. + i as f64 / 10.), y: t.sin() * 3. }
            })
            .collect();
        let circle = minimum_bounding_circle(&points).unwrap();
        assert!(points.iter().all(|p| circle.contains(*p)));
    }

    #[test]
    fn collinear_points() {
        let points = [
            coord! { x: 0., y: 0. },
            coord! { x: 2., y: 0. },
            coord! { x: 1., y: 0. },
            coord! { x: 4., y: 0. },
        ];
        let circle = minimum_bounding_circle(&points).unwrap();
        assert_relative_eq!(circle.center.x, 2., epsilon = 1e-12);
        assert_relative_eq!(circle.radius, 2., epsilon = 1e-12);
    }

    #[test]
    fn empty_geometry_fails() {
        let arr = wkb_array::<i32>(vec![Some(geo::MultiPoint::<f64>::new(vec![]).into())]);
        let err = arr.minimum_bounding_circle().unwrap_err();
        assert_eq!(err.index(), Some(0));
    }
}
