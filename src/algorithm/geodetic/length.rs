use arrow_array::types::Float64Type;
use arrow_array::{Float64Array, OffsetSizeTrait};
use geographiclib_rs::{Geodesic, InverseGeodesic};

use crate::algorithm::geodetic::Spheroid;
use crate::algorithm::native::try_unary_primitive;
use crate::array::WKBArray;
use crate::error::Result;
use crate::native::{Coord, Shape};

/// Determine the length of a geometry on an ellipsoid.
///
/// This uses the geodesic measurement methods given by [Karney (2013)], on the given spheroid
/// rather than a fixed WGS84. Polygons measure the length of all their rings, points have zero
/// length and collections sum their members.
///
/// # Units
///
/// - return value: meters
///
/// [Karney (2013)]:  https://arxiv.org/pdf/1109.4448.pdf
pub trait GeodeticLength {
    type Output;

    fn geodetic_length(&self, spheroid: &Spheroid) -> Self::Output;
}

impl<O: OffsetSizeTrait> GeodeticLength for WKBArray<O> {
    type Output = Result<Float64Array>;

    fn geodetic_length(&self, spheroid: &Spheroid) -> Self::Output {
        let geod = spheroid.geodesic();
        try_unary_primitive::<_, Float64Type, _>(self, "geodetic_length", |geom| {
            Ok(shape_length(&geod, geom.shape()))
        })
    }
}

fn line_length(geod: &Geodesic, coords: &[Coord]) -> f64 {
    coords
        .windows(2)
        .map(|w| -> f64 { geod.inverse(w[0].y, w[0].x, w[1].y, w[1].x) })
        .sum()
}

fn shape_length(geod: &Geodesic, shape: &Shape) -> f64 {
    match shape {
        Shape::Point(_) | Shape::MultiPoint(_) => 0.,
        Shape::LineString(coords) => line_length(geod, coords),
        Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
            rings.iter().map(|r| line_length(geod, r)).sum()
        }
        Shape::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .map(|r| line_length(geod, r))
            .sum(),
        Shape::GeometryCollection(shapes) => shapes.iter().map(|s| shape_length(geod, s)).sum(),
    }
}
