use arrow_array::types::Float64Type;
use arrow_array::{Float64Array, OffsetSizeTrait};
use geographiclib_rs::{Geodesic, PolygonArea, Winding};

use crate::algorithm::geodetic::Spheroid;
use crate::algorithm::native::try_unary_primitive;
use crate::array::WKBArray;
use crate::error::Result;
use crate::native::{Coord, Shape};

/// Determine the area of a geometry on an ellipsoid.
///
/// Polygons measure the exterior ring minus the holes, regardless of ring orientation. Points
/// and lines have zero area, collections sum their members. Coordinates are longitude/latitude
/// in degrees.
///
/// # Units
///
/// - return value: square meters
pub trait GeodeticArea {
    type Output;

    fn geodetic_area(&self, spheroid: &Spheroid) -> Self::Output;
}

impl<O: OffsetSizeTrait> GeodeticArea for WKBArray<O> {
    type Output = Result<Float64Array>;

    fn geodetic_area(&self, spheroid: &Spheroid) -> Self::Output {
        let geod = spheroid.geodesic();
        try_unary_primitive::<_, Float64Type, _>(self, "geodetic_area", |geom| {
            Ok(shape_area(&geod, geom.shape()))
        })
    }
}

fn ring_area(geod: &Geodesic, ring: &[Coord]) -> f64 {
    // PolygonArea closes the ring itself
    let open = match ring {
        [first, .., last] if first.xy_eq(last) => &ring[..ring.len() - 1],
        _ => ring,
    };
    if open.len() < 3 {
        return 0.;
    }
    let mut polygon = PolygonArea::new(geod, Winding::CounterClockwise);
    open.iter().for_each(|c| polygon.add_point(c.y, c.x));
    let (_perimeter, area, _count) = polygon.compute(true);
    area.abs()
}

fn polygon_area(geod: &Geodesic, rings: &[Vec<Coord>]) -> f64 {
    match rings.split_first() {
        Some((exterior, holes)) => {
            let holes: f64 = holes.iter().map(|r| ring_area(geod, r)).sum();
            ring_area(geod, exterior) - holes
        }
        None => 0.,
    }
}

fn shape_area(geod: &Geodesic, shape: &Shape) -> f64 {
    match shape {
        Shape::Point(_) | Shape::MultiPoint(_) | Shape::LineString(_) => 0.,
        Shape::MultiLineString(_) => 0.,
        Shape::Polygon(rings) => polygon_area(geod, rings),
        Shape::MultiPolygon(polygons) => polygons.iter().map(|p| polygon_area(geod, p)).sum(),
        Shape::GeometryCollection(shapes) => shapes.iter().map(|s| shape_area(geod, s)).sum(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::linestring::ls0;
    use crate::test::polygon::{p0, p1, polygon_array};
    use crate::test::wkb::wkb_array;
    use approx::assert_relative_eq;
    use arrow_array::Array;
    use geo::{polygon, GeodesicArea as _, Polygon};

    #[test]
    fn matches_geo_on_wgs84() {
        let arr = wkb_array::<i32>(vec![Some(p0().into()), None, Some(ls0().into())]);
        let areas = arr.geodetic_area(&Spheroid::wgs84()).unwrap();
        assert_relative_eq!(areas.value(0), p0().geodesic_area_unsigned(), max_relative = 1e-9);
        assert!(areas.is_null(1));
        assert_eq!(areas.value(2), 0.);
    }

    #[test]
    fn fixture_polygons() {
        let areas = polygon_array().geodetic_area(&Spheroid::wgs84()).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas.null_count(), 0);
        assert_relative_eq!(areas.value(0), p0().geodesic_area_unsigned(), max_relative = 1e-9);
        assert!(areas.value(1) > areas.value(0));
    }

    #[test]
    fn holes_are_subtracted_whatever_the_orientation() {
        let arr = wkb_array::<i32>(vec![Some(p1().into())]);
        let area = arr.geodetic_area(&Spheroid::wgs84()).unwrap().value(0);

        let outer = Polygon::new(p1().exterior().clone(), vec![]);
        let mut hole = p1().interiors()[0].clone();
        hole.0.reverse();
        let inner = Polygon::new(hole, vec![]);
        let expected = outer.geodesic_area_unsigned() - inner.geodesic_area_unsigned();
        assert_relative_eq!(area, expected, max_relative = 1e-9);
        assert!(area > 0.);
    }

    #[test]
    fn sphere_octant() {
        // One eighth of a unit sphere
        let octant = polygon![
            (x: 0., y: 0.),
            (x: 90., y: 0.),
            (x: 0., y: 90.),
            (x: 0., y: 0.),
        ];
        let arr = wkb_array::<i64>(vec![Some(octant.into())]);
        let area = arr
            .geodetic_area(&Spheroid::sphere(1.).unwrap())
            .unwrap()
            .value(0);
        assert_relative_eq!(area, std::f64::consts::PI / 2., epsilon = 1e-9);
    }
}
