use std::sync::Arc;

use arrow_array::OffsetSizeTrait;
use geo::{HaversineIntermediate, Point};

use crate::algorithm::geodetic::sphere::{arc_length, to_vec3};
use crate::algorithm::native::try_map_geometries;
use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::metadata::Edges;
use crate::native::Coord;

/// Densify linear components along great circles so that no segment is longer than
/// `max_seg_length`, given in radians of arc.
///
/// Inserted points lie on the great circle through their neighbours; Z and M are interpolated
/// linearly. Points are returned unchanged. The output is marked as having spherical edges.
pub trait GeodeticSegmentize {
    type Output;

    fn geodetic_segmentize(&self, max_seg_length: f64) -> Self::Output;
}

impl<O: OffsetSizeTrait> GeodeticSegmentize for WKBArray<O> {
    type Output = Result<WKBArray<O>>;

    fn geodetic_segmentize(&self, max_seg_length: f64) -> Self::Output {
        if !(max_seg_length.is_finite() && max_seg_length > 0.) {
            return Err(GeoArrowError::Precondition(
                format!("max_seg_length must be positive, got {max_seg_length}").into(),
            ));
        }
        let output = try_map_geometries(self, "geodetic_segmentize", |geom| {
            geom.try_map_shape(|shape| {
                shape.try_map_linear(&mut |coords| segmentize_line(&coords, max_seg_length))
            })
        })?;
        let metadata = output.metadata().as_ref().clone().with_edges(Edges::Spherical);
        Ok(output.with_metadata(Arc::new(metadata)))
    }
}

fn lerp(a: Option<f64>, b: Option<f64>, f: f64) -> Option<f64> {
    Some(a? + (b? - a?) * f)
}

/// Edges closer than this to half a great circle have no defined path.
const ANTIPODAL_TOLERANCE: f64 = 1e-10;

/// WKB counts are `u32`, so no line can hold more vertices than this.
const MAX_VERTICES: usize = u32::MAX as usize;

fn segmentize_line(coords: &[Coord], max_seg_length: f64) -> Result<Vec<Coord>> {
    let Some(last) = coords.last() else {
        return Ok(vec![]);
    };
    let mut out = Vec::with_capacity(coords.len());
    for w in coords.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        out.push(*a);
        let length = arc_length(&to_vec3(a), &to_vec3(b));
        if std::f64::consts::PI - length < ANTIPODAL_TOLERANCE {
            return Err(GeoArrowError::ComputationFailed(
                format!(
                    "cannot segmentize the edge between antipodal points ({} {}) and ({} {})",
                    a.x, a.y, b.x, b.y
                )
                .into(),
            ));
        }
        let pieces = (length / max_seg_length).ceil();
        if pieces <= 1. {
            continue;
        }
        if pieces >= (MAX_VERTICES - out.len()) as f64 {
            return Err(GeoArrowError::ComputationFailed(
                format!("segmentizing would produce more than {MAX_VERTICES} vertices").into(),
            ));
        }
        let pieces_count = pieces as usize;
        out.try_reserve(pieces_count).map_err(|_| {
            GeoArrowError::ComputationFailed(
                format!("cannot allocate {pieces_count} interpolated vertices").into(),
            )
        })?;
        let (pa, pb) = (Point::new(a.x, a.y), Point::new(b.x, b.y));
        for k in 1..pieces_count {
            let f = k as f64 / pieces;
            let p = pa.haversine_intermediate(&pb, f);
            out.push(Coord {
                x: p.x(),
                y: p.y(),
                z: lerp(a.z, b.z, f),
                m: lerp(a.m, b.m, f),
            });
        }
    }
    out.push(*last);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::native::{decode, encode, Dimension, NativeGeometry, ParserChecks, Shape};
    use crate::test::point::p0;
    use crate::test::polygon::p0 as square;
    use crate::test::wkb::{to_geo, wkb_array};
    use approx::assert_relative_eq;
    use geo::line_string;

    #[test]
    fn equator_is_split_evenly() {
        let line = line_string![(x: 0., y: 0.), (x: 10., y: 0.)];
        let arr = wkb_array::<i32>(vec![Some(line.into()), None, Some(p0().into())]);
        let out = arr.geodetic_segmentize(3f64.to_radians()).unwrap();
        assert_eq!(out.metadata().edges, Some(Edges::Spherical));

        let geoms = to_geo(&out);
        match &geoms[0] {
            Some(geo::Geometry::LineString(ls)) => {
                assert_eq!(ls.0.len(), 5);
                assert_relative_eq!(ls.0[1].x, 2.5, epsilon = 1e-9);
                assert_relative_eq!(ls.0[1].y, 0., epsilon = 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(geoms[1].is_none());
        assert_eq!(geoms[2], Some(p0().into()));
    }

    #[test]
    fn no_segment_exceeds_limit() {
        let arr = wkb_array::<i32>(vec![Some(square().into())]);
        let max = 1f64.to_radians();
        let out = arr.geodetic_segmentize(max).unwrap();
        let geoms = decode(&out, ParserChecks::ALL).unwrap();
        match geoms[0].as_ref().map(|g| g.shape()) {
            Some(Shape::Polygon(rings)) => {
                assert!(rings[0].len() > 40);
                for w in rings[0].windows(2) {
                    assert!(arc_length(&to_vec3(&w[0]), &to_vec3(&w[1])) <= max + 1e-12);
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn z_is_interpolated() {
        let line = NativeGeometry::new(
            Shape::LineString(vec![Coord::xyz(0., 0., 0.), Coord::xyz(3.5, 0., 100.)]),
            Dimension::XYZ,
        );
        let arr = encode::<i32>(vec![Some(line)]).unwrap();
        let out = arr.geodetic_segmentize(1f64.to_radians()).unwrap();
        let geoms = decode(&out, ParserChecks::NONE).unwrap();
        match geoms[0].as_ref().map(|g| g.shape()) {
            Some(Shape::LineString(coords)) => {
                assert_eq!(coords.len(), 5);
                assert_relative_eq!(coords[2].z.unwrap(), 50., epsilon = 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_length() {
        let arr = wkb_array::<i32>(vec![Some(p0().into())]);
        assert!(matches!(
            arr.geodetic_segmentize(0.),
            Err(GeoArrowError::Precondition(_))
        ));
        assert!(arr.geodetic_segmentize(f64::NAN).is_err());
    }

    #[test]
    fn antipodal_edge_fails() {
        let arr = wkb_array::<i32>(vec![
            Some(line_string![(x: 0., y: 0.), (x: 1., y: 0.)].into()),
            Some(line_string![(x: 0., y: 0.), (x: 180., y: 0.)].into()),
        ]);
        let err = arr.geodetic_segmentize(1f64.to_radians()).unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert!(err.to_string().contains("antipodal"));
    }

    #[test]
    fn tiny_length_is_rejected() {
        let arr = wkb_array::<i32>(vec![Some(
            line_string![(x: 0., y: 0.), (x: 10., y: 0.)].into(),
        )]);
        let err = arr.geodetic_segmentize(1e-300).unwrap_err();
        assert_eq!(err.index(), Some(0));
        assert!(err.to_string().contains("Computation failed"));
    }
}
