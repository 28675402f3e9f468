use arrow_array::builder::Float64Builder;
use arrow_array::{Float64Array, OffsetSizeTrait};
use geographiclib_rs::InverseGeodesic;
use tracing::debug;

use crate::algorithm::geodetic::Spheroid;
use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::native::{decode, Coord, NativeGeometry, ParserChecks, Shape};

/// The forward azimuth between consecutive points on an ellipsoid.
///
/// An array of `N` points yields `N - 1` bearings, one per consecutive pair, in degrees
/// clockwise from north in `[0, 360)`. A pair with a null slot gives a null bearing.
pub trait GeodeticAzimuth {
    type Output;

    fn geodetic_azimuth(&self, spheroid: &Spheroid) -> Self::Output;
}

fn as_point(geom: &NativeGeometry) -> Result<Coord> {
    match geom.shape() {
        Shape::Point(Some(coord)) => Ok(*coord),
        Shape::Point(None) => Err(GeoArrowError::IncorrectType(
            "azimuth needs non-empty points".into(),
        )),
        other => Err(GeoArrowError::IncorrectType(
            format!("azimuth needs points, got {}", other.type_name()).into(),
        )),
    }
}

impl<O: OffsetSizeTrait> GeodeticAzimuth for WKBArray<O> {
    type Output = Result<Float64Array>;

    fn geodetic_azimuth(&self, spheroid: &Spheroid) -> Self::Output {
        if self.len() < 2 {
            return Err(GeoArrowError::Precondition(
                format!("bearing needs at least 2 points, got {}", self.len()).into(),
            ));
        }
        debug!(operation = "geodetic_azimuth", len = self.len(), "running operation");

        let points = decode(self, ParserChecks::wkb_default())?
            .iter()
            .enumerate()
            .map(|(i, maybe_geom)| {
                maybe_geom
                    .as_ref()
                    .map(as_point)
                    .transpose()
                    .map_err(|err| err.at_index(i))
            })
            .collect::<Result<Vec<_>>>()?;

        let geod = spheroid.geodesic();
        let mut output_array = Float64Builder::with_capacity(points.len() - 1);
        for pair in points.windows(2) {
            match (&pair[0], &pair[1]) {
                (Some(a), Some(b)) => {
                    let (_s12, azi1, _azi2, _a12): (f64, f64, f64, f64) =
                        geod.inverse(a.y, a.x, b.y, b.x);
                    output_array.append_value(normalize_degrees(azi1));
                }
                _ => output_array.append_null(),
            }
        }
        Ok(output_array.finish())
    }
}

/// Map an angle in degrees to `[0, 360)`.
fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.);
    // rem_euclid can round up to exactly 360 for tiny negative input
    if normalized >= 360. {
        0.
    } else {
        normalized
    }
}
