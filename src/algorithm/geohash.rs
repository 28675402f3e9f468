use arrow_array::builder::GenericStringBuilder;
use arrow_array::{GenericStringArray, OffsetSizeTrait};
use geo::{coord, Coord, Rect};
use geohash::encode;
use tracing::{debug, warn};

use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::native::{decode, NativeGeometry, ParserChecks};

/// The longest geohash supported, which is the limit of the [`geohash`] crate.
///
/// PostGIS-style engines go up to 20 characters; longer requests are truncated to this.
pub const MAX_PRECISION: usize = 12;

/// Encode the center of each geometry's bounding box as a geohash.
///
/// A positive `precision` is the number of characters, capped at [`MAX_PRECISION`]. Zero or a
/// negative value picks the longest geohash whose cell still contains the whole bounding box,
/// which is the empty string for geometries spanning cells at the coarsest level. Either way a
/// point gets at most [`MAX_PRECISION`] characters.
pub trait GeohashEncode {
    type Output<S: OffsetSizeTrait>;

    fn geohash<S: OffsetSizeTrait>(&self, precision: i32) -> Self::Output<S>;
}

impl<O: OffsetSizeTrait> GeohashEncode for WKBArray<O> {
    type Output<S: OffsetSizeTrait> = Result<GenericStringArray<S>>;

    fn geohash<S: OffsetSizeTrait>(&self, precision: i32) -> Self::Output<S> {
        debug!(operation = "geohash", len = self.len(), precision, "running operation");
        let geoms = decode(self, ParserChecks::wkb_default())?;

        let hash_len = usize::try_from(precision).unwrap_or(0).min(MAX_PRECISION);
        let mut builder = GenericStringBuilder::<S>::with_capacity(
            geoms.len(),
            geoms.len() * hash_len.max(1),
        );
        for (i, maybe_geom) in geoms.iter().enumerate() {
            match maybe_geom {
                Some(geom) => {
                    let hash = geometry_geohash(geom, hash_len).map_err(|err| {
                        warn!(operation = "geohash", index = i, %err, "operation failed");
                        err.at_index(i)
                    })?;
                    builder.append_value(hash);
                }
                None => builder.append_null(),
            }
        }
        Ok(builder.finish())
    }
}

fn bounding_rect(geom: &NativeGeometry) -> Option<Rect> {
    let coords = geom.xy_coords();
    let first = coords.first()?;
    let (mut min, mut max) = (*first, *first);
    for c in &coords[1..] {
        min = coord! { x: min.x.min(c.x), y: min.y.min(c.y) };
        max = coord! { x: max.x.max(c.x), y: max.y.max(c.y) };
    }
    Some(Rect::new(min, max))
}

/// The longest geohash shared by both corners of the box.
fn auto_precision(rect: &Rect) -> Result<usize> {
    let lower = encode(rect.min(), MAX_PRECISION)?;
    let upper = encode(rect.max(), MAX_PRECISION)?;
    Ok(lower
        .chars()
        .zip(upper.chars())
        .take_while(|(a, b)| a == b)
        .count())
}

fn geometry_geohash(geom: &NativeGeometry, hash_len: usize) -> Result<String> {
    let rect = bounding_rect(geom).ok_or_else(|| {
        GeoArrowError::ComputationFailed("geohash of an empty geometry".into())
    })?;
    let len = match hash_len {
        0 => auto_precision(&rect)?,
        len => len,
    };
    if len == 0 {
        return Ok(String::new());
    }
    let center: Coord = rect.center();
    Ok(encode(center, len)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::polygon::{p0, p1};
    use crate::test::wkb::wkb_array;
    use arrow_array::{Array, StringArray};
    use geo::point;

    #[test]
    fn encode_points() {
        let arr = wkb_array::<i32>(vec![
            Some(point!(x: -5.6, y: 42.6).into()),
            None,
        ]);
        let hashes: StringArray = arr.geohash::<i32>(5).unwrap();
        assert_eq!(hashes.value(0), "ezs42");
        assert!(hashes.is_null(1));
    }

    #[test]
    fn precision_is_capped() {
        let arr = wkb_array::<i32>(vec![Some(point!(x: -5.6, y: 42.6).into())]);
        let hashes: StringArray = arr.geohash::<i32>(40).unwrap();
        assert_eq!(hashes.value(0).len(), MAX_PRECISION);
        assert!(hashes.value(0).starts_with("ezs42"));
    }

    #[test]
    fn automatic_precision() {
        let arr = wkb_array::<i64>(vec![
            Some(point!(x: -5.6, y: 42.6).into()),
            Some(p0().into()),
            Some(p1().into()),
        ]);
        let hashes = arr.geohash::<i64>(0).unwrap();
        // A point fits the smallest cell
        assert_eq!(hashes.value(0).len(), MAX_PRECISION);
        assert_eq!(hashes.value(1), "s");
        // Straddles the first-level cells around the origin
        assert_eq!(hashes.value(2), "");
    }

    #[test]
    fn empty_geometry_fails() {
        let arr = wkb_array::<i32>(vec![
            Some(point!(x: 0., y: 0.).into()),
            Some(geo::MultiPoint::<f64>::new(vec![]).into()),
        ]);
        let err = arr.geohash::<i32>(5).unwrap_err();
        assert_eq!(err.index(), Some(1));
    }
}
