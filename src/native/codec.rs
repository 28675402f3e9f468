use arrow_array::{Array, OffsetSizeTrait};
use tracing::{debug, warn};

use crate::array::{WKBArray, WKBBuilder};
use crate::error::Result;
use crate::io::wkb::read_wkb;
use crate::native::{NativeGeometry, ParserChecks};

/// Decode every slot of a WKB array into an owned geometry.
///
/// Null slots decode to `None`. On the first malformed slot the whole call fails with
/// [`GeoArrowError::AtIndex`](crate::error::GeoArrowError::AtIndex) naming that slot, and
/// everything decoded so far is dropped.
pub fn decode<O: OffsetSizeTrait>(
    array: &WKBArray<O>,
    checks: ParserChecks,
) -> Result<Vec<Option<NativeGeometry>>> {
    debug!(len = array.len(), ?checks, "decoding WKB array");
    array
        .iter()
        .enumerate()
        .map(|(i, maybe_buf)| {
            maybe_buf
                .map(|buf| read_wkb(buf, checks))
                .transpose()
                .map_err(|err| {
                    warn!(index = i, %err, "failed to decode WKB");
                    err.at_index(i)
                })
        })
        .collect()
}

/// Decode a `Binary` or `LargeBinary` Arrow array of WKB.
pub fn decode_array(array: &dyn Array, checks: ParserChecks) -> Result<Vec<Option<NativeGeometry>>> {
    decode(&WKBArray::<i64>::try_from(array)?, checks)
}

/// Encode owned geometries into a WKB array of little-endian EWKB.
///
/// The geometries are consumed: each one is dropped right after it is written. The output carries
/// empty metadata; attach a CRS with [`WKBArray::with_metadata`].
pub fn encode<O: OffsetSizeTrait>(geoms: Vec<Option<NativeGeometry>>) -> Result<WKBArray<O>> {
    debug!(len = geoms.len(), "encoding EWKB array");
    let mut builder = WKBBuilder::<O>::with_capacity_from_iter(geoms.iter().map(Option::as_ref));
    for (i, geom) in geoms.into_iter().enumerate() {
        builder
            .push_geometry(geom.as_ref())
            .map_err(|err| err.at_index(i))?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::GeoArrowError;
    use crate::native::{Coord, Dimension, Shape};
    use crate::test::wkb::{hex_to_bytes, wkb_array};
    use arrow_array::{BinaryArray, Int32Array};

    #[test]
    fn round_trip_preserves_order_and_nulls() {
        let arr = wkb_array::<i32>(vec![
            Some(crate::test::point::p0().into()),
            None,
            Some(crate::test::polygon::p0().into()),
        ]);
        let geoms = decode(&arr, ParserChecks::wkb_default()).unwrap();
        assert_eq!(geoms.len(), 3);
        assert!(geoms[1].is_none());
        let expected = geoms.clone();

        let encoded = encode::<i64>(geoms).unwrap();
        assert_eq!(encoded.len(), 3);
        assert!(encoded.is_null(1));
        assert_eq!(decode(&encoded, ParserChecks::ALL).unwrap(), expected);
    }

    #[test]
    fn malformed_slot_is_named() {
        let good = hex_to_bytes("0101000000000000000000F03F0000000000000040");
        let input = BinaryArray::from(vec![Some(good.as_slice()), None, Some(&[0x01, 0x01][..])]);
        let err = decode(&WKBArray::from(input), ParserChecks::NONE).unwrap_err();
        assert_eq!(err.index(), Some(2));
        assert!(err.to_string().starts_with("Failed on geometry at index 2"));
    }

    #[test]
    fn srid_survives_encoding() {
        let geom = NativeGeometry::new(Shape::Point(Some(Coord::xy(1., 2.))), Dimension::XY)
            .with_srid(Some(4326));
        let encoded = encode::<i32>(vec![Some(geom.clone())]).unwrap();
        let decoded = decode(&encoded, ParserChecks::NONE).unwrap();
        assert_eq!(decoded[0].as_ref(), Some(&geom));
    }

    #[test]
    fn decode_array_rejects_non_binary() {
        let ints = Int32Array::from(vec![1, 2]);
        assert!(matches!(
            decode_array(&ints, ParserChecks::NONE),
            Err(GeoArrowError::IncorrectType(_))
        ));
    }
}
