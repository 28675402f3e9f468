use arrow_array::types::ArrowPrimitiveType;
use arrow_array::{OffsetSizeTrait, PrimitiveArray};
use arrow_buffer::BufferBuilder;
use tracing::{debug, warn};

use crate::array::WKBArray;
use crate::error::Result;
use crate::native::{decode, encode, NativeGeometry, ParserChecks};

/// Decode `array` and apply a fallible scalar op to every valid slot.
///
/// Null slots stay null. The first failing slot aborts the whole call, wrapped with its index.
// Note: This is derived from arrow-rs' `PrimitiveArray::try_unary`
pub(crate) fn try_unary_primitive<O, T, F>(
    array: &WKBArray<O>,
    name: &'static str,
    mut op: F,
) -> Result<PrimitiveArray<T>>
where
    O: OffsetSizeTrait,
    T: ArrowPrimitiveType,
    F: FnMut(&NativeGeometry) -> Result<T::Native>,
{
    debug!(operation = name, len = array.len(), "running operation");
    let geoms = decode(array, ParserChecks::wkb_default())?;

    let nulls = array.nulls().cloned();
    let mut buffer = BufferBuilder::<T::Native>::new(geoms.len());
    buffer.append_n_zeroed(geoms.len());
    let slice = buffer.as_slice_mut();

    for (i, maybe_geom) in geoms.iter().enumerate() {
        if let Some(geom) = maybe_geom {
            slice[i] = op(geom).map_err(|err| {
                warn!(operation = name, index = i, %err, "operation failed");
                err.at_index(i)
            })?;
        }
    }

    Ok(PrimitiveArray::new(buffer.finish().into(), nulls))
}

/// Decode `array`, replace every valid geometry with the result of `op`, and encode the result.
///
/// The input metadata is copied onto the output.
pub(crate) fn try_map_geometries<O, F>(
    array: &WKBArray<O>,
    name: &'static str,
    mut op: F,
) -> Result<WKBArray<O>>
where
    O: OffsetSizeTrait,
    F: FnMut(NativeGeometry) -> Result<NativeGeometry>,
{
    debug!(operation = name, len = array.len(), "running operation");
    let geoms = decode(array, ParserChecks::wkb_default())?;
    let output = geoms
        .into_iter()
        .enumerate()
        .map(|(i, maybe_geom)| {
            maybe_geom.map(&mut op).transpose().map_err(|err| {
                warn!(operation = name, index = i, %err, "operation failed");
                err.at_index(i)
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(encode::<O>(output)?.with_metadata(array.metadata()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::GeoArrowError;
    use crate::test::point::p0;
    use crate::test::wkb::wkb_array;
    use arrow_array::types::Float64Type;
    use arrow_array::Array;

    #[test]
    fn nulls_propagate() {
        let arr = wkb_array::<i32>(vec![Some(p0().into()), None]);
        let out = try_unary_primitive::<_, Float64Type, _>(&arr, "test", |_| Ok(1.)).unwrap();
        assert_eq!(out.value(0), 1.);
        assert!(out.is_null(1));
    }

    #[test]
    fn failure_names_index() {
        let arr = wkb_array::<i32>(vec![None, Some(p0().into()), Some(p0().into())]);
        let mut calls = 0;
        let err = try_map_geometries(&arr, "test", |_| {
            calls += 1;
            Err(GeoArrowError::ComputationFailed("nope".into()))
        })
        .unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(calls, 1);
    }
}
