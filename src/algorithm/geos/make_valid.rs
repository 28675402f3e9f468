use arrow_array::OffsetSizeTrait;
use geos::Geom;

use crate::algorithm::geos::{from_geos, to_geos};
use crate::algorithm::native::try_map_geometries;
use crate::array::WKBArray;
use crate::error::Result;

/// Repair invalid geometries without losing vertices, using GEOS.
///
/// Valid geometries come back unchanged apart from normalization by GEOS; the repaired result
/// may be of a different type (e.g. a bow-tie polygon becomes a multipolygon).
pub trait MakeValid {
    type Output;

    fn make_valid(&self) -> Self::Output;
}

impl<O: OffsetSizeTrait> MakeValid for WKBArray<O> {
    type Output = Result<WKBArray<O>>;

    fn make_valid(&self) -> Self::Output {
        try_map_geometries(self, "make_valid", |geom| {
            let valid = to_geos(&geom)?.make_valid()?;
            Ok(from_geos(&valid)?.with_srid(geom.srid()))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metadata::ArrayMetadata;
    use crate::test::polygon::p0;
    use crate::test::wkb::{to_geo, wkb_array};
    use approx::assert_relative_eq;
    use geo::{polygon, Area, Geometry};
    use std::sync::Arc;

    #[test]
    fn bow_tie_is_repaired() {
        let bow_tie = polygon![
            (x: 0., y: 0.),
            (x: 2., y: 2.),
            (x: 2., y: 0.),
            (x: 0., y: 2.),
            (x: 0., y: 0.),
        ];
        let metadata = ArrayMetadata::from_authority_code("EPSG:4326").unwrap();
        let arr = wkb_array::<i32>(vec![Some(bow_tie.into()), None, Some(p0().into())])
            .with_metadata(Arc::new(metadata));
        let out = arr.make_valid().unwrap();
        assert_eq!(out.metadata(), arr.metadata());

        let geoms = to_geo(&out);
        match &geoms[0] {
            Some(Geometry::MultiPolygon(mp)) => {
                assert_eq!(mp.0.len(), 2);
                assert_relative_eq!(mp.unsigned_area(), 2., epsilon = 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(geoms[1].is_none());
        assert_relative_eq!(
            geoms[2].as_ref().unwrap().unsigned_area(),
            100.,
            epsilon = 1e-9
        );
    }
}
