use std::sync::Arc;

use arrow_array::OffsetSizeTrait;
use proj::Proj;

use crate::algorithm::native::try_map_geometries;
use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::metadata::ArrayMetadata;

/// Reproject an array using PROJ.
///
/// `definitions` holds the source and the target projection, in that order, as anything PROJ
/// accepts (`EPSG:4326`, a PROJ string, WKT). Only X and Y are transformed. The output array
/// carries the target definition as its CRS and its geometries lose any SRID.
pub trait Transform {
    type Output;

    fn transform(&self, definitions: &[&str]) -> Self::Output;
}

fn validate(definition: &str, role: &'static str) -> Result<()> {
    Proj::new(definition)
        .map(|_| ())
        .map_err(|_| GeoArrowError::InvalidProjection {
            role,
            definition: definition.to_string(),
        })
}

impl<O: OffsetSizeTrait> Transform for WKBArray<O> {
    type Output = Result<WKBArray<O>>;

    fn transform(&self, definitions: &[&str]) -> Self::Output {
        let [source, target] = definitions else {
            return Err(GeoArrowError::Precondition(
                format!(
                    "transform needs a source and a target definition, got {}",
                    definitions.len()
                )
                .into(),
            ));
        };
        validate(source, "source")?;
        validate(target, "target")?;
        let proj = Proj::new_known_crs(source, target, None)
            .map_err(|err| GeoArrowError::General(err.to_string()))?;

        let output = try_map_geometries(self, "transform", |mut geom| {
            geom.try_for_each_coord_mut(|c| {
                if c.is_empty() {
                    return Ok(());
                }
                (c.x, c.y) = proj.convert((c.x, c.y))?;
                Ok(())
            })?;
            Ok(geom.with_srid(None))
        })?;
        Ok(output.with_metadata(Arc::new(ArrayMetadata::from_proj_string(*target))))
    }
}
