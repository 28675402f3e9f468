//! Bindings to the [`geos`] crate for validity repair and splitting.
//!
//! Geometries cross into GEOS as EWKB and come back through the regular WKB reader, so the
//! SRID of the input is kept. GEOS may drop M values.

mod make_valid;
mod split;

pub use make_valid::MakeValid;
pub use split::Split;

use geos::Geom;

use crate::error::Result;
use crate::io::wkb::{read_wkb, wkb_size, write_wkb, WKBFlavor};
use crate::native::{NativeGeometry, ParserChecks};

pub(crate) fn to_geos(geom: &NativeGeometry) -> Result<geos::Geometry> {
    let mut buf = Vec::with_capacity(wkb_size(geom, WKBFlavor::Extended));
    write_wkb(&mut buf, geom, WKBFlavor::Extended)?;
    Ok(geos::Geometry::new_from_wkb(&buf)?)
}

pub(crate) fn from_geos(geom: &impl Geom) -> Result<NativeGeometry> {
    let buf = geom.to_wkb()?;
    read_wkb(buf.as_ref(), ParserChecks::NONE)
}

/// The version of the linked GEOS library.
pub fn geos_version() -> Result<String> {
    Ok(geos::version()?)
}
