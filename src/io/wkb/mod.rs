//! Reading WKB and EWKB, writing ISO WKB or EWKB.
//!
//! The reader accepts both byte orders, ISO dimension codes (`+1000`, `+2000`, `+3000`) and
//! PostGIS EWKB flags, including an embedded SRID. Curved and surface types are rejected.

mod reader;
mod writer;

pub use reader::read_wkb;
pub use writer::{wkb_size, write_wkb, WKBFlavor};

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{GeoArrowError, Result};
use crate::native::Dimension;

/// EWKB flag for geometries with elevation.
pub(crate) const EWKB_Z_FLAG: u32 = 0x8000_0000;
/// EWKB flag for geometries with a measure.
pub(crate) const EWKB_M_FLAG: u32 = 0x4000_0000;
/// EWKB flag for geometries followed by a 4-byte SRID.
pub(crate) const EWKB_SRID_FLAG: u32 = 0x2000_0000;

/// The base geometry types of OGC simple features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum WKBGeometryType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

/// Byte order marker of a WKB record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    BigEndian,
    LittleEndian,
}

impl TryFrom<u8> for Endianness {
    type Error = GeoArrowError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Endianness::BigEndian),
            1 => Ok(Endianness::LittleEndian),
            other => Err(GeoArrowError::Wkb(
                format!("unexpected byte order marker {other}").into(),
            )),
        }
    }
}

impl From<Endianness> for u8 {
    fn from(value: Endianness) -> Self {
        use Endianness::*;
        match value {
            BigEndian => 0,
            LittleEndian => 1,
        }
    }
}

/// A decoded WKB type word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WKBType {
    pub geometry_type: WKBGeometryType,
    pub dim: Dimension,
    pub has_srid: bool,
}

impl WKBType {
    /// Decode a raw type word in either the ISO or the EWKB convention.
    pub fn from_raw(raw: u32) -> Result<Self> {
        let ewkb_z = raw & EWKB_Z_FLAG != 0;
        let ewkb_m = raw & EWKB_M_FLAG != 0;
        let has_srid = raw & EWKB_SRID_FLAG != 0;
        let code = raw & 0x0FFF_FFFF;

        let (iso_z, iso_m) = match code / 1000 {
            0 => (false, false),
            1 => (true, false),
            2 => (false, true),
            3 => (true, true),
            _ => {
                return Err(GeoArrowError::Wkb(
                    format!("unknown geometry type {raw}").into(),
                ))
            }
        };

        let base = code % 1000;
        let geometry_type = WKBGeometryType::try_from(base).map_err(|_| match base {
            8..=17 => GeoArrowError::NotYetImplemented(format!(
                "curved and surface geometry types (WKB type {base})"
            )),
            _ => GeoArrowError::Wkb(format!("unknown geometry type {raw}").into()),
        })?;

        Ok(Self {
            geometry_type,
            dim: Dimension::from_flags(ewkb_z || iso_z, ewkb_m || iso_m),
            has_srid,
        })
    }

    /// Encode as an EWKB type word.
    pub fn to_ewkb(self) -> u32 {
        let mut raw: u32 = self.geometry_type.into();
        if self.dim.has_z() {
            raw |= EWKB_Z_FLAG;
        }
        if self.dim.has_m() {
            raw |= EWKB_M_FLAG;
        }
        if self.has_srid {
            raw |= EWKB_SRID_FLAG;
        }
        raw
    }

    /// Encode as an ISO type word.
    pub fn to_iso(self) -> u32 {
        let base: u32 = self.geometry_type.into();
        let offset = match self.dim {
            Dimension::XY => 0,
            Dimension::XYZ => 1000,
            Dimension::XYM => 2000,
            Dimension::XYZM => 3000,
        };
        base + offset
    }
}
