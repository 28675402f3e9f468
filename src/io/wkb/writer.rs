use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{GeoArrowError, Result};
use crate::io::wkb::{Endianness, WKBGeometryType, WKBType};
use crate::native::{Coord, Dimension, NativeGeometry, Shape};

/// Which WKB dialect to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WKBFlavor {
    /// OGC ISO WKB: dimensions in the type code, no SRID.
    Iso,
    /// PostGIS EWKB: dimension and SRID flags in the high bits.
    #[default]
    Extended,
}

const HEADER_BYTES: usize = 1 + 4;

fn coords_size(coords: &[Coord], dim: Dimension) -> usize {
    4 + coords.len() * dim.size() * 8
}

fn rings_size(rings: &[Vec<Coord>], dim: Dimension) -> usize {
    4 + rings.iter().map(|r| coords_size(r, dim)).sum::<usize>()
}

fn shape_size(shape: &Shape, dim: Dimension) -> usize {
    HEADER_BYTES
        + match shape {
            Shape::Point(_) => dim.size() * 8,
            Shape::LineString(coords) => coords_size(coords, dim),
            Shape::Polygon(rings) => rings_size(rings, dim),
            Shape::MultiPoint(coords) => 4 + coords.len() * (HEADER_BYTES + dim.size() * 8),
            Shape::MultiLineString(lines) => {
                4 + lines
                    .iter()
                    .map(|l| HEADER_BYTES + coords_size(l, dim))
                    .sum::<usize>()
            }
            Shape::MultiPolygon(polygons) => {
                4 + polygons
                    .iter()
                    .map(|p| HEADER_BYTES + rings_size(p, dim))
                    .sum::<usize>()
            }
            Shape::GeometryCollection(shapes) => {
                4 + shapes.iter().map(|s| shape_size(s, dim)).sum::<usize>()
            }
        }
}

/// The number of bytes [`write_wkb`] will produce for this geometry.
pub fn wkb_size(geom: &NativeGeometry, flavor: WKBFlavor) -> usize {
    let srid = match (flavor, geom.srid()) {
        (WKBFlavor::Extended, Some(_)) => 4,
        _ => 0,
    };
    shape_size(geom.shape(), geom.dim()) + srid
}

/// Write a geometry as little-endian WKB of the given flavor.
///
/// With [`WKBFlavor::Extended`] the SRID, when present, is written on the outermost record only.
pub fn write_wkb<W: Write>(writer: &mut W, geom: &NativeGeometry, flavor: WKBFlavor) -> Result<()> {
    let srid = match flavor {
        WKBFlavor::Extended => geom.srid(),
        WKBFlavor::Iso => None,
    };
    ShapeWriter {
        writer,
        dim: geom.dim(),
        flavor,
    }
    .write_shape(geom.shape(), srid)
}

struct ShapeWriter<'a, W: Write> {
    writer: &'a mut W,
    dim: Dimension,
    flavor: WKBFlavor,
}

fn checked_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| GeoArrowError::Overflow)
}

impl<'a, W: Write> ShapeWriter<'a, W> {
    fn write_header(&mut self, geometry_type: WKBGeometryType, srid: Option<i32>) -> Result<()> {
        let ty = WKBType {
            geometry_type,
            dim: self.dim,
            has_srid: srid.is_some(),
        };
        self.writer.write_u8(Endianness::LittleEndian.into())?;
        let raw = match self.flavor {
            WKBFlavor::Iso => ty.to_iso(),
            WKBFlavor::Extended => ty.to_ewkb(),
        };
        self.writer.write_u32::<LittleEndian>(raw)?;
        if let Some(srid) = srid {
            self.writer.write_i32::<LittleEndian>(srid)?;
        }
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(checked_len(len)?)?;
        Ok(())
    }

    fn write_coord(&mut self, coord: &Coord) -> Result<()> {
        self.writer.write_f64::<LittleEndian>(coord.x)?;
        self.writer.write_f64::<LittleEndian>(coord.y)?;
        if self.dim.has_z() {
            self.writer
                .write_f64::<LittleEndian>(coord.z.unwrap_or(f64::NAN))?;
        }
        if self.dim.has_m() {
            self.writer
                .write_f64::<LittleEndian>(coord.m.unwrap_or(f64::NAN))?;
        }
        Ok(())
    }

    fn write_coords(&mut self, coords: &[Coord]) -> Result<()> {
        self.write_len(coords.len())?;
        coords.iter().try_for_each(|c| self.write_coord(c))
    }

    fn write_rings(&mut self, rings: &[Vec<Coord>]) -> Result<()> {
        self.write_len(rings.len())?;
        rings.iter().try_for_each(|r| self.write_coords(r))
    }

    fn write_shape(&mut self, shape: &Shape, srid: Option<i32>) -> Result<()> {
        match shape {
            Shape::Point(coord) => {
                self.write_header(WKBGeometryType::Point, srid)?;
                let empty = Coord {
                    x: f64::NAN,
                    y: f64::NAN,
                    z: None,
                    m: None,
                };
                self.write_coord(coord.as_ref().unwrap_or(&empty))
            }
            Shape::LineString(coords) => {
                self.write_header(WKBGeometryType::LineString, srid)?;
                self.write_coords(coords)
            }
            Shape::Polygon(rings) => {
                self.write_header(WKBGeometryType::Polygon, srid)?;
                self.write_rings(rings)
            }
            Shape::MultiPoint(coords) => {
                self.write_header(WKBGeometryType::MultiPoint, srid)?;
                self.write_len(coords.len())?;
                for coord in coords {
                    self.write_header(WKBGeometryType::Point, None)?;
                    self.write_coord(coord)?;
                }
                Ok(())
            }
            Shape::MultiLineString(lines) => {
                self.write_header(WKBGeometryType::MultiLineString, srid)?;
                self.write_len(lines.len())?;
                for line in lines {
                    self.write_header(WKBGeometryType::LineString, None)?;
                    self.write_coords(line)?;
                }
                Ok(())
            }
            Shape::MultiPolygon(polygons) => {
                self.write_header(WKBGeometryType::MultiPolygon, srid)?;
                self.write_len(polygons.len())?;
                for rings in polygons {
                    self.write_header(WKBGeometryType::Polygon, None)?;
                    self.write_rings(rings)?;
                }
                Ok(())
            }
            Shape::GeometryCollection(shapes) => {
                self.write_header(WKBGeometryType::GeometryCollection, srid)?;
                self.write_len(shapes.len())?;
                shapes.iter().try_for_each(|s| self.write_shape(s, None))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io::wkb::read_wkb;
    use crate::native::ParserChecks;
    use crate::test::polygon::p0;
    use crate::test::wkb::hex_to_bytes;

    fn write(geom: &NativeGeometry, flavor: WKBFlavor) -> Vec<u8> {
        let mut buf = Vec::with_capacity(wkb_size(geom, flavor));
        write_wkb(&mut buf, geom, flavor).unwrap();
        assert_eq!(buf.len(), wkb_size(geom, flavor));
        buf
    }

    #[test]
    fn point_bytes() {
        let geom = NativeGeometry::new(Shape::Point(Some(Coord::xy(1., 2.))), Dimension::XY);
        assert_eq!(
            write(&geom, WKBFlavor::Iso),
            hex_to_bytes("0101000000000000000000F03F0000000000000040")
        );
    }

    #[test]
    fn ewkb_keeps_srid_and_z() {
        let geom = NativeGeometry::new(
            Shape::Point(Some(Coord::xyz(1., 2., 3.))),
            Dimension::XYZ,
        )
        .with_srid(Some(4326));
        let buf = write(&geom, WKBFlavor::Extended);
        assert_eq!(
            buf,
            hex_to_bytes("01010000A0E6100000000000000000F03F00000000000000400000000000000840")
        );
        assert_eq!(read_wkb(&buf, ParserChecks::ALL).unwrap(), geom);

        // ISO has nowhere to put the SRID
        let iso = read_wkb(&write(&geom, WKBFlavor::Iso), ParserChecks::ALL).unwrap();
        assert_eq!(iso.srid(), None);
        assert_eq!(iso.dim(), Dimension::XYZ);
    }

    #[test]
    fn nested_collection_round_trip() {
        let geom = NativeGeometry::new(
            Shape::GeometryCollection(vec![
                Shape::from_geo(&p0().into()),
                Shape::MultiPoint(vec![Coord::xy(0., 0.), Coord::xy(5., 5.)]),
                Shape::Point(None),
            ]),
            Dimension::XY,
        );
        let buf = write(&geom, WKBFlavor::Extended);
        assert_eq!(read_wkb(&buf, ParserChecks::ALL).unwrap(), geom);
    }
}
