use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use tracing::trace;

use crate::error::{GeoArrowError, Result};
use crate::io::wkb::{Endianness, WKBGeometryType, WKBType};
use crate::native::{Coord, Dimension, NativeGeometry, ParserChecks, Shape};

/// Parse one WKB or EWKB record into a [`NativeGeometry`], applying `checks` afterwards.
///
/// Trailing bytes after the record are ignored.
pub fn read_wkb(buf: &[u8], checks: ParserChecks) -> Result<NativeGeometry> {
    let mut reader = WKBReader::new(buf);
    let (shape, ty, srid) = reader.read_geometry(None)?;
    trace!(
        geometry_type = shape.type_name(),
        bytes = buf.len(),
        "parsed WKB"
    );
    checks.validate(&shape)?;
    Ok(NativeGeometry::new(shape, ty.dim).with_srid(srid))
}

struct WKBReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

fn eof(_: std::io::Error) -> GeoArrowError {
    GeoArrowError::Wkb("unexpected end of buffer".into())
}

impl<'a> WKBReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn read_u32(&mut self, byte_order: Endianness) -> Result<u32> {
        match byte_order {
            Endianness::BigEndian => self.cursor.read_u32::<BigEndian>().map_err(eof),
            Endianness::LittleEndian => self.cursor.read_u32::<LittleEndian>().map_err(eof),
        }
    }

    fn read_f64(&mut self, byte_order: Endianness) -> Result<f64> {
        match byte_order {
            Endianness::BigEndian => self.cursor.read_f64::<BigEndian>().map_err(eof),
            Endianness::LittleEndian => self.cursor.read_f64::<LittleEndian>().map_err(eof),
        }
    }

    /// Read a count and make sure the buffer can plausibly hold that many items of at least
    /// `min_item_bytes` each, so corrupt counts can't trigger huge allocations.
    fn read_count(&mut self, byte_order: Endianness, min_item_bytes: usize) -> Result<usize> {
        let count = self.read_u32(byte_order)? as usize;
        if count.saturating_mul(min_item_bytes) > self.remaining() {
            return Err(GeoArrowError::Wkb(
                format!("count {count} exceeds the remaining buffer").into(),
            ));
        }
        Ok(count)
    }

    fn read_coord(&mut self, byte_order: Endianness, dim: Dimension) -> Result<Coord> {
        let x = self.read_f64(byte_order)?;
        let y = self.read_f64(byte_order)?;
        let z = match dim.has_z() {
            true => Some(self.read_f64(byte_order)?),
            false => None,
        };
        let m = match dim.has_m() {
            true => Some(self.read_f64(byte_order)?),
            false => None,
        };
        Ok(Coord { x, y, z, m })
    }

    fn read_coords(&mut self, byte_order: Endianness, dim: Dimension) -> Result<Vec<Coord>> {
        let num_coords = self.read_count(byte_order, dim.size() * 8)?;
        let mut coords = Vec::with_capacity(num_coords);
        for _ in 0..num_coords {
            coords.push(self.read_coord(byte_order, dim)?);
        }
        Ok(coords)
    }

    fn read_rings(&mut self, byte_order: Endianness, dim: Dimension) -> Result<Vec<Vec<Coord>>> {
        let num_rings = self.read_count(byte_order, 4)?;
        let mut rings = Vec::with_capacity(num_rings);
        for _ in 0..num_rings {
            rings.push(self.read_coords(byte_order, dim)?);
        }
        Ok(rings)
    }

    /// Read the byte order, type word and optional SRID of a record.
    fn read_header(&mut self) -> Result<(Endianness, WKBType, Option<i32>)> {
        let byte_order = Endianness::try_from(self.cursor.read_u8().map_err(eof)?)?;
        let ty = WKBType::from_raw(self.read_u32(byte_order)?)?;
        let srid = match ty.has_srid {
            true => Some(self.read_u32(byte_order)? as i32),
            false => None,
        };
        Ok((byte_order, ty, srid))
    }

    /// Read a nested record of the expected type and dimension.
    fn read_member(
        &mut self,
        expected: WKBGeometryType,
        dim: Dimension,
    ) -> Result<(Endianness, WKBType)> {
        let (byte_order, ty, _) = self.read_header()?;
        if ty.geometry_type != expected {
            return Err(GeoArrowError::Wkb(
                format!(
                    "expected {expected:?} inside a multi geometry, found {:?}",
                    ty.geometry_type
                )
                .into(),
            ));
        }
        check_dim(ty.dim, dim)?;
        Ok((byte_order, ty))
    }

    fn read_geometry(
        &mut self,
        parent_dim: Option<Dimension>,
    ) -> Result<(Shape, WKBType, Option<i32>)> {
        let (byte_order, ty, srid) = self.read_header()?;
        if let Some(parent_dim) = parent_dim {
            check_dim(ty.dim, parent_dim)?;
        }
        let dim = ty.dim;

        let shape = match ty.geometry_type {
            WKBGeometryType::Point => {
                let coord = self.read_coord(byte_order, dim)?;
                Shape::Point((!coord.is_empty()).then_some(coord))
            }
            WKBGeometryType::LineString => Shape::LineString(self.read_coords(byte_order, dim)?),
            WKBGeometryType::Polygon => Shape::Polygon(self.read_rings(byte_order, dim)?),
            WKBGeometryType::MultiPoint => {
                let num_points = self.read_count(byte_order, 5 + dim.size() * 8)?;
                let mut coords = Vec::with_capacity(num_points);
                for _ in 0..num_points {
                    let (byte_order, _) = self.read_member(WKBGeometryType::Point, dim)?;
                    coords.push(self.read_coord(byte_order, dim)?);
                }
                Shape::MultiPoint(coords)
            }
            WKBGeometryType::MultiLineString => {
                let num_lines = self.read_count(byte_order, 9)?;
                let mut lines = Vec::with_capacity(num_lines);
                for _ in 0..num_lines {
                    let (byte_order, _) = self.read_member(WKBGeometryType::LineString, dim)?;
                    lines.push(self.read_coords(byte_order, dim)?);
                }
                Shape::MultiLineString(lines)
            }
            WKBGeometryType::MultiPolygon => {
                let num_polygons = self.read_count(byte_order, 9)?;
                let mut polygons = Vec::with_capacity(num_polygons);
                for _ in 0..num_polygons {
                    let (byte_order, _) = self.read_member(WKBGeometryType::Polygon, dim)?;
                    polygons.push(self.read_rings(byte_order, dim)?);
                }
                Shape::MultiPolygon(polygons)
            }
            WKBGeometryType::GeometryCollection => {
                let num_geoms = self.read_count(byte_order, 5)?;
                let mut shapes = Vec::with_capacity(num_geoms);
                for _ in 0..num_geoms {
                    let (shape, _, _) = self.read_geometry(Some(dim))?;
                    shapes.push(shape);
                }
                Shape::GeometryCollection(shapes)
            }
        };

        Ok((shape, ty, srid))
    }
}

fn check_dim(found: Dimension, expected: Dimension) -> Result<()> {
    if found != expected {
        return Err(GeoArrowError::Wkb(
            format!("mixed dimensionality: {found:?} inside {expected:?}").into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::wkb::{hex_to_bytes, iso_wkb};
    use geo::{line_string, point, Geometry};

    #[test]
    fn little_endian_point() {
        // POINT (1 2)
        let buf = hex_to_bytes("0101000000000000000000F03F0000000000000040");
        let geom = read_wkb(&buf, ParserChecks::NONE).unwrap();
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::xy(1., 2.))));
        assert_eq!(geom.dim(), Dimension::XY);
        assert_eq!(geom.srid(), None);
    }

    #[test]
    fn big_endian_point() {
        let buf = hex_to_bytes("00000000013FF00000000000004000000000000000");
        let geom = read_wkb(&buf, ParserChecks::NONE).unwrap();
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::xy(1., 2.))));
    }

    #[test]
    fn ewkb_point_with_srid_and_z() {
        // SRID=4326;POINT Z (1 2 3)
        let buf = hex_to_bytes("01010000A0E6100000000000000000F03F00000000000000400000000000000840");
        let geom = read_wkb(&buf, ParserChecks::NONE).unwrap();
        assert_eq!(geom.srid(), Some(4326));
        assert_eq!(geom.dim(), Dimension::XYZ);
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::xyz(1., 2., 3.))));
    }

    #[test]
    fn empty_point() {
        // POINT EMPTY
        let buf = hex_to_bytes("0101000000000000000000F87F000000000000F87F");
        let geom = read_wkb(&buf, ParserChecks::ALL).unwrap();
        assert!(geom.is_empty());
    }

    #[test]
    fn line_string() {
        let geom: Geometry = line_string![(x: 0., y: 0.), (x: 1., y: 1.)].into();
        let parsed = read_wkb(&iso_wkb(&geom), ParserChecks::ALL).unwrap();
        assert_eq!(parsed.to_geo(), geom);
    }

    #[test]
    fn truncated() {
        let geom: Geometry = point!(x: 1., y: 2.).into();
        let buf = iso_wkb(&geom);
        let err = read_wkb(&buf[..buf.len() - 3], ParserChecks::NONE).unwrap_err();
        assert!(err.to_string().contains("unexpected end of buffer"));
    }

    #[test]
    fn corrupt_count() {
        // LineString claiming u32::MAX points
        let buf = hex_to_bytes("0102000000FFFFFFFF");
        assert!(read_wkb(&buf, ParserChecks::NONE).is_err());
    }

    #[test]
    fn checks_are_applied() {
        // LINESTRING with a single point
        let buf = hex_to_bytes("010200000001000000000000000000F03F0000000000000040");
        assert!(read_wkb(&buf, ParserChecks::NONE).is_ok());
        assert!(read_wkb(&buf, ParserChecks::MINPOINTS).is_err());
    }
}
