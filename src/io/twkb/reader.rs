use arrow_array::{Array, GenericBinaryArray, OffsetSizeTrait};
use tracing::debug;

use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::io::twkb::varint::{decode_signed, decode_varint, zigzag_decode};
use crate::io::wkb::WKBGeometryType;
use crate::native::{encode, Coord, Dimension, NativeGeometry, ParserChecks, Shape};

const BBOX_FLAG: u8 = 0x01;
const SIZE_FLAG: u8 = 0x02;
const IDLIST_FLAG: u8 = 0x04;
const EXTENDED_DIMS_FLAG: u8 = 0x08;
const EMPTY_FLAG: u8 = 0x10;

/// Parse one TWKB record. Every check in [`ParserChecks::ALL`] is applied.
pub fn read_twkb(buf: &[u8]) -> Result<NativeGeometry> {
    let mut reader = TWKBReader { buf, pos: 0 };
    let (shape, dim) = reader.read_geometry()?;
    ParserChecks::ALL.validate(&shape)?;
    Ok(NativeGeometry::new(shape, dim))
}

/// Decode a binary array of TWKB records into a WKB array. Nulls are preserved.
pub fn from_twkb<I: OffsetSizeTrait, O: OffsetSizeTrait>(
    array: &GenericBinaryArray<I>,
) -> Result<WKBArray<O>> {
    debug!(len = array.len(), "decoding TWKB array");
    let geoms = array
        .iter()
        .enumerate()
        .map(|(i, maybe_buf)| {
            maybe_buf
                .map(read_twkb)
                .transpose()
                .map_err(|err| err.at_index(i))
        })
        .collect::<Result<Vec<_>>>()?;
    encode(geoms)
}

/// Per-geometry decoding state. Deltas run across all components of one record.
struct Header {
    dim: Dimension,
    /// Divisors for x/y, z and m.
    scales: [f64; 3],
    has_idlist: bool,
    is_empty: bool,
}

struct TWKBReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> TWKBReader<'a> {
    fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| GeoArrowError::Twkb("unexpected end of buffer".into()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_count(&mut self) -> Result<usize> {
        let count = decode_varint(self.buf, &mut self.pos)? as usize;
        // Every item needs at least one byte
        if count > self.buf.len() - self.pos {
            return Err(GeoArrowError::Twkb(
                format!("count {count} exceeds the remaining buffer").into(),
            ));
        }
        Ok(count)
    }

    fn read_header(&mut self) -> Result<(WKBGeometryType, Header)> {
        let type_and_precision = self.read_u8()?;
        let geometry_type = WKBGeometryType::try_from((type_and_precision & 0x0F) as u32)
            .map_err(|_| {
                GeoArrowError::Twkb(
                    format!("unknown geometry type {}", type_and_precision & 0x0F).into(),
                )
            })?;
        let precision = zigzag_decode((type_and_precision >> 4) as u64);

        let metadata = self.read_u8()?;
        let (dim, z_precision, m_precision) = if metadata & EXTENDED_DIMS_FLAG != 0 {
            let ext = self.read_u8()?;
            let has_z = ext & 0x01 != 0;
            let has_m = ext & 0x02 != 0;
            (
                Dimension::from_flags(has_z, has_m),
                ((ext >> 2) & 0x07) as i32,
                ((ext >> 5) & 0x07) as i32,
            )
        } else {
            (Dimension::XY, 0, 0)
        };

        if metadata & SIZE_FLAG != 0 {
            let size = decode_varint(self.buf, &mut self.pos)? as usize;
            if size > self.buf.len() - self.pos {
                return Err(GeoArrowError::Twkb("unexpected end of buffer".into()));
            }
        }
        let is_empty = metadata & EMPTY_FLAG != 0;
        if metadata & BBOX_FLAG != 0 && !is_empty {
            // min and delta for each ordinate; not needed to rebuild the geometry
            for _ in 0..dim.size() * 2 {
                decode_signed(self.buf, &mut self.pos)?;
            }
        }

        let header = Header {
            dim,
            scales: [
                10f64.powi(precision as i32),
                10f64.powi(z_precision),
                10f64.powi(m_precision),
            ],
            has_idlist: metadata & IDLIST_FLAG != 0,
            is_empty,
        };
        Ok((geometry_type, header))
    }

    fn read_coord(&mut self, header: &Header, prev: &mut [i64; 4]) -> Result<Coord> {
        let mut ordinates = [0f64; 4];
        for (i, ordinate) in ordinates.iter_mut().take(header.dim.size()).enumerate() {
            prev[i] = prev[i]
                .checked_add(decode_signed(self.buf, &mut self.pos)?)
                .ok_or(GeoArrowError::Overflow)?;
            let scale = match (i, header.dim) {
                (0 | 1, _) => header.scales[0],
                (2, Dimension::XYM) => header.scales[2],
                (2, _) => header.scales[1],
                _ => header.scales[2],
            };
            *ordinate = prev[i] as f64 / scale;
        }
        let mut coord = Coord::xy(ordinates[0], ordinates[1]);
        match header.dim {
            Dimension::XY => {}
            Dimension::XYZ => coord.z = Some(ordinates[2]),
            Dimension::XYM => coord.m = Some(ordinates[2]),
            Dimension::XYZM => {
                coord.z = Some(ordinates[2]);
                coord.m = Some(ordinates[3]);
            }
        }
        Ok(coord)
    }

    fn read_coords(&mut self, header: &Header, prev: &mut [i64; 4]) -> Result<Vec<Coord>> {
        let num_coords = self.read_count()?;
        (0..num_coords)
            .map(|_| self.read_coord(header, prev))
            .collect()
    }

    fn read_rings(&mut self, header: &Header, prev: &mut [i64; 4]) -> Result<Vec<Vec<Coord>>> {
        let num_rings = self.read_count()?;
        (0..num_rings)
            .map(|_| self.read_coords(header, prev))
            .collect()
    }

    fn read_multi_count(&mut self, header: &Header) -> Result<usize> {
        let count = self.read_count()?;
        if header.has_idlist {
            for _ in 0..count {
                decode_signed(self.buf, &mut self.pos)?;
            }
        }
        Ok(count)
    }

    fn read_geometry(&mut self) -> Result<(Shape, Dimension)> {
        let (geometry_type, header) = self.read_header()?;
        let mut prev = [0i64; 4];

        let shape = if header.is_empty {
            match geometry_type {
                WKBGeometryType::Point => Shape::Point(None),
                WKBGeometryType::LineString => Shape::LineString(vec![]),
                WKBGeometryType::Polygon => Shape::Polygon(vec![]),
                WKBGeometryType::MultiPoint => Shape::MultiPoint(vec![]),
                WKBGeometryType::MultiLineString => Shape::MultiLineString(vec![]),
                WKBGeometryType::MultiPolygon => Shape::MultiPolygon(vec![]),
                WKBGeometryType::GeometryCollection => Shape::GeometryCollection(vec![]),
            }
        } else {
            match geometry_type {
                WKBGeometryType::Point => {
                    Shape::Point(Some(self.read_coord(&header, &mut prev)?))
                }
                WKBGeometryType::LineString => {
                    Shape::LineString(self.read_coords(&header, &mut prev)?)
                }
                WKBGeometryType::Polygon => Shape::Polygon(self.read_rings(&header, &mut prev)?),
                WKBGeometryType::MultiPoint => {
                    let count = self.read_multi_count(&header)?;
                    let coords = (0..count)
                        .map(|_| self.read_coord(&header, &mut prev))
                        .collect::<Result<_>>()?;
                    Shape::MultiPoint(coords)
                }
                WKBGeometryType::MultiLineString => {
                    let count = self.read_multi_count(&header)?;
                    let lines = (0..count)
                        .map(|_| self.read_coords(&header, &mut prev))
                        .collect::<Result<_>>()?;
                    Shape::MultiLineString(lines)
                }
                WKBGeometryType::MultiPolygon => {
                    let count = self.read_multi_count(&header)?;
                    let polygons = (0..count)
                        .map(|_| self.read_rings(&header, &mut prev))
                        .collect::<Result<_>>()?;
                    Shape::MultiPolygon(polygons)
                }
                WKBGeometryType::GeometryCollection => {
                    let count = self.read_multi_count(&header)?;
                    let mut shapes = Vec::with_capacity(count);
                    for _ in 0..count {
                        let (shape, dim) = self.read_geometry()?;
                        if dim != header.dim {
                            return Err(GeoArrowError::Twkb(
                                format!("mixed dimensionality: {dim:?} inside {:?}", header.dim)
                                    .into(),
                            ));
                        }
                        shapes.push(shape);
                    }
                    Shape::GeometryCollection(shapes)
                }
            }
        };

        Ok((shape, header.dim))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::native::decode;
    use approx::assert_relative_eq;
    use arrow_array::BinaryArray;

    #[test]
    fn point() {
        // POINT(1 2), precision 0
        let geom = read_twkb(&[0x01, 0x00, 0x02, 0x04]).unwrap();
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::xy(1., 2.))));
    }

    #[test]
    fn line_string_with_precision() {
        // LINESTRING(1.5 2, 3 -1), precision 1: deltas (15, 20), (15, -30)
        let geom = read_twkb(&[0x22, 0x00, 0x02, 0x1E, 0x28, 0x1E, 0x3B]).unwrap();
        assert_eq!(
            geom.shape(),
            &Shape::LineString(vec![Coord::xy(1.5, 2.), Coord::xy(3., -1.)])
        );
    }

    #[test]
    fn empty_with_bbox_flag() {
        let geom = read_twkb(&[0x03, EMPTY_FLAG | BBOX_FLAG]).unwrap();
        assert_eq!(geom.shape(), &Shape::Polygon(vec![]));
    }

    #[test]
    fn point_with_bbox() {
        // POINT(1 2) with a bbox of xmin 1, dx 0, ymin 2, dy 0
        let geom = read_twkb(&[0x01, BBOX_FLAG, 0x02, 0x00, 0x04, 0x00, 0x02, 0x04]).unwrap();
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::xy(1., 2.))));
    }

    #[test]
    fn size_header() {
        let geom = read_twkb(&[0x01, SIZE_FLAG, 0x02, 0x02, 0x04]).unwrap();
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::xy(1., 2.))));

        // Announces five bytes where two remain
        assert!(matches!(
            read_twkb(&[0x01, SIZE_FLAG, 0x05, 0x02, 0x04]),
            Err(GeoArrowError::Twkb(_))
        ));
    }

    #[test]
    fn negative_precision() {
        // POINT(10 20) at precision -1, stored as (1, 2)
        let geom = read_twkb(&[0x11, 0x00, 0x02, 0x04]).unwrap();
        let Shape::Point(Some(c)) = geom.shape() else {
            panic!("unexpected {:?}", geom.shape());
        };
        assert_relative_eq!(c.x, 10., epsilon = 1e-9);
        assert_relative_eq!(c.y, 20., epsilon = 1e-9);
    }

    #[test]
    fn nested_collection() {
        // GEOMETRYCOLLECTION(POINT(1 2), GEOMETRYCOLLECTION(LINESTRING(0 0, 1 1)))
        let buf = [
            0x07, 0x00, 0x02, // outer collection of two
            0x01, 0x00, 0x02, 0x04, // point
            0x07, 0x00, 0x01, // inner collection of one
            0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x02, // line string
        ];
        let geom = read_twkb(&buf).unwrap();
        assert_eq!(
            geom.shape(),
            &Shape::GeometryCollection(vec![
                Shape::Point(Some(Coord::xy(1., 2.))),
                Shape::GeometryCollection(vec![Shape::LineString(vec![
                    Coord::xy(0., 0.),
                    Coord::xy(1., 1.)
                ])]),
            ])
        );
    }

    #[test]
    fn overlong_varint_is_an_error() {
        let mut buf = vec![0x01, 0x00];
        buf.extend([0x80; 10]);
        buf.extend([0x00, 0x00]);
        assert!(matches!(read_twkb(&buf), Err(GeoArrowError::Twkb(_))));
    }

    #[test]
    fn xyz_point() {
        // POINT Z (1 2 3), extended dims with z precision 0
        let geom = read_twkb(&[0x01, EXTENDED_DIMS_FLAG, 0x01, 0x02, 0x04, 0x06]).unwrap();
        assert_eq!(geom.dim(), Dimension::XYZ);
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::xyz(1., 2., 3.))));
    }

    #[test]
    fn multipoint_with_idlist() {
        // MULTIPOINT((0 0), (1 1)) with ids 10 and 20
        let geom = read_twkb(&[0x04, IDLIST_FLAG, 0x02, 0x14, 0x28, 0x00, 0x00, 0x02, 0x02])
            .unwrap();
        assert_eq!(
            geom.shape(),
            &Shape::MultiPoint(vec![Coord::xy(0., 0.), Coord::xy(1., 1.)])
        );
    }

    #[test]
    fn unclosed_ring_fails_checks() {
        // POLYGON with a single open 4-point ring
        let buf = [
            0x03, 0x00, 0x01, 0x04, 0x00, 0x00, 0x02, 0x00, 0x00, 0x02, 0x01, 0x00,
        ];
        assert!(read_twkb(&buf).is_err());
    }

    #[test]
    fn array_keeps_nulls_and_names_index() {
        let input = BinaryArray::from(vec![Some(&[0x01u8, 0x00, 0x02, 0x04][..]), None]);
        let wkb = from_twkb::<i32, i32>(&input).unwrap();
        let decoded = decode(&wkb, ParserChecks::ALL).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded[1].is_none());

        let bad = BinaryArray::from(vec![Some(&[0x01u8, 0x00, 0x02, 0x04][..]), Some(&[0x01u8][..])]);
        let err = from_twkb::<i32, i32>(&bad).unwrap_err();
        assert_eq!(err.index(), Some(1));
    }
}
