use arrow_array::OffsetSizeTrait;
use geos::Geom;

use crate::algorithm::geos::{from_geos, to_geos};
use crate::algorithm::native::try_map_geometries;
use crate::array::WKBArray;
use crate::error::{GeoArrowError, Result};
use crate::native::{decode, Coord, Dimension, NativeGeometry, ParserChecks, Shape};

/// Split every geometry by a single blade.
///
/// The blade is the first non-null geometry of `blade`. Lines can be split by points, lines or
/// the boundary of polygons; polygons can be split by lines. Each result is a
/// `GeometryCollection` of the pieces, which is the input itself when the blade misses it.
pub trait Split<Rhs = Self> {
    type Output;

    fn split(&self, blade: &Rhs) -> Self::Output;
}

/// A blade, prepared once for the whole array.
enum Blade {
    Points(Vec<Coord>),
    Linework(geos::Geometry),
}

impl Blade {
    fn new(geom: NativeGeometry) -> Result<Self> {
        match geom.shape() {
            Shape::Point(_) | Shape::MultiPoint(_) => Ok(Blade::Points(
                geom.xy_coords()
                    .into_iter()
                    .map(|c| Coord::xy(c.x, c.y))
                    .collect(),
            )),
            Shape::LineString(_) | Shape::MultiLineString(_) => {
                Ok(Blade::Linework(to_geos(&geom)?))
            }
            Shape::Polygon(_) | Shape::MultiPolygon(_) => {
                Ok(Blade::Linework(to_geos(&geom)?.boundary()?))
            }
            Shape::GeometryCollection(_) => Err(GeoArrowError::IncorrectType(
                "a GeometryCollection can't be used as a blade".into(),
            )),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Blade::Points(_) => "points",
            Blade::Linework(_) => "lines",
        }
    }
}

impl<O1: OffsetSizeTrait, O2: OffsetSizeTrait> Split<WKBArray<O2>> for WKBArray<O1> {
    type Output = Result<WKBArray<O1>>;

    fn split(&self, blade: &WKBArray<O2>) -> Self::Output {
        let blade = decode(blade, ParserChecks::wkb_default())?
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| GeoArrowError::Precondition("split needs a non-null blade".into()))?;
        let blade = Blade::new(blade)?;

        try_map_geometries(self, "split", |geom| split_geometry(geom, &blade))
    }
}

fn split_geometry(geom: NativeGeometry, blade: &Blade) -> Result<NativeGeometry> {
    let dim = geom.dim();
    let srid = geom.srid();
    let mut pieces = vec![];
    for part in geom.into_shape().into_parts() {
        if part.is_empty() {
            continue;
        }
        pieces.extend(split_part(NativeGeometry::new(part, dim), blade)?);
    }

    // GEOS may hand back fewer dimensions than it was given
    let uniform = pieces.iter().all(|p| p.dim() == dim);
    let (pieces, dim) = match uniform {
        true => (pieces, dim),
        false => (
            pieces.into_iter().map(NativeGeometry::force_2d).collect(),
            Dimension::XY,
        ),
    };
    let shapes = pieces.into_iter().map(NativeGeometry::into_shape).collect();
    Ok(NativeGeometry::new(Shape::GeometryCollection(shapes), dim).with_srid(srid))
}

/// Split a single-part geometry.
fn split_part(part: NativeGeometry, blade: &Blade) -> Result<Vec<NativeGeometry>> {
    match (part.shape(), blade) {
        (Shape::LineString(coords), Blade::Points(points)) => {
            let dim = part.dim();
            Ok(split_line_by_points(coords, points)
                .into_iter()
                .map(|piece| NativeGeometry::new(Shape::LineString(piece), dim))
                .collect())
        }
        (Shape::LineString(_), Blade::Linework(lines)) => {
            let diff = to_geos(&part)?.difference(lines)?;
            let dim_pieces = from_geos(&diff)?;
            let dim = dim_pieces.dim();
            Ok(dim_pieces
                .into_shape()
                .into_parts()
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(|s| NativeGeometry::new(s, dim))
                .collect())
        }
        (Shape::Polygon(_), Blade::Linework(lines)) => split_polygon_by_lines(&part, lines),
        (shape, blade) => Err(GeoArrowError::IncorrectType(
            format!(
                "splitting a {} by {} is not supported",
                shape.type_name(),
                blade.type_name()
            )
            .into(),
        )),
    }
}

/// Node the polygon's boundary with the blade, rebuild faces, and keep those inside the polygon.
fn split_polygon_by_lines(
    polygon: &NativeGeometry,
    lines: &geos::Geometry,
) -> Result<Vec<NativeGeometry>> {
    let polygon = to_geos(polygon)?;
    let noded = polygon.boundary()?.union(lines)?;
    let faces = geos::Geometry::polygonize(&[noded])?;

    let mut pieces = vec![];
    for i in 0..faces.get_num_geometries()? {
        let face = faces.get_geometry_n(i)?;
        if polygon.contains(&face.point_on_surface()?)? {
            pieces.push(from_geos(&face)?);
        }
    }
    Ok(pieces)
}

const EPSILON: f64 = 1e-12;

/// Position of `p` along the segment `a-b` as a fraction of its length, if `p` lies on it.
fn segment_fraction(a: &Coord, b: &Coord, p: &Coord) -> Option<f64> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0. {
        return None;
    }
    let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
    let scale = len2.sqrt().max(1.);
    if cross.abs() > EPSILON * scale * scale {
        return None;
    }
    let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / len2;
    (-EPSILON..=1. + EPSILON).contains(&t).then_some(t.clamp(0., 1.))
}

fn interpolate(a: &Coord, b: &Coord, p: &Coord, t: f64) -> Coord {
    let lerp = |u: Option<f64>, v: Option<f64>| Some(u? + (v? - u?) * t);
    Coord {
        x: p.x,
        y: p.y,
        z: lerp(a.z, b.z),
        m: lerp(a.m, b.m),
    }
}

/// Cut a line wherever one of `points` lies on it. The line's own endpoints never cut.
fn split_line_by_points(coords: &[Coord], points: &[Coord]) -> Vec<Vec<Coord>> {
    let Some(first) = coords.first() else {
        return vec![];
    };
    let mut pieces = vec![];
    let mut current = vec![*first];
    let last_segment = coords.len().saturating_sub(2);

    for (i, w) in coords.windows(2).enumerate() {
        let (a, b) = (&w[0], &w[1]);
        let mut cuts: Vec<(f64, Coord)> = points
            .iter()
            .filter_map(|p| segment_fraction(a, b, p).map(|t| (t, interpolate(a, b, p, t))))
            // The start of each segment was handled as the end of the previous one
            .filter(|(t, _)| *t > 0.)
            .collect();
        cuts.sort_by(|x, y| x.0.total_cmp(&y.0));
        cuts.dedup_by(|x, y| (x.0 - y.0).abs() <= EPSILON);

        let mut cut_at_end = false;
        for (t, c) in cuts {
            if t >= 1. {
                cut_at_end = i != last_segment;
                continue;
            }
            current.push(c);
            pieces.push(std::mem::replace(&mut current, vec![c]));
        }
        current.push(*b);
        if cut_at_end {
            pieces.push(std::mem::replace(&mut current, vec![*b]));
        }
    }
    pieces.push(current);
    pieces
}
