use crate::error::Result;

/// The coordinate dimension of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    /// Two-dimensional.
    #[default]
    XY,
    /// With elevation.
    XYZ,
    /// With a measure.
    XYM,
    /// With elevation and a measure.
    XYZM,
}

impl Dimension {
    /// Build from the presence of Z and M ordinates.
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dimension::XY,
            (true, false) => Dimension::XYZ,
            (false, true) => Dimension::XYM,
            (true, true) => Dimension::XYZM,
        }
    }

    pub fn has_z(&self) -> bool {
        matches!(self, Dimension::XYZ | Dimension::XYZM)
    }

    pub fn has_m(&self) -> bool {
        matches!(self, Dimension::XYM | Dimension::XYZM)
    }

    /// Number of ordinates per coordinate.
    pub fn size(&self) -> usize {
        2 + usize::from(self.has_z()) + usize::from(self.has_m())
    }
}

/// A single coordinate. `z` and `m` are set exactly when the owning geometry's [`Dimension`] has
/// them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: None,
        }
    }

    /// Whether both planar ordinates are NaN, which is how WKB spells an empty point.
    pub fn is_empty(&self) -> bool {
        self.x.is_nan() && self.y.is_nan()
    }

    /// Compare the planar ordinates only.
    pub fn xy_eq(&self, other: &Coord) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub(crate) fn to_geo(self) -> geo::Coord {
        geo::coord! { x: self.x, y: self.y }
    }
}

/// The geometric content of a [`NativeGeometry`].
///
/// Rings are stored closed, exactly as they were decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// `None` for an empty point.
    Point(Option<Coord>),
    LineString(Vec<Coord>),
    /// Exterior ring first, then holes.
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Shape>),
}

impl Shape {
    /// The OGC name of this geometry type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Point(_) => "Point",
            Shape::LineString(_) => "LineString",
            Shape::Polygon(_) => "Polygon",
            Shape::MultiPoint(_) => "MultiPoint",
            Shape::MultiLineString(_) => "MultiLineString",
            Shape::MultiPolygon(_) => "MultiPolygon",
            Shape::GeometryCollection(_) => "GeometryCollection",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Point(coord) => coord.is_none(),
            Shape::LineString(coords) | Shape::MultiPoint(coords) => coords.is_empty(),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter().all(|ring| ring.is_empty())
            }
            Shape::MultiPolygon(polygons) => polygons.iter().flatten().all(|r| r.is_empty()),
            Shape::GeometryCollection(shapes) => shapes.iter().all(Shape::is_empty),
        }
    }

    /// Visit every coordinate, in storage order.
    pub fn for_each_coord<F: FnMut(&Coord)>(&self, f: &mut F) {
        match self {
            Shape::Point(coord) => coord.iter().for_each(|c| f(c)),
            Shape::LineString(coords) | Shape::MultiPoint(coords) => coords.iter().for_each(f),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter().flatten().for_each(f)
            }
            Shape::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(f),
            Shape::GeometryCollection(shapes) => {
                shapes.iter().for_each(|shape| shape.for_each_coord(f))
            }
        }
    }

    /// Mutate every coordinate in place, stopping at the first error.
    pub fn try_for_each_coord_mut<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(&mut Coord) -> Result<()>,
    {
        match self {
            Shape::Point(coord) => coord.iter_mut().try_for_each(f),
            Shape::LineString(coords) | Shape::MultiPoint(coords) => {
                coords.iter_mut().try_for_each(f)
            }
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter_mut().flatten().try_for_each(f)
            }
            Shape::MultiPolygon(polygons) => {
                polygons.iter_mut().flatten().flatten().try_for_each(f)
            }
            Shape::GeometryCollection(shapes) => shapes
                .iter_mut()
                .try_for_each(|shape| shape.try_for_each_coord_mut(f)),
        }
    }

    /// Visit every coordinate mutably, in storage order.
    pub fn for_each_coord_mut<F: FnMut(&mut Coord)>(&mut self, f: &mut F) {
        match self {
            Shape::Point(coord) => coord.iter_mut().for_each(|c| f(c)),
            Shape::LineString(coords) | Shape::MultiPoint(coords) => {
                coords.iter_mut().for_each(f)
            }
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => {
                rings.iter_mut().flatten().for_each(f)
            }
            Shape::MultiPolygon(polygons) => {
                polygons.iter_mut().flatten().flatten().for_each(f)
            }
            Shape::GeometryCollection(shapes) => shapes
                .iter_mut()
                .for_each(|shape| shape.for_each_coord_mut(f)),
        }
    }

    /// Rewrite every linear component (linestrings and polygon rings), stopping at the first
    /// error. Points are left alone.
    pub fn try_map_linear<F>(self, f: &mut F) -> Result<Shape>
    where
        F: FnMut(Vec<Coord>) -> Result<Vec<Coord>>,
    {
        let map_all = |lines: Vec<Vec<Coord>>, f: &mut F| -> Result<Vec<Vec<Coord>>> {
            lines.into_iter().map(&mut *f).collect()
        };
        Ok(match self {
            Shape::Point(_) | Shape::MultiPoint(_) => self,
            Shape::LineString(coords) => Shape::LineString(f(coords)?),
            Shape::Polygon(rings) => Shape::Polygon(map_all(rings, f)?),
            Shape::MultiLineString(lines) => Shape::MultiLineString(map_all(lines, f)?),
            Shape::MultiPolygon(polygons) => Shape::MultiPolygon(
                polygons
                    .into_iter()
                    .map(|rings| map_all(rings, f))
                    .collect::<Result<_>>()?,
            ),
            Shape::GeometryCollection(shapes) => Shape::GeometryCollection(
                shapes
                    .into_iter()
                    .map(|shape| shape.try_map_linear(f))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Split into single-part shapes. Collections are flattened recursively.
    pub fn into_parts(self) -> Vec<Shape> {
        match self {
            Shape::MultiPoint(coords) => coords
                .into_iter()
                .map(|c| Shape::Point((!c.is_empty()).then_some(c)))
                .collect(),
            Shape::MultiLineString(lines) => lines.into_iter().map(Shape::LineString).collect(),
            Shape::MultiPolygon(polygons) => polygons.into_iter().map(Shape::Polygon).collect(),
            Shape::GeometryCollection(shapes) => {
                shapes.into_iter().flat_map(Shape::into_parts).collect()
            }
            single => vec![single],
        }
    }
}

/// An owned geometry, as decoded from one slot of a WKB array.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeGeometry {
    dim: Dimension,
    srid: Option<i32>,
    shape: Shape,
}

impl NativeGeometry {
    pub fn new(shape: Shape, dim: Dimension) -> Self {
        Self {
            dim,
            srid: None,
            shape,
        }
    }

    /// Attach (or clear) the spatial reference id carried through EWKB.
    pub fn with_srid(mut self, srid: Option<i32>) -> Self {
        self.srid = srid;
        self
    }

    pub fn dim(&self) -> Dimension {
        self.dim
    }

    pub fn srid(&self) -> Option<i32> {
        self.srid
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn into_shape(self) -> Shape {
        self.shape
    }

    /// Replace the content, keeping dimension and SRID.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Transform the content, keeping dimension and SRID.
    pub fn try_map_shape<F: FnOnce(Shape) -> Result<Shape>>(mut self, f: F) -> Result<Self> {
        self.shape = f(self.shape)?;
        Ok(self)
    }

    pub fn type_name(&self) -> &'static str {
        self.shape.type_name()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Mutate every coordinate in place without touching the structure of the geometry.
    pub fn try_for_each_coord_mut<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Coord) -> Result<()>,
    {
        self.shape.try_for_each_coord_mut(&mut f)
    }

    /// Drop Z and M.
    pub fn force_2d(mut self) -> Self {
        self.dim = Dimension::XY;
        self.shape.for_each_coord_mut(&mut |c| {
            c.z = None;
            c.m = None;
        });
        self
    }

    /// The planar coordinates of every vertex, skipping empty points.
    pub fn xy_coords(&self) -> Vec<geo::Coord> {
        let mut out = Vec::new();
        self.shape.for_each_coord(&mut |c| {
            if !c.is_empty() {
                out.push(c.to_geo())
            }
        });
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square() -> Vec<Coord> {
        vec![
            Coord::xy(0., 0.),
            Coord::xy(1., 0.),
            Coord::xy(1., 1.),
            Coord::xy(0., 1.),
            Coord::xy(0., 0.),
        ]
    }

    #[test]
    fn dimension_flags() {
        assert_eq!(Dimension::from_flags(true, true), Dimension::XYZM);
        assert_eq!(Dimension::XYM.size(), 3);
        assert!(!Dimension::XYM.has_z());
    }

    #[test]
    fn empty_shapes() {
        assert!(Shape::Point(None).is_empty());
        assert!(Shape::GeometryCollection(vec![Shape::LineString(vec![])]).is_empty());
        assert!(!Shape::Polygon(vec![square()]).is_empty());
    }

    #[test]
    fn coord_mutation_keeps_structure() {
        let mut geom = NativeGeometry::new(Shape::Polygon(vec![square()]), Dimension::XY);
        geom.try_for_each_coord_mut(|c| {
            c.x += 10.;
            Ok(())
        })
        .unwrap();
        match geom.shape() {
            Shape::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][1], Coord::xy(11., 0.));
            }
            other => panic!("unexpected {}", other.type_name()),
        }
    }

    #[test]
    fn into_parts_flattens() {
        let shape = Shape::GeometryCollection(vec![
            Shape::MultiPoint(vec![Coord::xy(0., 0.), Coord::xy(1., 1.)]),
            Shape::LineString(vec![Coord::xy(0., 0.), Coord::xy(1., 1.)]),
        ]);
        let parts = shape.into_parts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].type_name(), "Point");
    }

    #[test]
    fn force_2d_drops_z() {
        let geom = NativeGeometry::new(
            Shape::LineString(vec![Coord::xyz(0., 0., 1.), Coord::xyz(1., 1., 2.)]),
            Dimension::XYZ,
        )
        .force_2d();
        assert_eq!(geom.dim(), Dimension::XY);
        assert_eq!(
            geom.shape(),
            &Shape::LineString(vec![Coord::xy(0., 0.), Coord::xy(1., 1.)])
        );
    }

    #[test]
    fn linear_mapping_stops_at_error() {
        let shape = Shape::MultiLineString(vec![square(), vec![]]);
        let result = shape.try_map_linear(&mut |coords| {
            if coords.is_empty() {
                return Err(crate::error::GeoArrowError::General("empty".into()));
            }
            Ok(coords)
        });
        assert!(result.is_err());
    }
}
