use bitflags::bitflags;

use crate::error::{GeoArrowError, Result};
use crate::native::{Coord, Shape};

bitflags! {
    /// Consistency checks applied while parsing geometry bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParserChecks: u8 {
        /// Linestrings need two points and polygon rings four.
        const MINPOINTS = 1;
        /// Curved geometries need an odd number of points.
        ///
        /// Curves are rejected by the readers in this crate, so on linear input this never fires.
        const ODD = 1 << 1;
        /// Polygon rings must end where they start.
        const CLOSURE = 1 << 2;
        const ALL = Self::MINPOINTS.bits() | Self::ODD.bits() | Self::CLOSURE.bits();
    }
}

impl ParserChecks {
    /// No checks at all.
    pub const NONE: Self = Self::empty();

    /// The checks applied when decoding WKB arrays.
    ///
    /// This is the *intersection* of [`MINPOINTS`](Self::MINPOINTS), [`ODD`](Self::ODD) and
    /// [`CLOSURE`](Self::CLOSURE), which is empty: WKB input is decoded without checks, so
    /// geometries that are technically invalid (unclosed rings, one-point lines) still make it
    /// through to the operations.
    pub fn wkb_default() -> Self {
        Self::MINPOINTS & Self::ODD & Self::CLOSURE
    }

    /// Validate a freshly decoded shape.
    pub fn validate(&self, shape: &Shape) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        match shape {
            Shape::Point(_) | Shape::MultiPoint(_) => Ok(()),
            Shape::LineString(coords) => self.validate_line(coords),
            Shape::MultiLineString(lines) => {
                lines.iter().try_for_each(|line| self.validate_line(line))
            }
            Shape::Polygon(rings) => rings.iter().try_for_each(|ring| self.validate_ring(ring)),
            Shape::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .try_for_each(|ring| self.validate_ring(ring)),
            Shape::GeometryCollection(shapes) => {
                shapes.iter().try_for_each(|shape| self.validate(shape))
            }
        }
    }

    fn validate_line(&self, coords: &[Coord]) -> Result<()> {
        // An empty line passes every check
        if self.contains(Self::MINPOINTS) && !coords.is_empty() && coords.len() < 2 {
            return Err(GeoArrowError::Wkb(
                "geometry must have at least two points".into(),
            ));
        }
        Ok(())
    }

    fn validate_ring(&self, ring: &[Coord]) -> Result<()> {
        if ring.is_empty() {
            return Ok(());
        }
        if self.contains(Self::MINPOINTS) && ring.len() < 4 {
            return Err(GeoArrowError::Wkb(
                "geometry requires more points: polygon rings need at least four".into(),
            ));
        }
        if self.contains(Self::CLOSURE) {
            let first = &ring[0];
            let last = &ring[ring.len() - 1];
            if !first.xy_eq(last) {
                return Err(GeoArrowError::Wkb("geometry contains non-closed rings".into()));
            }
        }
        Ok(())
    }
}
