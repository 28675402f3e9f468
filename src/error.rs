//! Defines [`GeoArrowError`], representing all errors returned by this crate.

use arrow_schema::ArrowError;
use std::borrow::Cow;
use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GeoArrowError {
    /// Incorrect type was passed to an operation.
    #[error("Incorrect type passed to operation: {0}")]
    IncorrectType(Cow<'static, str>),

    /// Returned when functionality is not yet available.
    #[error("Not yet implemented: {0}")]
    NotYetImplemented(String),

    /// General error.
    #[error("General error: {0}")]
    General(String),

    /// An argument failed validation before any geometry was decoded, e.g. too few input
    /// geometries or a parameter list of the wrong length.
    #[error("Precondition failed: {0}")]
    Precondition(Cow<'static, str>),

    /// A projection definition could not be parsed.
    #[error("Invalid {role} projection: {definition}")]
    InvalidProjection {
        /// Either `"source"` or `"target"`.
        role: &'static str,
        /// The definition as passed in.
        definition: String,
    },

    /// The geometry engine could not compute a result for a geometry.
    #[error("Computation failed: {0}")]
    ComputationFailed(Cow<'static, str>),

    /// Malformed WKB or EWKB bytes.
    #[error("WKB error: {0}")]
    Wkb(Cow<'static, str>),

    /// Malformed TWKB bytes.
    #[error("TWKB error: {0}")]
    Twkb(Cow<'static, str>),

    /// A per-geometry failure, tagged with the (0-based) slot it happened at.
    #[error("Failed on geometry at index {index}: {source}")]
    AtIndex {
        /// Slot in the input array.
        index: usize,
        /// Underlying failure.
        source: Box<GeoArrowError>,
    },

    /// Whenever pushing to a container fails because it does not support more entries.
    ///
    /// The solution is usually to use a higher-capacity container-backing type.
    #[error("Overflow")]
    Overflow,

    /// [ArrowError]
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// [geohash::GeohashError]
    #[error(transparent)]
    GeohashError(#[from] geohash::GeohashError),

    /// [geos::Error]
    #[cfg(feature = "geos")]
    #[error(transparent)]
    GeosError(#[from] geos::Error),

    /// [proj::ProjError]
    #[cfg(feature = "proj")]
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),

    /// [std::io::Error]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl GeoArrowError {
    /// Attach the slot index of the geometry that produced this error.
    ///
    /// An error that already carries an index is returned unchanged.
    pub fn at_index(self, index: usize) -> Self {
        match self {
            GeoArrowError::AtIndex { .. } => self,
            other => GeoArrowError::AtIndex {
                index,
                source: Box::new(other),
            },
        }
    }

    /// The slot index this error refers to, if known.
    pub fn index(&self) -> Option<usize> {
        match self {
            GeoArrowError::AtIndex { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, GeoArrowError>;

impl From<GeoArrowError> for ArrowError {
    fn from(err: GeoArrowError) -> Self {
        match err {
            GeoArrowError::Arrow(err) => err,
            _ => ArrowError::ExternalError(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn at_index_does_not_nest() {
        let err = GeoArrowError::Wkb("truncated".into()).at_index(3).at_index(7);
        assert_eq!(err.index(), Some(3));
        assert_eq!(
            err.to_string(),
            "Failed on geometry at index 3: WKB error: truncated"
        );
    }

    #[test]
    fn into_arrow_error() {
        let err: ArrowError = GeoArrowError::Precondition("too few".into()).into();
        assert!(matches!(err, ArrowError::ExternalError(_)));
    }
}
