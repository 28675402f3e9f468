//! Measurements and predicates on the sphere or on an ellipsoid.
//!
//! Coordinates are interpreted as longitude/latitude in degrees. Ellipsoidal measurements are
//! computed with [`geographiclib_rs`] on a caller-provided [`Spheroid`].

mod area;
mod azimuth;
mod covers;
mod length;
mod segmentize;
pub(crate) mod sphere;
mod spheroid;

pub use area::GeodeticArea;
pub use azimuth::GeodeticAzimuth;
pub use covers::GeodeticCovers;
pub use length::GeodeticLength;
pub use segmentize::GeodeticSegmentize;
pub use spheroid::Spheroid;
