//! Vectorized operations implemented on and returning GeoArrow WKB arrays.
//!
//! Every operation decodes its input with [`decode`][crate::native::decode], hands each geometry
//! to the engine, and either re-encodes the results or collects them into a plain Arrow array.

pub mod geodetic;
pub mod geohash;
#[cfg(feature = "geos")]
pub mod geos;
pub mod minimum_bounding_circle;
pub(crate) mod native;
#[cfg(feature = "proj")]
pub mod proj;
