//! Geodetic and robust geometry operations over [GeoArrow](https://github.com/geoarrow/geoarrow)
//! WKB arrays.
//!
//! Every operation decodes the WKB (or EWKB) slots of a [`WKBArray`](array::WKBArray) into owned
//! [`NativeGeometry`](native::NativeGeometry) values, computes, and encodes geometry results back
//! into a new array. Null slots stay null.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod algorithm;
pub mod array;
pub mod error;
pub mod io;
pub mod metadata;
pub mod native;
#[cfg(test)]
pub(crate) mod test;

#[cfg(feature = "geos")]
pub use algorithm::geos::geos_version;

/// The version of this crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
