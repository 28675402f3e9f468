//! Owned in-memory geometries and their conversion to and from WKB arrays.
//!
//! A [`NativeGeometry`] is what every operation in [`crate::algorithm`] works on. It is produced
//! by [`decode`] from a [`WKBArray`][crate::array::WKBArray] and consumed by [`encode`], which
//! turns it back into EWKB. Ownership moves on every call boundary, so each decoded geometry is
//! dropped exactly once: either by the operation that replaces it or by the encoder.

mod checks;
mod codec;
mod convert;
mod geometry;

pub use checks::ParserChecks;
pub use codec::{decode, decode_array, encode};
pub use geometry::{Coord, Dimension, NativeGeometry, Shape};
