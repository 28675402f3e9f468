//! Reading Tiny WKB (TWKB), the compact varint-and-delta variant of WKB.
//!
//! Only decoding is supported: geometries read from TWKB are handed to the regular
//! [`encode`](crate::native::encode) path to become a WKB array.

mod reader;
mod varint;

pub use reader::{from_twkb, read_twkb};
