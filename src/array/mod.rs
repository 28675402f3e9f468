//! Contains the GeoArrow WKB array used as the host geometry collection.

pub use binary::{WKBArray, WKBBuilder, WKBCapacity};

pub mod binary;
