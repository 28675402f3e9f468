//! Helpers shared by the operations: decode, apply per element, collect.

mod unary;

pub(crate) use unary::{try_map_geometries, try_unary_primitive};
