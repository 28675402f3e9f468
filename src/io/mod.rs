//! Readers and writers for binary geometry encodings.

pub mod twkb;
pub mod wkb;
