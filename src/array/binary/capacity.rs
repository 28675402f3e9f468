use std::ops::Add;

use crate::io::wkb::{wkb_size, WKBFlavor};
use crate::native::NativeGeometry;

/// A counter for the buffer sizes of a [`WKBArray`][crate::array::WKBArray].
///
/// This can be used to reduce allocations by allocating once for exactly the array size you need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WKBCapacity {
    pub(crate) buffer_capacity: usize,
    pub(crate) offsets_capacity: usize,
}

impl WKBCapacity {
    /// Create a new capacity with known sizes.
    pub fn new(buffer_capacity: usize, offsets_capacity: usize) -> Self {
        Self {
            buffer_capacity,
            offsets_capacity,
        }
    }

    /// Create a new empty capacity.
    pub fn new_empty() -> Self {
        Self::new(0, 0)
    }

    /// Return `true` if the capacity is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer_capacity == 0 && self.offsets_capacity == 0
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn offsets_capacity(&self) -> usize {
        self.offsets_capacity
    }

    /// Add a geometry, as it will be written in EWKB, to this capacity counter.
    #[inline]
    pub fn add_geometry(&mut self, geom: Option<&NativeGeometry>) {
        if let Some(geom) = geom {
            self.buffer_capacity += wkb_size(geom, WKBFlavor::Extended);
        }
        self.offsets_capacity += 1;
    }

    pub fn from_geometries<'a>(geoms: impl Iterator<Item = Option<&'a NativeGeometry>>) -> Self {
        let mut counter = Self::new_empty();
        geoms.for_each(|geom| counter.add_geometry(geom));
        counter
    }
}

impl Add for WKBCapacity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let buffer_capacity = self.buffer_capacity + rhs.buffer_capacity;
        let offsets_capacity = self.offsets_capacity + rhs.offsets_capacity;

        Self::new(buffer_capacity, offsets_capacity)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::native::{Coord, Dimension, Shape};

    #[test]
    fn counts_nulls_as_offsets_only() {
        let point = NativeGeometry::new(Shape::Point(Some(Coord::xy(0., 0.))), Dimension::XY);
        let capacity = WKBCapacity::from_geometries([Some(&point), None].into_iter());
        assert_eq!(capacity, WKBCapacity::new(21, 2));
        assert_eq!(capacity + capacity, WKBCapacity::new(42, 4));
    }
}
