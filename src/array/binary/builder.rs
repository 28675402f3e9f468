use std::sync::Arc;

use arrow_array::builder::{ArrayBuilder, GenericBinaryBuilder};
use arrow_array::OffsetSizeTrait;
use tracing::trace;

use crate::array::binary::WKBCapacity;
use crate::error::{GeoArrowError, Result};
use crate::io::wkb::{wkb_size, write_wkb, WKBFlavor};
use crate::metadata::ArrayMetadata;
use crate::native::NativeGeometry;

use super::array::WKBArray;

/// The Arrow equivalent to `Vec<Option<NativeGeometry>>`, written as little-endian EWKB.
/// Converting a [`WKBBuilder`] into a [`WKBArray`] is `O(1)`.
#[derive(Debug)]
pub struct WKBBuilder<O: OffsetSizeTrait> {
    builder: GenericBinaryBuilder<O>,
    metadata: Arc<ArrayMetadata>,
}

impl<O: OffsetSizeTrait> Default for WKBBuilder<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: OffsetSizeTrait> WKBBuilder<O> {
    /// Creates a new empty [`WKBBuilder`].
    pub fn new() -> Self {
        Self::with_capacity(Default::default())
    }

    /// Initializes a new [`WKBBuilder`] with a pre-allocated capacity of slots and values.
    pub fn with_capacity(capacity: WKBCapacity) -> Self {
        Self {
            builder: GenericBinaryBuilder::with_capacity(
                capacity.offsets_capacity,
                capacity.buffer_capacity,
            ),
            metadata: Default::default(),
        }
    }

    pub fn with_capacity_from_iter<'a>(
        geoms: impl Iterator<Item = Option<&'a NativeGeometry>>,
    ) -> Self {
        Self::with_capacity(WKBCapacity::from_geometries(geoms))
    }

    /// Set the metadata of the finished array.
    pub fn with_metadata(mut self, metadata: Arc<ArrayMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Push a geometry onto the end of this array.
    ///
    /// Fails with [`GeoArrowError::Overflow`] if a part count doesn't fit the WKB `u32` counts,
    /// or if the values buffer outgrows the offset type. Nothing is appended in that case.
    pub fn push_geometry(&mut self, geom: Option<&NativeGeometry>) -> Result<()> {
        match geom {
            Some(geom) => {
                let size = wkb_size(geom, WKBFlavor::Extended);
                let mut buf = Vec::with_capacity(size);
                write_wkb(&mut buf, geom, WKBFlavor::Extended)?;
                let total = self.builder.values_slice().len() + buf.len();
                if O::from_usize(total).is_none() {
                    return Err(GeoArrowError::Overflow);
                }
                trace!(geometry_type = geom.type_name(), bytes = size, "wrote EWKB");
                self.builder.append_value(&buf);
            }
            None => self.builder.append_null(),
        }
        Ok(())
    }

    /// Push raw WKB bytes, unchecked.
    pub fn push_wkb(&mut self, wkb: Option<&[u8]>) {
        self.builder.append_option(wkb)
    }

    pub fn len(&self) -> usize {
        self.builder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(mut self) -> WKBArray<O> {
        WKBArray::new(self.builder.finish(), self.metadata)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::native::{Coord, Dimension, Shape};

    #[test]
    fn nulls_survive() {
        let point = NativeGeometry::new(Shape::Point(Some(Coord::xy(0., 0.))), Dimension::XY);
        let mut builder = WKBBuilder::<i32>::with_capacity_from_iter([Some(&point), None].into_iter());
        builder.push_geometry(Some(&point)).unwrap();
        builder.push_geometry(None).unwrap();
        builder.push_wkb(None);
        let arr = builder.finish();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.null_count(), 2);
        assert_eq!(arr.value(0).map(<[u8]>::len), Some(21));
    }
}
