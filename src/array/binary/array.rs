use std::sync::Arc;

use arrow_array::{Array, BinaryArray, GenericBinaryArray, LargeBinaryArray, OffsetSizeTrait};
use arrow_buffer::NullBuffer;
use arrow_schema::{DataType, Field};

use crate::error::{GeoArrowError, Result};
use crate::metadata::ArrayMetadata;

/// The GeoArrow extension name of WKB arrays.
pub const WKB_EXTENSION_NAME: &str = "geoarrow.wkb";

/// An immutable array of WKB geometries using GeoArrow's in-memory representation.
///
/// This is semantically equivalent to `Vec<Option<&[u8]>>` due to the internal validity bitmap,
/// plus the [`ArrayMetadata`] (CRS and edges) that applies to every slot.
#[derive(Debug, Clone, PartialEq)]
pub struct WKBArray<O: OffsetSizeTrait> {
    array: GenericBinaryArray<O>,
    metadata: Arc<ArrayMetadata>,
}

impl<O: OffsetSizeTrait> WKBArray<O> {
    /// Create a new WKBArray from a BinaryArray
    pub fn new(array: GenericBinaryArray<O>, metadata: Arc<ArrayMetadata>) -> Self {
        Self { array, metadata }
    }

    /// The number of slots, including nulls.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Returns true if the array is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.array.is_null(i)
    }

    pub fn null_count(&self) -> usize {
        self.array.null_count()
    }

    pub fn nulls(&self) -> Option<&NullBuffer> {
        self.array.nulls()
    }

    /// The raw bytes at slot `i`, or `None` for a null slot.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn value(&self, i: usize) -> Option<&[u8]> {
        match self.array.is_null(i) {
            true => None,
            false => Some(self.array.value(i)),
        }
    }

    /// Iterate over the raw bytes of every slot.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<&[u8]>> + '_ {
        self.array.iter()
    }

    pub fn metadata(&self) -> Arc<ArrayMetadata> {
        self.metadata.clone()
    }

    /// Replace the metadata, e.g. after a reprojection.
    pub fn with_metadata(self, metadata: Arc<ArrayMetadata>) -> Self {
        Self {
            array: self.array,
            metadata,
        }
    }

    pub fn extension_name(&self) -> &'static str {
        WKB_EXTENSION_NAME
    }

    /// An Arrow field describing this array, carrying the GeoArrow extension metadata.
    pub fn extension_field(&self, name: &str) -> Arc<Field> {
        let data_type = match O::IS_LARGE {
            true => DataType::LargeBinary,
            false => DataType::Binary,
        };
        Arc::new(
            Field::new(name, data_type, true)
                .with_metadata(self.metadata.to_field_metadata(WKB_EXTENSION_NAME)),
        )
    }

    pub fn inner(&self) -> &GenericBinaryArray<O> {
        &self.array
    }

    pub fn into_inner(self) -> GenericBinaryArray<O> {
        self.array
    }

    /// Returns a zero-copy slice of this array with the indicated offset and length.
    ///
    /// # Panic
    /// This function panics iff `offset + length > self.len()`.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        assert!(
            offset + length <= self.len(),
            "offset + length may not exceed length of array"
        );
        Self {
            array: self.array.slice(offset, length),
            metadata: self.metadata(),
        }
    }
}

impl<O: OffsetSizeTrait> From<GenericBinaryArray<O>> for WKBArray<O> {
    fn from(value: GenericBinaryArray<O>) -> Self {
        Self::new(value, Default::default())
    }
}

impl<O: OffsetSizeTrait> From<WKBArray<O>> for GenericBinaryArray<O> {
    fn from(value: WKBArray<O>) -> Self {
        value.array
    }
}

impl TryFrom<&dyn Array> for WKBArray<i32> {
    type Error = GeoArrowError;

    fn try_from(value: &dyn Array) -> Result<Self> {
        match value.data_type() {
            DataType::Binary => {
                let downcasted = value
                    .as_any()
                    .downcast_ref::<BinaryArray>()
                    .ok_or_else(|| GeoArrowError::General("downcast to BinaryArray".into()))?;
                Ok(downcasted.clone().into())
            }
            DataType::LargeBinary => {
                let downcasted = value
                    .as_any()
                    .downcast_ref::<LargeBinaryArray>()
                    .ok_or_else(|| {
                        GeoArrowError::General("downcast to LargeBinaryArray".into())
                    })?;
                if downcasted.value_data().len() > i32::MAX as usize {
                    return Err(GeoArrowError::Overflow);
                }
                Ok(BinaryArray::from_iter(downcasted.iter()).into())
            }
            dt => Err(GeoArrowError::IncorrectType(
                format!("Unexpected type for a WKB array: {dt:?}").into(),
            )),
        }
    }
}

impl TryFrom<&dyn Array> for WKBArray<i64> {
    type Error = GeoArrowError;

    fn try_from(value: &dyn Array) -> Result<Self> {
        match value.data_type() {
            DataType::Binary => {
                let downcasted = value
                    .as_any()
                    .downcast_ref::<BinaryArray>()
                    .ok_or_else(|| GeoArrowError::General("downcast to BinaryArray".into()))?;
                Ok(LargeBinaryArray::from_iter(downcasted.iter()).into())
            }
            DataType::LargeBinary => {
                let downcasted = value
                    .as_any()
                    .downcast_ref::<LargeBinaryArray>()
                    .ok_or_else(|| {
                        GeoArrowError::General("downcast to LargeBinaryArray".into())
                    })?;
                Ok(downcasted.clone().into())
            }
            dt => Err(GeoArrowError::IncorrectType(
                format!("Unexpected type for a WKB array: {dt:?}").into(),
            )),
        }
    }
}
