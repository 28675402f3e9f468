//! Metadata carried alongside a WKB array.
//!
//! This is the GeoArrow [extension metadata](https://geoarrow.org/extension-types), serialized to
//! JSON under the `ARROW:extension:metadata` key of the array's field.

use std::collections::HashMap;

use arrow_schema::Field;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GeoArrowError;

/// Field metadata key holding the extension name.
pub const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";

/// Field metadata key holding the serialized [`ArrayMetadata`].
pub const EXTENSION_METADATA_KEY: &str = "ARROW:extension:metadata";

/// If present, instructs consumers that edges follow a spherical path rather than a planar one. If
/// this value is omitted, edges will be interpreted as planar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Edges {
    /// Follow a spherical path rather than a planar.
    #[serde(rename = "spherical")]
    Spherical,
}

/// An optional string disambiguating the value of the `crs` field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CRSType {
    /// [PROJJSON](https://proj.org/specifications/projjson.html).
    #[serde(rename = "projjson")]
    Projjson,

    /// [WKT2:2019](https://www.ogc.org/publications/standard/wkt-crs/).
    #[serde(rename = "wkt2:2019")]
    Wkt2_2019,

    /// An identifier in the form `AUTHORITY:CODE`, e.g. `EPSG:4326`.
    #[serde(rename = "authority_code")]
    AuthorityCode,

    /// An opaque identifier that requires out-of-band knowledge to interpret.
    #[serde(rename = "srid")]
    Srid,
}

/// GeoArrow array metadata: coordinate reference system and edge interpretation.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArrayMetadata {
    /// A PROJJSON object, a CRS string (WKT, `AUTHORITY:CODE`, PROJ string), or omitted when the
    /// producer has no CRS information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<Value>,

    /// Disambiguates `crs`. Omitted when the producer cannot vouch for the representation, which
    /// is the case for free-form PROJ strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs_type: Option<CRSType>,

    /// Spherical edges, or planar when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<Edges>,
}

impl ArrayMetadata {
    /// Decide whether this [ArrayMetadata] should be written to Arrow metadata (aka if it is
    /// non-empty)
    pub fn should_serialize(&self) -> bool {
        self.crs.is_some() || self.edges.is_some()
    }

    /// Construct from a PROJ definition string, e.g. `+proj=longlat +datum=WGS84`.
    ///
    /// No authority code is recorded, even when the definition mentions one.
    pub fn from_proj_string(value: impl Into<String>) -> Self {
        Self::default().with_unknown_crs_type(value.into())
    }

    /// Construct from an `AUTHORITY:CODE` string.
    pub fn from_authority_code(value: impl Into<String>) -> Result<Self, GeoArrowError> {
        Self::default().with_authority_code(value.into())
    }

    /// Set the CRS using an opaque string.
    pub fn with_unknown_crs_type(mut self, value: String) -> Self {
        self.crs = Some(Value::String(value));
        self.crs_type = None;
        self
    }

    /// Set the CRS using an authority:code string.
    ///
    /// Fails with [`GeoArrowError::IncorrectType`] when `value` has no `:` separator.
    pub fn with_authority_code(mut self, value: String) -> Result<Self, GeoArrowError> {
        if !value.contains(':') {
            return Err(GeoArrowError::IncorrectType(
                format!("expected an AUTHORITY:CODE CRS, got {value:?}").into(),
            ));
        }
        self.crs = Some(Value::String(value));
        self.crs_type = Some(CRSType::AuthorityCode);
        Ok(self)
    }

    /// Set the edge type.
    pub fn with_edges(mut self, edges: Edges) -> Self {
        self.edges = Some(edges);
        self
    }

    /// The CRS as a plain string, if it was stored as one.
    pub fn crs_str(&self) -> Option<&str> {
        self.crs.as_ref().and_then(Value::as_str)
    }

    /// Field metadata for a WKB array carrying this metadata.
    pub fn to_field_metadata(&self, extension_name: &str) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert(EXTENSION_NAME_KEY.to_string(), extension_name.to_string());
        if self.should_serialize() {
            // ArrayMetadata only holds JSON-representable values
            if let Ok(serialized) = serde_json::to_string(self) {
                metadata.insert(EXTENSION_METADATA_KEY.to_string(), serialized);
            }
        }
        metadata
    }
}

impl TryFrom<&Field> for ArrayMetadata {
    type Error = GeoArrowError;

    fn try_from(value: &Field) -> Result<Self, Self::Error> {
        if let Some(ext_meta) = value.metadata().get(EXTENSION_METADATA_KEY) {
            Ok(serde_json::from_str(ext_meta)?)
        } else {
            Ok(Default::default())
        }
    }
}
