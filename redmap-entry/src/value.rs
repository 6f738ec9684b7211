//! # Field Values and the Stored Encoding
//!
//! Purpose: Carry a record field's scalar value and encode it as an explicit,
//! versioned payload instead of an implementation-defined blob.
//!
//! Every field is stored as JSON of the shape
//! `{"v":1,"value":{"Float":1610322901.801648}}`; the whole record is one
//! JSON object mapping field names to those payloads, stored under the
//! record's sub-key because the store's hash model is flat. Version checks
//! happen on decode and fail per-field.

use std::collections::BTreeMap;

use redmap_common::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

use crate::schema::FieldKind;

/// Version tag embedded in every encoded field payload.
pub const FORMAT_VERSION: u8 = 1;

/// Intermediate representation of a record: field name to encoded bytes.
pub type FieldMap = BTreeMap<String, Vec<u8>>;

/// A single field's scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// UTF-8 string.
    Str(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit float, carried at full precision.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
}

impl FieldValue {
    /// The schema kind this value satisfies.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Str(_) => FieldKind::Str,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Bool(_) => FieldKind::Bool,
        }
    }

    /// String form used by `dump`; floats keep their shortest round-trip
    /// representation.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Str(text) => text.clone(),
            FieldValue::Int(number) => number.to_string(),
            FieldValue::Float(number) => number.to_string(),
            FieldValue::Bool(flag) => flag.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    v: u8,
    value: FieldValue,
}

/// Encodes one field value into its versioned payload.
pub fn encode_field(name: &str, value: &FieldValue) -> StoreResult<Vec<u8>> {
    let envelope = Envelope {
        v: FORMAT_VERSION,
        value: value.clone(),
    };
    serde_json::to_vec(&envelope).map_err(|err| StoreError::Serialize {
        field: name.to_string(),
        reason: err.to_string(),
    })
}

/// Decodes one field payload, checking the format version.
pub fn decode_field(name: &str, bytes: &[u8]) -> StoreResult<FieldValue> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|err| StoreError::Deserialize {
            field: name.to_string(),
            reason: err.to_string(),
        })?;
    if envelope.v != FORMAT_VERSION {
        return Err(StoreError::Deserialize {
            field: name.to_string(),
            reason: format!("unsupported format version {}", envelope.v),
        });
    }
    Ok(envelope.value)
}

/// Packs a field map into the single blob stored under the sub-key.
pub fn pack_field_map(map: &FieldMap) -> StoreResult<Vec<u8>> {
    let mut outer = serde_json::Map::with_capacity(map.len());
    for (name, bytes) in map {
        let payload: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|err| StoreError::Serialize {
                field: name.clone(),
                reason: err.to_string(),
            })?;
        outer.insert(name.clone(), payload);
    }
    serde_json::to_vec(&serde_json::Value::Object(outer)).map_err(|err| StoreError::Serialize {
        field: "<field map>".to_string(),
        reason: err.to_string(),
    })
}

/// Unpacks a stored blob back into a field map.
pub fn unpack_field_map(blob: &[u8]) -> StoreResult<FieldMap> {
    let outer: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(blob)
        .map_err(|err| StoreError::Deserialize {
            field: "<field map>".to_string(),
            reason: err.to_string(),
        })?;

    let mut map = FieldMap::new();
    for (name, payload) in outer {
        let bytes = serde_json::to_vec(&payload).map_err(|err| StoreError::Deserialize {
            field: name.clone(),
            reason: err.to_string(),
        })?;
        map.insert(name, bytes);
    }
    Ok(map)
}

/// Decoded field values keyed by name, consumed by `StoreEntry::from_fields`.
///
/// The typed takers turn a missing field or a kind mismatch into a
/// `Deserialize` error naming the field, so record constructors stay flat.
#[derive(Debug, Default)]
pub struct FieldValues {
    values: BTreeMap<String, FieldValue>,
}

impl FieldValues {
    pub fn new(values: BTreeMap<String, FieldValue>) -> Self {
        FieldValues { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn take_str(&mut self, name: &str) -> StoreResult<String> {
        match self.take(name)? {
            FieldValue::Str(text) => Ok(text),
            other => Err(kind_mismatch(name, FieldKind::Str, &other)),
        }
    }

    pub fn take_int(&mut self, name: &str) -> StoreResult<i64> {
        match self.take(name)? {
            FieldValue::Int(number) => Ok(number),
            other => Err(kind_mismatch(name, FieldKind::Int, &other)),
        }
    }

    pub fn take_float(&mut self, name: &str) -> StoreResult<f64> {
        match self.take(name)? {
            FieldValue::Float(number) => Ok(number),
            other => Err(kind_mismatch(name, FieldKind::Float, &other)),
        }
    }

    pub fn take_bool(&mut self, name: &str) -> StoreResult<bool> {
        match self.take(name)? {
            FieldValue::Bool(flag) => Ok(flag),
            other => Err(kind_mismatch(name, FieldKind::Bool, &other)),
        }
    }

    fn take(&mut self, name: &str) -> StoreResult<FieldValue> {
        self.values.remove(name).ok_or_else(|| StoreError::Deserialize {
            field: name.to_string(),
            reason: "field missing from stored map".to_string(),
        })
    }
}

fn kind_mismatch(name: &str, expected: FieldKind, got: &FieldValue) -> StoreError {
    StoreError::Deserialize {
        field: name.to_string(),
        reason: format!(
            "expected {}, stored value is {}",
            expected.name(),
            got.kind().name()
        ),
    }
}
