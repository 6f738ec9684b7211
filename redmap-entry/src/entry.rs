//! # The StoreEntry Capability
//!
//! Purpose: Let record types participate in generic persistence by declaring
//! a static schema and exposing field access by name, instead of runtime
//! reflection.
//!
//! A stored record is addressed by its store-key (one hash object per record
//! type) and its sub-key (`{identity}:{creation timestamp}`), assigned once
//! at construction and never changed.

use redmap_common::{StoreError, StoreResult};

use crate::schema::FieldSpec;
use crate::value::{encode_field, FieldMap, FieldValue, FieldValues};

/// Capability trait for records persisted as hash entries.
pub trait StoreEntry: Sized {
    /// Record type name, used in `dump` headers and log context.
    const KIND: &'static str;

    /// Ordered, static field schema for this record type.
    fn schema() -> &'static [FieldSpec];

    /// Top-level grouping key; typically constant per record type.
    fn store_key(&self) -> &str;

    /// Per-record identifier, unique within the store-key's hash.
    fn sub_key(&self) -> &str;

    /// Current value of a declared field, by schema name.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Reconstructs a record from decoded field values.
    fn from_fields(store_key: &str, sub_key: &str, fields: FieldValues) -> StoreResult<Self>;
}

/// Composes a sub-key from an identity field and a creation timestamp.
///
/// The timestamp keeps its full-precision string form, so two records with
/// the same identity collide only when created within the same microsecond.
pub fn sub_key_for(identity: &str, created_ts: f64) -> String {
    format!("{identity}:{created_ts}")
}

/// Serializes every non-derived declared field of a record.
///
/// Derived fields are excluded: their value lives in the sub-key and would
/// otherwise be stored twice.
pub fn to_field_map<E: StoreEntry>(entry: &E) -> StoreResult<FieldMap> {
    let mut map = FieldMap::new();
    for spec in E::schema() {
        if spec.derived {
            continue;
        }
        let value = entry.field(spec.name).ok_or_else(|| StoreError::Serialize {
            field: spec.name.to_string(),
            reason: "declared field not exposed by the record".to_string(),
        })?;
        if value.kind() != spec.kind {
            return Err(StoreError::Serialize {
                field: spec.name.to_string(),
                reason: format!(
                    "declared as {}, record holds {}",
                    spec.kind.name(),
                    value.kind().name()
                ),
            });
        }
        map.insert(spec.name.to_string(), encode_field(spec.name, &value)?);
    }
    Ok(map)
}

/// Fixed multi-line rendering of a record for diagnostics.
///
/// Header names the record type, store key, and sub-key; one line per field
/// in declaration order. Calling it twice on an unmodified record yields
/// identical text.
pub fn dump<E: StoreEntry>(entry: &E) -> String {
    let mut out = format!(
        "{} entry for key \"{}\" (sub-key \"{}\")\n",
        E::KIND,
        entry.store_key(),
        entry.sub_key()
    );
    for spec in E::schema() {
        let rendered = entry
            .field(spec.name)
            .map(|value| value.display())
            .unwrap_or_default();
        out.push_str(&format!("  {} -> \"{}\"\n", spec.name, rendered));
    }
    out
}

/// Field-wise equality over the full declared field set.
///
/// Store-key and sub-key identity participate, so two records stored under
/// different keys are never equal even with matching field values.
pub fn entries_equal<E: StoreEntry>(a: &E, b: &E) -> bool {
    a.store_key() == b.store_key()
        && a.sub_key() == b.sub_key()
        && E::schema()
            .iter()
            .all(|spec| a.field(spec.name) == b.field(spec.name))
}
