//! Static field schema descriptors.
//!
//! A record type's schema is an ordered `&'static [FieldSpec]` fixed at
//! type-definition time. The order is the declaration order and drives both
//! `dump` rendering and equality checks.

/// Scalar type a field may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// UTF-8 string.
    Str,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float; used for epoch-seconds timestamps.
    Float,
    /// Boolean flag.
    Bool,
}

impl FieldKind {
    /// Human-readable name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            FieldKind::Str => "str",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
        }
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as stored in the field map.
    pub name: &'static str,
    /// Declared scalar type.
    pub kind: FieldKind,
    /// Derived fields are encoded into the sub-key instead of the field map
    /// and never appear in `to_field_map` output.
    pub derived: bool,
}

impl FieldSpec {
    /// Declares a regular field.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            derived: false,
        }
    }

    /// Declares a derived field (identity lives in the sub-key).
    pub const fn derived(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            derived: true,
        }
    }
}

/// Looks a field up by name in a schema.
pub fn find<'a>(schema: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    schema.iter().find(|spec| spec.name == name)
}
