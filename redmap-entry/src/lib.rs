//! # redmap Entry Mapper
//!
//! Purpose: Convert between in-memory records and the flat field maps stored
//! as hash objects in a Redis-compatible store, and run the generic
//! store/fetch operations over either client mode.
//!
//! ## Design Principles
//! 1. **Static Schemas**: Every record type declares an ordered, compile-time
//!    list of field descriptors; there is no runtime reflection.
//! 2. **Explicit Encoding**: Field values are stored as versioned, tagged
//!    JSON payloads; decoding a foreign version or malformed payload is a
//!    per-field error, never a silent default.
//! 3. **Full or Nothing**: A fetch either reconstructs the whole record or
//!    fails; there is no partial-success reporting.
//! 4. **Capability Seam**: Records participate through the [`StoreEntry`]
//!    trait; persistence is generic over the client traits only.

pub mod entry;
pub mod persist;
pub mod schema;
pub mod value;

pub use entry::{dump, entries_equal, sub_key_for, to_field_map, StoreEntry};
pub use schema::{FieldKind, FieldSpec};
pub use value::{FieldMap, FieldValue, FieldValues, FORMAT_VERSION};
