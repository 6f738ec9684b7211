//! # Error Taxonomy
//!
//! Purpose: Give clients and the entry mapper one shared vocabulary for
//! failures, so callers can branch on the condition instead of parsing
//! messages.
//!
//! ## Design Principles
//! 1. **Fail Fast**: Every error surfaces to the caller verbatim; there is no
//!    retry or fallback layer hiding behind these variants.
//! 2. **Branchable Conditions**: A missing entry (`NotFound`) is distinct from
//!    a rejected command (`Command`) so lookups can miss without being treated
//!    as a systemic fault.
//! 3. **Log Once**: The site that detects an error logs it with the operation
//!    name; these variants carry only what the caller needs afterwards.

use thiserror::Error;

/// Result type used across the redmap crates.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the store clients and the entry mapper.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store unreachable, handshake failed, or the socket died mid-command.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Address could not be parsed into a socket address.
    #[error("invalid store address: {0}")]
    InvalidAddress(String),

    /// Blocking pool is at capacity with no idle connections available.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// RESP framing violation in a store response.
    #[error("protocol error in store response")]
    Protocol,

    /// Store rejected the command (wrong type, wrong arity, ...).
    #[error("store rejected command: {message}")]
    Command { message: String },

    /// Reply type did not match the expected command response.
    #[error("unexpected response type from store")]
    UnexpectedResponse,

    /// Fetch requested a sub-key absent from the store.
    #[error("no entry for sub-key {sub_key:?} under {store_key:?}")]
    NotFound { store_key: String, sub_key: String },

    /// A field value could not be encoded for storage.
    #[error("field {field:?} could not be encoded: {reason}")]
    Serialize { field: String, reason: String },

    /// Stored bytes could not be decoded back to the field's declared type.
    #[error("field {field:?} could not be decoded: {reason}")]
    Deserialize { field: String, reason: String },
}

impl StoreError {
    /// True when the underlying failure was a connection-level problem.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::InvalidAddress(_))
    }

    /// True when the error is a plain missing-entry condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
