//! # Blocking Client
//!
//! Purpose: Expose the hash-object command surface over a pooled, blocking
//! TCP connection. Every call acquires a connection, runs exactly one
//! command, and releases the connection on all exit paths.
//!
//! The operation-name strings logged here follow the `hset("key", "field")`
//! format so diagnostics read like the command that was issued.

use std::collections::BTreeMap;

use redmap_common::StoreResult;
use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::pool::{ConnectionPool, PooledConnection};
use crate::resp::{
    expect_bulk, expect_integer, expect_pairs, expect_simple, expect_string_array, RespValue,
};

/// Command surface of the blocking execution mode.
///
/// The entry mapper is generic over this trait; [`BlockingStore`] is the one
/// production implementation, test doubles provide in-memory ones.
pub trait StoreClient {
    /// Pings the store and returns its response text.
    fn ping(&self) -> StoreResult<String>;
    /// True when the top-level key exists.
    fn exists(&self, key: &str) -> StoreResult<bool>;
    /// Lists top-level keys matching a glob pattern.
    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
    /// Writes one hash field; true when the field was newly created.
    fn hset(&self, key: &str, field: &str, value: &[u8]) -> StoreResult<bool>;
    /// Reads one hash field; `None` when the field is absent.
    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Vec<u8>>>;
    /// Reads every field of a hash.
    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, Vec<u8>>>;
    /// Lists the field names of a hash.
    fn hkeys(&self, key: &str) -> StoreResult<Vec<String>>;
    /// True when the hash field exists.
    fn hexists(&self, key: &str, field: &str) -> StoreResult<bool>;
    /// Deletes one hash field; true when a field was removed.
    fn hdel(&self, key: &str, field: &str) -> StoreResult<bool>;
    /// Deletes a top-level key; true when a key was removed.
    fn delete(&self, key: &str) -> StoreResult<bool>;
}

/// Blocking store client with connection pooling.
pub struct BlockingStore {
    pool: ConnectionPool,
}

impl BlockingStore {
    /// Creates a client with default configuration for the given address.
    pub fn connect(addr: impl Into<String>) -> Self {
        Self::with_config(StoreConfig::new(addr))
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        BlockingStore {
            pool: ConnectionPool::new(config),
        }
    }

    /// Scoped acquisition of a connection for one named operation.
    ///
    /// The returned guard logs the operation name now and again when it is
    /// released; the underlying connection goes back to the pool on every
    /// exit path because the guard owns it.
    pub fn acquire(&self, op_name: &str) -> StoreResult<ScopedOp> {
        let conn = self.pool.acquire().map_err(|err| {
            error!(op = op_name, error = %err, "unable to acquire store connection");
            err
        })?;
        debug!(op = op_name, "store operation started");
        Ok(ScopedOp {
            op: op_name.to_string(),
            conn,
        })
    }
}

/// RAII guard around a pooled connection, tagged with an operation name.
pub struct ScopedOp {
    op: String,
    conn: PooledConnection,
}

impl ScopedOp {
    /// Forwards one command to the store.
    ///
    /// On failure the operation name and underlying error are logged once and
    /// the failure is re-signaled; the connection is not reused.
    pub fn execute(&mut self, args: &[&[u8]]) -> StoreResult<RespValue> {
        self.conn.exec(args).map_err(|err| {
            error!(op = %self.op, error = %err, "store command failed");
            err
        })
    }
}

impl Drop for ScopedOp {
    fn drop(&mut self) {
        debug!(op = %self.op, "store operation finished");
    }
}

impl StoreClient for BlockingStore {
    fn ping(&self) -> StoreResult<String> {
        let mut op = self.acquire("ping()")?;
        expect_simple(op.execute(&[b"PING"])?)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("exists(\"{key}\")"))?;
        Ok(expect_integer(op.execute(&[b"EXISTS", key.as_bytes()])?)? > 0)
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut op = self.acquire(&format!("keys(\"{pattern}\")"))?;
        expect_string_array(op.execute(&[b"KEYS", pattern.as_bytes()])?)
    }

    fn hset(&self, key: &str, field: &str, value: &[u8]) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("hset(\"{key}\", \"{field}\")"))?;
        let reply = op.execute(&[b"HSET", key.as_bytes(), field.as_bytes(), value])?;
        Ok(expect_integer(reply)? > 0)
    }

    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut op = self.acquire(&format!("hget(\"{key}\", \"{field}\")"))?;
        expect_bulk(op.execute(&[b"HGET", key.as_bytes(), field.as_bytes()])?)
    }

    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        let mut op = self.acquire(&format!("hgetall(\"{key}\")"))?;
        expect_pairs(op.execute(&[b"HGETALL", key.as_bytes()])?)
    }

    fn hkeys(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut op = self.acquire(&format!("hkeys(\"{key}\")"))?;
        expect_string_array(op.execute(&[b"HKEYS", key.as_bytes()])?)
    }

    fn hexists(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("hexists(\"{key}\", \"{field}\")"))?;
        let reply = op.execute(&[b"HEXISTS", key.as_bytes(), field.as_bytes()])?;
        Ok(expect_integer(reply)? == 1)
    }

    fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("hdel(\"{key}\", \"{field}\")"))?;
        let reply = op.execute(&[b"HDEL", key.as_bytes(), field.as_bytes()])?;
        Ok(expect_integer(reply)? > 0)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("delete(\"{key}\")"))?;
        Ok(expect_integer(op.execute(&[b"DEL", key.as_bytes()])?)? > 0)
    }
}
