//! # Non-Blocking Client
//!
//! Purpose: The same command surface as the blocking client, but every store
//! round-trip suspends the calling task instead of blocking a thread.
//!
//! ## Design Principles
//! 1. **Single Suspension Seam**: Tasks suspend only at connection
//!    acquisition and command round-trips; encoding and decoding never yield.
//! 2. **Lazy Reconnect**: One connection is kept behind an async mutex,
//!    established on first use and dropped after any failure so the next
//!    operation reconnects.
//! 3. **Same Discipline**: Scoped acquisition, operation-name logging, and
//!    pass-through failure semantics match the blocking mode exactly.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use bytes::{Buf, BytesMut};
use redmap_common::{StoreError, StoreResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::resp::{
    decode, encode_command, expect_bulk, expect_integer, expect_pairs, expect_simple,
    expect_string_array, RespValue,
};

/// Command surface of the non-blocking execution mode.
///
/// Mirrors [`crate::StoreClient`] method for method; the two traits are the
/// seam between the entry mapper and the mode chosen at construction.
pub trait AsyncStoreClient {
    /// Pings the store and returns its response text.
    fn ping(&self) -> impl std::future::Future<Output = StoreResult<String>> + Send;
    /// True when the top-level key exists.
    fn exists(&self, key: &str) -> impl std::future::Future<Output = StoreResult<bool>> + Send;
    /// Lists top-level keys matching a glob pattern.
    fn keys(&self, pattern: &str)
        -> impl std::future::Future<Output = StoreResult<Vec<String>>> + Send;
    /// Writes one hash field; true when the field was newly created.
    fn hset(
        &self,
        key: &str,
        field: &str,
        value: &[u8],
    ) -> impl std::future::Future<Output = StoreResult<bool>> + Send;
    /// Reads one hash field; `None` when the field is absent.
    fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> impl std::future::Future<Output = StoreResult<Option<Vec<u8>>>> + Send;
    /// Reads every field of a hash.
    fn hgetall(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = StoreResult<BTreeMap<String, Vec<u8>>>> + Send;
    /// Lists the field names of a hash.
    fn hkeys(&self, key: &str)
        -> impl std::future::Future<Output = StoreResult<Vec<String>>> + Send;
    /// True when the hash field exists.
    fn hexists(
        &self,
        key: &str,
        field: &str,
    ) -> impl std::future::Future<Output = StoreResult<bool>> + Send;
    /// Deletes one hash field; true when a field was removed.
    fn hdel(
        &self,
        key: &str,
        field: &str,
    ) -> impl std::future::Future<Output = StoreResult<bool>> + Send;
    /// Deletes a top-level key; true when a key was removed.
    fn delete(&self, key: &str) -> impl std::future::Future<Output = StoreResult<bool>> + Send;
}

/// Non-blocking store client over a lazily established connection.
pub struct AsyncStore {
    config: StoreConfig,
    conn: Mutex<Option<AsyncConnection>>,
}

impl AsyncStore {
    /// Creates a client with default configuration for the given address.
    pub fn connect(addr: impl Into<String>) -> Self {
        Self::with_config(StoreConfig::new(addr))
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        AsyncStore {
            config,
            conn: Mutex::new(None),
        }
    }

    /// Scoped acquisition of the connection for one named operation.
    pub async fn acquire(&self, op_name: &str) -> StoreResult<AsyncScopedOp<'_>> {
        let mut slot = self.conn.lock().await;
        if slot.is_none() {
            let conn = AsyncConnection::connect(&self.config).await.map_err(|err| {
                error!(op = op_name, error = %err, "unable to open store connection");
                err
            })?;
            *slot = Some(conn);
        }
        debug!(op = op_name, "store operation started");
        Ok(AsyncScopedOp {
            op: op_name.to_string(),
            slot,
        })
    }
}

/// Guard holding the connection for one named operation.
pub struct AsyncScopedOp<'a> {
    op: String,
    slot: MutexGuard<'a, Option<AsyncConnection>>,
}

impl AsyncScopedOp<'_> {
    /// Forwards one command to the store.
    ///
    /// On failure the connection is dropped (the next acquisition
    /// reconnects), the operation name and error are logged once, and the
    /// failure is re-signaled.
    pub async fn execute(&mut self, args: &[&[u8]]) -> StoreResult<RespValue> {
        let conn = self.slot.as_mut().expect("connection present");
        match conn.exec(args).await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.slot.take();
                error!(op = %self.op, error = %err, "store command failed");
                Err(err)
            }
        }
    }
}

impl Drop for AsyncScopedOp<'_> {
    fn drop(&mut self) {
        debug!(op = %self.op, "store operation finished");
    }
}

struct AsyncConnection {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: Vec<u8>,
    read_timeout: Option<std::time::Duration>,
}

impl AsyncConnection {
    async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let addr: SocketAddr = config
            .addr
            .parse()
            .map_err(|_| StoreError::InvalidAddress(config.addr.clone()))?;

        let stream = match config.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(addr))
                .await
                .map_err(|_| timeout_error("connect timed out"))??,
            None => TcpStream::connect(addr).await?,
        };
        stream.set_nodelay(true)?;
        debug!(addr = %config.addr, "opened non-blocking store connection");

        Ok(AsyncConnection {
            stream,
            read_buf: BytesMut::with_capacity(4 * 1024),
            write_buf: Vec::with_capacity(256),
            read_timeout: config.read_timeout,
        })
    }

    async fn exec(&mut self, args: &[&[u8]]) -> StoreResult<RespValue> {
        self.write_buf.clear();
        encode_command(args, &mut self.write_buf);
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;

        loop {
            if let Some((value, used)) = decode(&self.read_buf)? {
                self.read_buf.advance(used);
                return Ok(value);
            }

            let read = match self.read_timeout {
                Some(timeout) => {
                    tokio::time::timeout(timeout, self.stream.read_buf(&mut self.read_buf))
                        .await
                        .map_err(|_| timeout_error("read timed out"))??
                }
                None => self.stream.read_buf(&mut self.read_buf).await?,
            };
            if read == 0 {
                return Err(StoreError::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "store closed the connection mid-reply",
                )));
            }
        }
    }
}

fn timeout_error(context: &str) -> StoreError {
    StoreError::Connection(std::io::Error::new(std::io::ErrorKind::TimedOut, context))
}

impl AsyncStoreClient for AsyncStore {
    async fn ping(&self) -> StoreResult<String> {
        let mut op = self.acquire("ping()").await?;
        expect_simple(op.execute(&[b"PING"]).await?)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("exists(\"{key}\")")).await?;
        Ok(expect_integer(op.execute(&[b"EXISTS", key.as_bytes()]).await?)? > 0)
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut op = self.acquire(&format!("keys(\"{pattern}\")")).await?;
        expect_string_array(op.execute(&[b"KEYS", pattern.as_bytes()]).await?)
    }

    async fn hset(&self, key: &str, field: &str, value: &[u8]) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("hset(\"{key}\", \"{field}\")")).await?;
        let reply = op
            .execute(&[b"HSET", key.as_bytes(), field.as_bytes(), value])
            .await?;
        Ok(expect_integer(reply)? > 0)
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut op = self.acquire(&format!("hget(\"{key}\", \"{field}\")")).await?;
        expect_bulk(op.execute(&[b"HGET", key.as_bytes(), field.as_bytes()]).await?)
    }

    async fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        let mut op = self.acquire(&format!("hgetall(\"{key}\")")).await?;
        expect_pairs(op.execute(&[b"HGETALL", key.as_bytes()]).await?)
    }

    async fn hkeys(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut op = self.acquire(&format!("hkeys(\"{key}\")")).await?;
        expect_string_array(op.execute(&[b"HKEYS", key.as_bytes()]).await?)
    }

    async fn hexists(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut op = self
            .acquire(&format!("hexists(\"{key}\", \"{field}\")"))
            .await?;
        let reply = op
            .execute(&[b"HEXISTS", key.as_bytes(), field.as_bytes()])
            .await?;
        Ok(expect_integer(reply)? == 1)
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("hdel(\"{key}\", \"{field}\")")).await?;
        let reply = op
            .execute(&[b"HDEL", key.as_bytes(), field.as_bytes()])
            .await?;
        Ok(expect_integer(reply)? > 0)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut op = self.acquire(&format!("delete(\"{key}\")")).await?;
        Ok(expect_integer(op.execute(&[b"DEL", key.as_bytes()]).await?)? > 0)
    }
}
