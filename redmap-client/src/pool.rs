//! # Blocking Connection Pool
//!
//! Purpose: Reuse TCP connections for the blocking client to avoid repeated
//! handshakes.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Keep a bounded set of reusable connections.
//! 2. **Minimal Locking**: Hold the mutex only while moving idle connections.
//! 3. **Fail Fast**: Exceeding the pool limit is an error, not a wait.
//! 4. **Invalidate on Failure**: A connection that saw an IO or protocol
//!    error never returns to the idle set.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};

use redmap_common::{StoreError, StoreResult};
use tracing::debug;

use crate::config::StoreConfig;
use crate::resp::{decode, encode_command, RespValue};

struct PoolState {
    idle: VecDeque<Connection>,
    total: usize,
}

struct PoolInner {
    config: StoreConfig,
    state: Mutex<PoolState>,
}

/// Connection pool handle.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Creates a new connection pool; connections are opened lazily.
    pub fn new(config: StoreConfig) -> Self {
        let state = PoolState {
            idle: VecDeque::with_capacity(config.max_idle),
            total: 0,
        };
        ConnectionPool {
            inner: Arc::new(PoolInner {
                config,
                state: Mutex::new(state),
            }),
        }
    }

    /// Acquires a connection from the pool, opening one if none are idle.
    pub fn acquire(&self) -> StoreResult<PooledConnection> {
        if let Some(conn) = self.pop_idle() {
            return Ok(PooledConnection::new(self.inner.clone(), conn));
        }

        if !self.try_reserve() {
            return Err(StoreError::PoolExhausted);
        }

        match Connection::connect(&self.inner.config) {
            Ok(conn) => Ok(PooledConnection::new(self.inner.clone(), conn)),
            Err(err) => {
                self.release_slot();
                Err(err)
            }
        }
    }

    fn pop_idle(&self) -> Option<Connection> {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        state.idle.pop_front()
    }

    fn try_reserve(&self) -> bool {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        if state.total >= self.inner.config.max_total {
            return false;
        }
        state.total += 1;
        true
    }

    fn release_slot(&self) {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        state.total = state.total.saturating_sub(1);
    }

    fn return_connection(&self, conn: Connection) {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        if state.idle.len() < self.inner.config.max_idle {
            state.idle.push_back(conn);
        } else {
            state.total = state.total.saturating_sub(1);
        }
    }
}

/// RAII wrapper returning a connection to the pool on drop.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
    valid: bool,
}

impl PooledConnection {
    fn new(pool: Arc<PoolInner>, conn: Connection) -> Self {
        PooledConnection {
            pool,
            conn: Some(conn),
            valid: true,
        }
    }

    /// Executes one RESP command and returns the parsed response.
    pub fn exec(&mut self, args: &[&[u8]]) -> StoreResult<RespValue> {
        let conn = self.conn.as_mut().expect("connection exists");
        let response = conn.exec(args);
        if response.is_err() {
            // Do not return a failed connection to the pool.
            self.valid = false;
        }
        response
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };

        let pool = ConnectionPool {
            inner: self.pool.clone(),
        };

        if self.valid {
            pool.return_connection(conn);
        } else {
            pool.release_slot();
        }
    }
}

/// Single TCP connection with reusable buffers.
struct Connection {
    stream: TcpStream,
    read_buf: Vec<u8>,
    write_buf: Vec<u8>,
}

impl Connection {
    fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let stream = connect_stream(config)?;
        if let Some(timeout) = config.read_timeout {
            stream.set_read_timeout(Some(timeout))?;
        }
        if let Some(timeout) = config.write_timeout {
            stream.set_write_timeout(Some(timeout))?;
        }
        // Disable Nagle to keep request latency low for small payloads.
        stream.set_nodelay(true)?;
        debug!(addr = %config.addr, "opened blocking store connection");

        Ok(Connection {
            stream,
            read_buf: Vec::with_capacity(512),
            write_buf: Vec::with_capacity(256),
        })
    }

    fn exec(&mut self, args: &[&[u8]]) -> StoreResult<RespValue> {
        self.write_buf.clear();
        encode_command(args, &mut self.write_buf);
        self.stream.write_all(&self.write_buf)?;
        self.stream.flush()?;

        loop {
            if let Some((value, used)) = decode(&self.read_buf)? {
                self.read_buf.drain(..used);
                return Ok(value);
            }

            let mut chunk = [0u8; 4096];
            let read = self.stream.read(&mut chunk)?;
            if read == 0 {
                return Err(StoreError::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "store closed the connection mid-reply",
                )));
            }
            self.read_buf.extend_from_slice(&chunk[..read]);
        }
    }
}

fn connect_stream(config: &StoreConfig) -> StoreResult<TcpStream> {
    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|_| StoreError::InvalidAddress(config.addr.clone()))?;
    let stream = match config.connect_timeout {
        Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
        None => TcpStream::connect(addr)?,
    };
    Ok(stream)
}
