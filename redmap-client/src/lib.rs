//! # redmap Store Clients
//!
//! Purpose: Provide ready-to-use handles to a Redis-compatible key-value
//! store in two mutually exclusive execution modes, selected once at
//! construction: a blocking client backed by a bounded connection pool, and a
//! non-blocking client that suspends the calling task at each store
//! round-trip.
//!
//! ## Design Principles
//! 1. **Scoped Acquisition**: Every command runs inside an RAII guard that
//!    logs the operation name on entry and releases the connection on all
//!    exit paths.
//! 2. **Transparent Pass-Through**: No retries, no backoff, no suppression.
//!    Failures are logged once with their operation name and re-signaled.
//! 3. **Interface Seam**: Callers depend on [`StoreClient`] or
//!    [`AsyncStoreClient`] only, never on a concrete client type.
//! 4. **Explicit Protocol Handling**: RESP2 framing is encoded and decoded
//!    explicitly; violations fail fast as protocol errors.

pub mod blocking;
pub mod config;
pub mod nonblocking;
pub mod pool;
pub mod resp;

pub use blocking::{BlockingStore, ScopedOp, StoreClient};
pub use config::StoreConfig;
pub use nonblocking::{AsyncScopedOp, AsyncStore, AsyncStoreClient};
pub use resp::RespValue;
