//! Client configuration shared by both execution modes.

use std::time::Duration;

/// Configuration for a store client and, in blocking mode, its pool.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store address, e.g. "127.0.0.1:6379".
    pub addr: String,
    /// Maximum idle connections kept by the blocking pool.
    pub max_idle: usize,
    /// Maximum total connections (idle + in-use) in the blocking pool.
    pub max_total: usize,
    /// Optional TCP read timeout.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl StoreConfig {
    /// Builds a configuration with defaults for everything but the address.
    pub fn new(addr: impl Into<String>) -> Self {
        StoreConfig {
            addr: addr.into(),
            ..StoreConfig::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            addr: "127.0.0.1:6379".to_string(),
            max_idle: 8,
            max_total: 16,
            read_timeout: None,
            write_timeout: None,
            connect_timeout: None,
        }
    }
}
