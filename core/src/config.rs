//! Endpoint configuration.
//!
//! `EndpointConfig` is plain data so it can be embedded in a larger
//! application config and loaded with serde. Validation and timeout
//! coercion happen when a client is built from it.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT_MS: i64 = 5000;

fn default_timeout_ms() -> i64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    /// Negative values are treated as their absolute value; zero disables the limit.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: i64,
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: i64,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeouts(mut self, connect_timeout_ms: i64, read_timeout_ms: i64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self.read_timeout_ms = read_timeout_ms;
        self
    }
}
