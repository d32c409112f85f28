//! Reader configuration types
//!
//! The reader only needs to know which interface to bind and how often the
//! read loop wakes up to check for shutdown. Everything about publishing is
//! handled by the application layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interface used when none is configured
pub const DEFAULT_INTERFACE: &str = "vcan0";

/// Configuration for a [`BusReader`](crate::BusReader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// CAN network interface to bind (e.g. "can0", "vcan0")
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Receive timeout in milliseconds; bounds how long `close()` waits for
    /// the read loop to notice shutdown (default: 50ms)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_read_timeout() -> u64 {
    50
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

impl ReaderConfig {
    /// Create a configuration for the given interface
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Self::default()
        }
    }

    /// Builder method: set the receive timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        // Zero would disable the timeout and make the loop uncancellable
        self.read_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1);
        self
    }

    /// Receive timeout as a `Duration`, never zero
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }

    /// Name given to the read loop thread
    pub fn thread_name(&self) -> String {
        format!("can-rx-{}", self.interface)
    }
}
