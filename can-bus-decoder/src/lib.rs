//! CAN Bus Decoder Library
//!
//! Reads a live CAN bus on a background thread, decodes a fixed set of
//! vehicle frames into engineering values and keeps the latest value of each
//! signal for other threads to poll.
//!
//! # Architecture
//!
//! - [`signals`]: pure frame → readings decoding, no state
//! - [`ValueCache`]: one slot per signal, read as a consistent snapshot
//! - [`BusReader`]: owns the socket and the read loop thread
//! - [`SignalSink`]: boundary for forwarding snapshots off-process
//!
//! The library does NOT:
//! - Retransmit, filter or rate-limit frames
//! - Validate the plausibility of decoded values
//! - Reconnect after a bus failure
//!
//! # Example Usage
//!
//! ```no_run
//! use can_bus_decoder::{publish_snapshot, BusReader, ReaderConfig};
//! use std::time::Duration;
//!
//! let reader = BusReader::open_with_config(&ReaderConfig::new("vcan0")).unwrap();
//!
//! loop {
//!     std::thread::sleep(Duration::from_millis(100));
//!     let values = reader.snapshot();
//!     let mut print = |name: &str, payload: &str| -> can_bus_decoder::Result<()> {
//!         println!("{} {}", name, payload);
//!         Ok(())
//!     };
//!     publish_snapshot(&values, &mut print, None, chrono::Utc::now()).unwrap();
//! }
//! ```

// Public modules
pub mod cache;
pub mod config;
pub mod publish;
pub mod reader;
pub mod signals;
pub mod source;
pub mod types;

// Re-export main types for convenience
pub use cache::{Sample, ValueCache, Values};
pub use config::{ReaderConfig, DEFAULT_INTERFACE};
pub use publish::{publish_snapshot, SignalSink};
pub use reader::{BusReader, ReaderState, StopReason};
pub use signals::{decode_frame, is_known, required_len};
pub use source::{FrameSource, Received, SocketCanSource};
pub use types::{
    CanFrame, ReaderError, Result, Signal, SignalReading, SignalValue, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
