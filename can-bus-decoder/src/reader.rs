//! Background bus reader
//!
//! [`BusReader`] owns a [`FrameSource`] and a dedicated thread that pulls
//! frames from it, decodes them and writes the results into a [`ValueCache`].
//! Any number of threads may call [`BusReader::snapshot`] while the loop runs.
//!
//! The thread lives exactly as long as the reader: `close()` (or dropping the
//! reader) raises a shutdown flag, waits for the loop to exit, and the loop
//! drops the source on its way out, so the connection is released before
//! `close()` returns.

use crate::cache::{ValueCache, Values};
use crate::config::ReaderConfig;
use crate::signals::decode_frame;
use crate::source::{FrameSource, Received, SocketCanSource};
use crate::types::{ReaderError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Why the read loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The owner closed the reader
    Closed,
    /// The source failed; the reader will not update again
    Failed(String),
}

/// Lifecycle state of a [`BusReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderState {
    Running,
    Stopped(StopReason),
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderState::Running => write!(f, "running"),
            ReaderState::Stopped(StopReason::Closed) => write!(f, "stopped (closed)"),
            ReaderState::Stopped(StopReason::Failed(e)) => write!(f, "stopped (error: {})", e),
        }
    }
}

/// State shared between the reader handle and its loop thread
struct Shared {
    cache: ValueCache,
    state: Mutex<ReaderState>,
    shutdown: AtomicBool,
    frames: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            cache: ValueCache::new(),
            state: Mutex::new(ReaderState::Running),
            shutdown: AtomicBool::new(false),
            frames: AtomicU64::new(0),
        }
    }

    fn stop(&self, reason: StopReason) {
        *self.state.lock() = ReaderState::Stopped(reason);
    }
}

/// Reads a CAN bus on a background thread and caches the latest signal values
pub struct BusReader {
    interface: String,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl BusReader {
    /// Open a raw CAN socket on `interface` and start reading
    ///
    /// # Example
    /// ```no_run
    /// use can_bus_decoder::{BusReader, Signal};
    ///
    /// let reader = BusReader::open("vcan0").unwrap();
    /// let values = reader.snapshot();
    /// if let Some(speed) = values.value(Signal::Speed) {
    ///     println!("speed: {}", speed);
    /// }
    /// ```
    pub fn open(interface: &str) -> Result<Self> {
        Self::open_with_config(&ReaderConfig::new(interface))
    }

    /// Open the interface named in `config` and start reading
    ///
    /// Fails with [`ReaderError::Connection`] if the socket cannot be created
    /// or bound; nothing is left running in that case.
    pub fn open_with_config(config: &ReaderConfig) -> Result<Self> {
        let source = SocketCanSource::open(&config.interface, config.read_timeout())?;
        Self::with_source(source, config)
    }

    /// Start reading from an already opened source
    pub fn with_source<S: FrameSource>(source: S, config: &ReaderConfig) -> Result<Self> {
        let shared = Arc::new(Shared::new());
        let interface = config.interface.clone();

        let handle = thread::Builder::new()
            .name(config.thread_name())
            .spawn({
                let shared = Arc::clone(&shared);
                let interface = interface.clone();
                move || read_loop(source, &shared, &interface)
            })
            .map_err(ReaderError::Spawn)?;

        log::info!("Started CAN reader on {}", interface);

        Ok(Self {
            interface,
            shared,
            handle: Some(handle),
        })
    }

    /// Consistent copy of the latest value of every signal
    ///
    /// Never waits on bus I/O. Keeps returning the last known values after
    /// the reader has stopped.
    pub fn snapshot(&self) -> Values {
        self.shared.cache.snapshot()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReaderState {
        self.shared.state.lock().clone()
    }

    /// True while the read loop is still receiving
    pub fn is_running(&self) -> bool {
        matches!(self.state(), ReaderState::Running)
    }

    /// Number of complete frames received so far
    pub fn frames_received(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    /// Interface this reader was opened on
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Stop the read loop and wait for it to exit
    ///
    /// Calling this more than once is harmless. Dropping the reader closes
    /// it as well.
    pub fn close(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.shared.shutdown.store(true, Ordering::Release);

        if handle.join().is_err() {
            log::error!("CAN read loop on {} panicked", self.interface);
            self.shared.stop(StopReason::Failed("read loop panicked".to_string()));
        }

        log::info!("Closed CAN reader on {}", self.interface);
    }
}

impl Drop for BusReader {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for BusReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusReader")
            .field("interface", &self.interface)
            .field("state", &self.state())
            .field("frames_received", &self.frames_received())
            .finish()
    }
}

fn read_loop<S: FrameSource>(mut source: S, shared: &Shared, interface: &str) {
    let reason = loop {
        if shared.shutdown.load(Ordering::Acquire) {
            break StopReason::Closed;
        }

        match source.recv() {
            Ok(Received::Frame(frame)) => {
                shared.frames.fetch_add(1, Ordering::Relaxed);
                log::trace!("Received CAN ID 0x{:X}, data {:02X?}", frame.can_id, frame.data);
                shared.cache.apply(&decode_frame(&frame));
            }
            Ok(Received::Incomplete { bytes }) => {
                log::warn!("Read incomplete CAN frame on {} ({} bytes)", interface, bytes);
            }
            Ok(Received::Idle) => {}
            Err(e) => {
                // A source torn down during close() is not a fault
                if shared.shutdown.load(Ordering::Acquire) {
                    break StopReason::Closed;
                }
                log::error!("Error reading CAN frame on {}: {}", interface, e);
                break StopReason::Failed(e.to_string());
            }
        }
    };

    drop(source);

    match &reason {
        StopReason::Closed => log::debug!("CAN read loop on {} exited", interface),
        StopReason::Failed(_) => log::warn!("CAN reader on {} is no longer updating", interface),
    }
    shared.stop(reason);
}
