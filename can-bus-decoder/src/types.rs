//! Core types for the CAN bus decoder library
//!
//! This module defines the frames the reader consumes, the fixed set of
//! engineering signals it produces, and the error type shared by the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Maximum payload of a classic CAN frame
pub const MAX_DLC: usize = 8;

/// Raw CAN frame as received from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// CAN message ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Frame data bytes (0-8 bytes)
    pub data: Vec<u8>,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
    /// True if this is a remote frame
    pub is_remote_frame: bool,
}

impl CanFrame {
    /// Create a standard data frame
    ///
    /// Fails with [`ReaderError::InvalidData`] if the payload exceeds 8 bytes.
    pub fn new(can_id: u32, data: &[u8]) -> Result<Self> {
        if data.len() > MAX_DLC {
            return Err(ReaderError::InvalidData(format!(
                "payload of {} bytes exceeds CAN DLC {} for ID 0x{:X}",
                data.len(),
                MAX_DLC,
                can_id
            )));
        }

        Ok(Self {
            can_id,
            data: data.to_vec(),
            is_extended: can_id > 0x7FF,
            is_remote_frame: false,
        })
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Errors that can occur while opening or running a bus reader
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Failed to open CAN interface '{interface}': {source}")]
    Connection {
        interface: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn read loop: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Sink rejected reading: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The engineering signals this decoder knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Vehicle speed (km/h)
    Speed,
    /// Engine speed
    Rpm,
    /// Coolant temperature (°C)
    #[serde(rename = "temp")]
    Temperature,
    /// Throttle position (%)
    Throttle,
    /// Brake pedal pressed
    Brake,
    /// Check-engine light
    #[serde(rename = "cel")]
    CheckEngine,
    /// Engine-management light
    #[serde(rename = "eml")]
    EngineManagement,
}

impl Signal {
    /// All signals, in publish order
    pub const ALL: [Signal; 7] = [
        Signal::Speed,
        Signal::Rpm,
        Signal::Temperature,
        Signal::Throttle,
        Signal::Brake,
        Signal::CheckEngine,
        Signal::EngineManagement,
    ];

    /// Stable name used when handing readings to a sink
    pub fn name(self) -> &'static str {
        match self {
            Signal::Speed => "speed",
            Signal::Rpm => "rpm",
            Signal::Temperature => "temp",
            Signal::Throttle => "throttle",
            Signal::Brake => "brake",
            Signal::CheckEngine => "cel",
            Signal::EngineManagement => "eml",
        }
    }

    /// Engineering unit, if the signal has one
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Signal::Speed => Some("km/h"),
            Signal::Rpm => Some("rpm"),
            Signal::Temperature => Some("°C"),
            Signal::Throttle => Some("%"),
            Signal::Brake | Signal::CheckEngine | Signal::EngineManagement => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signal value types produced by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    /// Floating-point value (after scaling/offset)
    Float(f64),
    /// Boolean value (single bit)
    Boolean(bool),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Float(v) => write!(f, "{:.2}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
        }
    }
}

impl SignalValue {
    /// Convert signal value to f64
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Float(v) => *v,
            SignalValue::Boolean(v) => if *v { 1.0 } else { 0.0 },
        }
    }

    /// Boolean view of the value, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SignalValue::Boolean(v) => Some(*v),
            SignalValue::Float(_) => None,
        }
    }

    /// Render the value the way sinks receive it
    ///
    /// Floats carry six decimals, booleans are `1`/`0`.
    pub fn payload(&self) -> String {
        match self {
            SignalValue::Float(v) => format!("{:.6}", v),
            SignalValue::Boolean(v) => if *v { "1" } else { "0" }.to_string(),
        }
    }
}

/// One decoded value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalReading {
    pub signal: Signal,
    pub value: SignalValue,
}

impl SignalReading {
    pub fn float(signal: Signal, value: f64) -> Self {
        Self {
            signal,
            value: SignalValue::Float(value),
        }
    }

    pub fn boolean(signal: Signal, value: bool) -> Self {
        Self {
            signal,
            value: SignalValue::Boolean(value),
        }
    }
}

impl fmt::Display for SignalReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signal.unit() {
            Some(unit) => write!(f, "{}: {} {}", self.signal, self.value, unit),
            None => write!(f, "{}: {}", self.signal, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_oversized_payload() {
        assert!(CanFrame::new(0x153, &[0; 9]).is_err());

        let frame = CanFrame::new(0x153, &[0, 1, 2]).unwrap();
        assert_eq!(frame.dlc(), 3);
        assert!(!frame.is_extended);
        assert!(CanFrame::new(0x18DA00F1, &[]).unwrap().is_extended);
    }

    #[test]
    fn test_signal_names() {
        let names: Vec<&str> = Signal::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["speed", "rpm", "temp", "throttle", "brake", "cel", "eml"]);
        for (i, signal) in Signal::ALL.iter().enumerate() {
            assert_eq!(signal.index(), i);
        }
    }

    #[test]
    fn test_signal_value_display() {
        assert_eq!(format!("{}", SignalValue::Float(26.627)), "26.63");
        assert_eq!(format!("{}", SignalValue::Boolean(true)), "true");
        assert_eq!(
            format!("{}", SignalReading::float(Signal::Speed, 16.0)),
            "speed: 16.00 km/h"
        );
    }

    #[test]
    fn test_signal_value_payload() {
        assert_eq!(SignalValue::Float(50.0).payload(), "50.000000");
        assert_eq!(SignalValue::Boolean(true).payload(), "1");
        assert_eq!(SignalValue::Boolean(false).payload(), "0");
        assert_eq!(SignalValue::Boolean(true).as_f64(), 1.0);
        assert_eq!(SignalValue::Float(1.0).as_bool(), None);
    }
}
