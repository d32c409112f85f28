//! Fixed message table
//!
//! Maps each known CAN ID to the bytes it must carry and the routine that
//! extracts its signals. All multi-byte fields are little-endian.

use crate::types::{Signal, SignalReading};
use byteorder::{ByteOrder, LittleEndian};

/// Vehicle speed message
pub const SPEED_ID: u32 = 0x153;
/// Engine speed message
pub const RPM_ID: u32 = 0x316;
/// Engine state message (temperature, throttle, brake)
pub const ENGINE_STATE_ID: u32 = 0x329;
/// Warning lights message
pub const WARNING_LIGHTS_ID: u32 = 0x545;

const RPM_DIVISOR: f64 = 6.4;
const TEMP_FACTOR: f64 = 0.75;
const TEMP_OFFSET: f64 = -48.373;
const THROTTLE_FULL_SCALE: f64 = 254.0;

const BRAKE_MASK: u8 = 0x01;
const CHECK_ENGINE_MASK: u8 = 0x02;
const ENGINE_MANAGEMENT_MASK: u8 = 0x10;

/// A known CAN message and how to decode it
#[derive(Debug, Clone, Copy)]
pub struct MessageDefinition {
    /// CAN message ID
    pub id: u32,
    /// Message name
    pub name: &'static str,
    /// Minimum DLC: one past the highest byte offset any field reads
    pub size: usize,
    /// Signals this message can produce
    pub signals: &'static [Signal],
    /// Extraction routine, only called with `data.len() >= size`
    pub(crate) extract: fn(&[u8], &mut Vec<SignalReading>),
}

pub(crate) static MESSAGES: [MessageDefinition; 4] = [
    MessageDefinition {
        id: SPEED_ID,
        name: "VehicleSpeed",
        size: 3,
        signals: &[Signal::Speed],
        extract: extract_speed,
    },
    MessageDefinition {
        id: RPM_ID,
        name: "EngineSpeed",
        size: 3,
        signals: &[Signal::Rpm],
        extract: extract_rpm,
    },
    MessageDefinition {
        id: ENGINE_STATE_ID,
        name: "EngineState",
        size: 7,
        signals: &[Signal::Temperature, Signal::Throttle, Signal::Brake],
        extract: extract_engine_state,
    },
    MessageDefinition {
        id: WARNING_LIGHTS_ID,
        name: "WarningLights",
        size: 1,
        signals: &[Signal::CheckEngine, Signal::EngineManagement],
        extract: extract_warning_lights,
    },
];

/// Look up the definition for a CAN ID
pub fn lookup(can_id: u32) -> Option<&'static MessageDefinition> {
    MESSAGES.iter().find(|m| m.id == can_id)
}

fn extract_speed(data: &[u8], out: &mut Vec<SignalReading>) {
    let raw = LittleEndian::read_u16(&data[1..3]);
    out.push(SignalReading::float(Signal::Speed, f64::from(raw)));
}

fn extract_rpm(data: &[u8], out: &mut Vec<SignalReading>) {
    let raw = LittleEndian::read_u16(&data[1..3]);
    out.push(SignalReading::float(Signal::Rpm, f64::from(raw) / RPM_DIVISOR));
}

// A zero byte means "field not present" for every field of this message, so a
// genuine zero reading is never reported.
fn extract_engine_state(data: &[u8], out: &mut Vec<SignalReading>) {
    let temp = data[1];
    if temp != 0 {
        out.push(SignalReading::float(
            Signal::Temperature,
            f64::from(temp) * TEMP_FACTOR + TEMP_OFFSET,
        ));
    }

    let throttle = data[5];
    if throttle != 0 {
        out.push(SignalReading::float(
            Signal::Throttle,
            f64::from(throttle) * 100.0 / THROTTLE_FULL_SCALE,
        ));
    }

    let brake = data[6];
    if brake != 0 {
        out.push(SignalReading::boolean(Signal::Brake, brake & BRAKE_MASK != 0));
    }
}

fn extract_warning_lights(data: &[u8], out: &mut Vec<SignalReading>) {
    let flags = data[0];
    out.push(SignalReading::boolean(
        Signal::CheckEngine,
        flags & CHECK_ENGINE_MASK != 0,
    ));
    out.push(SignalReading::boolean(
        Signal::EngineManagement,
        flags & ENGINE_MANAGEMENT_MASK != 0,
    ));
}
