//! Signal decoder
//!
//! Pure mapping from a raw [`CanFrame`] to the engineering values it carries.
//! No state and no I/O: the same frame always yields the same readings.

pub mod table;

pub use table::{lookup, MessageDefinition};

use crate::types::{CanFrame, SignalReading};

/// Decode a CAN frame into zero or more signal readings
///
/// Unknown IDs, extended (29-bit) frames, remote frames and frames shorter
/// than their message's minimum DLC produce no readings. A short frame is rejected whole, never
/// partially decoded.
///
/// # Example
/// ```
/// use can_bus_decoder::{decode_frame, CanFrame, Signal, SignalValue};
///
/// let frame = CanFrame::new(0x153, &[0x00, 0x10, 0x00]).unwrap();
/// let readings = decode_frame(&frame);
/// assert_eq!(readings[0].signal, Signal::Speed);
/// assert_eq!(readings[0].value, SignalValue::Float(16.0));
/// ```
pub fn decode_frame(frame: &CanFrame) -> Vec<SignalReading> {
    let mut readings = Vec::new();

    if frame.is_remote_frame {
        return readings;
    }

    // The table only holds 11-bit IDs; a 29-bit 0x153 is a different message
    if frame.is_extended {
        log::trace!("Extended CAN ID: 0x{:X}, ignoring", frame.can_id);
        return readings;
    }

    let Some(message) = lookup(frame.can_id) else {
        log::trace!("Unknown CAN ID: 0x{:X}, ignoring", frame.can_id);
        return readings;
    };

    if frame.dlc() < message.size {
        log::trace!(
            "{} (0x{:X}) too short: DLC {} < {}",
            message.name,
            frame.can_id,
            frame.dlc(),
            message.size
        );
        return readings;
    }

    (message.extract)(&frame.data, &mut readings);

    for reading in &readings {
        log::trace!("{} (0x{:X}) -> {}", message.name, frame.can_id, reading);
    }

    readings
}

/// Minimum DLC needed to decode a known CAN ID
pub fn required_len(can_id: u32) -> Option<usize> {
    lookup(can_id).map(|m| m.size)
}

/// Check whether a CAN ID carries any known signal
pub fn is_known(can_id: u32) -> bool {
    lookup(can_id).is_some()
}
