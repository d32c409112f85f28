//! Latest-value cache
//!
//! One slot per [`Signal`], overwritten in place by the read loop and copied
//! out whole by [`ValueCache::snapshot`]. Every reading a frame produces is
//! written under a single lock, so readers never see half of a frame applied.

use crate::types::{Signal, SignalReading, SignalValue, Timestamp};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// A cached value together with when it was last written
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub value: SignalValue,
    /// Wall-clock time of the frame that produced this value
    pub updated_at: Timestamp,
    /// Cache sequence number of the frame that produced this value
    pub sequence: u64,
}

/// Point-in-time copy of every signal slot
///
/// A slot is `None` until its originating frame has been seen once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    slots: [Option<Sample>; Signal::ALL.len()],
    sequence: u64,
}

impl Values {
    /// Latest sample for a signal
    pub fn get(&self, signal: Signal) -> Option<&Sample> {
        self.slots[signal.index()].as_ref()
    }

    /// Latest value for a signal
    pub fn value(&self, signal: Signal) -> Option<SignalValue> {
        self.get(signal).map(|s| s.value)
    }

    /// Known values in publish order
    pub fn readings(&self) -> impl Iterator<Item = (Signal, &Sample)> + '_ {
        Signal::ALL
            .iter()
            .filter_map(move |&signal| self.get(signal).map(|sample| (signal, sample)))
    }

    /// True if no signal has been observed yet
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Sequence number of the last frame applied to the cache
    pub fn last_sequence(&self) -> u64 {
        self.sequence
    }

    /// Check whether a signal was updated within `max_age` of `now`
    ///
    /// Unknown signals are never fresh. Samples stamped after `now` count as
    /// fresh.
    pub fn is_fresh(&self, signal: Signal, max_age: Duration, now: Timestamp) -> bool {
        match self.get(signal) {
            Some(sample) => match (now - sample.updated_at).to_std() {
                Ok(age) => age <= max_age,
                Err(_) => true,
            },
            None => false,
        }
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        for (signal, sample) in self.readings() {
            map.serialize_entry(signal.name(), sample)?;
        }
        map.end()
    }
}

/// Concurrency-safe store of the latest value of each signal
#[derive(Debug, Default)]
pub struct ValueCache {
    inner: RwLock<Values>,
}

impl ValueCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Write all readings decoded from one frame
    ///
    /// The readings share one timestamp and one sequence number. An empty
    /// slice leaves the cache untouched.
    pub fn apply(&self, readings: &[SignalReading]) {
        self.apply_at(readings, Utc::now());
    }

    pub(crate) fn apply_at(&self, readings: &[SignalReading], now: Timestamp) {
        if readings.is_empty() {
            return;
        }

        let mut values = self.inner.write();
        values.sequence += 1;
        let sequence = values.sequence;
        for reading in readings {
            values.slots[reading.signal.index()] = Some(Sample {
                value: reading.value,
                updated_at: now,
                sequence,
            });
        }
    }

    /// Copy the current state of every slot
    pub fn snapshot(&self) -> Values {
        self.inner.read().clone()
    }
}
