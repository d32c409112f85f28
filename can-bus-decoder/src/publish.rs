//! Sink boundary
//!
//! Consumers forward snapshots off-process through a [`SignalSink`], which
//! accepts one `(name, payload)` pair per known signal.

use crate::cache::Values;
use crate::types::{Result, Timestamp};
use std::time::Duration;

/// Destination for named readings
pub trait SignalSink {
    /// Publish one reading; `payload` is [`SignalValue::payload`](crate::SignalValue::payload)
    fn publish(&mut self, name: &str, payload: &str) -> Result<()>;
}

impl<F> SignalSink for F
where
    F: FnMut(&str, &str) -> Result<()>,
{
    fn publish(&mut self, name: &str, payload: &str) -> Result<()> {
        self(name, payload)
    }
}

/// Publish every known signal of a snapshot
///
/// Signals never observed are skipped. With `max_age` set, signals not
/// updated within `max_age` of `now` are skipped as well. Returns how many
/// pairs were published; the first sink error aborts the pass.
pub fn publish_snapshot(
    values: &Values,
    sink: &mut dyn SignalSink,
    max_age: Option<Duration>,
    now: Timestamp,
) -> Result<usize> {
    let mut published = 0;

    for (signal, sample) in values.readings() {
        if let Some(max_age) = max_age {
            if !values.is_fresh(signal, max_age, now) {
                log::trace!("Skipping stale signal {}", signal);
                continue;
            }
        }

        sink.publish(signal.name(), &sample.value.payload())?;
        published += 1;
    }

    Ok(published)
}
