//! Concrete signal sinks
//!
//! Both sinks write one line per reading to any `io::Write`.

use can_bus_decoder::{ReaderError, Result, SignalSink};
use serde::Serialize;
use std::io::Write;

/// Writes `name payload` lines
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SignalSink for TextSink<W> {
    fn publish(&mut self, name: &str, payload: &str) -> Result<()> {
        writeln!(self.out, "{} {}", name, payload)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReading<'a> {
    name: &'a str,
    value: &'a str,
}

/// Writes one JSON object per line
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SignalSink for JsonSink<W> {
    fn publish(&mut self, name: &str, payload: &str) -> Result<()> {
        serde_json::to_writer(&mut self.out, &JsonReading { name, value: payload })
            .map_err(|e| ReaderError::Sink(e.to_string()))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}
