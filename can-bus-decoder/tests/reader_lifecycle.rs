// Bus reader lifecycle driven by a scripted frame source
use can_bus_decoder::{
    BusReader, CanFrame, FrameSource, ReaderConfig, ReaderError, ReaderState, Received, Signal,
    SignalValue, StopReason,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Source fed from a channel; reports Idle when nothing is queued
struct ScriptedSource {
    rx: Receiver<io::Result<Received>>,
    dropped: Arc<AtomicBool>,
}

impl FrameSource for ScriptedSource {
    fn recv(&mut self) -> io::Result<Received> {
        match self.rx.recv_timeout(Duration::from_millis(5)) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                Ok(Received::Idle)
            }
        }
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

fn start() -> (BusReader, Sender<io::Result<Received>>, Arc<AtomicBool>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let (tx, rx) = mpsc::channel();
    let dropped = Arc::new(AtomicBool::new(false));
    let source = ScriptedSource {
        rx,
        dropped: Arc::clone(&dropped),
    };
    let reader = BusReader::with_source(source, &ReaderConfig::new("scripted0")).unwrap();
    (reader, tx, dropped)
}

fn frame(can_id: u32, data: &[u8]) -> io::Result<Received> {
    Ok(Received::Frame(CanFrame::new(can_id, data).unwrap()))
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for reader");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_frames_update_cache() {
    let (reader, tx, _) = start();
    assert_eq!(reader.state(), ReaderState::Running);
    assert!(reader.snapshot().is_empty());

    tx.send(frame(0x153, &[0x00, 0x10, 0x00, 0, 0, 0, 0, 0])).unwrap();
    tx.send(frame(0x316, &[0x00, 0x40, 0x01, 0, 0, 0, 0, 0])).unwrap();
    tx.send(frame(0x545, &[0x12, 0, 0, 0, 0, 0, 0, 0])).unwrap();
    wait_until(|| reader.frames_received() == 3);
    wait_until(|| reader.snapshot().last_sequence() == 3);

    let values = reader.snapshot();
    assert_eq!(values.value(Signal::Speed), Some(SignalValue::Float(16.0)));
    assert_eq!(values.value(Signal::Rpm), Some(SignalValue::Float(50.0)));
    assert_eq!(values.value(Signal::CheckEngine), Some(SignalValue::Boolean(true)));
    assert_eq!(values.value(Signal::EngineManagement), Some(SignalValue::Boolean(true)));
    assert_eq!(values.value(Signal::Temperature), None);
    assert_eq!(reader.interface(), "scripted0");
}

#[test]
fn test_unknown_and_short_frames_are_absorbed() {
    let (reader, tx, _) = start();

    tx.send(frame(0x100, &[0xFF; 8])).unwrap();
    tx.send(frame(0x153, &[0x00, 0x10])).unwrap();
    tx.send(Ok(Received::Incomplete { bytes: 5 })).unwrap();
    tx.send(frame(0x329, &[0, 0x64, 0, 0, 0, 0, 0, 0])).unwrap();
    wait_until(|| reader.frames_received() == 3);
    wait_until(|| reader.snapshot().last_sequence() == 1);

    let values = reader.snapshot();
    assert!(values.value(Signal::Speed).is_none());
    match values.value(Signal::Temperature) {
        Some(SignalValue::Float(t)) => assert!((t - 26.627).abs() < 1e-9),
        other => panic!("unexpected temperature: {:?}", other),
    }
    assert_eq!(reader.state(), ReaderState::Running);
}

#[test]
fn test_close_joins_loop_and_keeps_values() {
    let (mut reader, tx, dropped) = start();

    tx.send(frame(0x153, &[0x00, 0x20, 0x00])).unwrap();
    wait_until(|| reader.snapshot().last_sequence() == 1);

    reader.close();
    assert!(dropped.load(Ordering::SeqCst), "source outlived close()");
    assert_eq!(reader.state(), ReaderState::Stopped(StopReason::Closed));

    // Nothing is consumed any more
    assert!(tx.send(frame(0x153, &[0x00, 0x30, 0x00])).is_err());
    assert_eq!(reader.snapshot().value(Signal::Speed), Some(SignalValue::Float(32.0)));

    // Second close is a no-op
    reader.close();
    assert_eq!(reader.state(), ReaderState::Stopped(StopReason::Closed));
}

#[test]
fn test_drop_releases_source() {
    let (reader, _tx, dropped) = start();
    drop(reader);
    assert!(dropped.load(Ordering::SeqCst));
}

#[test]
fn test_read_error_makes_reader_inert() {
    let (reader, tx, dropped) = start();

    tx.send(frame(0x316, &[0x00, 0x80, 0x0C])).unwrap();
    tx.send(Err(io::Error::new(io::ErrorKind::Other, "bus off"))).unwrap();
    wait_until(|| !reader.is_running());

    match reader.state() {
        ReaderState::Stopped(StopReason::Failed(message)) => assert!(message.contains("bus off")),
        other => panic!("unexpected state: {:?}", other),
    }
    assert!(dropped.load(Ordering::SeqCst));

    // Stale data is still served
    assert_eq!(reader.snapshot().value(Signal::Rpm), Some(SignalValue::Float(500.0)));
    assert_eq!(reader.frames_received(), 1);
}

#[test]
fn test_snapshots_from_many_threads() {
    let (reader, tx, _) = start();
    let reader = Arc::new(reader);

    let pollers: Vec<_> = (0..4)
        .map(|_| {
            let reader = Arc::clone(&reader);
            thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_secs(5);
                let mut last = 0;
                let mut polls = 0u64;
                // Keep polling until the writer is done so reads overlap writes
                while last < 1_000 {
                    assert!(Instant::now() < deadline, "writer never finished");
                    polls += 1;
                    let values = reader.snapshot();
                    assert!(values.last_sequence() >= last);
                    last = values.last_sequence();
                    // The newest slot always carries the snapshot's sequence
                    let newest = values.readings().map(|(_, s)| s.sequence).max();
                    assert_eq!(newest.unwrap_or(0), last);
                }
                polls
            })
        })
        .collect();

    for i in 0..500u16 {
        let [lo, hi] = i.to_le_bytes();
        tx.send(frame(0x153, &[0, lo, hi])).unwrap();
        tx.send(frame(0x316, &[0, lo, hi])).unwrap();
    }

    for poller in pollers {
        assert!(poller.join().unwrap() > 0);
    }
    assert_eq!(reader.snapshot().last_sequence(), 1_000);
    assert_eq!(reader.snapshot().value(Signal::Speed), Some(SignalValue::Float(499.0)));
}

#[test]
fn test_open_missing_interface_fails() {
    let result = BusReader::open_with_config(&ReaderConfig::new("nocan7"));
    match result {
        Err(ReaderError::Connection { interface, .. }) => assert_eq!(interface, "nocan7"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("opened a reader on a missing interface"),
    }
}

/// Source whose connection is already broken
struct FailingSource {
    dropped: Arc<AtomicBool>,
}

impl FrameSource for FailingSource {
    fn recv(&mut self) -> io::Result<Received> {
        Err(io::Error::new(io::ErrorKind::NotConnected, "interface down"))
    }
}

impl Drop for FailingSource {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_failing_source_leaves_nothing_running() {
    let dropped = Arc::new(AtomicBool::new(false));
    let source = FailingSource {
        dropped: Arc::clone(&dropped),
    };
    let mut reader = BusReader::with_source(source, &ReaderConfig::new("broken0")).unwrap();

    wait_until(|| !reader.is_running());
    assert!(dropped.load(Ordering::SeqCst), "failed source was not released");
    match reader.state() {
        ReaderState::Stopped(StopReason::Failed(message)) => {
            assert!(message.contains("interface down"))
        }
        other => panic!("unexpected state: {:?}", other),
    }
    assert!(reader.snapshot().is_empty());
    assert_eq!(reader.frames_received(), 0);

    // Closing an already stopped reader joins the finished thread and keeps the reason
    reader.close();
    assert!(matches!(reader.state(), ReaderState::Stopped(StopReason::Failed(_))));
}
