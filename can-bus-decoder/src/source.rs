//! Frame sources
//!
//! The read loop pulls frames through the [`FrameSource`] trait so that the
//! same loop drives a live SocketCAN interface or a scripted source in tests.

use crate::types::{CanFrame, ReaderError, Result};
use socketcan::{CanFrame as SocketFrame, CanSocket, EmbeddedFrame, Frame, Socket};
use std::io;
use std::time::Duration;

/// Outcome of one receive call
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    /// A complete frame
    Frame(CanFrame),
    /// Fewer bytes than a full frame unit arrived; the data is unusable
    Incomplete { bytes: usize },
    /// Nothing arrived before the receive timeout
    Idle,
}

/// Blocking producer of CAN frames
///
/// `recv` may block, but must return periodically (with [`Received::Idle`] if
/// nothing arrived) so the owner can observe a shutdown request. Any `Err` is
/// treated as terminal by the read loop.
pub trait FrameSource: Send + 'static {
    fn recv(&mut self) -> io::Result<Received>;
}

/// Raw SocketCAN connection bound to one interface
pub struct SocketCanSource {
    socket: CanSocket,
    interface: String,
}

impl SocketCanSource {
    /// Open a raw CAN socket on `interface`
    ///
    /// `read_timeout` bounds how long a single `recv` blocks.
    pub fn open(interface: &str, read_timeout: Duration) -> Result<Self> {
        let connection_error = |source: io::Error| ReaderError::Connection {
            interface: interface.to_string(),
            source,
        };

        let socket = CanSocket::open(interface).map_err(connection_error)?;
        socket
            .set_read_timeout(read_timeout)
            .map_err(connection_error)?;

        log::debug!("Opened raw CAN socket on {}", interface);

        Ok(Self {
            socket,
            interface: interface.to_string(),
        })
    }

    /// Interface this source is bound to
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl FrameSource for SocketCanSource {
    fn recv(&mut self) -> io::Result<Received> {
        match self.socket.read_frame() {
            Ok(SocketFrame::Error(_)) => {
                log::debug!("Bus error frame on {}", self.interface);
                Ok(Received::Idle)
            }
            Ok(frame) => Ok(Received::Frame(CanFrame {
                can_id: frame.raw_id(),
                data: frame.data().to_vec(),
                is_extended: frame.is_extended(),
                is_remote_frame: frame.is_remote_frame(),
            })),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(Received::Idle)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Received::Idle),
            Err(e) => Err(e),
        }
    }
}
