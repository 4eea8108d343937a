//! Serial link ownership and the background read loop.
//!
//! The reader owns the physical (or scripted) serial connection and runs a
//! blocking read loop on a dedicated blocking task. Everything it learns
//! crosses to the consumer context as [`LinkEvent`]s over a single-producer
//! single-consumer channel; only raw bytes cross the boundary, never decoder
//! state. Connection lifecycle is additionally published on a watch channel
//! so callers can observe the current [`ConnectionState`] without draining
//! events.
//!
//! [`ConnectionState`]: crate::types::ConnectionState

mod reader;
mod serial;

pub use reader::{LinkChannels, LinkHandle, SerialLinkReader};
pub use serial::{SerialLink, SerialPortLink};

/// Everything the read loop reports to the consumer context.
///
/// Open failure, read failure and cooperative stop are distinct terminal
/// events; none is overloaded to mean another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link opened and the read loop is running.
    Connected,
    /// The link could not be opened; terminal.
    ConnectFailed(String),
    /// One chunk of raw bytes, in read order.
    Data(Vec<u8>),
    /// I/O failure mid-session; terminal.
    ReadFailed(String),
    /// The read loop exited after a stop request; terminal.
    Stopped,
}

impl LinkEvent {
    /// Terminal events end the session; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LinkEvent::ConnectFailed(_) | LinkEvent::ReadFailed(_) | LinkEvent::Stopped
        )
    }
}
