//! Background reader that owns the serial link.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::serial::SerialLink;
use super::LinkEvent;
use crate::types::ConnectionState;

const READ_BUF_LEN: usize = 256;

/// Channels handed to the consumer when the reader spawns.
pub struct LinkChannels {
    /// Ordered event stream; only the read loop sends, only one consumer
    /// receives.
    pub events: mpsc::UnboundedReceiver<LinkEvent>,
    /// Current connection state, updated before the matching event is sent.
    pub state: watch::Receiver<ConnectionState>,
    /// Stop/join handle for the read loop.
    pub handle: LinkHandle,
}

/// Cooperative stop handle for the background read loop.
pub struct LinkHandle {
    alive: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl LinkHandle {
    /// Request a stop without waiting. Safe from any context, any number of
    /// times; the loop observes it within one read timeout.
    pub fn request_stop(&self) {
        self.alive.store(false, Ordering::Relaxed);
    }

    /// Request a stop and wait for the read loop to exit. The loop is
    /// guaranteed finished when this returns.
    pub async fn stop(&mut self) {
        self.request_stop();
        if let Some(join) = self.join.take() {
            if join.await.is_err() {
                warn!("read loop task panicked during shutdown");
            }
        }
    }

    /// Whether a stop has been requested yet.
    pub fn stop_requested(&self) -> bool {
        !self.alive.load(Ordering::Relaxed)
    }
}

/// Spawns and manages the blocking serial read loop.
///
/// The loop owns the [`SerialLink`] outright; no other context touches it.
/// Lifecycle follows Closed → Opening → {Open, Failed}; from Open the loop
/// runs until a read error (→ Failed), a stop request (→ Stopped) or the
/// consumer dropping its channel. Failures are reported, never retried;
/// retry policy belongs to the caller.
pub struct SerialLinkReader;

impl SerialLinkReader {
    /// Spawn the read loop for `link` on the blocking pool.
    pub fn spawn<L: SerialLink>(link: L) -> LinkChannels {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Closed);

        let alive = Arc::new(AtomicBool::new(true));
        let alive_loop = Arc::clone(&alive);

        let join = tokio::task::spawn_blocking(move || {
            read_loop(link, event_tx, state_tx, alive_loop);
        });

        LinkChannels { events, state, handle: LinkHandle { alive, join: Some(join) } }
    }
}

fn read_loop<L: SerialLink>(
    mut link: L,
    events: mpsc::UnboundedSender<LinkEvent>,
    state: watch::Sender<ConnectionState>,
    alive: Arc<AtomicBool>,
) {
    let _ = state.send(ConnectionState::Opening);
    if let Err(e) = link.open() {
        warn!(error = %e, "serial open failed");
        let _ = state.send(ConnectionState::Failed);
        let _ = events.send(LinkEvent::ConnectFailed(e.to_string()));
        return;
    }

    info!("serial link open, read loop running");
    let _ = state.send(ConnectionState::Open);
    let _ = events.send(LinkEvent::Connected);

    let mut buf = [0u8; READ_BUF_LEN];
    let mut chunks = 0u64;

    while alive.load(Ordering::Relaxed) {
        match link.read_chunk(&mut buf) {
            Ok(0) => {
                // Transport closed underneath us.
                warn!("serial link closed by transport");
                link.close();
                let _ = state.send(ConnectionState::Failed);
                let _ = events.send(LinkEvent::ReadFailed("link closed by transport".into()));
                return;
            }
            Ok(n) => {
                chunks += 1;
                trace!(bytes = n, "chunk read");
                if events.send(LinkEvent::Data(buf[..n].to_vec())).is_err() {
                    debug!("event receiver dropped, read loop exiting");
                    break;
                }
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                // Bounded wait elapsed; loop back to re-check the stop flag.
            }
            Err(e) => {
                warn!(error = %e, "serial read failed");
                link.close();
                let _ = state.send(ConnectionState::Failed);
                let _ = events.send(LinkEvent::ReadFailed(e.to_string()));
                return;
            }
        }
    }

    link.close();
    debug!(chunks, "read loop stopped");
    let _ = state.send(ConnectionState::Stopped);
    let _ = events.send(LinkEvent::Stopped);
}
