//! Top-level composition of link reader and pipeline.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::PortConfig;
use crate::link::{LinkChannels, SerialLink, SerialLinkReader, SerialPortLink};
use crate::pipeline::TelemetryPipeline;
use crate::series::SeriesSet;
use crate::sink::TelemetrySink;
use crate::types::ConnectionState;

/// A running ground station session: one serial link, one pipeline, one sink.
///
/// `init` spawns the blocking read loop immediately; call [`run`] to drive
/// the pipeline until the link terminates or [`shutdown`] is requested from
/// another task via the token returned by [`cancel_token`].
///
/// [`run`]: GroundStation::run
/// [`shutdown`]: GroundStation::shutdown
/// [`cancel_token`]: GroundStation::cancel_token
pub struct GroundStation<S: TelemetrySink> {
    pipeline: TelemetryPipeline<S>,
    channels: LinkChannels,
    cancel: CancellationToken,
}

impl<S: TelemetrySink> GroundStation<S> {
    /// Open the configured serial port and start reading from it.
    ///
    /// Port open happens on the reader's own thread, so this returns
    /// immediately; an unreachable port surfaces through the sink as a
    /// failed connection event.
    pub fn init(config: PortConfig, sink: S) -> Self {
        info!(port = %config.port, baud = config.baud_rate, "initializing ground station");
        Self::init_with_link(SerialPortLink::new(config), sink)
    }

    /// Start a session over any [`SerialLink`] transport.
    pub fn init_with_link<L: SerialLink>(link: L, sink: S) -> Self {
        Self {
            pipeline: TelemetryPipeline::new(sink),
            channels: SerialLinkReader::spawn(link),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts [`run`](GroundStation::run) from another task.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Latest state published by the read loop.
    pub fn connection_state(&self) -> ConnectionState {
        *self.channels.state.borrow()
    }

    /// The pipeline's plotting buffers.
    pub fn series(&self) -> &SeriesSet {
        self.pipeline.series()
    }

    /// Count of telemetry frames decoded so far.
    pub fn sequence(&self) -> u64 {
        self.pipeline.sequence()
    }

    /// Drive the pipeline until the link terminates or the token fires.
    ///
    /// On cancellation the link is stopped and the remaining queued events,
    /// including the final `Stopped`, are still delivered to the sink.
    pub async fn run(&mut self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("ground station cancelled");
                self.channels.handle.stop().await;
                // The read loop has exited; drain what it left behind.
                while let Ok(event) = self.channels.events.try_recv() {
                    if !self.pipeline.handle_event(event) {
                        break;
                    }
                }
            }
            _ = self.pipeline.run(&mut self.channels.events) => {}
        }
    }

    /// Stop the read loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        info!(frames = self.pipeline.sequence(), "shutting down ground station");
        self.cancel.cancel();
        self.channels.handle.stop().await;
    }
}
