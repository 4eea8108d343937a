//! Orchestration: link events in, decoded data out.
//!
//! [`TelemetryPipeline`] owns the frame decoder, the per-series sample
//! buffers and the pipeline-wide sequence counter. It is single-threaded by
//! design: the consumer context feeds it [`LinkEvent`]s (directly or via
//! [`run`]) and it mutates its own state and calls the sink, in order. The
//! reader context never touches any of this; only raw bytes cross the
//! channel.
//!
//! [`run`]: TelemetryPipeline::run

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::decoder::FrameDecoder;
use crate::link::LinkEvent;
use crate::series::{SeriesSet, DEFAULT_SERIES_CAPACITY};
use crate::sink::TelemetrySink;
use crate::types::{ConnectionState, DecodedFrame};

/// Routes decoded frames into series buffers and the sink.
pub struct TelemetryPipeline<S: TelemetrySink> {
    decoder: FrameDecoder,
    series: SeriesSet,
    seq: u64,
    sink: S,
}

impl<S: TelemetrySink> TelemetryPipeline<S> {
    pub fn new(sink: S) -> Self {
        Self::with_capacity(sink, DEFAULT_SERIES_CAPACITY)
    }

    /// Use a non-default plotting window per series.
    pub fn with_capacity(sink: S, series_capacity: usize) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            series: SeriesSet::new(series_capacity),
            seq: 0,
            sink,
        }
    }

    /// The per-series plotting buffers, for snapshot reads.
    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    /// Count of telemetry frames decoded so far.
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Handle one link event. Returns `false` once a terminal lifecycle
    /// event has been relayed and the pipeline is done.
    pub fn handle_event(&mut self, event: LinkEvent) -> bool {
        match event {
            LinkEvent::Data(chunk) => {
                self.handle_chunk(&chunk);
                true
            }
            LinkEvent::Connected => {
                self.sink.on_connection_event(ConnectionState::Open, None);
                true
            }
            LinkEvent::ConnectFailed(reason) => {
                self.sink.on_connection_event(ConnectionState::Failed, Some(&reason));
                false
            }
            LinkEvent::ReadFailed(reason) => {
                self.sink.on_connection_event(ConnectionState::Failed, Some(&reason));
                false
            }
            LinkEvent::Stopped => {
                self.sink.on_connection_event(ConnectionState::Stopped, None);
                false
            }
        }
    }

    /// Drain the event channel until a terminal event or channel close.
    pub async fn run(&mut self, events: &mut mpsc::UnboundedReceiver<LinkEvent>) {
        info!("telemetry pipeline running");
        while let Some(event) = events.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        info!(frames = self.seq, "telemetry pipeline finished");
    }

    fn handle_chunk(&mut self, chunk: &[u8]) {
        for decoded in self.decoder.feed(chunk) {
            match decoded {
                Ok(DecodedFrame::Telemetry(frame)) => {
                    self.seq += 1;
                    self.series.record(&frame, self.seq);
                    trace!(seq = self.seq, altitude = frame.altitude, "telemetry frame");
                    self.sink.on_telemetry(&frame, self.seq);
                }
                Ok(DecodedFrame::Status(message)) => {
                    debug!(text = %message.text, "status message");
                    self.sink.on_status(&message);
                }
                Err(error) => {
                    debug!(%error, "decode error");
                    self.sink.on_decode_error(&error);
                }
            }
        }
    }
}
