//! Sink interface consumed by the presentation layer.
//!
//! The pipeline pushes everything it decodes into a [`TelemetrySink`]: a
//! display, a logger, a test harness. Rendering is out of scope here; the
//! sink receives decoded values and does with them what it will.

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::DecodeError;
use crate::types::{ConnectionState, StatusMessage, TelemetryFrame};

/// Consumer of decoded telemetry, status and lifecycle information.
///
/// Called from the consumer context only, in pipeline order. Implementations
/// should return quickly; a slow sink backs up the event channel, not the
/// serial reader.
pub trait TelemetrySink: Send + 'static {
    /// A telemetry frame decoded under the given sequence index.
    fn on_telemetry(&mut self, frame: &TelemetryFrame, seq: u64);

    /// A non-empty status message, verbatim from the wire.
    fn on_status(&mut self, message: &StatusMessage);

    /// A connection lifecycle transition, with failure detail when present.
    fn on_connection_event(&mut self, state: ConnectionState, detail: Option<&str>);

    /// A recoverable decode failure; the stream continues past it.
    fn on_decode_error(&mut self, error: &DecodeError);
}

/// Everything a [`ChannelSink`] forwards, as one tagged union.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Telemetry { frame: TelemetryFrame, seq: u64 },
    Status(StatusMessage),
    Connection { state: ConnectionState, detail: Option<String> },
    DecodeError(DecodeError),
}

/// [`TelemetrySink`] that forwards every event into an unbounded channel.
///
/// The receiving half is a `futures::Stream`, so a display can drain it at
/// its own refresh rate; see [`CoalesceExt`](crate::stream::CoalesceExt)
/// for latest-wins pacing.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelSink {
    /// Create a sink and the stream of events it will forward.
    pub fn channel() -> (Self, UnboundedReceiverStream<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }

    fn forward(&self, event: PipelineEvent) {
        // A dropped receiver just means nobody is watching anymore.
        let _ = self.tx.send(event);
    }
}

impl TelemetrySink for ChannelSink {
    fn on_telemetry(&mut self, frame: &TelemetryFrame, seq: u64) {
        self.forward(PipelineEvent::Telemetry { frame: *frame, seq });
    }

    fn on_status(&mut self, message: &StatusMessage) {
        self.forward(PipelineEvent::Status(message.clone()));
    }

    fn on_connection_event(&mut self, state: ConnectionState, detail: Option<&str>) {
        self.forward(PipelineEvent::Connection { state, detail: detail.map(str::to_owned) });
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        self.forward(PipelineEvent::DecodeError(error.clone()));
    }
}
