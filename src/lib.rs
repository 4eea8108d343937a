//! Serial-link telemetry ingestion for rocket ground stations.
//!
//! Groundlink turns the byte stream from a radio-modem serial port into
//! typed telemetry frames, status messages and bounded plotting series,
//! with the blocking serial I/O isolated from async consumers.
//!
//! # Features
//!
//! - **Marker framing**: `TSP`/`TEP` telemetry and `MSP`/`MEP` status frames
//!   reassembled across arbitrary chunk boundaries
//! - **Bounded series**: fixed-window sample buffers per telemetry channel,
//!   sized for live plotting
//! - **Isolated I/O**: the blocking port read loop runs on its own thread
//!   and talks to consumers only through channels
//! - **Pluggable transport**: anything implementing [`SerialLink`] can feed
//!   the pipeline, real hardware or scripted test data
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use groundlink::{ChannelSink, GroundStation, PipelineEvent, PortConfig};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> groundlink::Result<()> {
//!     let config = PortConfig::new("/dev/ttyUSB0", 9600);
//!     let (sink, mut events) = ChannelSink::channel();
//!     let mut station = GroundStation::init(config, sink);
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = events.next().await {
//!             if let PipelineEvent::Telemetry { frame, seq } = event {
//!                 println!("#{seq}: altitude {} m", frame.altitude);
//!             }
//!         }
//!     });
//!
//!     station.run().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod config;
mod error;
mod series;
pub mod types;

// Ingestion pipeline
mod decoder;
pub mod link;
mod pipeline;
mod sink;
mod station;
pub mod stream;

pub use config::{FlowControl, PortConfig};
pub use decoder::FrameDecoder;
pub use error::{DecodeError, LinkError, Result};
pub use series::{BoundedSeriesBuffer, DEFAULT_SERIES_CAPACITY, SeriesSet};
pub use types::{
    ConnectionState, DecodedFrame, Series, SeriesSample, StatusMessage, TelemetryFrame,
};

pub use link::{
    LinkChannels, LinkEvent, LinkHandle, SerialLink, SerialLinkReader, SerialPortLink,
};
pub use pipeline::TelemetryPipeline;
pub use sink::{ChannelSink, PipelineEvent, TelemetrySink};
pub use station::GroundStation;
pub use stream::CoalesceExt;
