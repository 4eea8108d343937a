//! Core types for decoded telemetry data.
//!
//! The wire protocol carries two frame kinds, both ASCII and marker-delimited:
//! numeric telemetry records ([`TelemetryFrame`]) and free-text status
//! messages ([`StatusMessage`]). Decoded frames flow through the pipeline as
//! [`DecodedFrame`] values; each telemetry frame is additionally fanned out
//! into the eight named [`Series`] channels used for live charting.

use serde::{Deserialize, Serialize};

/// One decoded telemetry record: eight ordered numeric fields.
///
/// Produced by the frame decoder from the comma-separated payload between the
/// `TSP`/`TEP` markers. Field order on the wire is fixed and matches the
/// declaration order here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub altitude: f64,
    pub temperature: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl TelemetryFrame {
    /// Build a frame from the eight wire fields, in wire order.
    pub fn from_fields(fields: [f64; 8]) -> Self {
        let [altitude, temperature, accel_x, accel_y, accel_z, gyro_x, gyro_y, gyro_z] = fields;
        Self { altitude, temperature, accel_x, accel_y, accel_z, gyro_x, gyro_y, gyro_z }
    }

    /// Value of the given series channel within this frame.
    pub fn series_value(&self, series: Series) -> f64 {
        match series {
            Series::Altitude => self.altitude,
            Series::Temperature => self.temperature,
            Series::AccelX => self.accel_x,
            Series::AccelY => self.accel_y,
            Series::AccelZ => self.accel_z,
            Series::GyroX => self.gyro_x,
            Series::GyroY => self.gyro_y,
            Series::GyroZ => self.gyro_z,
        }
    }
}

/// Free-text status message extracted from an `MSP`/`MEP` frame.
///
/// Payloads that are empty after marker extraction are discarded by the
/// decoder and never reach the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Tagged union of everything the frame decoder can extract.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    Telemetry(TelemetryFrame),
    Status(StatusMessage),
}

/// The eight named scalar channels derived from a telemetry frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    Altitude,
    Temperature,
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Series {
    /// All series, in wire-field order.
    pub const ALL: [Series; 8] = [
        Series::Altitude,
        Series::Temperature,
        Series::AccelX,
        Series::AccelY,
        Series::AccelZ,
        Series::GyroX,
        Series::GyroY,
        Series::GyroZ,
    ];

    /// Stable channel name, suitable for chart labels and log fields.
    pub fn name(self) -> &'static str {
        match self {
            Series::Altitude => "altitude",
            Series::Temperature => "temperature",
            Series::AccelX => "accelX",
            Series::AccelY => "accelY",
            Series::AccelZ => "accelZ",
            Series::GyroX => "gyroX",
            Series::GyroY => "gyroY",
            Series::GyroZ => "gyroZ",
        }
    }

    pub(crate) fn index(self) -> usize {
        Series::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// One sample in a plotting series.
///
/// `seq` is the pipeline-wide frame counter: every series derived from the
/// same telemetry frame carries the same sequence index, so the eight
/// channels advance in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSample {
    pub value: f64,
    pub seq: u64,
}

/// Lifecycle state of the serial link, owned by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Link not yet opened.
    Closed,
    /// Open in progress on the reader context.
    Opening,
    /// Link open, read loop running.
    Open,
    /// Open or read failure; terminal.
    Failed,
    /// Cooperative stop completed; terminal.
    Stopped,
}

impl ConnectionState {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Failed | ConnectionState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_value_follows_wire_order() {
        let frame = TelemetryFrame::from_fields([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        for (i, series) in Series::ALL.into_iter().enumerate() {
            assert_eq!(frame.series_value(series), (i + 1) as f64);
            assert_eq!(series.index(), i);
        }
    }

    #[test]
    fn terminal_states() {
        assert!(ConnectionState::Failed.is_terminal());
        assert!(ConnectionState::Stopped.is_terminal());
        assert!(!ConnectionState::Closed.is_terminal());
        assert!(!ConnectionState::Opening.is_terminal());
        assert!(!ConnectionState::Open.is_terminal());
    }

    #[test]
    fn series_names_are_unique() {
        let names: std::collections::HashSet<_> = Series::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), Series::ALL.len());
    }
}
