//! Serial port configuration.
//!
//! `PortConfig` is the reader's configuration surface: port identifier, baud
//! rate, flow-control mode and read timeout. Values pass through to the
//! transport unchanged. Configs deserialize from YAML, e.g.:
//!
//! ```yaml
//! port: /dev/ttyUSB0
//! baud_rate: 2000000
//! flow_control: hardware
//! read_timeout_ms: 1000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LinkError, Result};

/// Flow-control mode for the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    #[default]
    None,
    /// XON/XOFF software flow control.
    Software,
    /// RTS/CTS hardware flow control.
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(mode: FlowControl) -> Self {
        match mode {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Configuration for the serial telemetry link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    /// Port identifier, e.g. `COM3` or `/dev/ttyUSB0`.
    pub port: String,

    /// Baud rate in bits per second.
    pub baud_rate: u32,

    /// Flow-control mode; defaults to none.
    #[serde(default)]
    pub flow_control: FlowControl,

    /// Upper bound on a single blocking read. Keeps the read loop responsive
    /// to stop requests when the transport cannot cancel an in-flight read.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_read_timeout_ms() -> u64 {
    1_000
}

impl PortConfig {
    /// Create a config with default flow control and read timeout.
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            flow_control: FlowControl::default(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }

    /// Read timeout as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Parse a config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: PortConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LinkError::config(format!("bad YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path).map_err(|e| {
            LinkError::config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(LinkError::config("port identifier is empty"));
        }
        if self.baud_rate == 0 {
            return Err(LinkError::config("baud rate must be nonzero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip_with_defaults() {
        let config = PortConfig::from_yaml_str("port: COM3\nbaud_rate: 2000000\n")
            .expect("minimal config should parse");

        assert_eq!(config.port, "COM3");
        assert_eq!(config.baud_rate, 2_000_000);
        assert_eq!(config.flow_control, FlowControl::None);
        assert_eq!(config.read_timeout(), Duration::from_millis(1_000));
    }

    #[test]
    fn yaml_full_config() {
        let yaml = "\
port: /dev/ttyUSB0
baud_rate: 115200
flow_control: hardware
read_timeout_ms: 250
";
        let config = PortConfig::from_yaml_str(yaml).expect("full config should parse");
        assert_eq!(config.flow_control, FlowControl::Hardware);
        assert_eq!(config.read_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn rejects_empty_port_and_zero_baud() {
        let err = PortConfig::from_yaml_str("port: \"\"\nbaud_rate: 9600\n").unwrap_err();
        assert!(matches!(err, LinkError::Config { .. }));

        let err = PortConfig::from_yaml_str("port: COM1\nbaud_rate: 0\n").unwrap_err();
        assert!(matches!(err, LinkError::Config { .. }));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = PortConfig::from_yaml_str("port: [oops\n").unwrap_err();
        assert!(err.is_fatal());
    }
}
