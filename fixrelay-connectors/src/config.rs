//! JSON configuration for a host-side relay
//!
//! Every section is optional; missing values take the core defaults.
//!
//! ```json
//! {
//!   "gps_port": "/dev/ttyUSB0",
//!   "modem_port": "/dev/ttyUSB1",
//!   "network": {
//!     "ssid": "fieldnet",
//!     "passphrase": "s3cret",
//!     "collector_host": "192.168.4.2",
//!     "collector_port": 8080
//!   },
//!   "delivery": { "close_after_send": true },
//!   "pipeline": { "policy": "Signed", "record_interval_ms": 500 }
//! }
//! ```

use std::fs;
use std::path::Path;

use fixrelay_core::constants::time::{DEFAULT_JOIN_TIMEOUT_MS, DEFAULT_MODEM_BAUD};
use fixrelay_core::modem::{DeliveryTiming, LinkConfig, ModemLink};
use fixrelay_core::serial::SerialTiming;
use fixrelay_core::time::StdClock;
use fixrelay_core::{PipelineConfig, TransportConfig, TransportSession};
use serde::{Deserialize, Serialize};

use crate::serial::SerialLink;
use crate::{ConnectorError, Result};

/// Network credentials and collector endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Network name to join
    pub ssid: String,
    /// Network passphrase, empty for an open network
    pub passphrase: String,
    /// Address of the collector the records are sent to
    pub collector_host: String,
    /// Collector TCP port
    pub collector_port: u16,
    /// Time allowed for joining the network (ms)
    pub join_timeout_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            passphrase: String::new(),
            collector_host: String::new(),
            collector_port: 8080,
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
        }
    }
}

/// Everything needed to run the loop from a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// GPS receiver serial device
    pub gps_port: String,
    /// Modem serial device
    pub modem_port: String,
    /// Modem line rate
    pub modem_timing: SerialTiming,
    /// Credentials and collector endpoint
    pub network: NetworkSettings,
    /// Modem response timeout and poll interval
    pub transport: TransportConfig,
    /// Settle delays and connection handling during delivery
    pub delivery: DeliveryTiming,
    /// Loop behaviour, GPS line rate and calibration
    pub pipeline: PipelineConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            gps_port: "/dev/ttyUSB0".into(),
            modem_port: "/dev/ttyUSB1".into(),
            modem_timing: SerialTiming::from_baud(DEFAULT_MODEM_BAUD),
            network: NetworkSettings::default(),
            transport: TransportConfig::default(),
            delivery: DeliveryTiming::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Parse from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded relay configuration from {}", path.display());
        Ok(config)
    }

    /// Write as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject settings the modem scripts cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.network.ssid.is_empty() {
            return Err(ConnectorError::InvalidConfig("network.ssid is empty".into()));
        }
        if self.network.collector_host.is_empty() {
            return Err(ConnectorError::InvalidConfig(
                "network.collector_host is empty".into(),
            ));
        }
        if self.modem_timing.baud == 0 || self.pipeline.gps_timing.baud == 0 {
            return Err(ConnectorError::InvalidConfig("baud rate must be non-zero".into()));
        }
        self.link_config().map(|_| ())
    }

    /// Network settings as the modem expects them
    pub fn link_config(&self) -> Result<LinkConfig> {
        let net = &self.network;
        let link = LinkConfig::new(
            &net.ssid,
            &net.passphrase,
            &net.collector_host,
            net.collector_port,
        )?;
        Ok(link.with_join_timeout_ms(net.join_timeout_ms))
    }

    /// Open the GPS serial port
    pub fn open_gps(&self) -> Result<SerialLink> {
        SerialLink::open(&self.gps_port, self.pipeline.gps_timing)
    }

    /// Open the modem serial port and wrap it in a modem driver
    pub fn open_modem(&self, clock: StdClock) -> Result<ModemLink<SerialLink, StdClock>> {
        let port = SerialLink::open(&self.modem_port, self.modem_timing)?;
        let session = TransportSession::new(port, clock, self.transport);
        Ok(ModemLink::new(session, self.link_config()?, self.delivery))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixrelay_core::HemispherePolicy;
    use fixrelay_core::TelemetryError;

    const MINIMAL: &str = r#"{
        "network": { "ssid": "fieldnet", "passphrase": "s3cret", "collector_host": "10.0.0.2" }
    }"#;

    #[test]
    fn missing_sections_take_defaults() {
        let config = RelayConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.network.collector_port, 8080);
        assert_eq!(config.transport, TransportConfig::default());
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.modem_timing.baud, 115_200);
    }

    #[test]
    fn nested_overrides_apply() {
        let config = RelayConfig::from_json(
            r#"{
                "network": { "ssid": "a", "collector_host": "h", "join_timeout_ms": 4000 },
                "delivery": { "close_after_send": true },
                "transport": { "response_timeout_ms": 1000 },
                "pipeline": { "policy": "Signed", "record_interval_ms": 250 }
            }"#,
        )
        .unwrap();
        assert!(config.delivery.close_after_send);
        assert_eq!(config.transport.response_timeout_ms, 1000);
        assert_eq!(config.pipeline.policy, HemispherePolicy::Signed);
        assert_eq!(config.pipeline.record_interval_ms, 250);
        assert_eq!(config.link_config().unwrap().join_timeout_ms, 4000);
    }

    #[test]
    fn empty_ssid_is_rejected() {
        assert!(matches!(
            RelayConfig::from_json("{}"),
            Err(ConnectorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn oversized_passphrase_is_rejected() {
        let json = format!(
            r#"{{ "network": {{ "ssid": "a", "collector_host": "h", "passphrase": "{}" }} }}"#,
            "x".repeat(80)
        );
        assert!(matches!(
            RelayConfig::from_json(&json),
            Err(ConnectorError::Telemetry(TelemetryError::CommandTooLong { .. }))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.json");
        let config = RelayConfig::from_json(MINIMAL).unwrap();

        config.save(&path).unwrap();
        assert_eq!(RelayConfig::load(&path).unwrap(), config);
    }
}
