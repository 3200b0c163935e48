//! Host-side adapters for the fixrelay telemetry loop
//!
//! ## Overview
//!
//! The core crate only knows byte streams, register buses and clocks. This
//! crate connects those seams to a host operating system:
//!
//! - [`serial`]: any `Read + Write` handle, in particular a serial port
//!   opened through the `serialport` crate, as a [`ByteStream`]
//! - [`config`]: one JSON file holding every tunable of the loop
//! - [`collector`]: the TCP endpoint that receives records and appends them
//!   to a CSV file
//!
//! ## Collector Protocol
//!
//! ```text
//! modem ──TCP──▶ collector :8080
//!                  │ one connection at a time
//!                  │ up to 256 bytes per read
//!                  ▼
//!              telemetry.csv   (header written once, one record per line)
//! ```
//!
//! The modem opens a fresh connection for every record and leaves it open
//! once the payload is sent; the collector reads what arrived and moves on.
//!
//! ## Example Usage
//!
//! ```no_run
//! use fixrelay_connectors::collector::Collector;
//!
//! let mut collector = Collector::bind("0.0.0.0:8080", "telemetry.csv")?;
//! collector.serve()?;
//! # Ok::<(), fixrelay_connectors::ConnectorError>(())
//! ```
//!
//! [`ByteStream`]: fixrelay_core::ByteStream

pub mod collector;
pub mod config;
pub mod serial;

pub use collector::Collector;
pub use config::RelayConfig;
pub use serial::{IoStream, SerialLink};

use fixrelay_core::TelemetryError;
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
