//! Telemetry Pipeline State Machine
//!
//! ## Overview
//!
//! One cycle turns one GPS line into at most one delivered record:
//!
//! ```text
//!            ┌──────────────────────────────────────────────────────┐
//!            ▼                                                      │
//!      AwaitFrame ─▶ ValidateFrame ─▶ DecodeFrame ─▶ ReadSensors    │
//!            ▲            │ invalid /      │ no fix        │ fault  │
//!            │            │ not a position │               │        │
//!            ├────────────┴────────────────┴───────────────┘        │
//!            │                                                      │
//!            │                Fuse ─▶ Encode ─▶ Transmit ───────────┘
//! ```
//!
//! Every exit leads back to `AwaitFrame`. Nothing carries over between
//! cycles except the calibration offsets and the attitude state; a failed
//! delivery is not retried.
//!
//! ## Startup
//!
//! [`TelemetryPipeline::start`] runs once before the first cycle:
//! 1. Send the receiver configuration sentence (RMC + GGA only)
//! 2. Measure or install calibration offsets
//! 3. Seed the attitude from gravity
//! 4. Escape the modem out of any stale raw mode
//! 5. Associate with the network

use crate::attitude::{AttitudeEstimator, AttitudeState};
use crate::buffer::RawFrame;
use crate::calibration::{CalibrationMode, CalibrationOffset};
use crate::constants::time::DEFAULT_RECORD_INTERVAL_MS;
use crate::errors::{TelemetryError, TelemetryResult};
use crate::frame::validate;
use crate::modem::{ModemLink, ScriptReport};
use crate::nmea::{receiver_config_sentence, try_decode, HemispherePolicy, SentenceFilter};
use crate::record::TelemetryRecord;
use crate::sensors::{Imu, SensorKind};
use crate::serial::{LineReader, SerialTiming};
use crate::traits::{ByteStream, Delay, RegisterBus, TimeSource};

/// Position of the pipeline within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Receiving a line from the GPS
    AwaitFrame,
    /// Checking framing and checksum
    ValidateFrame,
    /// Extracting the position
    DecodeFrame,
    /// Reading the IMU
    ReadSensors,
    /// Updating the attitude estimate
    Fuse,
    /// Formatting the record
    Encode,
    /// Delivering through the modem
    Transmit,
}

/// Pipeline behaviour
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Hemisphere letter interpretation
    pub policy: HemispherePolicy,
    /// Sentence types that carry a position
    pub filter: SentenceFilter,
    /// GPS link pacing
    pub gps_timing: SerialTiming,
    /// Calibration at startup
    pub calibration: CalibrationMode,
    /// Send the receiver configuration sentence at startup
    pub configure_receiver: bool,
    /// Pause after each delivery (ms)
    pub record_interval_ms: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: HemispherePolicy::default(),
            filter: SentenceFilter::default(),
            gps_timing: SerialTiming::default(),
            calibration: CalibrationMode::default(),
            configure_receiver: true,
            record_interval_ms: DEFAULT_RECORD_INTERVAL_MS,
        }
    }
}

impl PipelineConfig {
    /// Set the hemisphere policy
    pub fn with_policy(mut self, policy: HemispherePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the sentence allow-list
    pub fn with_filter(mut self, filter: SentenceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the GPS link pacing
    pub fn with_gps_timing(mut self, timing: SerialTiming) -> Self {
        self.gps_timing = timing;
        self
    }

    /// Set how offsets are obtained
    pub fn with_calibration(mut self, calibration: CalibrationMode) -> Self {
        self.calibration = calibration;
        self
    }

    /// Enable or disable the startup receiver configuration
    pub fn with_configure_receiver(mut self, enabled: bool) -> Self {
        self.configure_receiver = enabled;
        self
    }

    /// Set the pause after each delivery
    pub fn with_record_interval_ms(mut self, ms: u32) -> Self {
        self.record_interval_ms = ms;
        self
    }
}

/// What one cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Frame failed framing or checksum checks, or was truncated
    Rejected(TelemetryError),
    /// Valid sentence of a type that carries no position
    Ignored,
    /// Position sentence without a usable fix
    NoFix,
    /// IMU read failed; attitude untouched, nothing sent
    SensorFault(TelemetryError),
    /// Record could not be formatted
    EncodeFailed(TelemetryError),
    /// Record handed to the modem
    Transmitted {
        /// What was sent
        record: TelemetryRecord,
        /// Attitude after fusion
        attitude: AttitudeState,
        /// Per-step delivery result
        delivery: ScriptReport,
    },
    /// GPS link failed
    LinkFault(TelemetryError),
}

/// Result of [`TelemetryPipeline::start`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartupReport {
    /// Offsets in effect
    pub offsets: CalibrationOffset,
    /// Initial attitude
    pub attitude: AttitudeState,
    /// Association steps
    pub association: ScriptReport,
}

/// Cycle counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineMetrics {
    /// Cycles run
    pub cycles: u32,
    /// Frames rejected by validation
    pub rejected: u32,
    /// Valid non-position sentences
    pub ignored: u32,
    /// Position sentences without a fix
    pub no_fix: u32,
    /// Sensor read failures
    pub sensor_faults: u32,
    /// Records that did not fit the record buffer
    pub encode_failures: u32,
    /// GPS link read failures
    pub link_faults: u32,
    /// Records delivered with every step acknowledged
    pub delivered: u32,
    /// Records whose delivery had a failed step
    pub delivery_failures: u32,
}

impl PipelineMetrics {
    /// Count one outcome
    pub fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles = self.cycles.saturating_add(1);
        let counter = match outcome {
            CycleOutcome::Rejected(_) => &mut self.rejected,
            CycleOutcome::Ignored => &mut self.ignored,
            CycleOutcome::NoFix => &mut self.no_fix,
            CycleOutcome::SensorFault(_) => &mut self.sensor_faults,
            CycleOutcome::EncodeFailed(_) => &mut self.encode_failures,
            CycleOutcome::LinkFault(_) => &mut self.link_faults,
            CycleOutcome::Transmitted { delivery, .. } if delivery.is_clean() => &mut self.delivered,
            CycleOutcome::Transmitted { .. } => &mut self.delivery_failures,
        };
        *counter = counter.saturating_add(1);
    }
}

/// GPS → IMU → modem telemetry loop
pub struct TelemetryPipeline<G, B, M, C> {
    reader: LineReader<G, C>,
    imu: Imu<B>,
    modem: ModemLink<M, C>,
    clock: C,
    config: PipelineConfig,
    offsets: CalibrationOffset,
    attitude: AttitudeEstimator,
    frame: RawFrame,
    state: PipelineState,
    last_phase: PipelineState,
    metrics: PipelineMetrics,
}

impl<G, B, M, C> TelemetryPipeline<G, B, M, C>
where
    G: ByteStream,
    B: RegisterBus,
    M: ByteStream,
    C: TimeSource + Delay + Clone,
{
    /// Assemble the loop from its peripherals
    pub fn new(gps: G, bus: B, modem: ModemLink<M, C>, clock: C, config: PipelineConfig) -> Self {
        let offsets = match config.calibration {
            CalibrationMode::Preset(offsets) => offsets,
            CalibrationMode::Measure { .. } => CalibrationOffset::ZERO,
        };
        Self {
            reader: LineReader::new(gps, clock.clone(), config.gps_timing),
            imu: Imu::new(bus),
            modem,
            clock,
            config,
            offsets,
            attitude: AttitudeEstimator::new(),
            frame: RawFrame::new(),
            state: PipelineState::AwaitFrame,
            last_phase: PipelineState::AwaitFrame,
            metrics: PipelineMetrics::default(),
        }
    }

    /// One-time startup sequence
    ///
    /// Fails only if the receiver cannot be written, calibration cannot
    /// read the IMU, or the modem cannot be written. A failed association
    /// step is reported, not raised.
    pub fn start(&mut self) -> TelemetryResult<StartupReport> {
        if self.config.configure_receiver {
            let sentence = receiver_config_sentence()?;
            self.reader.write_all(&sentence)?;
        }

        if let CalibrationMode::Measure { samples } = self.config.calibration {
            self.offsets = CalibrationOffset::measure(&mut self.imu, samples)?;
        }

        let accel = self.imu.read_raw(SensorKind::Accelerometer)?;
        let accel = self.offsets.correct(SensorKind::Accelerometer, accel);
        self.attitude.seed(accel, self.clock.now());

        self.modem.reset()?;
        let association = self.modem.associate();

        self.state = PipelineState::AwaitFrame;
        Ok(StartupReport {
            offsets: self.offsets,
            attitude: self.attitude.state(),
            association,
        })
    }

    /// Run one cycle, from waiting for a line back to waiting for a line
    pub fn step(&mut self) -> CycleOutcome {
        let outcome = self.cycle();
        self.last_phase = self.state;
        self.state = PipelineState::AwaitFrame;
        self.metrics.record(&outcome);
        outcome
    }

    fn cycle(&mut self) -> CycleOutcome {
        self.state = PipelineState::AwaitFrame;
        match self.reader.read_line(&mut self.frame) {
            Ok(()) => {}
            Err(e @ TelemetryError::FrameTruncated { .. }) => return CycleOutcome::Rejected(e),
            Err(e) => return CycleOutcome::LinkFault(e),
        }

        self.state = PipelineState::ValidateFrame;
        let sentence = validate(self.frame.as_bytes());
        if let Some(reason) = sentence.rejection() {
            log_debug!("frame rejected: {}", reason);
            return CycleOutcome::Rejected(reason);
        }
        if !self.config.filter.matches(&sentence) {
            return CycleOutcome::Ignored;
        }

        self.state = PipelineState::DecodeFrame;
        let fix = match try_decode(&sentence, self.config.policy) {
            Ok(fix) => fix,
            Err(_) => return CycleOutcome::NoFix,
        };

        self.state = PipelineState::ReadSensors;
        let raw = match self.imu.read_all() {
            Ok(raw) => raw,
            Err(e) => {
                log_warn!("sensor read failed, cycle skipped: {}", e);
                return CycleOutcome::SensorFault(e);
            }
        };
        let corrected = self.offsets.apply(&raw);

        self.state = PipelineState::Fuse;
        let _mode = self
            .attitude
            .update(corrected.accel, corrected.gyro, self.clock.now());
        if let Err(_e) = self.attitude.unwrap_quadrants(corrected.accel) {
            log_debug!("{}", _e);
        }

        self.state = PipelineState::Encode;
        let record = TelemetryRecord::new(fix, &corrected.scaled());
        let line = match record.format() {
            Ok(line) => line,
            Err(e) => {
                log_warn!("record not formatted: {}", e);
                return CycleOutcome::EncodeFailed(e);
            }
        };

        self.state = PipelineState::Transmit;
        let delivery = self.modem.deliver(line.as_bytes());
        if self.config.record_interval_ms > 0 {
            self.clock.delay_ms(self.config.record_interval_ms);
        }

        CycleOutcome::Transmitted {
            record,
            attitude: self.attitude.state(),
            delivery,
        }
    }

    /// Run cycles until the GPS link fails; returns that failure
    pub fn run(&mut self) -> TelemetryError {
        loop {
            if let CycleOutcome::LinkFault(e) = self.step() {
                log_warn!("GPS link lost: {}", e);
                return e;
            }
        }
    }

    /// Current state, `AwaitFrame` whenever no cycle is running
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Furthest state the last cycle reached before returning
    ///
    /// `Transmit` after a delivery, `ValidateFrame` after a rejected line,
    /// `ReadSensors` after a sensor fault and so on.
    pub fn last_phase(&self) -> PipelineState {
        self.last_phase
    }

    /// Offsets in effect
    pub fn offsets(&self) -> CalibrationOffset {
        self.offsets
    }

    /// Attitude estimator
    pub fn attitude(&self) -> &AttitudeEstimator {
        &self.attitude
    }

    /// Cycle counters
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Modem driver
    pub fn modem_mut(&mut self) -> &mut ModemLink<M, C> {
        &mut self.modem
    }

    /// IMU reader
    pub fn imu_mut(&mut self) -> &mut Imu<B> {
        &mut self.imu
    }

    /// GPS line reader
    pub fn reader_mut(&mut self) -> &mut LineReader<G, C> {
        &mut self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRegisterBus, MockSerial};
    use crate::modem::{DeliveryTiming, LinkConfig};
    use crate::time::MockTimeSource;
    use crate::transport::{TransportConfig, TransportSession};

    type TestPipeline<'a> =
        TelemetryPipeline<MockSerial, MockRegisterBus, MockSerial, &'a MockTimeSource>;

    fn pipeline(gps: MockSerial, bus: MockRegisterBus, clock: &MockTimeSource) -> TestPipeline<'_> {
        let mut modem = MockSerial::new();
        modem.respond_to("AT", b"OK\r\n");
        modem.respond_to("AT+CIPSEND", b"> ");
        let session = TransportSession::new(modem, clock, TransportConfig::default());
        let link = LinkConfig::new("ap", "pw", "10.0.0.2", 8080).unwrap();
        let modem = ModemLink::new(session, link, DeliveryTiming::default());
        let config = PipelineConfig::default()
            .with_calibration(CalibrationMode::Preset(CalibrationOffset::ZERO))
            .with_record_interval_ms(0);
        TelemetryPipeline::new(gps, bus, modem, clock, config)
    }

    fn level_bus() -> MockRegisterBus {
        let mut bus = MockRegisterBus::new();
        bus.set_triplet(0x3B, [0, 0, 16384]);
        bus
    }

    #[test]
    fn valid_fix_is_transmitted() {
        let mut gps = MockSerial::new();
        gps.inject_rx(b"$GPRMC,,,4807.038,N,01131.000,W,,,,,,*60\r\n");
        let clock = MockTimeSource::new(0);
        let mut pipeline = pipeline(gps, level_bus(), &clock);

        match pipeline.step() {
            CycleOutcome::Transmitted { record, delivery, .. } => {
                assert!((record.fix.latitude - 48.1173).abs() < 1e-3);
                assert!((record.accel.z - 1.0).abs() < 1e-6);
                assert!(delivery.is_clean());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(pipeline.state(), PipelineState::AwaitFrame);
        assert_eq!(pipeline.last_phase(), PipelineState::Transmit);
        assert_eq!(pipeline.metrics().delivered, 1);
    }

    #[test]
    fn bad_checksum_is_rejected_without_sensor_read() {
        let mut gps = MockSerial::new();
        gps.inject_rx(b"$GPRMC,,,4807.038,N,01131.000,W,,,,,,*00\r\n");
        let clock = MockTimeSource::new(0);
        let mut pipeline = pipeline(gps, level_bus(), &clock);

        assert!(matches!(
            pipeline.step(),
            CycleOutcome::Rejected(TelemetryError::ChecksumMismatch { .. })
        ));
        assert_eq!(pipeline.imu_mut().bus_mut().reads(), 0);
        assert_eq!(pipeline.last_phase(), PipelineState::ValidateFrame);
    }

    #[test]
    fn sensor_fault_skips_cycle() {
        let mut gps = MockSerial::new();
        gps.inject_rx(b"$GPRMC,,,4807.038,N,01131.000,W,,,,,,*60\r\n");
        let mut bus = level_bus();
        bus.fail_register(0x43);
        let clock = MockTimeSource::new(0);
        let mut pipeline = pipeline(gps, bus, &clock);
        let before = pipeline.attitude().state();

        assert_eq!(
            pipeline.step(),
            CycleOutcome::SensorFault(TelemetryError::SensorRead { register: 0x43 })
        );
        assert_eq!(pipeline.attitude().state(), before);
        assert!(pipeline.modem_mut().session_mut().stream_mut().written().is_empty());
    }

    #[test]
    fn run_stops_on_link_fault() {
        let mut gps = MockSerial::new();
        gps.inject_rx(b"$GPGSV,2,1,08,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45*75\r\n");
        gps.close_when_drained();
        let clock = MockTimeSource::new(0);
        let mut pipeline = pipeline(gps, level_bus(), &clock);

        assert!(matches!(pipeline.run(), TelemetryError::Serial { .. }));
        let metrics = pipeline.metrics();
        assert_eq!(metrics.cycles, 2);
        assert_eq!(metrics.ignored, 1);
    }
}
