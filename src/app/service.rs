//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the estimator, refill detector, publish gate state,
//! refill counter and indicator sequencer.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!     SensorPort ──▶ ┌──────────────────────────┐ ──▶ TelemetryPort
//!                    │        AppService         │
//!  IndicatorPort ◀── │ Estimate · Detect · Gate  │ ◀─▶ CounterStore
//!                    └──────────────────────────┘ ──▶ EventSink
//! ```
//!
//! Every failure is absorbed at the tick boundary: a bad sample skips the
//! tick, a transport outage suppresses publishes, a storage failure keeps
//! the in-memory count.

use log::{debug, info, warn};

use crate::config::{FIRMWARE_VERSION, SystemConfig};
use crate::error::{Error, SensorError};
use crate::indicator::{self, IndicatorSequencer};
use crate::monitor::counter::RefillCounter;
use crate::monitor::estimator::LevelEstimator;
use crate::monitor::gate::{PublishGate, PublishGateState};
use crate::monitor::refill::{RefillDetector, RefillPhase};
use crate::monitor::{Distance, Reading};
use crate::telemetry::TOPIC_COMMAND;

use super::commands::AppCommand;
use super::events::{AppEvent, InboundEvent, LinkEvent, TelemetryData};
use super::ports::{
    ConfigError, CounterStore, EventSink, IndicatorPort, SensorPort, StorageError, TelemetryPort,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    estimator: LevelEstimator,
    detector: RefillDetector,
    gate: PublishGate,
    gate_state: PublishGateState,
    counter: RefillCounter,
    indicator: IndicatorSequencer,
    last_reading: Option<Reading>,
    /// Consecutive samples that ended in `Timeout` or `Bus`.
    failed_samples: u32,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** touch storage; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Result<Self, Error> {
        config.validate().map_err(|e| match e {
            ConfigError::ValidationFailed(msg) => Error::Config(msg),
            _ => Error::Config("invalid configuration"),
        })?;
        let estimator = LevelEstimator::new(config.full_mm, config.empty_mm)?;
        let detector = RefillDetector::new(config.refill_threshold_pct, config.refill_window_ms);
        let gate = PublishGate::new(config.publish_threshold_pct);

        Ok(Self {
            config,
            estimator,
            detector,
            gate,
            gate_state: PublishGateState::default(),
            counter: RefillCounter::new(),
            indicator: IndicatorSequencer::new(),
            last_reading: None,
            failed_samples: 0,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Hydrate the refill counter from storage and announce the start.
    ///
    /// A failed read is not fatal: the counter stays unsettled and the
    /// next `Connected` event retries the load.
    pub fn start(&mut self, store: &impl CounterStore, sink: &mut impl EventSink) {
        self.hydrate(store, sink);
        sink.emit(&AppEvent::Started {
            refills: self.counter.count(),
        });
        info!("AppService started (refills={})", self.counter.count());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one sampling cycle:
    /// sense → estimate → detect → persist/announce count → gate → publish → indicator.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`IndicatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + IndicatorPort),
        telemetry: &mut impl TelemetryPort,
        store: &mut impl CounterStore,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Sense
        match hw.read_distance(now_ms) {
            Ok(raw) => {
                self.failed_samples = 0;
                self.indicator.set_fault(false);
                let distance = raw.saturating_add_signed(self.config.sensor_offset_mm);
                self.process(distance, now_ms, telemetry, store, sink);
            }
            // Measurement period has not elapsed; nothing to do this tick.
            Err(SensorError::NotReady) => {}
            Err(e) => self.sensor_failed(e, sink),
        }

        // 2. Indicator
        self.render(now_ms, hw);
    }

    /// Consume one inbound lifecycle event.
    pub fn dispatch(
        &mut self,
        event: InboundEvent,
        now_ms: u64,
        hw: &mut impl IndicatorPort,
        telemetry: &mut impl TelemetryPort,
        store: &mut impl CounterStore,
        sink: &mut impl EventSink,
    ) {
        match event {
            InboundEvent::Link(LinkEvent::Connected) => {
                self.indicator.set_connecting(false);
                sink.emit(&AppEvent::LinkUp);
                if let Err(e) = telemetry.announce(FIRMWARE_VERSION) {
                    warn!("MQTT | announce failed: {e}");
                }
                self.hydrate(store, sink);
                self.announce_count(telemetry);
            }
            InboundEvent::Link(LinkEvent::Disconnected) => {
                self.indicator.set_connecting(true);
                sink.emit(&AppEvent::LinkDown);
            }
            InboundEvent::Link(LinkEvent::Message { topic, payload }) => {
                if topic.as_str() != TOPIC_COMMAND {
                    debug!("MQTT | ignoring message on {}", topic.as_str());
                } else {
                    match AppCommand::parse(&payload) {
                        Ok(cmd) => self.handle_command(cmd, telemetry, store, sink),
                        Err(e) => sink.emit(&AppEvent::CommandIgnored(e)),
                    }
                }
            }
            InboundEvent::Update(update) => self.indicator.update_event(update, now_ms),
        }

        self.render(now_ms, hw);
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute a parsed command, then clear the retained command slot.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        telemetry: &mut impl TelemetryPort,
        store: &mut impl CounterStore,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::ResetRefillCounter => {
                let result = self.counter.reset(store);
                self.storage_result(result, sink);
                sink.emit(&AppEvent::RefillCounterReset);
                info!("REFILL | counter reset");
                self.announce_count(telemetry);
                if let Err(e) = telemetry.clear_command() {
                    warn!("MQTT | clearing command failed: {e}");
                }
            }
        }
    }

    /// Show (or stop showing) the connecting state, e.g. around a blocking
    /// network join before the loop starts.
    pub fn indicate_connecting(&mut self, active: bool, now_ms: u64, hw: &mut impl IndicatorPort) {
        self.indicator.set_connecting(active);
        self.render(now_ms, hw);
    }

    /// Briefly confirm a completed network join.  The connecting state
    /// resumes once the flash expires unless the broker is up by then.
    pub fn indicate_joined(&mut self, now_ms: u64, hw: &mut impl IndicatorPort) {
        self.indicator.flash_joined(now_ms);
        self.render(now_ms, hw);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn refill_count(&self) -> u32 {
        self.counter.count()
    }

    /// Most recent processed sample, if any.
    pub fn last_reading(&self) -> Option<Reading> {
        self.last_reading
    }

    /// Last level handed to the transport.
    pub fn last_announced(&self) -> Option<f32> {
        self.gate_state.last_announced
    }

    pub fn refill_phase(&self) -> RefillPhase {
        self.detector.phase()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn process(
        &mut self,
        distance_mm: Distance,
        now_ms: u64,
        telemetry: &mut impl TelemetryPort,
        store: &mut impl CounterStore,
        sink: &mut impl EventSink,
    ) {
        // 2. Estimate
        let level = self.estimator.estimate(distance_mm);
        self.last_reading = Some(Reading { distance_mm, level });

        // 3. Detect, then count, persist and announce
        if let Some(hit) = self.detector.observe(level, now_ms) {
            let result = self.counter.increment(store);
            self.storage_result(result, sink);
            let count = self.counter.count();
            sink.emit(&AppEvent::RefillDetected {
                count,
                delta: hit.delta(),
            });
            self.announce_count(telemetry);
            self.indicator.start_refill_pulse(now_ms);
        }

        // 4. Gate and publish the level
        if !telemetry.is_available() {
            return;
        }
        let previous = self.gate_state;
        if self.gate.should_publish(level, &mut self.gate_state) {
            match telemetry.publish_fill_level(level, distance_mm) {
                Ok(()) => sink.emit(&AppEvent::Telemetry(TelemetryData {
                    level,
                    distance_mm,
                    refills: self.counter.count(),
                })),
                Err(e) => {
                    // Not announced; the next sample tries again.
                    self.gate_state = previous;
                    warn!("TELEM | publish failed: {e}");
                }
            }
        }
    }

    fn sensor_failed(&mut self, err: SensorError, sink: &mut impl EventSink) {
        self.failed_samples = self.failed_samples.saturating_add(1);
        sink.emit(&AppEvent::SensorFault(err));
        if self.failed_samples >= self.config.sensor_fault_samples {
            self.indicator.set_fault(true);
        }
    }

    fn hydrate(&mut self, store: &impl CounterStore, sink: &mut impl EventSink) {
        match self.counter.load(store) {
            Ok(true) => sink.emit(&AppEvent::CounterHydrated(self.counter.count())),
            Ok(false) => {}
            Err(e) => sink.emit(&AppEvent::PersistenceFailed(e)),
        }
    }

    fn storage_result(&self, result: Result<u32, StorageError>, sink: &mut impl EventSink) {
        if let Err(e) = result {
            sink.emit(&AppEvent::PersistenceFailed(e));
        }
    }

    fn announce_count(&self, telemetry: &mut impl TelemetryPort) {
        if !telemetry.is_available() {
            return;
        }
        if let Err(e) = telemetry.publish_refill_count(self.counter.count()) {
            warn!("TELEM | refill count publish failed: {e}");
        }
    }

    fn render(&mut self, now_ms: u64, hw: &mut impl IndicatorPort) {
        let active = self.indicator.current(now_ms);
        let level = self.last_reading.map(|r| r.level);
        hw.set_indicator(indicator::resolve(level, active));
    }
}
