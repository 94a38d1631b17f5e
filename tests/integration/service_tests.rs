//! Integration tests for the sample → estimate → detect → gate → publish
//! pipeline inside `AppService`, driven through mock adapters.

use super::mock_hw::{BrokerCall, MockBroker, MockHardware, MockStore, RecordingSink};

use tanklevel::app::events::{AppEvent, LinkEvent};
use tanklevel::app::service::AppService;
use tanklevel::config::{FIRMWARE_VERSION, SystemConfig};
use tanklevel::error::SensorError;
use tanklevel::indicator::{self, COLOUR_ERROR, COLOUR_REFILL, Directive};
use tanklevel::monitor::Distance;
use tanklevel::monitor::counter::REFILLS_KEY;
use tanklevel::monitor::refill::RefillPhase;

struct Rig {
    app: AppService,
    hw: MockHardware,
    broker: MockBroker,
    store: MockStore,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        Self::with_store(config, MockStore::default())
    }

    fn with_store(config: SystemConfig, store: MockStore) -> Self {
        let mut rig = Self {
            app: AppService::new(config).unwrap(),
            hw: MockHardware::new(),
            broker: MockBroker::online(),
            store,
            sink: RecordingSink::new(),
        };
        rig.app.start(&rig.store, &mut rig.sink);
        rig
    }

    fn sample(&mut self, now_ms: u64, distance: Distance) {
        self.hw.push(Ok(distance));
        self.tick(now_ms);
    }

    fn tick(&mut self, now_ms: u64) {
        self.app.tick(
            now_ms,
            &mut self.hw,
            &mut self.broker,
            &mut self.store,
            &mut self.sink,
        );
    }

    fn link(&mut self, now_ms: u64, event: LinkEvent) {
        self.app.dispatch(
            event.into(),
            now_ms,
            &mut self.hw,
            &mut self.broker,
            &mut self.store,
            &mut self.sink,
        );
    }
}

/// FULL=50, EMPTY=230, REFILL_THRESHOLD=30, WINDOW=10 s.
fn bench_config() -> SystemConfig {
    SystemConfig {
        full_mm: 50,
        empty_mm: 230,
        refill_threshold_pct: 30.0,
        refill_window_ms: 10_000,
        ..SystemConfig::default()
    }
}

/// A 128 mm span keeps every level exact in `f32`.
fn linear_config() -> SystemConfig {
    SystemConfig {
        full_mm: 0,
        empty_mm: 128,
        ..SystemConfig::default()
    }
}

// ── Refill detection ──────────────────────────────────────────

#[test]
fn refill_scenario_counts_exactly_once() {
    let mut rig = Rig::new(bench_config());

    rig.sample(0, 200);
    rig.sample(0, 200);
    rig.sample(1_000, 90);
    rig.sample(2_000, 90);

    let level = rig.app.last_reading().unwrap().level;
    assert!((level - 77.78).abs() < 0.01, "level was {level}");
    assert_eq!(rig.sink.refills_detected(), 1);
    assert_eq!(rig.app.refill_count(), 1);
    assert_eq!(rig.store.values[REFILLS_KEY], 1);
    assert_eq!(rig.broker.counts(), vec![1]);

    let delta = rig.sink.events.iter().find_map(|e| match e {
        AppEvent::RefillDetected { delta, .. } => Some(*delta),
        _ => None,
    });
    assert!((delta.unwrap() - 61.11).abs() < 0.01);
}

#[test]
fn second_jump_in_same_window_is_not_counted() {
    let mut rig = Rig::new(bench_config());

    rig.sample(0, 200);
    rig.sample(1_000, 90);
    rig.sample(2_000, 230);
    rig.sample(3_000, 50);

    assert_eq!(rig.app.refill_count(), 1);
    assert_eq!(rig.app.refill_phase(), RefillPhase::Refilling);
}

#[test]
fn expired_window_rebases_on_latest_level() {
    let mut rig = Rig::new(bench_config());

    rig.sample(0, 200); // 16.7 %
    rig.sample(11_000, 150); // window expired, baseline -> 44.4 %
    rig.sample(12_000, 120); // 61.1 %: +44.4 over the old baseline, +16.7 over the new

    assert_eq!(rig.app.refill_count(), 0);
    assert_eq!(rig.app.refill_phase(), RefillPhase::Idle);
}

#[test]
fn jump_at_exact_window_end_belongs_to_old_window() {
    let mut rig = Rig::new(bench_config());
    rig.sample(0, 200);
    rig.sample(10_000, 90);
    assert_eq!(rig.app.refill_count(), 1);
}

#[test]
fn jump_just_after_window_end_only_rearms() {
    let mut rig = Rig::new(bench_config());
    rig.sample(0, 200);
    rig.sample(10_001, 90);
    assert_eq!(rig.app.refill_count(), 0);

    // The re-armed window counts the next rise from its own baseline.
    rig.sample(10_500, 230);
    rig.sample(11_000, 90);
    assert_eq!(rig.app.refill_count(), 0);
}

#[test]
fn refill_after_rearm_counts_again() {
    let mut rig = Rig::new(bench_config());
    rig.sample(0, 200);
    rig.sample(1_000, 90);
    rig.sample(12_000, 230); // re-arm at 0 %
    rig.sample(13_000, 90);
    assert_eq!(rig.app.refill_count(), 2);
    assert_eq!(rig.broker.counts(), vec![1, 2]);
}

// ── Publish gate ──────────────────────────────────────────────

#[test]
fn gate_publishes_first_and_large_changes_only() {
    let mut rig = Rig::new(linear_config());

    rig.sample(0, 64); // 50 %
    rig.sample(100, 56); // 56.25 %
    rig.sample(200, 48); // 62.5 %

    assert_eq!(rig.broker.levels(), vec![50.0, 62.5]);
    assert_eq!(rig.app.last_announced(), Some(62.5));
}

#[test]
fn fill_level_carries_distance() {
    let mut rig = Rig::new(linear_config());
    rig.sample(0, 32);
    assert_eq!(
        rig.broker.calls,
        vec![BrokerCall::FillLevel {
            level: 75.0,
            distance_mm: 32
        }]
    );
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Telemetry(t) if t.distance_mm == 32 && t.refills == 0
    )));
}

#[test]
fn offline_tick_does_not_advance_gate() {
    let mut rig = Rig::new(linear_config());
    rig.broker.available = false;
    rig.sample(0, 64);
    assert_eq!(rig.app.last_announced(), None);

    rig.broker.available = true;
    rig.sample(100, 60);
    assert_eq!(rig.broker.levels(), vec![53.125]);
}

#[test]
fn failed_publish_is_retried_on_next_sample() {
    let mut rig = Rig::new(linear_config());
    rig.broker.fail = true;
    rig.sample(0, 64);
    assert_eq!(rig.app.last_announced(), None);

    rig.broker.fail = false;
    rig.sample(100, 64);
    assert_eq!(rig.broker.levels(), vec![50.0]);
}

// ── Sensing ───────────────────────────────────────────────────

#[test]
fn timeout_skips_tick_without_touching_state() {
    let mut rig = Rig::new(linear_config());
    rig.sample(0, 64);
    rig.hw.push(Err(SensorError::Timeout));
    rig.tick(100);

    assert_eq!(rig.app.last_reading().unwrap().distance_mm, 64);
    assert!(rig.sink.contains(&AppEvent::SensorFault(SensorError::Timeout)));
    assert_eq!(rig.app.tick_count(), 2);
}

#[test]
fn persistent_sensor_failure_shows_error() {
    let config = SystemConfig {
        sensor_fault_samples: 3,
        ..linear_config()
    };
    let mut rig = Rig::new(config);
    for t in 0..3 {
        rig.hw.push(Err(SensorError::Bus));
        rig.tick(t * 100);
    }
    assert_eq!(rig.hw.last_shown(), Some(Directive::Fill(COLOUR_ERROR)));

    rig.sample(300, 64);
    assert_eq!(
        rig.hw.last_shown(),
        Some(Directive::Fill(indicator::map_level(50.0)))
    );
}

#[test]
fn sensor_offset_is_applied_before_estimation() {
    let config = SystemConfig {
        sensor_offset_mm: 10,
        ..linear_config()
    };
    let mut rig = Rig::new(config);
    rig.sample(0, 22);
    assert_eq!(rig.app.last_reading().unwrap().level, 75.0);
}

// ── Counter persistence ───────────────────────────────────────

#[test]
fn start_hydrates_and_increments_from_stored_count() {
    let mut rig = Rig::with_store(bench_config(), MockStore::with(REFILLS_KEY, 5));
    assert_eq!(rig.app.refill_count(), 5);

    rig.sample(0, 200);
    rig.sample(1_000, 90);
    assert_eq!(rig.app.refill_count(), 6);
    assert_eq!(rig.store.writes, vec![(REFILLS_KEY.to_owned(), 6)]);
}

#[test]
fn storage_failure_keeps_in_memory_count() {
    let mut rig = Rig::new(bench_config());
    rig.store.fail_writes = true;

    rig.sample(0, 200);
    rig.sample(1_000, 90);

    assert_eq!(rig.app.refill_count(), 1);
    assert!(rig.store.values.is_empty());
    assert!(rig.sink.events.iter().any(|e| matches!(e, AppEvent::PersistenceFailed(_))));
    assert_eq!(rig.broker.counts(), vec![1]);
}

#[test]
fn failed_startup_read_is_retried_on_connect() {
    let mut store = MockStore::with(REFILLS_KEY, 8);
    store.fail_reads = true;
    let mut rig = Rig::with_store(bench_config(), store);
    assert_eq!(rig.app.refill_count(), 0);

    rig.store.fail_reads = false;
    rig.link(0, LinkEvent::Connected);

    assert_eq!(rig.app.refill_count(), 8);
    assert_eq!(rig.broker.counts(), vec![8]);
}

#[test]
fn reconnect_does_not_reload_counter() {
    let mut rig = Rig::with_store(bench_config(), MockStore::with(REFILLS_KEY, 3));
    rig.sample(0, 200);
    rig.sample(1_000, 90);
    assert_eq!(rig.app.refill_count(), 4);

    // Storage rolled back behind our back; the running count wins.
    rig.store.values.insert(REFILLS_KEY.to_owned(), 1);
    rig.link(2_000, LinkEvent::Disconnected);
    rig.link(3_000, LinkEvent::Connected);
    assert_eq!(rig.app.refill_count(), 4);
}

// ── Link lifecycle ────────────────────────────────────────────

#[test]
fn connect_announces_firmware_then_count() {
    let mut rig = Rig::with_store(bench_config(), MockStore::with(REFILLS_KEY, 2));
    rig.link(0, LinkEvent::Connected);
    assert_eq!(
        rig.broker.calls,
        vec![
            BrokerCall::Announce(FIRMWARE_VERSION.to_owned()),
            BrokerCall::RefillCount(2),
        ]
    );
    assert!(rig.sink.contains(&AppEvent::LinkUp));
}

#[test]
fn refill_while_offline_is_announced_on_connect() {
    let mut rig = Rig::new(bench_config());
    rig.broker.available = false;
    rig.sample(0, 200);
    rig.sample(1_000, 90);
    assert_eq!(rig.app.refill_count(), 1);
    assert!(rig.broker.calls.is_empty());

    rig.broker.available = true;
    rig.link(2_000, LinkEvent::Connected);
    assert_eq!(rig.broker.counts(), vec![1]);
}

// ── Indicator ─────────────────────────────────────────────────

#[test]
fn refill_pulses_blue_then_returns_to_level() {
    let mut rig = Rig::new(bench_config());
    rig.sample(0, 200);
    rig.sample(1_000, 90);
    assert_eq!(rig.hw.last_shown(), Some(Directive::Fill(COLOUR_REFILL)));

    rig.tick(1_150);
    assert_eq!(rig.hw.last_shown(), Some(Directive::Off));

    rig.tick(1_600);
    let level = rig.app.last_reading().unwrap().level;
    assert_eq!(
        rig.hw.last_shown(),
        Some(Directive::Fill(indicator::map_level(level)))
    );
}
