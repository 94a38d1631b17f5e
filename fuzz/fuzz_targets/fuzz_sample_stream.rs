//! Fuzz target: `AppService::tick` over arbitrary sample streams
//!
//! Every 4 input bytes become one tick: a time step, a distance and a
//! sensor outcome selector.  In-memory ports stand in for the hardware,
//! broker and NVS.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every published level lies in `[0, 100]`
//! - The persisted count always equals the in-memory count
//! - The count never decreases (no reset command is sent)
//!
//! cargo fuzz run fuzz_sample_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use tanklevel::app::events::AppEvent;
use tanklevel::app::ports::{
    CounterStore, EventSink, IndicatorPort, SensorPort, StorageError, TelemetryPort,
};
use tanklevel::app::service::AppService;
use tanklevel::config::SystemConfig;
use tanklevel::error::{SensorError, TransportError};
use tanklevel::indicator::Directive;
use tanklevel::monitor::Distance;

// ── In-memory ports for fuzz testing ──────────────────────────

struct Hw(Option<Result<Distance, SensorError>>);

impl SensorPort for Hw {
    fn read_distance(&mut self, _now_ms: u64) -> Result<Distance, SensorError> {
        self.0.take().unwrap_or(Err(SensorError::NotReady))
    }
}

impl IndicatorPort for Hw {
    fn set_indicator(&mut self, _directive: Directive) {}
}

#[derive(Default)]
struct Broker {
    levels: Vec<f32>,
}

impl TelemetryPort for Broker {
    fn is_available(&self) -> bool {
        true
    }
    fn publish_fill_level(&mut self, level: f32, _d: Distance) -> Result<(), TransportError> {
        self.levels.push(level);
        Ok(())
    }
    fn publish_refill_count(&mut self, _count: u32) -> Result<(), TransportError> {
        Ok(())
    }
    fn announce(&mut self, _firmware: &str) -> Result<(), TransportError> {
        Ok(())
    }
    fn clear_command(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Default)]
struct Store(Option<u32>);

impl CounterStore for Store {
    fn get_u32(&self, _key: &str, default: u32) -> Result<u32, StorageError> {
        Ok(self.0.unwrap_or(default))
    }
    fn put_u32(&mut self, _key: &str, value: u32) -> Result<(), StorageError> {
        self.0 = Some(value);
        Ok(())
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(mut app) = AppService::new(SystemConfig::default()) else {
        return;
    };
    let mut broker = Broker::default();
    let mut store = Store::default();
    app.start(&store, &mut Discard);

    let mut now = 0u64;
    let mut last_count = 0;
    for chunk in data.chunks_exact(4) {
        now += u64::from(chunk[0]) * 100;
        let distance = u16::from_le_bytes([chunk[1], chunk[2]]);
        let sample = match chunk[3] % 8 {
            0 => Err(SensorError::Timeout),
            1 => Err(SensorError::NotReady),
            2 => Err(SensorError::Bus),
            _ => Ok(distance),
        };

        let mut hw = Hw(Some(sample));
        app.tick(now, &mut hw, &mut broker, &mut store, &mut Discard);

        let count = app.refill_count();
        assert!(count >= last_count, "count went backwards");
        if count > 0 {
            assert_eq!(store.0, Some(count));
        }
        last_count = count;
    }

    assert!(broker.levels.iter().all(|l| (0.0..=100.0).contains(l)));
});
