//! Inbound command and firmware-update handling through `AppService::dispatch`.

use super::mock_hw::{BrokerCall, MockBroker, MockHardware, MockStore, RecordingSink};

use tanklevel::app::commands::RESET_REFILL_COUNTER;
use tanklevel::app::events::{AppEvent, InboundEvent, LinkEvent, UpdateEvent};
use tanklevel::app::service::AppService;
use tanklevel::config::SystemConfig;
use tanklevel::error::CommandError;
use tanklevel::indicator::{COLOUR_ERROR, COLOUR_UPDATE_DONE, COLOUR_UPDATE_PROGRESS, Directive};
use tanklevel::monitor::counter::REFILLS_KEY;
use tanklevel::telemetry::{TOPIC_BASE, TOPIC_COMMAND};

struct Rig {
    app: AppService,
    hw: MockHardware,
    broker: MockBroker,
    store: MockStore,
    sink: RecordingSink,
}

impl Rig {
    fn with_count(count: u32) -> Self {
        let mut rig = Self {
            app: AppService::new(SystemConfig::default()).unwrap(),
            hw: MockHardware::new(),
            broker: MockBroker::online(),
            store: MockStore::with(REFILLS_KEY, count),
            sink: RecordingSink::new(),
        };
        rig.app.start(&rig.store, &mut rig.sink);
        rig
    }

    fn send(&mut self, now_ms: u64, event: impl Into<InboundEvent>) {
        self.app.dispatch(
            event.into(),
            now_ms,
            &mut self.hw,
            &mut self.broker,
            &mut self.store,
            &mut self.sink,
        );
    }

    fn command(&mut self, topic: &str, payload: &[u8]) {
        self.send(0, LinkEvent::message(topic, payload).unwrap());
    }
}

// ── Reset command ─────────────────────────────────────────────

#[test]
fn reset_zeroes_persists_announces_and_clears() {
    let mut rig = Rig::with_count(7);
    rig.command(TOPIC_COMMAND, RESET_REFILL_COUNTER.as_bytes());

    assert_eq!(rig.app.refill_count(), 0);
    assert_eq!(rig.store.writes, vec![(REFILLS_KEY.to_owned(), 0)]);
    assert_eq!(
        rig.broker.calls,
        vec![BrokerCall::RefillCount(0), BrokerCall::ClearCommand]
    );
    assert!(rig.sink.contains(&AppEvent::RefillCounterReset));
}

#[test]
fn reset_tolerates_surrounding_whitespace() {
    let mut rig = Rig::with_count(3);
    rig.command(TOPIC_COMMAND, b"  reset_refill_counter\n");
    assert_eq!(rig.app.refill_count(), 0);
}

#[test]
fn reset_with_failing_storage_still_zeroes_memory() {
    let mut rig = Rig::with_count(4);
    rig.store.fail_writes = true;
    rig.command(TOPIC_COMMAND, RESET_REFILL_COUNTER.as_bytes());

    assert_eq!(rig.app.refill_count(), 0);
    assert_eq!(rig.store.values[REFILLS_KEY], 4);
    assert!(rig.sink.events.iter().any(|e| matches!(e, AppEvent::PersistenceFailed(_))));
    assert_eq!(rig.broker.counts(), vec![0]);
}

#[test]
fn reset_before_hydrate_wins_over_stored_value() {
    let mut store = MockStore::with(REFILLS_KEY, 9);
    store.fail_reads = true;
    let mut rig = Rig {
        app: AppService::new(SystemConfig::default()).unwrap(),
        hw: MockHardware::new(),
        broker: MockBroker::online(),
        store,
        sink: RecordingSink::new(),
    };
    rig.app.start(&rig.store, &mut rig.sink);

    rig.store.fail_writes = true;
    rig.command(TOPIC_COMMAND, RESET_REFILL_COUNTER.as_bytes());

    // Storage recovers; a later connect must not resurrect the old value.
    rig.store.fail_reads = false;
    rig.send(100, LinkEvent::Connected);
    assert_eq!(rig.app.refill_count(), 0);
}

#[test]
fn reset_while_offline_skips_transport() {
    let mut rig = Rig::with_count(2);
    rig.broker.available = false;
    rig.command(TOPIC_COMMAND, RESET_REFILL_COUNTER.as_bytes());

    assert_eq!(rig.app.refill_count(), 0);
    assert!(rig.broker.calls.is_empty());
}

// ── Ignored payloads ──────────────────────────────────────────

#[test]
fn blank_payload_is_ignored() {
    let mut rig = Rig::with_count(5);
    rig.command(TOPIC_COMMAND, b" ");

    assert_eq!(rig.app.refill_count(), 5);
    assert!(rig.sink.contains(&AppEvent::CommandIgnored(CommandError::Empty)));
    assert!(rig.broker.calls.is_empty());
}

#[test]
fn unknown_payload_is_ignored() {
    let mut rig = Rig::with_count(5);
    rig.command(TOPIC_COMMAND, b"reboot");

    assert_eq!(rig.app.refill_count(), 5);
    assert!(rig.sink.contains(&AppEvent::CommandIgnored(CommandError::Unknown)));
    assert!(rig.store.writes.is_empty());
}

#[test]
fn non_utf8_payload_is_ignored() {
    let mut rig = Rig::with_count(1);
    rig.command(TOPIC_COMMAND, &[0xFF, 0xFE]);
    assert_eq!(rig.app.refill_count(), 1);
}

#[test]
fn reset_on_other_topic_is_ignored() {
    let mut rig = Rig::with_count(6);
    rig.command(TOPIC_BASE, RESET_REFILL_COUNTER.as_bytes());

    assert_eq!(rig.app.refill_count(), 6);
    assert!(!rig.sink.events.iter().any(|e| matches!(e, AppEvent::CommandIgnored(_))));
    assert!(rig.broker.calls.is_empty());
}

// ── Firmware update indicator ─────────────────────────────────

#[test]
fn update_progress_drives_ring() {
    let mut rig = Rig::with_count(0);
    rig.send(0, UpdateEvent::Started);
    rig.send(10, UpdateEvent::Progress { done: 3, total: 10 });

    assert_eq!(
        rig.hw.last_shown(),
        Some(Directive::Progress {
            colour: COLOUR_UPDATE_PROGRESS,
            done: 3,
            total: 10
        })
    );

    rig.send(20, UpdateEvent::Finished);
    assert_eq!(rig.hw.last_shown(), Some(Directive::Fill(COLOUR_UPDATE_DONE)));
}

#[test]
fn update_failure_flashes_error_then_recovers() {
    let mut rig = Rig::with_count(0);
    rig.send(0, UpdateEvent::Started);
    rig.send(100, UpdateEvent::Failed);
    assert_eq!(rig.hw.last_shown(), Some(Directive::Fill(COLOUR_ERROR)));

    // No reading yet, so the ring goes dark once the error hold expires.
    rig.app.tick(
        2_200,
        &mut rig.hw,
        &mut rig.broker,
        &mut rig.store,
        &mut rig.sink,
    );
    assert_eq!(rig.hw.last_shown(), Some(Directive::Off));
}
