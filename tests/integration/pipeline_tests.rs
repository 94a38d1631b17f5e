//! End-to-end runs against the real host backends: the simulated MQTT
//! outbox, the in-memory NVS store and the link-event channel.

use super::mock_hw::MockHardware;

use tanklevel::adapters::log_sink::LogEventSink;
use tanklevel::adapters::mqtt::MqttAdapter;
use tanklevel::adapters::nvs::NvsAdapter;
use tanklevel::app::commands::RESET_REFILL_COUNTER;
use tanklevel::app::events::LinkEvent;
use tanklevel::app::ports::CounterStore;
use tanklevel::app::service::AppService;
use tanklevel::channels;
use tanklevel::config::{FIRMWARE_VERSION, SystemConfig};
use tanklevel::monitor::counter::REFILLS_KEY;
use tanklevel::telemetry::{
    COMMAND_CLEARED, StateDocument, TOPIC_BASE, TOPIC_COMMAND, TOPIC_DISTANCE, TOPIC_FIRMWARE,
    TOPIC_LEVEL, TOPIC_REFILLS, TOPIC_STATUS,
};

fn config() -> SystemConfig {
    SystemConfig {
        full_mm: 50,
        empty_mm: 230,
        refill_threshold_pct: 30.0,
        ..SystemConfig::default()
    }
}

/// Drain the channel the way the control loop does.
fn drain(
    app: &mut AppService,
    now_ms: u64,
    hw: &mut MockHardware,
    mqtt: &mut MqttAdapter,
    nvs: &mut NvsAdapter,
    sink: &mut LogEventSink,
) {
    while let Some(event) = channels::next_link_event() {
        mqtt.observe_link(&event);
        app.dispatch(event.into(), now_ms, hw, mqtt, nvs, sink);
    }
}

fn last_document(mqtt: &mut MqttAdapter) -> StateDocument {
    let out = mqtt.take_outbox();
    let doc = out
        .iter()
        .rev()
        .find(|p| p.topic == TOPIC_BASE)
        .expect("document published");
    serde_json::from_str(&doc.payload).unwrap()
}

#[test]
fn full_session_through_host_backends() {
    let mut nvs = NvsAdapter::new();
    nvs.put_u32(REFILLS_KEY, 3).unwrap();
    let mut mqtt = MqttAdapter::simulated();
    let mut hw = MockHardware::new();
    let mut sink = LogEventSink::new();

    let mut app = AppService::new(config()).unwrap();
    app.start(&nvs, &mut sink);
    assert_eq!(app.refill_count(), 3);

    // Offline: sampling runs but nothing leaves the device.
    hw.push(Ok(200));
    app.tick(0, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    assert!(mqtt.take_outbox().is_empty());

    // Session comes up.
    assert!(channels::push_link_event(LinkEvent::Connected));
    drain(&mut app, 100, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    assert_eq!(mqtt.subscriptions(), &[TOPIC_COMMAND]);
    let out = mqtt.take_outbox();
    let topics: Vec<_> = out.iter().map(|p| p.topic).collect();
    assert_eq!(
        topics,
        vec![TOPIC_STATUS, TOPIC_FIRMWARE, TOPIC_BASE, TOPIC_REFILLS, TOPIC_BASE]
    );
    assert_eq!(out[1].payload, FIRMWARE_VERSION);
    assert_eq!(out[3].payload, "3");

    // Refill: count, persist, then the level.
    hw.push(Ok(90));
    app.tick(1_000, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    assert_eq!(nvs.get_u32(REFILLS_KEY, 0), Ok(4));
    let out = mqtt.take_outbox();
    assert_eq!(out[0].topic, TOPIC_REFILLS);
    assert_eq!(out[0].payload, "4");
    let level = out.iter().find(|p| p.topic == TOPIC_LEVEL).unwrap();
    assert_eq!(level.payload, "77.8");
    let distance = out.iter().find(|p| p.topic == TOPIC_DISTANCE).unwrap();
    assert_eq!(distance.payload, "90");

    let doc: StateDocument = serde_json::from_str(&out.last().unwrap().payload).unwrap();
    assert_eq!(doc.fuellstand, Some(77.8));
    assert_eq!(doc.distanz, Some(90));
    assert_eq!(doc.auffuellungen, Some(4));
    assert_eq!(doc.firmware.as_deref(), Some(FIRMWARE_VERSION));

    // Remote reset arrives through the same channel.
    let cmd = LinkEvent::message(TOPIC_COMMAND, RESET_REFILL_COUNTER.as_bytes()).unwrap();
    assert!(channels::push_link_event(cmd));
    drain(&mut app, 1_100, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    assert_eq!(app.refill_count(), 0);
    assert_eq!(nvs.get_u32(REFILLS_KEY, 9), Ok(0));
    let out = mqtt.take_outbox();
    let cleared = out.last().unwrap();
    assert_eq!(cleared.topic, TOPIC_COMMAND);
    assert_eq!(cleared.payload, COMMAND_CLEARED);
    assert!(cleared.retain);

    // Session drops: publishes stop, the gate does not move.
    assert!(channels::push_link_event(LinkEvent::Disconnected));
    drain(&mut app, 1_200, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    hw.push(Ok(230));
    app.tick(1_300, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    assert!(mqtt.take_outbox().is_empty());
    assert!((app.last_announced().unwrap() - 77.78).abs() < 0.01);

    // Back online: the next sample goes out.
    assert!(channels::push_link_event(LinkEvent::Connected));
    drain(&mut app, 1_400, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    hw.push(Ok(230));
    app.tick(1_500, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    let doc = last_document(&mut mqtt);
    assert_eq!(doc.fuellstand, Some(0.0));
    assert_eq!(doc.auffuellungen, Some(0));
}

#[test]
fn failing_client_does_not_advance_gate() {
    let mut nvs = NvsAdapter::new();
    let mut mqtt = MqttAdapter::simulated();
    mqtt.observe_link(&LinkEvent::Connected);
    mqtt.set_failing(true);
    let mut hw = MockHardware::new();
    let mut sink = LogEventSink::new();

    let mut app = AppService::new(config()).unwrap();
    app.start(&nvs, &mut sink);

    hw.push(Ok(140));
    app.tick(0, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    assert_eq!(app.last_announced(), None);

    mqtt.set_failing(false);
    hw.push(Ok(140));
    app.tick(1_000, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    assert_eq!(last_document(&mut mqtt).fuellstand, Some(50.0));
}

#[test]
fn unavailable_storage_keeps_counting() {
    let mut nvs = NvsAdapter::new();
    nvs.set_failing(true);
    let mut mqtt = MqttAdapter::simulated();
    mqtt.observe_link(&LinkEvent::Connected);
    let mut hw = MockHardware::with_distances(&[200, 90]);
    let mut sink = LogEventSink::new();

    let mut app = AppService::new(config()).unwrap();
    app.start(&nvs, &mut sink);
    app.tick(0, &mut hw, &mut mqtt, &mut nvs, &mut sink);
    app.tick(1_000, &mut hw, &mut mqtt, &mut nvs, &mut sink);

    assert_eq!(app.refill_count(), 1);
    nvs.set_failing(false);
    assert_eq!(nvs.get_u32(REFILLS_KEY, 0), Ok(0));
}
