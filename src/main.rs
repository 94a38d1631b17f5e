//! Tank level monitor: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter      MqttAdapter     NvsAdapter   LogEventSink│
//! │  (Sensor+Indicator)   (Telemetry)     (Counter+    (EventSink) │
//! │   VL53L0X · WS2812                     Config)                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Estimator · RefillDetector · PublishGate · Counter    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  MQTT task ──LinkEvent──▶ channel ──▶ control loop             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wiring: VL53L0X on I2C0 (SDA GPIO22, SCL GPIO23), 16-pixel WS2812
//! ring on GPIO1 via RMT channel 0.
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::KiloHertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{error, info};
use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

use tanklevel::adapters::hardware::HardwareAdapter;
use tanklevel::adapters::log_sink::LogEventSink;
use tanklevel::adapters::mqtt::{MqttAdapter, MqttSettings};
use tanklevel::adapters::nvs::NvsAdapter;
use tanklevel::adapters::time::MonotonicClock;
use tanklevel::app::service::AppService;
use tanklevel::channels;
use tanklevel::config::{self, FIRMWARE_VERSION};
use tanklevel::drivers::led_ring::LedRing;
use tanklevel::drivers::watchdog::Watchdog;
use tanklevel::sensors::range::RangeSensor;

// ── Build-time credentials ────────────────────────────────────

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => default,
    }
}

const WIFI_SSID: &str = env_or(option_env!("TANKLEVEL_WIFI_SSID"), "");
const WIFI_PASS: &str = env_or(option_env!("TANKLEVEL_WIFI_PASS"), "");
const MQTT_URL: &str = env_or(option_env!("TANKLEVEL_MQTT_URL"), "mqtt://192.168.179.23:1883");
const MQTT_USER: Option<&str> = option_env!("TANKLEVEL_MQTT_USER");
const MQTT_PASS: Option<&str> = option_env!("TANKLEVEL_MQTT_PASS");
const HOSTNAME: &str = "rocket";

const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Tanklevel v{}                    ║", FIRMWARE_VERSION);
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let clock = MonotonicClock::new();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new();
    let config = config::load_or_repair(&mut nvs);

    let watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);

    // ── 3. Hardware ───────────────────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio22,
        peripherals.pins.gpio23,
        &I2cConfig::new().baudrate(KiloHertz(400).into()),
    )?;
    let mut sensor = RangeSensor::new(i2c, config.sensor_timeout_ms);
    match sensor
        .init()
        .and_then(|()| sensor.start_continuous(config.sensor_period_ms, clock.uptime_ms()))
    {
        Ok(()) => {}
        // Keep running: the indicator shows the fault once samples keep failing.
        Err(e) => error!("Range sensor init failed: {}", e),
    }

    let driver = Ws2812Esp32Rmt::new(peripherals.rmt.channel0, peripherals.pins.gpio1)
        .map_err(|e| anyhow!("LED ring init failed: {:?}", e))?;
    let ring = LedRing::new(config.led_count, config.led_brightness, driver);
    let mut hw = HardwareAdapter::new(sensor, ring);

    // ── 4. Application core ───────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config.clone())?;
    app.start(&nvs, &mut sink);

    // ── 5. Network ────────────────────────────────────────────
    app.indicate_connecting(true, clock.uptime_ms(), &mut hw);
    let _wifi = match connect_wifi(peripherals.modem, sysloop, nvs_partition) {
        Ok(wifi) => wifi,
        Err(e) => {
            error!("WiFi setup failed: {:#}; restarting", e);
            FreeRtos::delay_ms(config.reconnect_interval_ms);
            esp_idf_svc::hal::reset::restart();
        }
    };
    app.indicate_joined(clock.uptime_ms(), &mut hw);

    let mut mqtt = MqttAdapter::connect(&MqttSettings {
        url: MQTT_URL,
        client_id: HOSTNAME,
        username: MQTT_USER,
        password: MQTT_PASS,
        reconnect_interval_ms: config.reconnect_interval_ms,
    })?;

    // ── 6. Control loop ───────────────────────────────────────
    info!("Entering control loop ({}ms cadence)", config.sample_interval_ms);
    loop {
        let now = clock.uptime_ms();

        while let Some(event) = channels::next_link_event() {
            mqtt.observe_link(&event);
            app.dispatch(event.into(), now, &mut hw, &mut mqtt, &mut nvs, &mut sink);
        }

        app.tick(now, &mut hw, &mut mqtt, &mut nvs, &mut sink);

        watchdog.feed();
        FreeRtos::delay_ms(config.sample_interval_ms);
    }
}

/// Join the configured access point and wait for an address.
fn connect_wifi(
    modem: esp_idf_svc::hal::modem::Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> Result<Box<EspWifi<'static>>> {
    let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = BlockingWifi::wrap(&mut esp_wifi, sysloop)?;

    let auth_method = if WIFI_PASS.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| anyhow!("SSID longer than 32 bytes"))?,
        password: WIFI_PASS
            .try_into()
            .map_err(|_| anyhow!("password longer than 64 bytes"))?,
        auth_method,
        ..Default::default()
    }))?;

    info!("WIFI | starting");
    wifi.start()?;
    info!("WIFI | connecting to '{}'", WIFI_SSID);
    wifi.connect()?;
    wifi.wait_netif_up()?;

    let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
    info!("WIFI | up ({:?})", ip_info.ip);

    Ok(Box::new(esp_wifi))
}
