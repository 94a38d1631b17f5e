//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                   |
//! |------------|-----------------|-------------------------------|
//! | `hardware` | SensorPort      | VL53L0X over I2C              |
//! |            | IndicatorPort   | WS2812 ring over RMT          |
//! | `log_sink` | EventSink       | Serial log output             |
//! | `mqtt`     | TelemetryPort   | ESP-IDF MQTT client / outbox  |
//! | `nvs`      | CounterStore    | NVS / in-memory store         |
//! |            | ConfigPort      |                               |
//! | `time`     | -               | ESP32 system timer            |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
