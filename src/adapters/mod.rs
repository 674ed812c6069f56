//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                      | Connects to               |
//! |---------------|---------------------------------|---------------------------|
//! | `config_file` | ConfigPort                      | JSON file on SPIFFS       |
//! | `heap`        | MemoryProbe                     | ESP-IDF heap statistics   |
//! | `log_sink`    | EventSink                       | Serial log + log file     |
//! | `mqtt`        | BrokerConnector / BrokerSession | ESP-IDF MQTT client       |
//! | `ntp`         | TimeSyncPort                    | ESP-IDF SNTP              |
//! | `system`      | RebootPort                      | `esp_restart()`           |
//! | `time`        | TimePort                        | ESP32 system timer        |
//! | `wifi`        | LinkPort                        | ESP-IDF WiFi STA          |

pub mod config_file;
pub mod heap;
pub mod log_sink;
pub mod mqtt;
pub mod ntp;
pub mod system;
pub mod time;
pub mod wifi;
