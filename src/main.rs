//! CO2 Monitor Firmware: Main Entry Point
//!
//! Bootstrap only: mount storage, load configuration, build the adapters
//! and drivers, decide which optional collaborators exist, then hand
//! everything to the [`MonitorService`] loop, which never returns.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Scd4x (Sensor)    Tm1637 (Display)  StatusLed   Watchdog      │
//! │  WifiAdapter       MqttConnector     SntpSync    HeapProbe     │
//! │  (Link)            (Broker)          (TimeSync)  (Memory)      │
//! │  LogEventSink      JsonConfigFile    Esp32Time   SystemReset   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  Health · ResourceGuard · Scheduler · Connectivity     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use co2monitor::adapters::config_file::JsonConfigFile;
use co2monitor::adapters::heap::HeapProbe;
use co2monitor::adapters::log_sink::{FileLog, LogEventSink};
use co2monitor::adapters::mqtt::MqttConnector;
use co2monitor::adapters::ntp::SntpSync;
use co2monitor::adapters::system::SystemReset;
use co2monitor::adapters::time::Esp32TimeAdapter;
use co2monitor::adapters::wifi::WifiAdapter;
use co2monitor::app::events::Capabilities;
use co2monitor::app::ports::SystemPorts;
use co2monitor::app::service::MonitorService;
use co2monitor::config::{self, CONFIG_PATH, LOG_PATH};
use co2monitor::connectivity::ConnectivityManager;
use co2monitor::diagnostics;
use co2monitor::drivers::scd4x::Scd4x;
use co2monitor::drivers::status_led::StatusLed;
use co2monitor::drivers::tm1637::Tm1637;
use co2monitor::drivers::watchdog::Watchdog;
use co2monitor::pins;

// ── Storage ───────────────────────────────────────────────────

/// Register the SPIFFS data partition at `/spiffs`.
///
/// Failure is not fatal: the config load falls back to placeholders and
/// file logging is skipped.
fn mount_storage() -> bool {
    let conf = esp_idf_svc::sys::esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: `conf` and the string it points to outlive the call; the
    // VFS copies what it keeps.
    let err = unsafe { esp_idf_svc::sys::esp_vfs_spiffs_register(&conf) };
    if err == esp_idf_svc::sys::ESP_OK {
        info!("Storage: SPIFFS mounted at {}", config::FS_BASE_PATH);
        true
    } else {
        warn!("Storage: SPIFFS mount failed ({}), running without files", err);
        false
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CO2 Monitor v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Storage, crash hook, configuration ─────────────────
    let storage = mount_storage();
    let file_log = storage.then(|| FileLog::new(LOG_PATH));
    diagnostics::install_panic_handler(file_log.clone());

    let config = config::load_or_default(&JsonConfigFile::new(CONFIG_PATH));

    // ── 3. Peripherals ────────────────────────────────────────
    let p = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    info!(
        "Pins: I2C SDA={} SCL={}, display CLK={} DIO={}, LED={}",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::DISPLAY_CLK_GPIO,
        pins::DISPLAY_DIO_GPIO,
        pins::STATUS_LED_GPIO
    );

    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ));
    let sensor = match I2cDriver::new(p.i2c0, p.pins.gpio21, p.pins.gpio22, &i2c_config) {
        Ok(i2c) => Some(Scd4x::new(i2c, Delay::new_default())),
        Err(e) => {
            warn!("I2C init failed ({}), continuing without sensor", e);
            None
        }
    };

    let display = match (PinDriver::output(p.pins.gpio18), PinDriver::output(p.pins.gpio19)) {
        (Ok(clk), Ok(dio)) => Some(Tm1637::new(clk, dio, Delay::new_default())),
        _ => {
            warn!("Display GPIO init failed, continuing without display");
            None
        }
    };

    let mut indicator = StatusLed::new(PinDriver::output(p.pins.gpio2)?);

    let wifi = EspWifi::new(p.modem, sysloop, Some(nvs))?;

    // ── 4. Capabilities ───────────────────────────────────────
    let caps = Capabilities {
        time_sync: true,
        broker: true,
        sensor: sensor.is_some(),
        display: display.is_some(),
    };

    // ── 5. Construct the service ──────────────────────────────
    let connectivity = ConnectivityManager::new(
        WifiAdapter::new(wifi),
        caps.broker.then(MqttConnector::new),
        config,
    );
    let mut service = MonitorService::new(sensor, display, connectivity);

    let mut time = Esp32TimeAdapter::new();
    let mut watchdog = Watchdog::new();
    let mut memory = HeapProbe::new();
    let mut time_sync = SntpSync::new();
    let mut sink = match file_log {
        Some(file) => LogEventSink::with_file(file),
        None => LogEventSink::new(),
    };

    let mut sys = SystemPorts {
        time: &mut time,
        watchdog: &mut watchdog,
        memory: &mut memory,
        indicator: &mut indicator,
        time_sync: &mut time_sync,
        sink: &mut sink,
    };

    info!("System ready. Entering monitor loop.");

    // ── 6. Run (returns only if the restart call itself returns) ──
    let reason = service.run(caps, &mut sys, &mut SystemReset::new());
    warn!("Restart request ({}) returned; exiting", reason);
    Ok(())
}
