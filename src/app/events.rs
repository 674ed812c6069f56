//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) and the
//! [`ConnectivityManager`](crate::connectivity::ConnectivityManager) report
//! every decision through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them: write to the
//! serial console, append to the log file.

use core::fmt;
use core::net::Ipv4Addr;

use crate::app::ports::RebootReason;
use crate::error::{CommsError, DisplayError, Error, SensorError};
use crate::health::Subsystem;
use crate::telemetry::Rejected;

/// Log level attached to every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Optional collaborators decided once by the bootstrap layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub time_sync: bool,
    pub broker: bool,
    pub sensor: bool,
    pub display: bool,
}

impl Capabilities {
    pub const ALL: Self = Self {
        time_sync: true,
        broker: true,
        sensor: true,
        display: true,
    };
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    // ── Lifecycle ─────────────────────────────────────────────
    Starting,
    CapabilitiesProbed(Capabilities),
    WatchdogArmed,
    WatchdogFailed(Error),
    MonitoringStarted,
    PreventiveReboot {
        uptime_secs: u64,
        readings: u32,
        transmissions: u32,
    },
    Fatal(Error),
    Shutdown(RebootReason),

    // ── Link ──────────────────────────────────────────────────
    LinkConnected(Option<Ipv4Addr>),
    LinkTimeout { attempt: u32 },
    LinkError { attempt: u32, error: CommsError },
    OfflineMode,

    // ── Time ──────────────────────────────────────────────────
    TimeSynced,
    TimeSyncFailed(CommsError),

    // ── Broker ────────────────────────────────────────────────
    BrokerConnected,
    BrokerError { count: u32, error: CommsError },
    BrokerReleased,
    PublishFailed { count: u32, error: CommsError },
    StatusReportFailed(CommsError),

    // ── Sensor ────────────────────────────────────────────────
    SensorReady,
    SensorInitFailed(SensorError),
    SensorReadFailed { count: u32, error: SensorError },
    SensorRejected { count: u32, reason: Rejected },

    // ── Display ───────────────────────────────────────────────
    DisplayReady,
    DisplayInitFailed(DisplayError),

    // ── Capabilities ──────────────────────────────────────────
    CapabilityMissing(&'static str),

    // ── Health ────────────────────────────────────────────────
    Reinitializing(Subsystem),

    // ── Memory ────────────────────────────────────────────────
    MemoryWarning { free: u32 },
    MemoryCritical { free: u32 },
    MemoryEmergency { free: u32 },
}

impl AppEvent {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Starting
            | Self::CapabilitiesProbed(_)
            | Self::WatchdogArmed
            | Self::MonitoringStarted
            | Self::PreventiveReboot { .. }
            | Self::Shutdown(_)
            | Self::LinkConnected(_)
            | Self::TimeSynced
            | Self::BrokerConnected
            | Self::BrokerReleased
            | Self::SensorReady
            | Self::DisplayReady => Severity::Info,

            Self::OfflineMode
            | Self::TimeSyncFailed(_)
            | Self::CapabilityMissing(_)
            | Self::Reinitializing(_)
            | Self::MemoryWarning { .. }
            | Self::MemoryCritical { .. } => Severity::Warning,

            Self::WatchdogFailed(_)
            | Self::LinkTimeout { .. }
            | Self::LinkError { .. }
            | Self::BrokerError { .. }
            | Self::PublishFailed { .. }
            | Self::StatusReportFailed(_)
            | Self::SensorInitFailed(_)
            | Self::SensorReadFailed { .. }
            | Self::SensorRejected { .. }
            | Self::DisplayInitFailed(_) => Severity::Error,

            Self::Fatal(_) | Self::MemoryEmergency { .. } => Severity::Critical,
        }
    }
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "Production CO2 Monitor starting"),
            Self::CapabilitiesProbed(c) => write!(
                f,
                "Capabilities: ntp={} mqtt={} sensor={} display={}",
                c.time_sync, c.broker, c.sensor, c.display
            ),
            Self::WatchdogArmed => write!(f, "Watchdog initialized"),
            Self::WatchdogFailed(e) => write!(f, "Watchdog init failed: {e}"),
            Self::MonitoringStarted => write!(f, "Production monitoring started"),
            Self::PreventiveReboot {
                uptime_secs,
                readings,
                transmissions,
            } => write!(
                f,
                "Preventive system reset | Uptime: {uptime_secs}s, Readings: {readings}, Transmissions: {transmissions}"
            ),
            Self::Fatal(e) => write!(f, "FATAL SYSTEM ERROR: {e}"),
            Self::Shutdown(reason) => write!(f, "System shutdown ({reason})"),

            Self::LinkConnected(Some(ip)) => write!(f, "WiFi connected: {ip}"),
            Self::LinkConnected(None) => write!(f, "WiFi connected"),
            Self::LinkTimeout { attempt } => write!(f, "WiFi timeout (attempt {attempt})"),
            Self::LinkError { attempt, error } => {
                write!(f, "WiFi error (attempt {attempt}): {error}")
            }
            Self::OfflineMode => write!(f, "WiFi init failed - proceeding in offline mode"),

            Self::TimeSynced => write!(f, "NTP synced"),
            Self::TimeSyncFailed(e) => write!(f, "NTP failed: {e}"),

            Self::BrokerConnected => write!(f, "MQTT connected"),
            Self::BrokerError { count, error } => {
                write!(f, "MQTT error (count {count}): {error}")
            }
            Self::BrokerReleased => write!(f, "MQTT session released"),
            Self::PublishFailed { count, error } => {
                write!(f, "MQTT publish error (count {count}): {error}")
            }
            Self::StatusReportFailed(e) => write!(f, "Status report error: {e}"),

            Self::SensorReady => write!(f, "Sensor initialized"),
            Self::SensorInitFailed(e) => write!(f, "Sensor init error: {e}"),
            Self::SensorReadFailed { count, error } => {
                write!(f, "Sensor read error (count {count}): {error}")
            }
            Self::SensorRejected { count, reason } => {
                write!(f, "{reason} (sensor error count {count})")
            }

            Self::DisplayReady => write!(f, "Display initialized"),
            Self::DisplayInitFailed(e) => write!(f, "Display init error: {e}"),

            Self::CapabilityMissing(what) => write!(f, "{what} unavailable"),

            Self::Reinitializing(s) => {
                write!(f, "{} failure limit reached, reinitializing", s.name())
            }

            Self::MemoryWarning { free } => write!(f, "MEMORY_WARNING: {free}"),
            Self::MemoryCritical { free } => write!(f, "MEMORY_CRITICAL: {free}"),
            Self::MemoryEmergency { free } => write!(f, "EMERGENCY_RESET: Memory={free}"),
        }
    }
}
