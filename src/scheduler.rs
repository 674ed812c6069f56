//! Periodic task clock.
//!
//! Every periodic action of the main loop is a [`Task`] with a fixed
//! interval.  [`ScheduleClock`] keeps one "last fired" timestamp per task,
//! all measured on the same monotonic clock, and answers "is it due?".
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     One loop pass (≈1 s)                     │
//! │                                                              │
//! │  feed WDT ─▶ display ─▶ SensorRead? ─▶ Publish? ─┐           │
//! │                                                  ▼           │
//! │        ┌────────── maintenance ──────────────────────────┐   │
//! │        │ Reclaim? ─▶ ConnectionCheck? ─▶ StatusReport?   │   │
//! │        │                  ─▶ preventive reboot due?      │   │
//! │        └─────────────────────────────────────────────────┘   │
//! │                                                  ▼           │
//! │                                     LED blink ─▶ sleep rest  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clock never advances a timestamp on its own.  The caller decides:
//! sensing advances unconditionally (fixed cadence), publishing only on
//! success (the next pass retries).

use crate::config::{
    CONNECTION_CHECK_INTERVAL_SECS, DISPLAY_SWITCH_INTERVAL_SECS, PREVENTIVE_REBOOT_SECS,
    PUBLISH_INTERVAL_SECS, RECLAIM_INTERVAL_SECS, SENSOR_READ_INTERVAL_SECS,
    STATUS_REPORT_INTERVAL_SECS,
};

// ═══════════════════════════════════════════════════════════════
//  Task table
// ═══════════════════════════════════════════════════════════════

/// Named periodic tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    SensorRead,
    Publish,
    DisplaySwitch,
    Reclaim,
    ConnectionCheck,
    StatusReport,
}

impl Task {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::SensorRead,
        Self::Publish,
        Self::DisplaySwitch,
        Self::Reclaim,
        Self::ConnectionCheck,
        Self::StatusReport,
    ];

    pub const fn interval_secs(self) -> u64 {
        match self {
            Self::SensorRead => SENSOR_READ_INTERVAL_SECS,
            Self::Publish => PUBLISH_INTERVAL_SECS,
            Self::DisplaySwitch => DISPLAY_SWITCH_INTERVAL_SECS,
            Self::Reclaim => RECLAIM_INTERVAL_SECS,
            Self::ConnectionCheck => CONNECTION_CHECK_INTERVAL_SECS,
            Self::StatusReport => STATUS_REPORT_INTERVAL_SECS,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SensorRead => "sensor-read",
            Self::Publish => "publish",
            Self::DisplaySwitch => "display-switch",
            Self::Reclaim => "reclaim",
            Self::ConnectionCheck => "connection-check",
            Self::StatusReport => "status-report",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

// ═══════════════════════════════════════════════════════════════
//  Clock
// ═══════════════════════════════════════════════════════════════

/// "Last fired" bookkeeping, owned by the main loop.
#[derive(Debug, Clone)]
pub struct ScheduleClock {
    /// `None` = never fired, i.e. due on the next check.
    last_fired: [Option<u64>; Task::COUNT],
    /// Uptime at which the preventive-reboot window started.
    window_start: u64,
}

impl Default for ScheduleClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleClock {
    pub fn new() -> Self {
        Self {
            last_fired: [None; Task::COUNT],
            window_start: 0,
        }
    }

    /// Mark every task as never fired so each one is eligible on the first
    /// pass, and start the preventive-reboot window at `now_secs`.
    pub fn seed(&mut self, now_secs: u64) {
        self.last_fired = [None; Task::COUNT];
        self.window_start = now_secs;
    }

    pub fn is_due(&self, task: Task, now_secs: u64) -> bool {
        match self.last_fired[task.index()] {
            None => true,
            Some(last) => now_secs.saturating_sub(last) >= task.interval_secs(),
        }
    }

    pub fn mark_fired(&mut self, task: Task, now_secs: u64) {
        self.last_fired[task.index()] = Some(now_secs);
    }

    pub fn last_fired(&self, task: Task) -> Option<u64> {
        self.last_fired[task.index()]
    }

    /// Seconds since the window started (uptime since last reboot).
    pub fn uptime_secs(&self, now_secs: u64) -> u64 {
        now_secs.saturating_sub(self.window_start)
    }

    pub fn preventive_reboot_due(&self, now_secs: u64) -> bool {
        self.uptime_secs(now_secs) >= PREVENTIVE_REBOOT_SECS
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
