//! Shared mutable state of the monitor.
//!
//! `MonitorContext` is the single struct holding everything that survives
//! from one loop pass to the next apart from device handles: the latest
//! reading, the health counters, the schedule clock and the statistics.  It
//! is passed by exclusive reference into each component; there are no
//! module-level globals.

use crate::app::events::Capabilities;
use crate::health::HealthTracker;
use crate::scheduler::ScheduleClock;
use crate::telemetry::TelemetryModel;

/// Which value the display is currently alternating to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Co2,
    ComfortIndex,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Co2 => Self::ComfortIndex,
            Self::ComfortIndex => Self::Co2,
        }
    }
}

/// Main loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Initializing,
    Running,
    ShuttingDown,
}

pub struct MonitorContext {
    pub state: MonitorState,
    pub capabilities: Capabilities,
    pub telemetry: TelemetryModel,
    pub health: HealthTracker,
    pub clock: ScheduleClock,
    pub display_mode: DisplayMode,
    pub successful_transmissions: u32,
}

impl Default for MonitorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorContext {
    pub fn new() -> Self {
        Self {
            state: MonitorState::Initializing,
            capabilities: Capabilities::ALL,
            telemetry: TelemetryModel::new(),
            health: HealthTracker::new(),
            clock: ScheduleClock::new(),
            // The first switch flips this to `Co2`.
            display_mode: DisplayMode::ComfortIndex,
            successful_transmissions: 0,
        }
    }
}
