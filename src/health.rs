//! Health tracker.
//!
//! One consecutive-failure counter per subsystem.  The tracker performs no
//! I/O: it only decides when a subsystem must be reinitialised and hands
//! that decision back to the component that owns the subsystem.
//!
//! ## Counter lifecycle
//!
//! 1. A success resets the counter to zero.
//! 2. A failure increments it.
//! 3. When it reaches the subsystem's threshold the tracker returns
//!    [`HealthSignal::ReinitializeRequired`] and resets the counter in the
//!    same call, so the next reinitialisation needs a fresh run of failures.
//!
//! The counter therefore never exceeds its threshold.

use crate::config::{MAX_CONSECUTIVE_ERRORS, MAX_MQTT_FAILURES, MAX_SENSOR_FAILURES};

/// Subsystems with independent failure accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Sensor,
    Broker,
    Link,
}

impl Subsystem {
    pub const ALL: [Self; 3] = [Self::Sensor, Self::Broker, Self::Link];

    /// Consecutive failures that trigger a reinitialisation.
    ///
    /// Sensor I/O is noisier than the broker session, so it tolerates more.
    pub const fn failure_threshold(self) -> u32 {
        match self {
            Self::Sensor => MAX_SENSOR_FAILURES,
            Self::Broker => MAX_MQTT_FAILURES,
            Self::Link => MAX_CONSECUTIVE_ERRORS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Broker => "MQTT",
            Self::Link => "WiFi",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// What the caller must do after [`HealthTracker::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthSignal {
    /// Counter is zero.
    Healthy,
    /// Counter was incremented but is still below threshold.
    Failing { consecutive: u32 },
    /// Threshold reached; the counter has already been reset.
    ReinitializeRequired(Subsystem),
}

/// A single subsystem's counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemHealth {
    consecutive_error_count: u32,
    failure_threshold: u32,
}

impl SubsystemHealth {
    pub const fn new(failure_threshold: u32) -> Self {
        Self {
            consecutive_error_count: 0,
            failure_threshold,
        }
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_error_count
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }
}

/// Per-subsystem error counters.
#[derive(Debug, Clone)]
pub struct HealthTracker {
    subsystems: [SubsystemHealth; 3],
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            subsystems: Subsystem::ALL.map(|s| SubsystemHealth::new(s.failure_threshold())),
        }
    }

    /// Record one outcome for `subsystem`.
    pub fn record(&mut self, subsystem: Subsystem, outcome: Outcome) -> HealthSignal {
        let health = &mut self.subsystems[subsystem.index()];
        match outcome {
            Outcome::Success => {
                health.consecutive_error_count = 0;
                HealthSignal::Healthy
            }
            Outcome::Failure => {
                health.consecutive_error_count += 1;
                if health.consecutive_error_count >= health.failure_threshold {
                    health.consecutive_error_count = 0;
                    HealthSignal::ReinitializeRequired(subsystem)
                } else {
                    HealthSignal::Failing {
                        consecutive: health.consecutive_error_count,
                    }
                }
            }
        }
    }

    /// Current consecutive failures for `subsystem`.
    pub fn errors(&self, subsystem: Subsystem) -> u32 {
        self.subsystems[subsystem.index()].consecutive_errors()
    }

    pub fn subsystem(&self, subsystem: Subsystem) -> &SubsystemHealth {
        &self.subsystems[subsystem.index()]
    }
}
