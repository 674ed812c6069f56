//! Resource guard.
//!
//! Samples free heap after a multi-pass reclamation and maps it onto the
//! graduated policy, most severe zone first:
//!
//! | Free bytes      | Action                                           |
//! |-----------------|--------------------------------------------------|
//! | `< 8000`        | release display, CRITICAL log, flush, reboot     |
//! | `< 12000`       | tear down the broker session, WARNING log        |
//! | `< 20000`       | WARNING log only                                 |
//! | otherwise       | nothing                                          |
//!
//! The guard only decides.  Carrying out the action (dropping handles,
//! rebooting) belongs to the service that owns those handles.

use crate::app::ports::MemoryProbe;
use crate::config::{
    MEMORY_CRITICAL_THRESHOLD, MEMORY_EMERGENCY_THRESHOLD, MEMORY_WARNING_THRESHOLD,
    RECLAIM_PASSES,
};

/// Decision for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAction {
    /// Above every threshold.
    None,
    /// Below the warning threshold: log only.
    Warn { free: u32 },
    /// Below the critical threshold: release the broker session.
    ShedBroker { free: u32 },
    /// Below the emergency threshold: the heap cannot be trusted any more.
    Reboot { free: u32 },
}

/// Momentary observation partitioned into ordered zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudget {
    pub free_bytes: u32,
}

impl MemoryBudget {
    pub fn action(self) -> MemoryAction {
        let free = self.free_bytes;
        if free < MEMORY_EMERGENCY_THRESHOLD {
            MemoryAction::Reboot { free }
        } else if free < MEMORY_CRITICAL_THRESHOLD {
            MemoryAction::ShedBroker { free }
        } else if free < MEMORY_WARNING_THRESHOLD {
            MemoryAction::Warn { free }
        } else {
            MemoryAction::None
        }
    }
}

/// Stateless policy object.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceGuard;

impl ResourceGuard {
    pub fn new() -> Self {
        Self
    }

    /// Reclaim, sample, decide.
    ///
    /// A single pass is not enough on a fragmented long-running heap, so the
    /// probe is asked to reclaim [`RECLAIM_PASSES`] times before sampling.
    pub fn check(&self, probe: &mut dyn MemoryProbe) -> MemoryAction {
        for _ in 0..RECLAIM_PASSES {
            probe.reclaim();
        }
        MemoryBudget {
            free_bytes: probe.free_bytes(),
        }
        .action()
    }
}
