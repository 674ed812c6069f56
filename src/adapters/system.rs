//! System reset adapter.
//!
//! Implements [`RebootPort`]: `esp_restart()` on the device (never
//! returns), a logged no-op that remembers the reason in simulation.

use log::error;

use crate::app::ports::{RebootPort, RebootReason};

#[derive(Debug, Default)]
pub struct SystemReset {
    last: Option<RebootReason>,
}

impl SystemReset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_reason(&self) -> Option<RebootReason> {
        self.last
    }
}

impl RebootPort for SystemReset {
    fn reboot(&mut self, reason: RebootReason) {
        self.last = Some(reason);
        error!("Restarting: {}", reason);

        #[cfg(target_os = "espidf")]
        // SAFETY: esp_restart has no preconditions and does not return.
        unsafe {
            esp_idf_svc::sys::esp_restart();
        }
    }
}
