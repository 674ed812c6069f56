//! SNTP time-sync adapter.
//!
//! Implements [`TimeSyncPort`] with a bounded wait: the call returns after
//! at most [`SYNC_POLLS`] × [`SYNC_POLL_MS`] whether or not the clock was
//! set.

use crate::app::ports::TimeSyncPort;
use crate::error::CommsError;

pub const SYNC_POLLS: u32 = 10;
pub const SYNC_POLL_MS: u32 = 500;

#[cfg(target_os = "espidf")]
#[derive(Default)]
pub struct SntpSync {
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
}

#[cfg(target_os = "espidf")]
impl SntpSync {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(target_os = "espidf")]
impl TimeSyncPort for SntpSync {
    fn sync(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::sntp::{EspSntp, SyncStatus};
        use log::{info, warn};

        if self.sntp.is_none() {
            self.sntp = Some(EspSntp::new_default().map_err(|e| {
                warn!("SNTP: start failed: {}", e);
                CommsError::TimeSyncFailed
            })?);
        }
        let Some(sntp) = self.sntp.as_ref() else {
            return Err(CommsError::TimeSyncFailed);
        };
        for _ in 0..SYNC_POLLS {
            if sntp.get_sync_status() == SyncStatus::Completed {
                info!("SNTP: clock set");
                return Ok(());
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(SYNC_POLL_MS);
        }
        Err(CommsError::TimeSyncFailed)
    }
}

/// Host stand-in: the host clock is already set.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SntpSync;

#[cfg(not(target_os = "espidf"))]
impl SntpSync {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "espidf"))]
impl TimeSyncPort for SntpSync {
    fn sync(&mut self) -> Result<(), CommsError> {
        Ok(())
    }
}
