//! Task Watchdog Timer (TWDT) driver.
//!
//! Implements [`WatchdogPort`] over the ESP-IDF TWDT API.  Once armed, the
//! device resets if the main loop goes longer than the timeout without
//! calling `feed()`.
//!
//! The main loop feeds once per pass; long bounded waits (link join polls)
//! feed on every iteration.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::app::ports::WatchdogPort;
use crate::error::Error;

pub struct Watchdog {
    subscribed: bool,
    feeds: u64,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    pub fn new() -> Self {
        Self {
            subscribed: false,
            feeds: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.subscribed
    }

    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}

impl WatchdogPort for Watchdog {
    /// Configure the TWDT for `timeout_ms` and subscribe the current task.
    #[cfg(target_os = "espidf")]
    fn arm(&mut self, timeout_ms: u32) -> Result<(), Error> {
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let mut ret = esp_task_wdt_reconfigure(&cfg);
            if ret == ESP_ERR_INVALID_STATE {
                // TWDT not started by the bootloader config.
                ret = esp_task_wdt_init(&cfg);
            }
            if ret != ESP_OK {
                log::warn!("TWDT configure returned {}", ret);
                return Err(Error::Hardware("watchdog configure"));
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            if ret != ESP_OK && ret != ESP_ERR_INVALID_ARG {
                log::warn!("Watchdog: failed to subscribe ({})", ret);
                return Err(Error::Hardware("watchdog subscribe"));
            }
        }
        self.subscribed = true;
        info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn arm(&mut self, timeout_ms: u32) -> Result<(), Error> {
        info!("Watchdog(sim): armed for {}ms", timeout_ms);
        self.subscribed = true;
        Ok(())
    }

    fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
