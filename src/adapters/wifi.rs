//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the hexagonal boundary for the wireless link.
//! Retry and reset policy lives in the
//! [`ConnectivityManager`](crate::connectivity::ConnectivityManager); this
//! adapter only performs the individual steps.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side runs.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidCredentials);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CommsError> {
    // Empty = open network.
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CommsError::InvalidCredentials);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Device adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiAdapter {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self { wifi }
    }
}

#[cfg(target_os = "espidf")]
impl LinkPort for WifiAdapter {
    fn activate(&mut self, on: bool) -> Result<(), CommsError> {
        let result = if on { self.wifi.start() } else { self.wifi.stop() };
        result.map_err(|e| {
            warn!("WiFi: activate({}) failed: {}", on, e);
            CommsError::LinkActivateFailed
        })
    }

    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), CommsError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        validate_ssid(ssid)?;
        validate_password(password)?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| CommsError::InvalidCredentials)?,
            password: password
                .try_into()
                .map_err(|_| CommsError::InvalidCredentials)?,
            auth_method,
            ..Default::default()
        });

        self.wifi.set_configuration(&config).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            CommsError::LinkConnectFailed
        })?;
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed: {}", e);
            CommsError::LinkConnectFailed
        })?;
        info!("WiFi: join requested for '{}'", ssid);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation adapter
// ───────────────────────────────────────────────────────────────

/// Host stand-in: joins immediately when the interface is up and the
/// credentials are well formed.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct WifiAdapter {
    active: bool,
    joined: bool,
    joins: u32,
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "espidf"))]
impl LinkPort for WifiAdapter {
    fn activate(&mut self, on: bool) -> Result<(), CommsError> {
        self.active = on;
        if !on {
            self.joined = false;
        }
        Ok(())
    }

    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), CommsError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        if !self.active {
            warn!("WiFi(sim): connect while interface down");
            return Err(CommsError::LinkConnectFailed);
        }
        self.joins = self.joins.wrapping_add(1);
        self.joined = true;
        info!("WiFi(sim): joined '{}' (attempt {})", ssid, self.joins);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.active && self.joined
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.is_connected().then_some(Ipv4Addr::new(192, 168, 4, 2))
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
