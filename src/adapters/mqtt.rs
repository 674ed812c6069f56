//! MQTT broker adapter.
//!
//! Implements [`BrokerConnector`] / [`BrokerSession`].  Every call to
//! [`BrokerConnector::connect`] builds a brand-new client; a session is
//! closed by dropping it, never reused.
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`
//!   with a connection flag maintained by the event callback.
//! - **other targets**: an in-process session that logs what it would send.

#[cfg(not(target_os = "espidf"))]
use log::{debug, info};

use crate::app::ports::{BrokerConnector, BrokerSession, Topic};
use crate::config::MonitorConfig;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Device adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod device {
    use core::time::Duration;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use esp_idf_svc::mqtt::client::{
        EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
    };
    use log::{info, warn};

    use super::{BrokerConnector, BrokerSession, CommsError, MonitorConfig, Topic};

    /// CONNACK polls, 100 ms apart.
    const CONNACK_POLLS: u32 = 50;

    #[derive(Default)]
    pub struct MqttConnector;

    impl MqttConnector {
        pub fn new() -> Self {
            Self
        }
    }

    pub struct MqttSession {
        client: EspMqttClient<'static>,
        connected: Arc<AtomicBool>,
    }

    impl BrokerConnector for MqttConnector {
        type Session = MqttSession;

        fn connect(&mut self, config: &MonitorConfig) -> Result<MqttSession, CommsError> {
            let url = format!("mqtt://{}:{}", config.mqtt_server, config.mqtt_port);
            let conf = MqttClientConfiguration {
                client_id: Some(config.mqtt_client_id.as_str()),
                keep_alive_interval: Some(Duration::from_secs(u64::from(
                    config.mqtt_keepalive_secs,
                ))),
                ..Default::default()
            };

            let connected = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&connected);
            let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
                EventPayload::Connected(_) => flag.store(true, Ordering::Release),
                EventPayload::Disconnected => flag.store(false, Ordering::Release),
                _ => {}
            })
            .map_err(|e| {
                warn!("MQTT: client init for {} failed: {}", url, e);
                CommsError::BrokerConnectFailed
            })?;

            for _ in 0..CONNACK_POLLS {
                if connected.load(Ordering::Acquire) {
                    info!("MQTT: session open to {}", url);
                    return Ok(MqttSession { client, connected });
                }
                esp_idf_hal::delay::FreeRtos::delay_ms(100);
            }
            warn!("MQTT: no CONNACK from {}", url);
            Err(CommsError::BrokerConnectFailed)
        }
    }

    impl BrokerSession for MqttSession {
        fn publish(&mut self, topic: Topic, payload: &[u8]) -> Result<(), CommsError> {
            if !self.connected.load(Ordering::Acquire) {
                return Err(CommsError::NotConnected);
            }
            self.client
                .publish(topic.as_str(), QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|e| {
                    warn!("MQTT: publish to {} failed: {}", topic.as_str(), e);
                    CommsError::PublishFailed
                })
        }

        fn disconnect(&mut self) -> Result<(), CommsError> {
            // The client stops when the session is dropped.
            self.connected.store(false, Ordering::Release);
            Ok(())
        }
    }
}

#[cfg(target_os = "espidf")]
pub use device::{MqttConnector, MqttSession};

// ───────────────────────────────────────────────────────────────
// Simulation adapter
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct MqttConnector {
    sessions: u32,
}

#[cfg(not(target_os = "espidf"))]
impl MqttConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct MqttSession {
    id: u32,
    open: bool,
    published: u32,
}

#[cfg(not(target_os = "espidf"))]
impl MqttSession {
    pub fn published(&self) -> u32 {
        self.published
    }
}

#[cfg(not(target_os = "espidf"))]
impl BrokerConnector for MqttConnector {
    type Session = MqttSession;

    fn connect(&mut self, config: &MonitorConfig) -> Result<MqttSession, CommsError> {
        if config.mqtt_server.is_empty() || config.mqtt_port == 0 {
            return Err(CommsError::BrokerConnectFailed);
        }
        self.sessions = self.sessions.wrapping_add(1);
        info!(
            "MQTT(sim): session {} to {}:{} as '{}'",
            self.sessions, config.mqtt_server, config.mqtt_port, config.mqtt_client_id
        );
        Ok(MqttSession {
            id: self.sessions,
            open: true,
            published: 0,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl BrokerSession for MqttSession {
    fn publish(&mut self, topic: Topic, payload: &[u8]) -> Result<(), CommsError> {
        if !self.open {
            return Err(CommsError::NotConnected);
        }
        self.published = self.published.wrapping_add(1);
        debug!(
            "MQTT(sim): [{}] {} <- {}",
            self.id,
            topic.as_str(),
            String::from_utf8_lossy(payload)
        );
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), CommsError> {
        if !self.open {
            return Err(CommsError::DisconnectFailed);
        }
        self.open = false;
        Ok(())
    }
}
