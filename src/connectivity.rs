//! Connectivity manager.
//!
//! Sole owner of the wireless link and the broker session.  Both are tracked
//! with an independent [`ConnectionState`] that nothing else may change.
//!
//! ```text
//!  ensure_link ─▶ connected? ──yes──▶ done (no interface reset)
//!                    │ no
//!                    ▼
//!        activate(false) ─▶ 1 s ─▶ activate(true) ─▶ 1 s
//!                    │
//!                    ▼
//!        connect(ssid, pw) ─▶ poll ×30 (1 s, feed WDT) ─▶ Connected
//!                                         │ timeout
//!                                         ▼
//!                              link failure counter += 1
//! ```
//!
//! The broker session is never repaired in place.  [`ensure_broker`] always
//! discards the old session before opening a fresh one.
//!
//! [`ensure_broker`]: ConnectivityManager::ensure_broker

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::{
    BrokerConnector, BrokerSession, EventSink, LinkPort, SystemPorts, Topic,
};
use crate::config::{LINK_JOIN_POLLS, LINK_POLL_MS, MonitorConfig};
use crate::error::CommsError;
use crate::health::{HealthSignal, HealthTracker, Outcome, Subsystem};

/// State of one connection, tracked separately for link and broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of a single publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Sent,
    /// No live session; nothing was attempted.
    NotConnected,
    Failed(CommsError),
}

pub struct ConnectivityManager<L: LinkPort, B: BrokerConnector> {
    link: L,
    /// `None` when the broker capability is absent.
    connector: Option<B>,
    session: Option<B::Session>,
    link_state: ConnectionState,
    broker_state: ConnectionState,
    link_attempts: u32,
    config: MonitorConfig,
}

impl<L: LinkPort, B: BrokerConnector> ConnectivityManager<L, B> {
    pub fn new(link: L, connector: Option<B>, config: MonitorConfig) -> Self {
        Self {
            link,
            connector,
            session: None,
            link_state: ConnectionState::Disconnected,
            broker_state: ConnectionState::Disconnected,
            link_attempts: 0,
            config,
        }
    }

    pub fn link_state(&self) -> ConnectionState {
        self.link_state
    }

    pub fn broker_state(&self) -> ConnectionState {
        self.broker_state
    }

    pub fn broker_available(&self) -> bool {
        self.connector.is_some()
    }

    pub fn broker_connected(&self) -> bool {
        self.broker_state == ConnectionState::Connected && self.session.is_some()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    // ── Link ──────────────────────────────────────────────────

    /// Make sure the link is up.  Returns `true` when connected.
    ///
    /// Bounded to the interface bounce plus [`LINK_JOIN_POLLS`] polls; the
    /// watchdog is fed on every poll.  A timeout counts as one link failure
    /// and never reboots.
    pub fn ensure_link(&mut self, health: &mut HealthTracker, sys: &mut SystemPorts<'_>) -> bool {
        if self.link.is_connected() {
            self.link_state = ConnectionState::Connected;
            return true;
        }

        self.link_state = ConnectionState::Connecting;
        self.link_attempts = self.link_attempts.wrapping_add(1);
        let attempt = self.link_attempts;
        info!("WiFi connecting (attempt {attempt})");

        if let Err(error) = self.bounce_and_join(sys) {
            sys.sink.emit(&AppEvent::LinkError { attempt, error });
            self.link_failed(health, sys.sink);
            return false;
        }

        for _ in 0..LINK_JOIN_POLLS {
            if self.link.is_connected() {
                self.link_state = ConnectionState::Connected;
                health.record(Subsystem::Link, Outcome::Success);
                sys.sink
                    .emit(&AppEvent::LinkConnected(self.link.local_address()));
                return true;
            }
            sys.time.sleep_ms(LINK_POLL_MS);
            sys.watchdog.feed();
        }

        // One last look after the final pause.
        if self.link.is_connected() {
            self.link_state = ConnectionState::Connected;
            health.record(Subsystem::Link, Outcome::Success);
            sys.sink
                .emit(&AppEvent::LinkConnected(self.link.local_address()));
            return true;
        }

        sys.sink.emit(&AppEvent::LinkTimeout { attempt });
        self.link_failed(health, sys.sink);
        false
    }

    /// Full interface bounce followed by a join request.
    fn bounce_and_join(&mut self, sys: &mut SystemPorts<'_>) -> Result<(), CommsError> {
        self.link.activate(false)?;
        sys.time.sleep_ms(LINK_POLL_MS);
        self.link.activate(true)?;
        sys.time.sleep_ms(LINK_POLL_MS);
        sys.watchdog.feed();
        self.link
            .connect(&self.config.wifi_ssid, &self.config.wifi_password)
    }

    fn link_failed(&mut self, health: &mut HealthTracker, sink: &mut dyn EventSink) {
        self.link_state = ConnectionState::Disconnected;
        if let HealthSignal::ReinitializeRequired(sub) = health.record(Subsystem::Link, Outcome::Failure)
        {
            sink.emit(&AppEvent::Reinitializing(sub));
            // Leave the radio down; the next attempt starts from a cold interface.
            let _ = self.link.activate(false);
        }
    }

    // ── Broker ────────────────────────────────────────────────

    /// Replace the broker session.  Returns `true` when a new session is up.
    ///
    /// Without the broker capability, or with the link down, this is a no-op
    /// that returns `false` and records nothing.
    pub fn ensure_broker(&mut self, health: &mut HealthTracker, sink: &mut dyn EventSink) -> bool {
        self.discard_session();

        let Some(connector) = self.connector.as_mut() else {
            return false;
        };
        if !self.link.is_connected() {
            debug!("MQTT connect skipped: link down");
            return false;
        }

        self.broker_state = ConnectionState::Connecting;
        match connector.connect(&self.config) {
            Ok(session) => {
                self.session = Some(session);
                self.broker_state = ConnectionState::Connected;
                health.record(Subsystem::Broker, Outcome::Success);
                sink.emit(&AppEvent::BrokerConnected);
                true
            }
            Err(error) => {
                self.broker_state = ConnectionState::Disconnected;
                let signal = health.record(Subsystem::Broker, Outcome::Failure);
                sink.emit(&AppEvent::BrokerError {
                    count: failure_count(signal, Subsystem::Broker),
                    error,
                });
                false
            }
        }
    }

    /// Bring back whatever is down.  Called on the reconciliation interval,
    /// never every pass.
    pub fn periodic_reconcile(&mut self, health: &mut HealthTracker, sys: &mut SystemPorts<'_>) {
        if !self.link.is_connected() && !self.ensure_link(health, sys) {
            return;
        }
        self.link_state = ConnectionState::Connected;
        if self.broker_state != ConnectionState::Connected && self.broker_available() {
            self.ensure_broker(health, sys.sink);
        }
    }

    /// Forget the broker for the rest of the run.  Nothing will try to open
    /// a session afterwards, including [`periodic_reconcile`](Self::periodic_reconcile).
    pub fn disable_broker(&mut self) {
        self.discard_session();
        self.connector = None;
    }

    /// Release the session handle, e.g. to recover heap.
    pub fn teardown_broker(&mut self, sink: &mut dyn EventSink) {
        if self.session.is_some() {
            self.discard_session();
            sink.emit(&AppEvent::BrokerReleased);
        }
        self.broker_state = ConnectionState::Disconnected;
    }

    /// Drop the current session, ignoring errors from a possibly broken one.
    fn discard_session(&mut self) {
        if let Some(mut old) = self.session.take() {
            let _ = old.disconnect();
        }
        self.broker_state = ConnectionState::Disconnected;
    }

    /// Publish one payload on the current session.
    ///
    /// A failed publish keeps the session: it is retried on the next pass,
    /// and only a full run of broker failures replaces it.
    pub fn publish(&mut self, topic: Topic, payload: &[u8]) -> PublishOutcome {
        if self.broker_state != ConnectionState::Connected {
            return PublishOutcome::NotConnected;
        }
        let Some(session) = self.session.as_mut() else {
            return PublishOutcome::NotConnected;
        };
        match session.publish(topic, payload) {
            Ok(()) => PublishOutcome::Sent,
            Err(e) => PublishOutcome::Failed(e),
        }
    }
}

/// Counter value to report alongside a failure signal.
pub(crate) fn failure_count(signal: HealthSignal, subsystem: Subsystem) -> u32 {
    match signal {
        HealthSignal::Failing { consecutive } => consecutive,
        HealthSignal::ReinitializeRequired(_) => subsystem.failure_threshold(),
        HealthSignal::Healthy => 0,
    }
}
