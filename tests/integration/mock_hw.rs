//! Mock hardware for integration tests.
//!
//! Platform services (clock, watchdog, heap, LED, time sync, event sink) are
//! owned by a [`Rig`] and lent to the service per call.  Devices the service
//! owns outright (sensor, display, link, broker) keep an `Rc` handle to
//! shared state so tests can script and inspect them after hand-over.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;

use co2monitor::app::events::AppEvent;
use co2monitor::app::ports::{
    BrokerConnector, BrokerSession, DisplayPort, EventSink, IndicatorPort, LinkPort, MemoryProbe,
    RebootPort, RebootReason, SensorPort, SystemPorts, TimePort, TimeSyncPort, Topic, WatchdogPort,
};
use co2monitor::config::MonitorConfig;
use co2monitor::connectivity::ConnectivityManager;
use co2monitor::error::{CommsError, DisplayError, Error, SensorError};
use co2monitor::telemetry::RawSample;

// ── Clock ─────────────────────────────────────────────────────

/// Simulated time: only advances when something sleeps.
#[derive(Debug, Default)]
pub struct MockClock {
    pub now_ms: u64,
    pub slept_ms: Vec<u32>,
}

impl MockClock {
    pub fn advance_secs(&mut self, secs: u64) {
        self.now_ms += secs * 1000;
    }
}

impl TimePort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms
    }

    fn unix_time(&self) -> u64 {
        1_700_000_000 + self.now_ms / 1000
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
        self.slept_ms.push(ms);
    }
}

// ── Watchdog ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockWatchdog {
    pub armed_ms: Option<u32>,
    pub feeds: u32,
    pub fail_arm: bool,
}

impl WatchdogPort for MockWatchdog {
    fn arm(&mut self, timeout_ms: u32) -> Result<(), Error> {
        if self.fail_arm {
            return Err(Error::Hardware("watchdog"));
        }
        self.armed_ms = Some(timeout_ms);
        Ok(())
    }

    fn feed(&mut self) {
        self.feeds += 1;
    }
}

// ── Heap ──────────────────────────────────────────────────────

/// Scripted free-heap readings.  Once the script runs dry the last value
/// repeats.
#[derive(Debug)]
pub struct MockMemory {
    script: VecDeque<u32>,
    last: u32,
    pub reclaims: u32,
    pub samples: u32,
}

impl MockMemory {
    pub fn healthy() -> Self {
        Self::scripted(&[150_000])
    }

    pub fn scripted(values: &[u32]) -> Self {
        Self {
            script: values.iter().copied().collect(),
            last: values.last().copied().unwrap_or(150_000),
            reclaims: 0,
            samples: 0,
        }
    }

    /// Drop the script and report `free` from now on.
    pub fn set(&mut self, free: u32) {
        self.script.clear();
        self.last = free;
    }
}

impl MemoryProbe for MockMemory {
    fn reclaim(&mut self) {
        self.reclaims += 1;
    }

    fn free_bytes(&mut self) -> u32 {
        self.samples += 1;
        if let Some(v) = self.script.pop_front() {
            self.last = v;
        }
        self.last
    }
}

// ── LED ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockIndicator {
    pub lit: bool,
    pub toggles: u32,
    pub fail: bool,
}

impl IndicatorPort for MockIndicator {
    fn set(&mut self, on: bool) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Hardware("status LED"));
        }
        self.lit = on;
        self.toggles += 1;
        Ok(())
    }
}

// ── Time sync ─────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockTimeSync {
    pub calls: u32,
    pub fail: bool,
}

impl TimeSyncPort for MockTimeSync {
    fn sync(&mut self) -> Result<(), CommsError> {
        self.calls += 1;
        if self.fail {
            Err(CommsError::TimeSyncFailed)
        } else {
            Ok(())
        }
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Reboot ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockReboot {
    pub requests: Vec<RebootReason>,
}

impl RebootPort for MockReboot {
    fn reboot(&mut self, reason: RebootReason) {
        self.requests.push(reason);
    }
}

// ── Rig: the borrowed platform services ───────────────────────

#[derive(Debug, Default)]
pub struct Rig {
    pub clock: MockClock,
    pub watchdog: MockWatchdog,
    pub memory: MockMemory,
    pub led: MockIndicator,
    pub ntp: MockTimeSync,
    pub sink: RecordingSink,
}

impl Default for MockMemory {
    fn default() -> Self {
        Self::healthy()
    }
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ports(&mut self) -> SystemPorts<'_> {
        SystemPorts {
            time: &mut self.clock,
            watchdog: &mut self.watchdog,
            memory: &mut self.memory,
            indicator: &mut self.led,
            time_sync: &mut self.ntp,
            sink: &mut self.sink,
        }
    }
}

// ── Sensor ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SensorState {
    /// Pending results; `data_ready` is true while this is non-empty.
    pub queue: VecDeque<Result<RawSample, SensorError>>,
    pub resets: u32,
    pub fail_reset: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockSensor(pub Rc<RefCell<SensorState>>);

impl MockSensor {
    pub fn push(&self, sample: Result<RawSample, SensorError>) {
        self.0.borrow_mut().queue.push_back(sample);
    }

    pub fn push_reading(&self, co2: i32, temperature: f32, humidity: f32) {
        self.push(Ok(RawSample {
            co2_ppm: Some(co2),
            temperature_c: Some(temperature),
            humidity_percent: Some(humidity),
        }));
    }

    pub fn resets(&self) -> u32 {
        self.0.borrow().resets
    }
}

impl SensorPort for MockSensor {
    fn data_ready(&mut self) -> Result<bool, SensorError> {
        Ok(!self.0.borrow().queue.is_empty())
    }

    fn read(&mut self) -> Result<RawSample, SensorError> {
        self.0
            .borrow_mut()
            .queue
            .pop_front()
            .unwrap_or(Err(SensorError::Unavailable))
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        let mut s = self.0.borrow_mut();
        s.resets += 1;
        if s.fail_reset {
            Err(SensorError::Bus)
        } else {
            Ok(())
        }
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Text(String),
    Number(i32),
}

#[derive(Debug, Default)]
pub struct DisplayState {
    pub shown: Vec<Shown>,
    pub brightness: Option<u8>,
    pub fail: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockDisplay(pub Rc<RefCell<DisplayState>>);

impl MockDisplay {
    pub fn last(&self) -> Option<Shown> {
        self.0.borrow().shown.last().cloned()
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.0.borrow().shown.clone()
    }
}

impl DisplayPort for MockDisplay {
    fn show(&mut self, text: &str) -> Result<(), DisplayError> {
        let mut d = self.0.borrow_mut();
        if d.fail {
            return Err(DisplayError::Gpio);
        }
        d.shown.push(Shown::Text(text.to_string()));
        Ok(())
    }

    fn show_number(&mut self, value: i32) -> Result<(), DisplayError> {
        let mut d = self.0.borrow_mut();
        if d.fail {
            return Err(DisplayError::Gpio);
        }
        d.shown.push(Shown::Number(value));
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError> {
        let mut d = self.0.borrow_mut();
        if d.fail {
            return Err(DisplayError::Gpio);
        }
        d.brightness = Some(level);
        Ok(())
    }
}

// ── Link ──────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LinkState {
    pub active: bool,
    pub connected: bool,
    /// Whether a join request succeeds at once.
    pub joins: bool,
    pub activations: Vec<bool>,
    pub connect_calls: u32,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            active: false,
            connected: false,
            joins: true,
            activations: Vec::new(),
            connect_calls: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockLink(pub Rc<RefCell<LinkState>>);

impl MockLink {
    pub fn unreachable() -> Self {
        let link = Self::default();
        link.0.borrow_mut().joins = false;
        link
    }

    pub fn already_up() -> Self {
        let link = Self::default();
        {
            let mut s = link.0.borrow_mut();
            s.active = true;
            s.connected = true;
        }
        link
    }

    pub fn drop_association(&self) {
        self.0.borrow_mut().connected = false;
    }
}

impl LinkPort for MockLink {
    fn activate(&mut self, on: bool) -> Result<(), CommsError> {
        let mut s = self.0.borrow_mut();
        s.active = on;
        if !on {
            s.connected = false;
        }
        s.activations.push(on);
        Ok(())
    }

    fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), CommsError> {
        let mut s = self.0.borrow_mut();
        s.connect_calls += 1;
        if s.active && s.joins {
            s.connected = true;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.0.borrow().connected
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.is_connected().then_some(Ipv4Addr::new(10, 0, 0, 7))
    }
}

// ── Broker ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct BrokerState {
    pub connects: u32,
    pub fail_connect: bool,
    /// Publishes that will fail before the broker accepts again.
    pub fail_next_publishes: u32,
    pub attempts: Vec<Topic>,
    pub published: Vec<(Topic, String)>,
    pub disconnects: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MockBroker(pub Rc<RefCell<BrokerState>>);

impl MockBroker {
    pub fn published_on(&self, topic: Topic) -> Vec<String> {
        self.0
            .borrow()
            .published
            .iter()
            .filter(|(t, _)| *t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn attempts_on(&self, topic: Topic) -> usize {
        self.0.borrow().attempts.iter().filter(|t| **t == topic).count()
    }

    pub fn connects(&self) -> u32 {
        self.0.borrow().connects
    }
}

#[derive(Debug)]
pub struct MockSession(Rc<RefCell<BrokerState>>);

impl BrokerConnector for MockBroker {
    type Session = MockSession;

    fn connect(&mut self, _config: &MonitorConfig) -> Result<MockSession, CommsError> {
        let mut s = self.0.borrow_mut();
        if s.fail_connect {
            return Err(CommsError::BrokerConnectFailed);
        }
        s.connects += 1;
        Ok(MockSession(Rc::clone(&self.0)))
    }
}

impl BrokerSession for MockSession {
    fn publish(&mut self, topic: Topic, payload: &[u8]) -> Result<(), CommsError> {
        let mut s = self.0.borrow_mut();
        s.attempts.push(topic);
        if s.fail_next_publishes > 0 {
            s.fail_next_publishes -= 1;
            return Err(CommsError::PublishFailed);
        }
        s.published
            .push((topic, String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), CommsError> {
        self.0.borrow_mut().disconnects += 1;
        Ok(())
    }
}

// ── Wiring helpers ────────────────────────────────────────────

pub fn connectivity(link: &MockLink, broker: &MockBroker) -> ConnectivityManager<MockLink, MockBroker> {
    ConnectivityManager::new(link.clone(), Some(broker.clone()), MonitorConfig::default())
}
