//! Monitor service: the hexagonal core.
//!
//! [`MonitorService`] owns the shared [`MonitorContext`], the sensor and
//! display handles, and the [`ConnectivityManager`].  Platform services
//! (clock, watchdog, heap probe, LED, time sync, event sink) are borrowed
//! per call through [`SystemPorts`], so every path can be driven by mocks.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │      MonitorService       │
//! DisplayPort ◀── │ Telemetry · Health ·      │ ──▶ BrokerSession
//!                 │ Schedule · ResourceGuard  │
//!                 └──────────────────────────┘
//!                      Initializing ─▶ Running ─▶ ShuttingDown ─▶ reboot
//! ```
//!
//! The only way out of `Running` is a reboot request: memory exhaustion,
//! the preventive uptime bound, or an error escaping a pass.

use core::fmt::Write as _;

use log::{info, warn};
use serde::Serialize;

use crate::config::{
    DISPLAY_BRIGHTNESS, EMERGENCY_FLUSH_MS, FATAL_REBOOT_DELAY_MS, LED_BLINK_MS, PASS_BUDGET_MS,
    PREVENTIVE_REBOOT_DELAY_MS, WATCHDOG_TIMEOUT_MS,
};
use crate::connectivity::{ConnectivityManager, PublishOutcome, failure_count};
use crate::error::{CommsError, Error};
use crate::health::{HealthSignal, Outcome, Subsystem};
use crate::resource::{MemoryAction, ResourceGuard};
use crate::scheduler::Task;

use super::context::{DisplayMode, MonitorContext, MonitorState};
use super::events::{AppEvent, Capabilities};
use super::payload::{Co2Payload, SensorPayload, StatusPayload};
use super::ports::{
    BrokerConnector, DisplayPort, EventSink, LinkPort, RebootPort, RebootReason, SensorPort,
    SystemPorts, Topic,
};

/// What the loop should do after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Continue,
    Reboot(RebootReason),
}

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

pub struct MonitorService<S, D, L, B>
where
    S: SensorPort,
    D: DisplayPort,
    L: LinkPort,
    B: BrokerConnector,
{
    ctx: MonitorContext,
    sensor: Option<S>,
    display: Option<D>,
    connectivity: ConnectivityManager<L, B>,
    guard: ResourceGuard,
}

impl<S, D, L, B> MonitorService<S, D, L, B>
where
    S: SensorPort,
    D: DisplayPort,
    L: LinkPort,
    B: BrokerConnector,
{
    pub fn new(
        sensor: Option<S>,
        display: Option<D>,
        connectivity: ConnectivityManager<L, B>,
    ) -> Self {
        Self {
            ctx: MonitorContext::new(),
            sensor,
            display,
            connectivity,
            guard: ResourceGuard::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    pub fn connectivity(&self) -> &ConnectivityManager<L, B> {
        &self.connectivity
    }

    pub fn sensor_available(&self) -> bool {
        self.sensor.is_some()
    }

    pub fn display_available(&self) -> bool {
        self.display.is_some()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring every subsystem up, best effort, then seed the schedule.
    ///
    /// Nothing here is fatal: a missing link, broker, sensor or display only
    /// narrows what the loop will do.  The one exception is the memory
    /// check, which may already demand a reboot.
    pub fn initialize(&mut self, caps: Capabilities, sys: &mut SystemPorts<'_>) -> PassOutcome {
        self.ctx.state = MonitorState::Initializing;
        self.ctx.capabilities = caps;
        sys.sink.emit(&AppEvent::Starting);
        sys.sink.emit(&AppEvent::CapabilitiesProbed(caps));

        if let PassOutcome::Reboot(reason) = self.check_memory(sys) {
            return PassOutcome::Reboot(reason);
        }

        match sys.watchdog.arm(WATCHDOG_TIMEOUT_MS) {
            Ok(()) => sys.sink.emit(&AppEvent::WatchdogArmed),
            Err(e) => sys.sink.emit(&AppEvent::WatchdogFailed(e)),
        }
        sys.watchdog.feed();

        if !self.connectivity.ensure_link(&mut self.ctx.health, sys) {
            sys.sink.emit(&AppEvent::OfflineMode);
        }

        sys.watchdog.feed();
        if caps.time_sync {
            match sys.time_sync.sync() {
                Ok(()) => sys.sink.emit(&AppEvent::TimeSynced),
                Err(e) => sys.sink.emit(&AppEvent::TimeSyncFailed(e)),
            }
        } else {
            sys.sink.emit(&AppEvent::CapabilityMissing("NTP"));
        }

        sys.watchdog.feed();
        if caps.broker && self.connectivity.broker_available() {
            self.connectivity.ensure_broker(&mut self.ctx.health, sys.sink);
        } else {
            self.connectivity.disable_broker();
            sys.sink.emit(&AppEvent::CapabilityMissing("MQTT"));
        }

        sys.watchdog.feed();
        self.init_sensor(caps, sys.sink);

        sys.watchdog.feed();
        self.init_display(caps, sys.sink);

        self.ctx.clock.seed(sys.time.uptime_secs());
        self.ctx.state = MonitorState::Running;
        sys.sink.emit(&AppEvent::MonitoringStarted);
        PassOutcome::Continue
    }

    fn init_sensor(&mut self, caps: Capabilities, sink: &mut dyn EventSink) {
        if !caps.sensor {
            self.sensor = None;
        }
        let Some(sensor) = self.sensor.as_mut() else {
            sink.emit(&AppEvent::CapabilityMissing("sensor"));
            return;
        };
        match sensor.reset() {
            Ok(()) => sink.emit(&AppEvent::SensorReady),
            Err(e) => {
                // Kept: a later reinitialisation may still bring it back.
                sink.emit(&AppEvent::SensorInitFailed(e));
                warn!("Sensor init failed - display/network only mode");
            }
        }
    }

    fn init_display(&mut self, caps: Capabilities, sink: &mut dyn EventSink) {
        if !caps.display {
            self.display = None;
        }
        let Some(display) = self.display.as_mut() else {
            sink.emit(&AppEvent::CapabilityMissing("display"));
            return;
        };
        match display
            .set_brightness(DISPLAY_BRIGHTNESS)
            .and_then(|()| display.show("init"))
        {
            Ok(()) => sink.emit(&AppEvent::DisplayReady),
            Err(e) => {
                sink.emit(&AppEvent::DisplayInitFailed(e));
                self.display = None;
            }
        }
    }

    /// Initialise, then loop until a reboot is requested.
    ///
    /// Performs best-effort shutdown and hands the reason to `reboot`.  On
    /// hardware that call does not return; under test the reason is returned.
    pub fn run(
        &mut self,
        caps: Capabilities,
        sys: &mut SystemPorts<'_>,
        reboot: &mut dyn RebootPort,
    ) -> RebootReason {
        let reason = match self.initialize(caps, sys) {
            PassOutcome::Reboot(reason) => reason,
            PassOutcome::Continue => self.run_until_reboot(sys),
        };
        self.shutdown(reason, sys);
        reboot.reboot(reason);
        reason
    }

    fn run_until_reboot(&mut self, sys: &mut SystemPorts<'_>) -> RebootReason {
        loop {
            match self.run_pass(sys) {
                Ok(PassOutcome::Continue) => {}
                Ok(PassOutcome::Reboot(reason)) => return reason,
                Err(e) => {
                    sys.sink.emit(&AppEvent::Fatal(e));
                    sys.time.sleep_ms(FATAL_REBOOT_DELAY_MS);
                    return RebootReason::Fatal;
                }
            }
        }
    }

    /// Teardown before the reboot takes effect.  Nothing here may fail.
    pub fn shutdown(&mut self, reason: RebootReason, sys: &mut SystemPorts<'_>) {
        self.ctx.state = MonitorState::ShuttingDown;
        sys.sink.emit(&AppEvent::Shutdown(reason));
        let _ = sys.indicator.set(false);
        self.connectivity.teardown_broker(sys.sink);
    }

    // ── One pass ──────────────────────────────────────────────

    /// One cooperative pass, roughly [`PASS_BUDGET_MS`] long.
    ///
    /// Order is fixed: watchdog, display, sense, publish, maintenance,
    /// liveness blink, pacing sleep.
    pub fn run_pass(&mut self, sys: &mut SystemPorts<'_>) -> Result<PassOutcome, Error> {
        sys.watchdog.feed();
        let started_ms = sys.time.uptime_ms();
        let now = sys.time.uptime_secs();

        self.refresh_display(now);

        if self.ctx.clock.is_due(Task::SensorRead, now) {
            self.sample_sensor(sys.sink);
            // Fixed cadence: a failed read waits for the next interval.
            self.ctx.clock.mark_fired(Task::SensorRead, now);
        }

        if self.ctx.clock.is_due(Task::Publish, now)
            && self.ctx.telemetry.co2_ppm().is_some()
            && self.publish_reading(sys)
        {
            self.ctx.clock.mark_fired(Task::Publish, now);
        }

        if let PassOutcome::Reboot(reason) = self.run_maintenance(now, sys) {
            return Ok(PassOutcome::Reboot(reason));
        }

        sys.indicator.set(true)?;
        sys.time.sleep_ms(LED_BLINK_MS);
        sys.indicator.set(false)?;

        let elapsed = sys.time.uptime_ms().saturating_sub(started_ms);
        let elapsed = u32::try_from(elapsed).unwrap_or(PASS_BUDGET_MS);
        let remaining = PASS_BUDGET_MS.saturating_sub(elapsed);
        if remaining > 0 {
            sys.time.sleep_ms(remaining);
        }
        Ok(PassOutcome::Continue)
    }

    // ── Display ───────────────────────────────────────────────

    /// Show "init" until the first CO2 value, then alternate between CO2
    /// and the comfort index.  Display errors are ignored.
    fn refresh_display(&mut self, now: u64) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        let Some(reading) = self.ctx.telemetry.latest().copied() else {
            let _ = display.show("init");
            return;
        };
        let Some(co2) = reading.co2_ppm else {
            let _ = display.show("init");
            return;
        };

        if self.ctx.clock.is_due(Task::DisplaySwitch, now) {
            self.ctx.display_mode = self.ctx.display_mode.toggled();
            self.ctx.clock.mark_fired(Task::DisplaySwitch, now);
        }

        let _ = match self.ctx.display_mode {
            DisplayMode::Co2 => display.show_number(co2 as i32),
            DisplayMode::ComfortIndex => match reading.comfort_index {
                Some(thi) => {
                    let mut text: heapless::String<4> = heapless::String::new();
                    let _ = write!(text, "Hi{:02}", (thi as i32).clamp(0, 99));
                    display.show(&text)
                }
                None => display.show("Hi--"),
            },
        };
    }

    // ── Sensing ───────────────────────────────────────────────

    /// Take one sample if the sensor has one waiting.  Returns `true` when a
    /// new reading was accepted.
    ///
    /// "Not ready yet" is neither a success nor a failure.  Read errors and
    /// out-of-range values count towards the sensor threshold; reaching it
    /// resets the sensor.
    pub fn sample_sensor(&mut self, sink: &mut dyn EventSink) -> bool {
        let Some(sensor) = self.sensor.as_mut() else {
            return false;
        };
        let sample = match sensor.data_ready() {
            Ok(false) => return false,
            Ok(true) => sensor.read(),
            Err(e) => Err(e),
        };

        match sample {
            Ok(raw) => match self.ctx.telemetry.ingest_sample(raw) {
                Ok(_) => {
                    self.ctx.health.record(Subsystem::Sensor, Outcome::Success);
                    true
                }
                Err(reason) => {
                    self.sensor_failed(sink, |count| AppEvent::SensorRejected { count, reason });
                    false
                }
            },
            Err(error) => {
                self.sensor_failed(sink, |count| AppEvent::SensorReadFailed { count, error });
                false
            }
        }
    }

    /// Count one sensor failure, report it, and reset the sensor once the
    /// threshold is reached.
    fn sensor_failed(&mut self, sink: &mut dyn EventSink, event: impl FnOnce(u32) -> AppEvent) {
        let signal = self.ctx.health.record(Subsystem::Sensor, Outcome::Failure);
        sink.emit(&event(failure_count(signal, Subsystem::Sensor)));

        if let HealthSignal::ReinitializeRequired(sub) = signal {
            sink.emit(&AppEvent::Reinitializing(sub));
            if let Some(sensor) = self.sensor.as_mut() {
                match sensor.reset() {
                    Ok(()) => sink.emit(&AppEvent::SensorReady),
                    Err(e) => sink.emit(&AppEvent::SensorInitFailed(e)),
                }
            }
        }
    }

    // ── Publishing ────────────────────────────────────────────

    /// Publish the latest reading on the CO2 and combined topics.  Returns
    /// `true` only when every publish went through.
    fn publish_reading(&mut self, sys: &mut SystemPorts<'_>) -> bool {
        let Some(reading) = self.ctx.telemetry.latest().copied() else {
            return false;
        };
        let Some(co2) = reading.co2_ppm else {
            return false;
        };
        if !self.connectivity.broker_connected() {
            return false;
        }

        let timestamp = sys.time.unix_time();
        let co2_bytes = encode(&Co2Payload { co2 });
        let sensor_bytes = {
            let payload = SensorPayload::from_reading(
                &reading,
                timestamp,
                self.connectivity.config().mqtt_client_id.as_str(),
            );
            payload.has_measurements().then(|| encode(&payload))
        };

        let mut outcome = match co2_bytes {
            Ok(bytes) => self.connectivity.publish(Topic::Co2, &bytes),
            Err(e) => PublishOutcome::Failed(e),
        };
        if outcome == PublishOutcome::Sent {
            outcome = match sensor_bytes {
                Some(Ok(bytes)) => self.connectivity.publish(Topic::Sensor, &bytes),
                Some(Err(e)) => PublishOutcome::Failed(e),
                None => PublishOutcome::Sent,
            };
        }

        match outcome {
            PublishOutcome::Sent => {
                self.ctx.successful_transmissions = self.ctx.successful_transmissions.wrapping_add(1);
                self.ctx.health.record(Subsystem::Broker, Outcome::Success);
                true
            }
            PublishOutcome::NotConnected => false,
            PublishOutcome::Failed(error) => {
                self.publish_failed(error, sys.sink);
                false
            }
        }
    }

    /// The session is kept and the next pass retries; a full run of
    /// failures replaces it.
    fn publish_failed(&mut self, error: CommsError, sink: &mut dyn EventSink) {
        let signal = self.ctx.health.record(Subsystem::Broker, Outcome::Failure);
        sink.emit(&AppEvent::PublishFailed {
            count: failure_count(signal, Subsystem::Broker),
            error,
        });
        if let HealthSignal::ReinitializeRequired(sub) = signal {
            sink.emit(&AppEvent::Reinitializing(sub));
            self.connectivity.ensure_broker(&mut self.ctx.health, sink);
        }
    }

    fn send_status(&mut self, now: u64, sys: &mut SystemPorts<'_>) {
        if !self.connectivity.broker_connected() {
            return;
        }
        let bytes = encode(&StatusPayload {
            uptime: self.ctx.clock.uptime_secs(now),
            memory_free: sys.memory.free_bytes(),
            successful_readings: self.ctx.telemetry.successful_readings(),
            successful_transmissions: self.ctx.successful_transmissions,
            sensor_errors: self.ctx.health.errors(Subsystem::Sensor),
            mqtt_errors: self.ctx.health.errors(Subsystem::Broker),
            wifi_errors: self.ctx.health.errors(Subsystem::Link),
            timestamp: sys.time.unix_time(),
            device_id: self.connectivity.config().mqtt_client_id.as_str(),
        });
        let outcome = match bytes {
            Ok(bytes) => self.connectivity.publish(Topic::Status, &bytes),
            Err(e) => PublishOutcome::Failed(e),
        };
        if let PublishOutcome::Failed(e) = outcome {
            sys.sink.emit(&AppEvent::StatusReportFailed(e));
        }
    }

    // ── Maintenance ───────────────────────────────────────────

    fn run_maintenance(&mut self, now: u64, sys: &mut SystemPorts<'_>) -> PassOutcome {
        if self.ctx.clock.is_due(Task::Reclaim, now) {
            self.ctx.clock.mark_fired(Task::Reclaim, now);
            if let PassOutcome::Reboot(reason) = self.check_memory(sys) {
                return PassOutcome::Reboot(reason);
            }
        }

        if self.ctx.clock.is_due(Task::ConnectionCheck, now) {
            self.connectivity
                .periodic_reconcile(&mut self.ctx.health, sys);
            self.ctx.clock.mark_fired(Task::ConnectionCheck, now);
        }

        if self.ctx.clock.is_due(Task::StatusReport, now) {
            self.send_status(now, sys);
            self.ctx.clock.mark_fired(Task::StatusReport, now);
        }

        if self.ctx.clock.preventive_reboot_due(now) {
            sys.sink.emit(&AppEvent::PreventiveReboot {
                uptime_secs: self.ctx.clock.uptime_secs(now),
                readings: self.ctx.telemetry.successful_readings(),
                transmissions: self.ctx.successful_transmissions,
            });
            sys.time.sleep_ms(PREVENTIVE_REBOOT_DELAY_MS);
            return PassOutcome::Reboot(RebootReason::Preventive);
        }

        PassOutcome::Continue
    }

    /// Run the resource guard and carry out its decision.
    fn check_memory(&mut self, sys: &mut SystemPorts<'_>) -> PassOutcome {
        match self.guard.check(sys.memory) {
            MemoryAction::None => PassOutcome::Continue,
            MemoryAction::Warn { free } => {
                sys.sink.emit(&AppEvent::MemoryWarning { free });
                PassOutcome::Continue
            }
            MemoryAction::ShedBroker { free } => {
                self.connectivity.teardown_broker(sys.sink);
                sys.sink.emit(&AppEvent::MemoryCritical { free });
                PassOutcome::Continue
            }
            MemoryAction::Reboot { free } => {
                if let Some(mut display) = self.display.take() {
                    let _ = display.show("    ");
                }
                sys.sink.emit(&AppEvent::MemoryEmergency { free });
                sys.time.sleep_ms(EMERGENCY_FLUSH_MS);
                info!("Rebooting: free heap {free} bytes");
                PassOutcome::Reboot(RebootReason::MemoryExhausted)
            }
        }
    }
}

fn encode(payload: &impl Serialize) -> Result<Vec<u8>, CommsError> {
    serde_json::to_vec(payload).map_err(|_| CommsError::PublishFailed)
}
