//! Integration tests for the MonitorService lifecycle and main-loop passes.
//!
//! Every scenario drives the real service against the mocks in
//! [`mock_hw`](super::mock_hw); time only moves when the service sleeps.

use co2monitor::app::events::{AppEvent, Capabilities, Severity};
use co2monitor::app::ports::{RebootReason, Topic};
use co2monitor::app::service::{MonitorService, PassOutcome};
use co2monitor::error::{CommsError, DisplayError, Error, SensorError};
use co2monitor::health::Subsystem;
use co2monitor::telemetry::Rejected;

use super::mock_hw::{
    MockBroker, MockDisplay, MockLink, MockMemory, MockReboot, MockSensor, Rig, Shown,
    connectivity,
};

type Service = MonitorService<MockSensor, MockDisplay, MockLink, MockBroker>;

struct Devices {
    sensor: MockSensor,
    display: MockDisplay,
    link: MockLink,
    broker: MockBroker,
}

fn build_with(link: MockLink) -> (Service, Devices) {
    let dev = Devices {
        sensor: MockSensor::default(),
        display: MockDisplay::default(),
        link,
        broker: MockBroker::default(),
    };
    let svc = MonitorService::new(
        Some(dev.sensor.clone()),
        Some(dev.display.clone()),
        connectivity(&dev.link, &dev.broker),
    );
    (svc, dev)
}

fn build() -> (Service, Devices) {
    build_with(MockLink::default())
}

fn started(rig: &mut Rig) -> (Service, Devices) {
    let (mut svc, dev) = build();
    assert_eq!(
        svc.initialize(Capabilities::ALL, &mut rig.ports()),
        PassOutcome::Continue
    );
    (svc, dev)
}

fn pass(svc: &mut Service, rig: &mut Rig) -> PassOutcome {
    svc.run_pass(&mut rig.ports()).unwrap()
}

fn text(s: &str) -> Shown {
    Shown::Text(s.to_string())
}

// ── Initialization ────────────────────────────────────────────

#[test]
fn initialize_brings_every_subsystem_up() {
    let mut rig = Rig::new();
    let (svc, dev) = started(&mut rig);

    assert_eq!(rig.watchdog.armed_ms, Some(30_000));
    assert!(svc.connectivity().broker_connected());
    assert_eq!(dev.sensor.resets(), 1);
    assert_eq!(dev.display.0.borrow().brightness, Some(7));
    assert_eq!(dev.display.last(), Some(text("init")));
    assert_eq!(rig.ntp.calls, 1);

    for expected in [
        AppEvent::Starting,
        AppEvent::WatchdogArmed,
        AppEvent::TimeSynced,
        AppEvent::BrokerConnected,
        AppEvent::SensorReady,
        AppEvent::DisplayReady,
        AppEvent::MonitoringStarted,
    ] {
        assert!(rig.sink.contains(&expected), "missing {:?}", expected);
    }
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::MonitoringStarted));
}

#[test]
fn missing_capabilities_are_reported_and_skipped() {
    let mut rig = Rig::new();
    let (mut svc, dev) = build();
    let caps = Capabilities {
        time_sync: false,
        broker: false,
        sensor: false,
        display: false,
    };
    svc.initialize(caps, &mut rig.ports());

    for name in ["NTP", "MQTT", "sensor", "display"] {
        assert!(
            rig.sink.contains(&AppEvent::CapabilityMissing(name)),
            "{} should be reported missing",
            name
        );
    }
    assert_eq!(rig.ntp.calls, 0);
    assert_eq!(dev.broker.connects(), 0);
    assert!(!svc.sensor_available());
    assert!(!svc.display_available());

    // The loop still runs.
    assert_eq!(pass(&mut svc, &mut rig), PassOutcome::Continue);
}

#[test]
fn unreachable_network_runs_offline() {
    let mut rig = Rig::new();
    let (mut svc, dev) = build_with(MockLink::unreachable());
    dev.sensor.push_reading(800, 22.0, 55.0);

    assert_eq!(
        svc.initialize(Capabilities::ALL, &mut rig.ports()),
        PassOutcome::Continue
    );
    assert!(rig.sink.contains(&AppEvent::LinkTimeout { attempt: 1 }));
    assert!(rig.sink.contains(&AppEvent::OfflineMode));
    assert_eq!(dev.broker.connects(), 0);

    pass(&mut svc, &mut rig);
    pass(&mut svc, &mut rig);
    assert_eq!(svc.context().telemetry.co2_ppm(), Some(800));
    assert_eq!(dev.display.last(), Some(Shown::Number(800)));
    assert!(dev.broker.0.borrow().attempts.is_empty());
}

#[test]
fn failed_display_init_drops_the_display() {
    let mut rig = Rig::new();
    let (mut svc, dev) = build();
    dev.display.0.borrow_mut().fail = true;
    svc.initialize(Capabilities::ALL, &mut rig.ports());

    assert!(rig.sink.contains(&AppEvent::DisplayInitFailed(DisplayError::Gpio)));
    assert!(!svc.display_available());
}

#[test]
fn failed_sensor_init_keeps_the_sensor() {
    let mut rig = Rig::new();
    let (mut svc, dev) = build();
    dev.sensor.0.borrow_mut().fail_reset = true;
    svc.initialize(Capabilities::ALL, &mut rig.ports());

    assert!(rig.sink.contains(&AppEvent::SensorInitFailed(SensorError::Bus)));
    assert!(svc.sensor_available());
}

// ── Sensing and publishing ────────────────────────────────────

#[test]
fn reading_is_published_on_both_topics() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    dev.sensor.push_reading(800, 22.0, 55.0);

    assert_eq!(pass(&mut svc, &mut rig), PassOutcome::Continue);

    assert_eq!(dev.broker.published_on(Topic::Co2), vec![r#"{"co2":800}"#.to_string()]);
    let combined = dev.broker.published_on(Topic::Sensor);
    assert_eq!(combined.len(), 1);
    for field in [
        r#""co2":800"#,
        r#""temperature":22.0"#,
        r#""humidity":55.0"#,
        r#""thi":68.2"#,
        r#""device_id":"pico_w_co2_monitor""#,
    ] {
        assert!(combined[0].contains(field), "{} not in {}", field, combined[0]);
    }

    // CO2 goes out before the combined payload.
    let attempts = dev.broker.0.borrow().attempts.clone();
    assert_eq!(&attempts[..2], &[Topic::Co2, Topic::Sensor]);
    assert_eq!(svc.context().successful_transmissions, 1);
    assert_eq!(svc.context().telemetry.successful_readings(), 1);
}

#[test]
fn first_pass_sends_a_status_report() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    dev.sensor.push_reading(615, 20.5, 40.0);

    pass(&mut svc, &mut rig);

    let status = dev.broker.published_on(Topic::Status);
    assert_eq!(status.len(), 1);
    assert!(status[0].contains(r#""successful_readings":1"#));
    assert!(status[0].contains(r#""memory_free":150000"#));
}

#[test]
fn failed_publish_is_retried_once_on_the_next_pass() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    dev.sensor.push_reading(800, 22.0, 55.0);
    dev.broker.0.borrow_mut().fail_next_publishes = 1;

    pass(&mut svc, &mut rig);
    assert!(rig.sink.contains(&AppEvent::PublishFailed {
        count: 1,
        error: CommsError::PublishFailed,
    }));
    assert!(dev.broker.published_on(Topic::Co2).is_empty());

    pass(&mut svc, &mut rig);
    pass(&mut svc, &mut rig);

    assert_eq!(dev.broker.attempts_on(Topic::Co2), 2);
    assert_eq!(dev.broker.published_on(Topic::Co2).len(), 1);
    assert_eq!(dev.broker.published_on(Topic::Sensor).len(), 1);
    // The session survived the failure.
    assert_eq!(dev.broker.connects(), 1);
    assert_eq!(svc.context().health.errors(Subsystem::Broker), 0);
}

#[test]
fn out_of_range_co2_keeps_the_previous_reading() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    dev.sensor.push_reading(800, 22.0, 55.0);
    dev.sensor.push_reading(60_000, 30.0, 10.0);

    assert!(svc.sample_sensor(&mut rig.sink));
    let before = *svc.context().telemetry.latest().unwrap();
    assert!(!svc.sample_sensor(&mut rig.sink));

    assert_eq!(*svc.context().telemetry.latest().unwrap(), before);
    assert_eq!(svc.context().telemetry.successful_readings(), 1);
    assert_eq!(svc.context().health.errors(Subsystem::Sensor), 1);
    assert!(rig.sink.contains(&AppEvent::SensorRejected {
        count: 1,
        reason: Rejected::Co2OutOfRange(60_000),
    }));
}

#[test]
fn repeated_out_of_range_values_reinitialize_the_sensor() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    for _ in 0..15 {
        dev.sensor.push_reading(-5, 22.0, 55.0);
    }

    for _ in 0..15 {
        assert!(!svc.sample_sensor(&mut rig.sink));
    }

    // One reset at init, one after the 15th rejected value.
    assert_eq!(dev.sensor.resets(), 2);
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::Reinitializing(Subsystem::Sensor)),
        1
    );
    assert_eq!(svc.context().health.errors(Subsystem::Sensor), 0);
    assert!(svc.context().telemetry.latest().is_none());

    let counts: Vec<u32> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::SensorRejected { count, .. } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(counts, (1..=15).collect::<Vec<u32>>());
}

#[test]
fn accepted_reading_clears_rejection_count() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    dev.sensor.push_reading(70_000, 22.0, 55.0);
    dev.sensor.push_reading(70_000, 22.0, 55.0);
    dev.sensor.push_reading(650, 22.0, 55.0);

    assert!(!svc.sample_sensor(&mut rig.sink));
    assert!(!svc.sample_sensor(&mut rig.sink));
    assert_eq!(svc.context().health.errors(Subsystem::Sensor), 2);

    assert!(svc.sample_sensor(&mut rig.sink));
    assert_eq!(svc.context().health.errors(Subsystem::Sensor), 0);
}

#[test]
fn sensor_is_reinitialized_after_fifteen_failures() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    for _ in 0..20 {
        dev.sensor.push(Err(SensorError::Bus));
    }

    for _ in 0..20 {
        assert!(!svc.sample_sensor(&mut rig.sink));
    }

    // One reset at init, one after the 15th failure.
    assert_eq!(dev.sensor.resets(), 2);
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::Reinitializing(Subsystem::Sensor)),
        1
    );
    assert_eq!(svc.context().health.errors(Subsystem::Sensor), 5);

    let counts: Vec<u32> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::SensorReadFailed { count, .. } => Some(*count),
            _ => None,
        })
        .collect();
    let expected: Vec<u32> = (1..=15).chain(1..=5).collect();
    assert_eq!(counts, expected);
}

// ── Display ───────────────────────────────────────────────────

#[test]
fn display_alternates_between_co2_and_comfort_index() {
    let mut rig = Rig::new();
    let (mut svc, dev) = started(&mut rig);
    dev.sensor.push_reading(800, 22.0, 55.0);

    for _ in 0..5 {
        pass(&mut svc, &mut rig);
    }

    // Init screen, then "init" once more before the first sample lands.
    assert_eq!(
        dev.display.shown(),
        vec![
            text("init"),
            text("init"),
            Shown::Number(800),
            Shown::Number(800),
            Shown::Number(800),
            text("Hi68"),
        ]
    );
}

// ── Watchdog and liveness ─────────────────────────────────────

#[test]
fn watchdog_is_fed_every_pass() {
    let mut rig = Rig::new();
    let (mut svc, _dev) = started(&mut rig);

    for _ in 0..10 {
        let before = rig.watchdog.feeds;
        pass(&mut svc, &mut rig);
        assert!(rig.watchdog.feeds > before);
    }
}

#[test]
fn pass_takes_about_one_second() {
    let mut rig = Rig::new();
    let (mut svc, _dev) = started(&mut rig);
    let start = rig.clock.now_ms;

    pass(&mut svc, &mut rig);

    assert_eq!(rig.clock.now_ms - start, 1000);
    assert!(!rig.led.lit);
    assert_eq!(rig.led.toggles, 2);
}

#[test]
fn indicator_failure_is_fatal() {
    let mut rig = Rig::new();
    let (mut svc, _dev) = build();
    let mut reboot = MockReboot::default();
    rig.led.fail = true;

    let reason = svc.run(Capabilities::ALL, &mut rig.ports(), &mut reboot);

    assert_eq!(reason, RebootReason::Fatal);
    assert_eq!(reboot.requests, vec![RebootReason::Fatal]);
    assert!(rig.sink.contains(&AppEvent::Fatal(Error::Hardware("status LED"))));
    assert!(rig.clock.slept_ms.contains(&5000));
    assert!(rig.sink.contains(&AppEvent::Shutdown(RebootReason::Fatal)));
}

// ── Memory ────────────────────────────────────────────────────

#[test]
fn memory_exhaustion_reboots_once() {
    let mut rig = Rig::new();
    rig.memory = MockMemory::scripted(&[150_000, 7_500]);
    let (mut svc, dev) = build();
    dev.sensor.push_reading(800, 22.0, 55.0);
    let mut reboot = MockReboot::default();

    let reason = svc.run(Capabilities::ALL, &mut rig.ports(), &mut reboot);

    assert_eq!(reason, RebootReason::MemoryExhausted);
    assert_eq!(reboot.requests, vec![RebootReason::MemoryExhausted]);
    assert!(!svc.display_available());
    assert_eq!(dev.display.last(), Some(text("    ")));

    let emergency = AppEvent::MemoryEmergency { free: 7_500 };
    assert!(rig.sink.contains(&emergency));
    assert_eq!(emergency.severity(), Severity::Critical);
    assert!(rig.clock.slept_ms.contains(&1000));
    assert!(rig.sink.contains(&AppEvent::BrokerReleased));
}

#[test]
fn memory_exhaustion_during_startup_skips_the_loop() {
    let mut rig = Rig::new();
    rig.memory = MockMemory::scripted(&[7_000]);
    let (mut svc, dev) = build();
    let mut reboot = MockReboot::default();

    let reason = svc.run(Capabilities::ALL, &mut rig.ports(), &mut reboot);

    assert_eq!(reason, RebootReason::MemoryExhausted);
    assert!(!rig.sink.contains(&AppEvent::MonitoringStarted));
    assert_eq!(dev.link.0.borrow().connect_calls, 0);
}

#[test]
fn critical_memory_releases_the_broker_session() {
    let mut rig = Rig::new();
    let (mut svc, _dev) = started(&mut rig);

    pass(&mut svc, &mut rig);
    rig.memory.set(11_000);
    // Next reclaim check is 60 s after the first.
    for _ in 0..60 {
        assert_eq!(pass(&mut svc, &mut rig), PassOutcome::Continue);
    }

    assert!(rig.sink.contains(&AppEvent::MemoryCritical { free: 11_000 }));
    assert!(rig.sink.contains(&AppEvent::BrokerReleased));
    assert!(!svc.connectivity().broker_connected());
}

#[test]
fn low_memory_only_warns() {
    let mut rig = Rig::new();
    rig.memory = MockMemory::scripted(&[150_000, 15_000]);
    let (mut svc, _dev) = started(&mut rig);

    pass(&mut svc, &mut rig);

    assert!(rig.sink.contains(&AppEvent::MemoryWarning { free: 15_000 }));
    assert!(svc.connectivity().broker_connected());
}

// ── Preventive reboot ─────────────────────────────────────────

#[test]
fn preventive_reboot_after_one_day() {
    let mut rig = Rig::new();
    let (mut svc, _dev) = started(&mut rig);
    assert_eq!(pass(&mut svc, &mut rig), PassOutcome::Continue);

    rig.clock.advance_secs(86_400);
    let outcome = pass(&mut svc, &mut rig);

    assert_eq!(outcome, PassOutcome::Reboot(RebootReason::Preventive));
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PreventiveReboot { .. })),
        1
    );
    assert!(rig.clock.slept_ms.contains(&2000));
}
