//! Integration tests for link and broker recovery in the ConnectivityManager.

use co2monitor::app::events::AppEvent;
use co2monitor::app::ports::Topic;
use co2monitor::connectivity::{ConnectionState, PublishOutcome};
use co2monitor::error::CommsError;
use co2monitor::health::{HealthTracker, Subsystem};

use super::mock_hw::{MockBroker, MockLink, Rig, connectivity};

#[test]
fn ensure_link_is_idempotent_when_up() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::already_up();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);

    assert!(conn.ensure_link(&mut health, &mut rig.ports()));
    assert!(conn.ensure_link(&mut health, &mut rig.ports()));

    assert!(link.0.borrow().activations.is_empty());
    assert_eq!(link.0.borrow().connect_calls, 0);
    assert_eq!(rig.clock.now_ms, 0);
    assert_eq!(conn.link_state(), ConnectionState::Connected);
}

#[test]
fn join_attempt_is_bounded() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::unreachable();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);

    assert!(!conn.ensure_link(&mut health, &mut rig.ports()));

    // Interface bounce (2 s) plus thirty one-second polls.
    assert_eq!(rig.clock.now_ms, 32_000);
    assert_eq!(link.0.borrow().activations, vec![false, true]);
    assert_eq!(rig.watchdog.feeds, 31);
    assert!(rig.sink.contains(&AppEvent::LinkTimeout { attempt: 1 }));
    assert_eq!(health.errors(Subsystem::Link), 1);
    assert_eq!(conn.link_state(), ConnectionState::Disconnected);
}

#[test]
fn twenty_link_timeouts_power_the_radio_down() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::unreachable();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);

    for _ in 0..20 {
        assert!(!conn.ensure_link(&mut health, &mut rig.ports()));
    }

    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::Reinitializing(Subsystem::Link)),
        1
    );
    assert_eq!(health.errors(Subsystem::Link), 0);
    let s = link.0.borrow();
    assert_eq!(s.activations.last(), Some(&false));
    assert!(!s.active);
}

#[test]
fn broker_failures_reach_threshold_and_reset() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::already_up();
    let broker = MockBroker::default();
    broker.0.borrow_mut().fail_connect = true;
    let mut conn = connectivity(&link, &broker);

    for _ in 0..10 {
        assert!(!conn.ensure_broker(&mut health, &mut rig.sink));
    }

    let counts: Vec<u32> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::BrokerError { count, error } => {
                assert_eq!(*error, CommsError::BrokerConnectFailed);
                Some(*count)
            }
            _ => None,
        })
        .collect();
    assert_eq!(counts, (1..=10).collect::<Vec<u32>>());
    assert_eq!(health.errors(Subsystem::Broker), 0);
}

#[test]
fn broker_is_not_attempted_while_link_is_down() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::unreachable();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);

    assert!(!conn.ensure_broker(&mut health, &mut rig.sink));
    assert_eq!(broker.connects(), 0);
    assert_eq!(health.errors(Subsystem::Broker), 0);
    assert!(rig.sink.events.is_empty());
}

#[test]
fn every_ensure_broker_opens_a_fresh_session() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::already_up();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);

    assert!(conn.ensure_broker(&mut health, &mut rig.sink));
    assert!(conn.ensure_broker(&mut health, &mut rig.sink));

    assert_eq!(broker.connects(), 2);
    assert_eq!(broker.0.borrow().disconnects, 1);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::BrokerConnected), 2);
}

#[test]
fn reconcile_recovers_link_then_broker() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::already_up();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);
    assert!(conn.ensure_broker(&mut health, &mut rig.sink));

    link.drop_association();
    conn.teardown_broker(&mut rig.sink);
    conn.periodic_reconcile(&mut health, &mut rig.ports());

    assert_eq!(conn.link_state(), ConnectionState::Connected);
    assert!(conn.broker_connected());
    assert_eq!(broker.connects(), 2);
    assert_eq!(link.0.borrow().activations, vec![false, true]);
}

#[test]
fn reconcile_leaves_a_live_session_alone() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::already_up();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);
    assert!(conn.ensure_broker(&mut health, &mut rig.sink));

    conn.periodic_reconcile(&mut health, &mut rig.ports());

    assert_eq!(broker.connects(), 1);
    assert_eq!(rig.clock.now_ms, 0);
}

#[test]
fn disabled_broker_is_never_reconnected() {
    let mut rig = Rig::new();
    let mut health = HealthTracker::new();
    let link = MockLink::already_up();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);

    conn.disable_broker();
    conn.periodic_reconcile(&mut health, &mut rig.ports());

    assert!(!conn.broker_available());
    assert_eq!(broker.connects(), 0);
    assert_eq!(conn.publish(Topic::Co2, b"{}"), PublishOutcome::NotConnected);
}

#[test]
fn publish_without_session_is_not_attempted() {
    let link = MockLink::already_up();
    let broker = MockBroker::default();
    let mut conn = connectivity(&link, &broker);

    assert_eq!(
        conn.publish(Topic::Co2, br#"{"co2":800}"#),
        PublishOutcome::NotConnected
    );
    assert!(broker.0.borrow().attempts.is_empty());
}
