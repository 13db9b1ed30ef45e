//! Integration tests for the relay lifecycle through the public API.
//!
//! Unlike the unit tests inside `application::bridge`, these drive the
//! bridge through its real run loop: events flow through the channel from
//! the simulated device exactly as they would from a BLE transport, and the
//! tests only observe what the collaborators observed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use dial_bridge::application::bridge::RelayBridge;
use dial_bridge::domain::config::RelayConfig;
use dial_bridge::domain::events::RelayEvent;
use dial_bridge::infrastructure::device::simulated::{
    DialProfile, SimulatedConnector, SimulatedDiscovery,
};
use dial_bridge::infrastructure::socket::mock::MockSocketServer;

use dial_core::DeviceDescriptor;

const STEP: Duration = Duration::from_secs(5);

/// Polls `condition` until it holds, failing the test after [`STEP`].
async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(STEP, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn descriptor() -> DeviceDescriptor {
    DeviceDescriptor::new("aa:bb:cc:dd:ee:01", "Dial")
}

/// Unattended start-up: discovery finds the dial, the bridge connects, and
/// the socket server is asked to start — no external nudging.
#[tokio::test]
async fn run_loop_connects_and_starts_server_unattended() {
    let (events_tx, events_rx) = mpsc::channel(64);

    let discovery =
        SimulatedDiscovery::new(events_tx.clone(), descriptor(), Duration::from_millis(1));
    let connector = SimulatedConnector::new(
        events_tx.clone(),
        DialProfile {
            connect_delay: Duration::from_millis(1),
            ..DialProfile::default()
        },
    );
    let server = MockSocketServer::new();
    let server_probe = server.clone();

    let bridge = RelayBridge::new(
        RelayConfig::default(),
        Box::new(discovery),
        Box::new(connector),
        Box::new(server),
        events_rx,
    );
    let bridge_task = tokio::spawn(bridge.run());

    wait_until(|| server_probe.calls().starts == 1).await;

    // Shutdown tears the server down and ends the loop.
    events_tx
        .send(RelayEvent::Shutdown)
        .await
        .expect("bridge alive");
    timeout(STEP, bridge_task)
        .await
        .expect("run loop did not end")
        .expect("join")
        .expect("run");
    assert!(server_probe.calls().stops >= 1);
}

/// A device that refuses connections sends the bridge back to discovery,
/// which finds the device again — the retry loop runs without intervention.
#[tokio::test]
async fn failed_connections_fall_back_to_discovery_and_retry() {
    let (events_tx, events_rx) = mpsc::channel(64);

    let discovery =
        SimulatedDiscovery::new(events_tx.clone(), descriptor(), Duration::from_millis(1));
    let connector = SimulatedConnector::new(
        events_tx.clone(),
        DialProfile {
            connect_succeeds: false,
            connect_delay: Duration::from_millis(1),
            ..DialProfile::default()
        },
    );
    let session_probe = connector.last_session();
    let server = MockSocketServer::new();
    let server_probe = server.clone();

    let bridge = RelayBridge::new(
        RelayConfig::default(),
        Box::new(discovery),
        Box::new(connector),
        Box::new(server),
        events_rx,
    );
    let bridge_task = tokio::spawn(bridge.run());

    // First attempt.
    wait_until(|| session_probe.lock().unwrap().is_some()).await;
    let first = session_probe.lock().unwrap().unwrap();

    // The failure must lead to a *new* attempt with a fresh session.
    wait_until(|| {
        session_probe
            .lock()
            .unwrap()
            .map(|current| current != first)
            .unwrap_or(false)
    })
    .await;

    // The server never started: no attempt got past Connecting.
    assert_eq!(server_probe.calls().starts, 0);

    events_tx
        .send(RelayEvent::Shutdown)
        .await
        .expect("bridge alive");
    timeout(STEP, bridge_task)
        .await
        .expect("run loop did not end")
        .expect("join")
        .expect("run");
}

/// The device-name filter keeps the bridge scanning past foreign devices.
#[tokio::test]
async fn name_filter_ignores_foreign_devices() {
    let (events_tx, events_rx) = mpsc::channel(64);

    let foreign = DeviceDescriptor::new("11:22:33:44:55:66", "Fitness Tracker");
    let discovery = SimulatedDiscovery::new(events_tx.clone(), foreign, Duration::from_millis(1));
    let connector = SimulatedConnector::new(events_tx.clone(), DialProfile::default());
    let session_probe = connector.last_session();
    let server = MockSocketServer::new();
    let server_probe = server.clone();

    let mut config = RelayConfig::default();
    config.device.name_prefix = Some("Dial".to_string());

    let bridge = RelayBridge::new(
        config,
        Box::new(discovery),
        Box::new(connector),
        Box::new(server),
        events_rx,
    );
    let bridge_task = tokio::spawn(bridge.run());

    // Give the discovery ample time to surface the foreign device.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(*session_probe.lock().unwrap(), None, "no session opened");
    assert_eq!(server_probe.calls().starts, 0);

    events_tx
        .send(RelayEvent::Shutdown)
        .await
        .expect("bridge alive");
    timeout(STEP, bridge_task)
        .await
        .expect("run loop did not end")
        .expect("join")
        .expect("run");
}
