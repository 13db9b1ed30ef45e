//! The simulated dial.
//!
//! A deterministic in-process implementation of the device seams, used by
//! the binary's `--simulate` mode and by every test that needs a device.
//! It behaves like the real thing at the event level: discovery surfaces a
//! descriptor after a delay, connect walks through `Connecting` →
//! `Connected`, then firmware and battery are reported, and display writes
//! are parsed with the real matrix codec and recorded where tests can see
//! them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use dial_core::{
    ConnectionState, DeviceDescriptor, GestureEvent, GestureKind, LedFrame, MatrixCommand,
};

use crate::domain::events::{RelayEvent, SessionId};
use crate::infrastructure::device::{DeviceConnector, DeviceControl, DeviceDiscovery, DeviceError};

// ── Profile ───────────────────────────────────────────────────────────────────

/// What the simulated dial reports, and how fast.
#[derive(Debug, Clone)]
pub struct DialProfile {
    pub firmware: String,
    pub battery: u8,
    /// Delay between `Connecting` and the connect outcome.
    pub connect_delay: Duration,
    /// `false` simulates a device that refuses the connection.
    pub connect_succeeds: bool,
    /// When set, the connected dial emits a demo gesture stream at this
    /// cadence (rotation ticks with a button press every tenth tick).
    pub gesture_interval: Option<Duration>,
}

impl Default for DialProfile {
    fn default() -> Self {
        Self {
            firmware: "1.0.0".to_string(),
            battery: 100,
            connect_delay: Duration::from_millis(20),
            connect_succeeds: true,
            gesture_interval: None,
        }
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Surfaces one fixed descriptor after a delay.  Restartable: a `start`
/// after a `stop` surfaces the descriptor again, like a device that is
/// still advertising.
pub struct SimulatedDiscovery {
    events: mpsc::Sender<RelayEvent>,
    descriptor: DeviceDescriptor,
    delay: Duration,
    scan_task: Option<JoinHandle<()>>,
}

impl SimulatedDiscovery {
    pub fn new(
        events: mpsc::Sender<RelayEvent>,
        descriptor: DeviceDescriptor,
        delay: Duration,
    ) -> Self {
        Self {
            events,
            descriptor,
            delay,
            scan_task: None,
        }
    }
}

impl DeviceDiscovery for SimulatedDiscovery {
    fn start(&mut self) -> Result<(), DeviceError> {
        if let Some(task) = &self.scan_task {
            if !task.is_finished() {
                return Ok(());
            }
        }
        let events = self.events.clone();
        let descriptor = self.descriptor.clone();
        let delay = self.delay;
        self.scan_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(RelayEvent::DeviceFound(descriptor)).await;
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.scan_task.take() {
            task.abort();
        }
    }

    fn is_scanning(&self) -> bool {
        self.scan_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SimulatedDiscovery {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Connector and dial ────────────────────────────────────────────────────────

/// Opens [`SimulatedDial`]s.  Keeps shared inspection handles so tests can
/// see which session was opened last and everything any of its dials was
/// asked to display.
pub struct SimulatedConnector {
    events: mpsc::Sender<RelayEvent>,
    profile: DialProfile,
    command_log: Arc<Mutex<Vec<MatrixCommand>>>,
    last_session: Arc<Mutex<Option<SessionId>>>,
}

impl SimulatedConnector {
    pub fn new(events: mpsc::Sender<RelayEvent>, profile: DialProfile) -> Self {
        Self {
            events,
            profile,
            command_log: Arc::new(Mutex::new(Vec::new())),
            last_session: Arc::new(Mutex::new(None)),
        }
    }

    /// Every display command any opened dial received, in order.
    pub fn command_log(&self) -> Arc<Mutex<Vec<MatrixCommand>>> {
        Arc::clone(&self.command_log)
    }

    /// The session id of the most recently opened dial.
    pub fn last_session(&self) -> Arc<Mutex<Option<SessionId>>> {
        Arc::clone(&self.last_session)
    }
}

impl DeviceConnector for SimulatedConnector {
    fn open(&mut self, descriptor: DeviceDescriptor, session: SessionId) -> Box<dyn DeviceControl> {
        *self.last_session.lock().expect("lock poisoned") = Some(session);
        Box::new(SimulatedDial {
            descriptor,
            session,
            events: self.events.clone(),
            profile: self.profile.clone(),
            command_log: Arc::clone(&self.command_log),
            tasks: Vec::new(),
        })
    }
}

/// One simulated device session.
pub struct SimulatedDial {
    descriptor: DeviceDescriptor,
    session: SessionId,
    events: mpsc::Sender<RelayEvent>,
    profile: DialProfile,
    command_log: Arc<Mutex<Vec<MatrixCommand>>>,
    tasks: Vec<JoinHandle<()>>,
}

impl DeviceControl for SimulatedDial {
    fn session(&self) -> SessionId {
        self.session
    }

    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn connect(&mut self) {
        let events = self.events.clone();
        let session = self.session;
        let profile = self.profile.clone();

        self.tasks.push(tokio::spawn(async move {
            let _ = events
                .send(RelayEvent::DeviceState {
                    session,
                    state: ConnectionState::Connecting,
                    reason: None,
                })
                .await;

            tokio::time::sleep(profile.connect_delay).await;

            if !profile.connect_succeeds {
                let _ = events
                    .send(RelayEvent::DeviceState {
                        session,
                        state: ConnectionState::Disconnected,
                        reason: Some("simulated connect failure".to_string()),
                    })
                    .await;
                return;
            }

            let _ = events
                .send(RelayEvent::DeviceState {
                    session,
                    state: ConnectionState::Connected,
                    reason: None,
                })
                .await;
            let _ = events
                .send(RelayEvent::Firmware {
                    session,
                    version: profile.firmware.clone(),
                })
                .await;
            let _ = events
                .send(RelayEvent::Battery {
                    session,
                    level: profile.battery,
                })
                .await;

            if let Some(interval) = profile.gesture_interval {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await; // the immediate first tick
                let mut step: u32 = 0;
                loop {
                    ticker.tick().await;
                    step += 1;
                    let event = if step % 10 == 0 {
                        GestureEvent::new(GestureKind::ButtonPress)
                    } else if step % 10 == 1 && step > 1 {
                        GestureEvent::new(GestureKind::ButtonRelease)
                    } else {
                        GestureEvent::with_value(GestureKind::Rotate, 10)
                    };
                    if events
                        .send(RelayEvent::Gesture { session, event })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            }
        }));
    }

    fn disconnect(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        // Best-effort: a full channel or a gone receiver just means nobody
        // is listening any more.
        let _ = self.events.try_send(RelayEvent::DeviceState {
            session: self.session,
            state: ConnectionState::Disconnected,
            reason: None,
        });
    }

    fn send_matrix(&mut self, command: MatrixCommand) {
        let frame = LedFrame::from_command(&command);
        debug!(session = %self.session, lit = frame.lit_count(), "simulated dial display updated");
        self.command_log.lock().expect("lock poisoned").push(command);
    }
}

impl Drop for SimulatedDial {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor::new("aa:bb:cc:dd:ee:01", "Dial")
    }

    #[tokio::test]
    async fn test_discovery_surfaces_descriptor() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut discovery = SimulatedDiscovery::new(tx, descriptor(), Duration::from_millis(1));

        discovery.start().expect("start");
        assert!(discovery.is_scanning());

        match rx.recv().await {
            Some(RelayEvent::DeviceFound(found)) => assert_eq!(found, descriptor()),
            other => panic!("expected DeviceFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_discovery_restarts_after_stop() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut discovery = SimulatedDiscovery::new(tx, descriptor(), Duration::from_millis(1));

        discovery.start().expect("start");
        assert!(matches!(rx.recv().await, Some(RelayEvent::DeviceFound(_))));

        // Stop-then-start (the relay's rediscovery path) surfaces the
        // device again.
        discovery.stop();
        discovery.start().expect("restart");
        assert!(matches!(rx.recv().await, Some(RelayEvent::DeviceFound(_))));
    }

    #[tokio::test]
    async fn test_stopped_discovery_stays_silent() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut discovery = SimulatedDiscovery::new(tx, descriptor(), Duration::from_millis(20));

        discovery.start().expect("start");
        discovery.stop();
        assert!(!discovery.is_scanning());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err(), "aborted scan must not deliver");
    }

    #[tokio::test]
    async fn test_connect_walks_through_lifecycle_events() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut connector = SimulatedConnector::new(
            tx,
            DialProfile {
                firmware: "1.2.3".to_string(),
                battery: 87,
                connect_delay: Duration::from_millis(1),
                ..DialProfile::default()
            },
        );
        let session = Uuid::new_v4();
        let mut dial = connector.open(descriptor(), session);
        dial.connect();

        let states: Vec<RelayEvent> = {
            let mut out = Vec::new();
            for _ in 0..4 {
                out.push(rx.recv().await.expect("event"));
            }
            out
        };

        assert!(matches!(
            states[0],
            RelayEvent::DeviceState {
                state: ConnectionState::Connecting,
                ..
            }
        ));
        assert!(matches!(
            states[1],
            RelayEvent::DeviceState {
                state: ConnectionState::Connected,
                ..
            }
        ));
        assert!(
            matches!(&states[2], RelayEvent::Firmware { version, .. } if version == "1.2.3")
        );
        assert!(matches!(states[3], RelayEvent::Battery { level: 87, .. }));
    }

    #[tokio::test]
    async fn test_failing_profile_reports_disconnected_with_reason() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut connector = SimulatedConnector::new(
            tx,
            DialProfile {
                connect_succeeds: false,
                connect_delay: Duration::from_millis(1),
                ..DialProfile::default()
            },
        );
        let mut dial = connector.open(descriptor(), Uuid::new_v4());
        dial.connect();

        assert!(matches!(
            rx.recv().await,
            Some(RelayEvent::DeviceState {
                state: ConnectionState::Connecting,
                ..
            })
        ));
        match rx.recv().await {
            Some(RelayEvent::DeviceState { state, reason, .. }) => {
                assert_eq!(state, ConnectionState::Disconnected);
                assert!(reason.is_some());
            }
            other => panic!("expected failure state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_matrix_records_command() {
        let (tx, _rx) = mpsc::channel(16);
        let mut connector = SimulatedConnector::new(tx, DialProfile::default());
        let log = connector.command_log();

        let mut dial = connector.open(descriptor(), Uuid::new_v4());
        dial.send_matrix(MatrixCommand::new("ooo"));

        let recorded = log.lock().expect("lock poisoned");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].as_str(), "ooo");
    }

    #[tokio::test]
    async fn test_connector_tracks_last_session() {
        let (tx, _rx) = mpsc::channel(16);
        let mut connector = SimulatedConnector::new(tx, DialProfile::default());
        let last = connector.last_session();
        assert_eq!(*last.lock().unwrap(), None);

        let session = Uuid::new_v4();
        let _dial = connector.open(descriptor(), session);
        assert_eq!(*last.lock().unwrap(), Some(session));
    }
}
