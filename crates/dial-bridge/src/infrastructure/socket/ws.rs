//! WebSocket server: accept loop and per-socket task management.
//!
//! Responsibilities:
//!
//! 1. Bind a TCP listener on the configured address (deferred to a spawned
//!    task so `start` never blocks; a bind failure surfaces as a
//!    `ServerFailed` event, not an error return).
//! 2. Accept incoming TCP connections and upgrade each to a WebSocket.
//! 3. Run two tasks per socket:
//!    - **writer** — drains the socket's outbound queue into the WebSocket
//!      sink, preserving per-socket send order;
//!    - **reader** — forwards inbound text frames to the relay loop and
//!      reports close/failure.
//! 4. Stop cleanly when asked: the accept loop checks a shared flag between
//!    short `accept` timeouts, and aborting the loop task drops the
//!    listener.
//!
//! The server never touches the client registry.  It hands each accepted
//! socket to the bridge as a `ClientOpened` event carrying the socket's
//! [`ClientHandle`]; whether the socket is kept is the bridge's decision.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use dial_core::WireMessage;

use crate::domain::events::{ClientHandle, RelayEvent};
use crate::infrastructure::socket::SocketServer;

/// How often the accept loop wakes to check the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// The production [`SocketServer`] on tokio-tungstenite.
pub struct WsServer {
    bind_addr: SocketAddr,
    events: mpsc::Sender<RelayEvent>,
    running: Arc<AtomicBool>,
    accept_task: Option<JoinHandle<()>>,
    local_addr_tx: watch::Sender<Option<SocketAddr>>,
}

impl WsServer {
    pub fn new(bind_addr: SocketAddr, events: mpsc::Sender<RelayEvent>) -> Self {
        let (local_addr_tx, _) = watch::channel(None);
        Self {
            bind_addr,
            events,
            running: Arc::new(AtomicBool::new(false)),
            accept_task: None,
            local_addr_tx,
        }
    }

    /// Observes the actually-bound address.  `None` while the server is
    /// down; with port 0 the OS-assigned port shows up here.
    pub fn local_addr_watch(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.local_addr_tx.subscribe()
    }
}

impl SocketServer for WsServer {
    fn start(&mut self) {
        if let Some(task) = &self.accept_task {
            if !task.is_finished() {
                debug!("socket server already running");
                return;
            }
        }
        self.running.store(true, Ordering::Relaxed);

        let bind_addr = self.bind_addr;
        let events = self.events.clone();
        let running = Arc::clone(&self.running);
        let local_addr_tx = self.local_addr_tx.clone();
        self.accept_task = Some(tokio::spawn(run_accept_loop(
            bind_addr,
            events,
            running,
            local_addr_tx,
        )));
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(task) = self.accept_task.take() {
            // Aborting drops the listener; per-socket tasks end when the
            // bridge drops their handles.
            task.abort();
        }
        let _ = self.local_addr_tx.send(None);
    }

    fn is_running(&self) -> bool {
        self.accept_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

async fn run_accept_loop(
    bind_addr: SocketAddr,
    events: mpsc::Sender<RelayEvent>,
    running: Arc<AtomicBool>,
    local_addr_tx: watch::Sender<Option<SocketAddr>>,
) {
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            let _ = events
                .send(RelayEvent::ServerFailed {
                    reason: format!("failed to bind {bind_addr}: {e}"),
                })
                .await;
            return;
        }
    };

    // With port 0 the OS picks; report what we actually got.
    let local_addr = listener.local_addr().unwrap_or(bind_addr);
    let _ = local_addr_tx.send(Some(local_addr));
    info!("websocket server listening on {local_addr}");
    if events
        .send(RelayEvent::ServerStarted { addr: local_addr })
        .await
        .is_err()
    {
        return;
    }

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("websocket server stopping");
            break;
        }

        // Short timeout so the loop re-checks the shutdown flag even when
        // nobody is connecting.
        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("tcp connection from {peer_addr}");
                let events = events.clone();
                tokio::spawn(async move {
                    handle_socket(stream, peer_addr, events).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept failure (e.g. fd exhaustion); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout — loop back to the flag check.
            }
        }
    }
}

// ── Per-socket session ────────────────────────────────────────────────────────

/// Runs one client socket: handshake, writer task, reader loop.
async fn handle_socket(stream: TcpStream, peer_addr: SocketAddr, events: mpsc::Sender<RelayEvent>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("websocket handshake failed with {peer_addr}: {e}");
            return;
        }
    };

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<WireMessage>();
    let handle = ClientHandle::new(outbound_tx);
    let socket = handle.id();
    info!(%socket, %peer_addr, "websocket client connected");

    // The bridge decides whether to keep the socket; if it drops the handle
    // (no device connected, or the bridge is gone) the queue closes and the
    // writer hangs up.
    if events.send(RelayEvent::ClientOpened(handle)).await.is_err() {
        return;
    }

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // Writer: per-socket FIFO from the registry to the peer.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if ws_tx
                .send(WsMessage::Text(message.to_string()))
                .await
                .is_err()
            {
                return;
            }
        }
        // Queue closed — the registry removed this socket.  Say goodbye.
        let _ = ws_tx.send(WsMessage::Close(None)).await;
    });

    // Reader: inbound display commands and connection lifecycle.
    loop {
        match ws_rx.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                if events
                    .send(RelayEvent::ClientMessage { socket, text })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Some(Ok(WsMessage::Binary(_))) => {
                warn!(%socket, "binary frame ignored (text protocol)");
            }
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                // Protocol-level frames; tungstenite answers pings itself.
            }
            Some(Ok(WsMessage::Close(_))) | None => {
                break;
            }
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                break;
            }
            Some(Err(e)) => {
                let _ = events
                    .send(RelayEvent::ClientFailed {
                        socket,
                        reason: e.to_string(),
                    })
                    .await;
                writer_task.abort();
                return;
            }
        }
    }

    debug!(%socket, "websocket client closed");
    let _ = events.send(RelayEvent::ClientClosed { socket }).await;
    // The writer keeps draining until the bridge drops the handle.
}

// ── Tests ─────────────────────────────────────────────────────────────────────
