//! WebSocket push layer for live preview.
//!
//! Owns the dynamic subscriber set. Broadcasting is fire-and-forget: a
//! failed send prunes that subscriber and never fails or delays a build.
//! Client messages (`rebuild-request`, `status-request`) are polled on a
//! reader thread.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Sender;
use parking_lot::Mutex;
use tungstenite::protocol::Message;
use tungstenite::{Error as WsError, WebSocket};

use super::message::DevMessage;
use super::state::DevState;
use super::Trigger;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Pause between read sweeps over the subscriber set. Sockets are
/// non-blocking, so a sweep itself returns immediately.
const READ_POLL: Duration = Duration::from_millis(100);

/// The dynamic live-preview subscriber set.
#[derive(Clone, Default)]
pub struct Subscribers {
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Send a message to every subscriber, pruning any that fail. A full
    /// send buffer (WouldBlock) keeps the subscriber; only broken
    /// connections are dropped.
    pub fn broadcast(&self, msg: &DevMessage) {
        let json = msg.to_json();
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain_mut(|ws| match ws.send(Message::Text(json.clone().into())) {
            Ok(()) => true,
            Err(WsError::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        });
        let pruned = before - clients.len();
        if pruned > 0 {
            crate::debug!("serve"; "pruned {pruned} dead subscriber(s)");
        }
    }

    fn add(&self, ws: WebSocket<TcpStream>) {
        self.clients.lock().push(ws);
    }
}

/// Start the WebSocket listener and the client reader thread.
///
/// Returns the actual port bound (retries upward when the base port is
/// taken, as dev servers often race their previous instance).
pub fn start_ws_server(
    base_port: u16,
    subscribers: Subscribers,
    trigger_tx: Sender<Trigger>,
    state: Arc<DevState>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;

    // Acceptor thread: handshake and register clients
    let acceptor_subscribers = subscribers.clone();
    let acceptor_state = Arc::clone(&state);
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let peer = stream.peer_addr().ok();
            match tungstenite::accept(stream) {
                Ok(mut ws) => {
                    if let Some(addr) = peer {
                        crate::debug!("serve"; "client connected: {addr}");
                    }
                    // Handshake is done; from here reads and writes must
                    // never block the shared subscriber lock
                    let _ = ws.get_ref().set_nonblocking(true);
                    // Greet with a status snapshot (count includes this client)
                    let count = acceptor_subscribers.count() + 1;
                    let status = status_message(&acceptor_state, count);
                    let _ = ws.send(Message::Text(status.to_json().into()));
                    acceptor_subscribers.add(ws);
                }
                Err(e) => crate::debug!("serve"; "handshake failed: {e}"),
            }
        }
    });

    // Reader thread: poll subscribers for client messages
    std::thread::spawn(move || {
        reader_loop(&subscribers, &trigger_tx, &state);
    });

    Ok(actual_port)
}

fn reader_loop(subscribers: &Subscribers, trigger_tx: &Sender<Trigger>, state: &Arc<DevState>) {
    loop {
        {
            let mut clients = subscribers.clients.lock();
            let mut i = 0;
            while i < clients.len() {
                // Snapshot under the same lock; status replies must not
                // re-enter the subscriber mutex.
                let count = clients.len();
                match clients[i].read() {
                    Ok(Message::Text(text)) => {
                        handle_client_message(&text, &mut clients[i], trigger_tx, state, count);
                        i += 1;
                    }
                    Ok(Message::Close(_)) => {
                        clients.remove(i);
                    }
                    Ok(_) => i += 1,
                    Err(WsError::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        i += 1;
                    }
                    Err(_) => {
                        clients.remove(i);
                    }
                }
            }
        }
        std::thread::sleep(READ_POLL);
    }
}

fn handle_client_message(
    text: &str,
    ws: &mut WebSocket<TcpStream>,
    trigger_tx: &Sender<Trigger>,
    state: &Arc<DevState>,
    subscriber_count: usize,
) {
    match DevMessage::from_json(text) {
        Some(DevMessage::RebuildRequest) => {
            crate::debug!("serve"; "rebuild requested by client");
            // Full channel means a rebuild is already pending
            let _ = trigger_tx.try_send(Trigger::Manual);
        }
        Some(DevMessage::StatusRequest) => {
            let status = status_message(state, subscriber_count);
            let _ = ws.send(Message::Text(status.to_json().into()));
        }
        Some(_) | None => {
            crate::debug!("serve"; "ignoring client message: {text}");
        }
    }
}

fn status_message(state: &Arc<DevState>, subscriber_count: usize) -> DevMessage {
    DevMessage::Status {
        building: state.is_building(),
        last_build_timestamp: state.last_build_timestamp(),
        subscriber_count,
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
