use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, RwLock};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{event, Level};

use crate::error::{EchoError, Result};
use crate::networking::socket_operation::{request_json, SocketOperation};

/// Correlation ids start here on every connection.
pub const INITIAL_CALL_ID: u64 = 1;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Connected,
    Disconnected,
    /// `params` of a notice frame
    Notice(Value),
}

/// Frames queued for the websocket writer.
pub type OutboundSender = mpsc::UnboundedSender<std::result::Result<Message, tungstenite::Error>>;

type Completion = Box<dyn FnOnce(Result<Value>) + Send>;

struct PendingCall {
    method: &'static str,
    complete: Completion,
}

/// Answer to an emitted call. Resolves exactly once.
pub struct PendingResponse<T> {
    call_id: u64,
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> PendingResponse<T> {
    pub fn call_id(&self) -> u64 {
        self.call_id
    }
}

/// Connection state, the pending-call table and inbound dispatch.
///
/// Nothing here touches the network. The driver in [`crate::networking::connection`] reports
/// lifecycle changes and inbound frames, and drains the outbound queue this hands frames to.
/// Each connection attempt gets a generation number so late reports from a dead socket are
/// ignored.
pub struct SocketCore {
    state: RwLock<SocketState>,
    generation: AtomicU64,
    next_call_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingCall>>,
    outbound: RwLock<Option<OutboundSender>>,
    events: broadcast::Sender<SocketEvent>,
}

impl SocketCore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        SocketCore {
            state: RwLock::new(SocketState::Disconnected),
            generation: AtomicU64::new(0),
            next_call_id: AtomicU64::new(INITIAL_CALL_ID),
            pending: Mutex::new(HashMap::new()),
            outbound: RwLock::new(None),
            events,
        }
    }

    pub async fn state(&self) -> SocketState {
        *self.state.read().await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SocketEvent> {
        self.events.subscribe()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Move to `Connecting`. Returns the generation the driver reports back with.
    pub async fn begin_connect(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        if *state != SocketState::Disconnected {
            return Err(EchoError::Connection(format!("socket is already {:?}", *state)));
        }
        *state = SocketState::Connecting;
        event!(Level::INFO, "socket connecting");
        Ok(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub async fn on_connected(&self, generation: u64, outbound: OutboundSender) {
        let mut state = self.state.write().await;
        if generation != self.generation.load(Ordering::SeqCst) || *state != SocketState::Connecting {
            return;
        }
        debug_assert!(self.pending.lock().await.is_empty());
        *self.outbound.write().await = Some(outbound);
        *state = SocketState::Connected;
        drop(state);
        event!(Level::INFO, "socket connected");
        let _ = self.events.send(SocketEvent::Connected);
    }

    pub async fn on_failure(&self, generation: u64, error: &str) {
        event!(Level::ERROR, "socket failure: {}", error);
        self.on_disconnected(generation, error).await;
    }

    /// Fail every pending call with a connection error and reset the id counter.
    pub async fn on_disconnected(&self, generation: u64, reason: &str) {
        let mut state = self.state.write().await;
        if generation != self.generation.load(Ordering::SeqCst) || *state == SocketState::Disconnected {
            return;
        }
        *state = SocketState::Disconnected;
        *self.outbound.write().await = None;

        let orphaned: Vec<(u64, PendingCall)> = self.pending.lock().await.drain().collect();
        self.next_call_id.store(INITIAL_CALL_ID, Ordering::SeqCst);
        drop(state);

        event!(
            Level::INFO,
            "socket disconnected ({}), failing {} pending calls",
            reason,
            orphaned.len()
        );
        for (_, call) in orphaned {
            (call.complete)(Err(EchoError::Connection(format!("socket disconnected: {}", reason))));
        }
        let _ = self.events.send(SocketEvent::Disconnected);
    }

    /// Explicit disconnect. Dropping the outbound queue closes the websocket writer.
    pub async fn disconnect(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.on_disconnected(generation, "disconnect requested").await;
    }

    /// Register `operation` in the pending table and queue its request frame.
    pub async fn emit<O: SocketOperation>(&self, operation: O, api_id: u64) -> Result<PendingResponse<O::Output>> {
        let (sender, receiver) = oneshot::channel();
        let method = operation.method();
        let params = operation.params();
        let complete: Completion = Box::new(move |result: Result<Value>| {
            let _ = sender.send(result.and_then(|value| operation.decode(value)));
        });
        let call_id = self.emit_raw(api_id, method, params, complete).await?;
        Ok(PendingResponse { call_id, receiver })
    }

    // The id is drawn under the state guard, so it always belongs to the live connection.
    async fn emit_raw(&self, api_id: u64, method: &'static str, params: Value, complete: Completion) -> Result<u64> {
        let state = self.state.read().await;
        if *state != SocketState::Connected {
            return Err(EchoError::Connection(String::from("socket is not connected")));
        }
        let call_id = self.next_call_id.fetch_add(1, Ordering::SeqCst);
        let request = request_json(call_id, api_id, method, params).to_string();
        {
            let mut pending = self.pending.lock().await;
            if pending.contains_key(&call_id) {
                return Err(EchoError::DuplicateCall(call_id));
            }
            pending.insert(call_id, PendingCall { method, complete });
        }

        let sent = match self.outbound.read().await.as_ref() {
            Some(outbound) => outbound.send(Ok(Message::Text(request))).is_ok(),
            None => false,
        };
        if !sent {
            self.pending.lock().await.remove(&call_id);
            return Err(EchoError::Connection(String::from("socket writer is closed")));
        }
        event!(Level::DEBUG, "emit call {} {}", call_id, method);
        Ok(call_id)
    }

    /// Wait for an emitted call. With a timeout the call is dropped from the table when it expires,
    /// so a late response is treated as unknown.
    pub async fn wait<T>(&self, response: PendingResponse<T>, timeout: Option<Duration>) -> Result<T> {
        let PendingResponse { call_id, receiver } = response;
        let received = match timeout {
            Some(duration) => match tokio::time::timeout(duration, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    self.pending.lock().await.remove(&call_id);
                    return Err(EchoError::Timeout(duration));
                }
            },
            None => receiver.await,
        };
        received.map_err(|_| EchoError::Connection(format!("call {} was dropped", call_id)))?
    }

    pub async fn call<O: SocketOperation>(&self, operation: O, api_id: u64, timeout: Option<Duration>) -> Result<O::Output> {
        let response = self.emit(operation, api_id).await?;
        self.wait(response, timeout).await
    }

    /// Dispatch one inbound text frame.
    pub async fn on_message(&self, text: &str) {
        let envelope: Value = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(error) => {
                event!(Level::WARN, "dropping unparsable frame: {}", error);
                return;
            }
        };

        if envelope.get("method").and_then(Value::as_str) == Some("notice") {
            let params = envelope.get("params").cloned().unwrap_or(Value::Null);
            if self.events.send(SocketEvent::Notice(params)).is_err() {
                event!(Level::WARN, "dropping notice, nobody is listening");
            }
            return;
        }

        let call_id = match envelope.get("id").and_then(Value::as_u64) {
            Some(call_id) => call_id,
            None => {
                event!(Level::WARN, "dropping frame without id: {}", text);
                return;
            }
        };
        let call = match self.pending.lock().await.remove(&call_id) {
            Some(call) => call,
            None => {
                event!(Level::WARN, "dropping response for unknown call {}", call_id);
                return;
            }
        };
        event!(Level::DEBUG, "response to call {} {}", call_id, call.method);

        let result = match envelope.get("error") {
            Some(error) => Err(EchoError::Response {
                call_id,
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            }),
            None => Ok(envelope.get("result").cloned().unwrap_or(Value::Null)),
        };
        (call.complete)(result);
    }
}

impl Default for SocketCore {
    fn default() -> Self {
        SocketCore::new()
    }
}
