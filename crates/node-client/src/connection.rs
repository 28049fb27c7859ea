//! A single live connection to the node.
//!
//! The connection owns the socket and its two dispatch tables. One writer
//! task drains the outbound queue so frames hit the wire in call order; one
//! reader task decodes inbound frames and demultiplexes each to the
//! correlation table (pull path) and the subscription table (push path), in
//! strict arrival order. Replies may arrive in any order relative to
//! requests — correctness rests on id correlation, never on FIFO replies.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use sw_domain::NodeConfig;
use sw_protocol::{new_message_id, Body, Frame};

use crate::correlation::CorrelationTable;
use crate::error::NodeClientError;
use crate::subscription::SubscriptionTable;

/// Lifecycle of a connection. `Disconnected` and `Connecting` cover the
/// window inside [`NodeConnection::connect`]; an instance is only handed
/// out once `Open`, and a `Closed` connection is never reused — the locator
/// creates a fresh one on next use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

type DisconnectHook = Box<dyn FnOnce() + Send>;

pub struct NodeConnection {
    outbound: mpsc::UnboundedSender<String>,
    correlation: CorrelationTable,
    subscriptions: SubscriptionTable,
    state: Mutex<ConnectionState>,
    on_disconnect: Mutex<Option<DisconnectHook>>,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl NodeConnection {
    /// Open the socket and spawn the reader/writer tasks. Resolves once the
    /// transport reports ready, or fails after the configured connect
    /// timeout.
    pub async fn connect(config: &NodeConfig) -> Result<Arc<Self>, NodeClientError> {
        let url = config.url();
        tracing::info!(url = %url, "connecting to node");

        let connect = tokio_tungstenite::connect_async(&url);
        let (ws, _response) = match tokio::time::timeout(config.connect_timeout(), connect).await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(NodeClientError::Transport(e)),
            Err(_) => return Err(NodeClientError::ConnectTimeout),
        };

        let (mut sink, mut stream) = ws.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let shutdown = CancellationToken::new();

        let conn = Arc::new(Self {
            outbound: outbound_tx,
            correlation: CorrelationTable::new(),
            subscriptions: SubscriptionTable::new(),
            state: Mutex::new(ConnectionState::Open),
            on_disconnect: Mutex::new(None),
            request_timeout: config.request_timeout(),
            shutdown: shutdown.clone(),
        });

        // Writer: the single task draining this queue keeps outbound frames
        // in call order on the wire.
        let writer_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_shutdown.cancelled() => break,
                    next = outbound_rx.recv() => {
                        let Some(text) = next else { break };
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::warn!(error = %e, "outbound write failed");
                            break;
                        }
                    }
                }
            }
            let _ = sink.close().await;
        });

        // Reader: frames are handled strictly in arrival order; dispatch for
        // one frame completes before the next is decoded.
        let reader_conn = Arc::clone(&conn);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = stream.next() => {
                        match next {
                            Some(Ok(Message::Text(text))) => reader_conn.handle_frame(&text),
                            Some(Ok(Message::Close(_))) => {
                                tracing::info!("node closed the connection");
                                break;
                            }
                            // Binary, ping and pong are not part of the protocol.
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "websocket error");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }
            reader_conn.mark_closed();
        });

        tracing::info!(url = %url, "node connection open");
        Ok(conn)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.correlation.len()
    }

    /// Fire-and-forget: encode and queue a frame under a fresh message id,
    /// which is returned. Never suspends; fails fast when the connection is
    /// not open.
    pub fn emit(&self, event: &str, body: Body) -> Result<String, NodeClientError> {
        let id = new_message_id();
        self.send_frame(event, &id, body)?;
        Ok(id)
    }

    /// Correlated call: register a fresh message id, send, and suspend until
    /// the reply bearing that id is demultiplexed — bounded by the
    /// configured request timeout. A connection that closes mid-wait fails
    /// the call with [`NodeClientError::ConnectionClosed`].
    pub async fn request(&self, event: &str, body: Body) -> Result<Frame, NodeClientError> {
        if !self.is_open() {
            return Err(NodeClientError::NoConnection);
        }

        let id = new_message_id();
        let (tx, rx) = oneshot::channel();
        if !self.correlation.register(&id, tx) {
            return Err(NodeClientError::DuplicateMessageId(id));
        }

        if let Err(e) = self.send_frame(event, &id, body) {
            self.correlation.forget(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(frame)) => Ok(frame),
            Ok(Err(_closed)) => Err(NodeClientError::ConnectionClosed),
            Err(_elapsed) => {
                self.correlation.forget(&id);
                Err(NodeClientError::RequestTimeout {
                    event: event.to_string(),
                })
            }
        }
    }

    /// Install `handler` as the single active subscriber for `event`,
    /// replacing any previous one. Nothing goes on the wire; pairing a
    /// subscribe with an [`emit`](Self::emit) that provokes the push is the
    /// caller's pattern.
    pub fn subscribe(&self, event: &str, handler: impl Fn(Frame) + Send + Sync + 'static) {
        self.subscriptions.subscribe(event, handler);
    }

    /// Subscribe and receive pushed frames through a channel instead of a
    /// callback. Dropping the receiver does not unsubscribe by itself;
    /// frames pushed afterwards are dropped.
    pub fn subscribe_channel(&self, event: &str) -> mpsc::UnboundedReceiver<Frame> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions.subscribe(event, move |frame| {
            let _ = tx.send(frame);
        });
        rx
    }

    pub fn unsubscribe(&self, event: &str) {
        self.subscriptions.unsubscribe(event);
    }

    /// Register the single callback fired when the transport closes. A
    /// later call replaces an unfired callback.
    pub fn on_disconnect(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_disconnect.lock() = Some(Box::new(hook));
    }

    /// Close the connection locally: pending requests fail with
    /// [`NodeClientError::ConnectionClosed`] and the disconnect callback
    /// fires, exactly as on a transport-initiated close.
    pub fn close(&self) {
        self.mark_closed();
    }

    fn send_frame(&self, event: &str, id: &str, body: Body) -> Result<(), NodeClientError> {
        if !self.is_open() {
            return Err(NodeClientError::NoConnection);
        }
        let frame = Frame::with_body(event, id, body);
        tracing::debug!(event, message_id = %id, "sending frame");
        self.outbound
            .send(frame.encode())
            .map_err(|_| NodeClientError::NoConnection)
    }

    /// Demultiplex one inbound frame. Both paths are checked
    /// unconditionally: a reply id resolves its pending request, and the
    /// event name is offered to the subscription table — a single frame may
    /// satisfy both.
    fn handle_frame(&self, raw: &str) {
        let frame = match Frame::decode(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                return;
            }
        };

        let resolved = match frame.message_id() {
            Some(id) => self.correlation.resolve(id, frame.clone()),
            None => false,
        };

        let event = frame.event().map(str::to_string);
        let dispatched = match event {
            Some(event) => self.subscriptions.dispatch(&event, frame),
            None => false,
        };

        if !resolved && !dispatched {
            tracing::trace!("frame matched no pending request or subscription");
        }
    }

    /// Transition to `Closed` exactly once: stop both tasks, fail every
    /// pending request, fire the disconnect callback.
    fn mark_closed(&self) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Closed {
                return;
            }
            *state = ConnectionState::Closed;
        }
        self.shutdown.cancel();
        self.correlation.fail_all();
        let hook = self.on_disconnect.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        tracing::info!("node connection closed");
    }
}
