//! Integration test: boots an in-process WebSocket server that plays the
//! node side of the frame protocol, connects real clients, and exercises
//! the full surface:
//!
//! - correlated request/reply, including out-of-order replies
//! - the subscribe-then-emit balance flow
//! - locator caching and transparent reconnect after a disconnect
//! - pending requests failing when the transport drops
//! - request timeouts cleaning up their correlation entries
//! - malformed inbound frames leaving the receive loop healthy

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use sw_domain::{NodeConfig, Transaction};
use sw_node_client::{
    ConnectionState, NodeApi, NodeClientError, NodeConnection, NodeLocator,
};
use sw_protocol::{Body, Frame};

// ── Mini node: in-process WS server ─────────────────────────────────────

/// Handle to one accepted client connection: push raw frames to the client,
/// receive the raw frames it sends. Dropping the handle closes the socket.
struct NodeConn {
    send: mpsc::Sender<String>,
    recv: mpsc::Receiver<String>,
}

impl NodeConn {
    async fn recv_frame(&mut self) -> Frame {
        let raw = tokio::time::timeout(Duration::from_secs(5), self.recv.recv())
            .await
            .expect("timeout waiting for a frame from the client")
            .expect("client connection dropped");
        Frame::decode(&raw).expect("client sent an undecodable frame")
    }

    async fn push_raw(&self, raw: impl Into<String>) {
        self.send.send(raw.into()).await.unwrap();
    }

    /// Push a JSON-bodied frame, the shape the real node replies with.
    async fn reply_json(&self, event: &str, message_id: &str, body: serde_json::Value) {
        self.push_raw(format!(
            "event: {event}\nmessage-id: {message_id}\ncontent-type: application/json\n\n{body}"
        ))
        .await;
    }
}

/// Boots a tiny WS server on an ephemeral port. Returns the bound address
/// and a channel delivering a [`NodeConn`] per accepted client.
async fn start_mini_node() -> (SocketAddr, mpsc::Receiver<NodeConn>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (conn_tx, conn_rx) = mpsc::channel(4);

    tokio::spawn(async move {
        while let Ok((stream, _peer)) = listener.accept().await {
            let conn_tx = conn_tx.clone();
            tokio::spawn(async move {
                let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let (mut sink, mut stream) = ws.split();

                let (push_tx, mut push_rx) = mpsc::channel::<String>(16);
                let (recv_tx, recv_rx) = mpsc::channel::<String>(16);

                let _ = conn_tx
                    .send(NodeConn {
                        send: push_tx,
                        recv: recv_rx,
                    })
                    .await;

                let read_task = tokio::spawn(async move {
                    while let Some(Ok(msg)) = stream.next().await {
                        if let Message::Text(text) = msg {
                            if recv_tx.send(text).await.is_err() {
                                break;
                            }
                        }
                    }
                });

                let write_task = tokio::spawn(async move {
                    while let Some(text) = push_rx.recv().await {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    let _ = sink.close().await;
                });

                let _ = tokio::join!(read_task, write_task);
            });
        }
    });

    (addr, conn_rx)
}

fn test_config(addr: SocketAddr) -> NodeConfig {
    NodeConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        connect_timeout_secs: 5,
        request_timeout_secs: 5,
    }
}

async fn wait_until_closed(conn: &NodeConnection) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while conn.is_open() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection never observed the close");
}

fn sample_transaction() -> Transaction {
    Transaction {
        from: "A".into(),
        to: "B".into(),
        amount: 5.0,
        timestamp: 1_700_000_000_000,
        signature: "sig".into(),
        hash: "h1".into(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn send_transaction_roundtrip() {
    let (addr, mut conns) = start_mini_node().await;
    let locator = NodeLocator::new(test_config(addr));
    let api = NodeApi::new(locator.clone());

    let tx = sample_transaction();
    let call = tokio::spawn({
        let api = api.clone();
        let tx = tx.clone();
        async move { api.send_transaction(&tx).await }
    });

    let mut node = conns.recv().await.unwrap();
    let frame = node.recv_frame().await;
    assert_eq!(frame.event(), Some("send-transaction"));
    let id = frame.message_id().expect("request carries a message id").to_string();
    let body = frame.body.as_json().expect("request body is JSON");
    assert_eq!(body["from"], "A");
    assert_eq!(body["to"], "B");
    assert_eq!(body["amount"], 5.0);

    node.reply_json("send-transaction", &id, json!({"status": "ok"})).await;

    let ack = call.await.unwrap().unwrap();
    assert!(ack.is_ok());

    // The correlation entry is gone once the reply lands.
    let conn = locator.find_node().await.unwrap();
    assert_eq!(conn.pending_requests(), 0);
}

#[tokio::test]
async fn concurrent_requests_match_out_of_order_replies() {
    let (addr, mut conns) = start_mini_node().await;
    let conn = NodeConnection::connect(&test_config(addr)).await.unwrap();
    let mut node = conns.recv().await.unwrap();

    let first = tokio::spawn({
        let conn = conn.clone();
        async move {
            conn.request(
                "get-transactions-for-address",
                Body::json(&json!({"address": "X"})).unwrap(),
            )
            .await
        }
    });
    let x_id = node.recv_frame().await.message_id().unwrap().to_string();

    let second = tokio::spawn({
        let conn = conn.clone();
        async move {
            conn.request(
                "get-transactions-for-address",
                Body::json(&json!({"address": "Y"})).unwrap(),
            )
            .await
        }
    });
    let y_id = node.recv_frame().await.message_id().unwrap().to_string();
    assert_ne!(x_id, y_id);

    // Reply to the second request first; each caller must still get its own.
    node.reply_json("get-transactions-for-address", &y_id, json!({"for": "Y"})).await;
    node.reply_json("get-transactions-for-address", &x_id, json!({"for": "X"})).await;

    let x_reply = first.await.unwrap().unwrap();
    let y_reply = second.await.unwrap().unwrap();
    assert_eq!(x_reply.body.as_json().unwrap()["for"], "X");
    assert_eq!(y_reply.body.as_json().unwrap()["for"], "Y");
    assert_eq!(conn.pending_requests(), 0);
}

#[tokio::test]
async fn balance_flow_subscribes_then_emits() {
    let (addr, mut conns) = start_mini_node().await;
    let api = NodeApi::new(NodeLocator::new(test_config(addr)));

    let call = tokio::spawn({
        let api = api.clone();
        async move { api.balance_for_address("addr-1").await }
    });

    let mut node = conns.recv().await.unwrap();
    let frame = node.recv_frame().await;
    assert_eq!(frame.event(), Some("get-balance-for-address"));
    assert_eq!(frame.body.as_json().unwrap()["address"], "addr-1");

    // The node answers with a push on the same event, under its own id.
    node.reply_json(
        "get-balance-for-address",
        "node-generated-id",
        json!({"address": "addr-1", "balance": 42.5}),
    )
    .await;

    let update = call.await.unwrap().unwrap();
    assert_eq!(update.address, "addr-1");
    assert_eq!(update.balance, 42.5);
}

#[tokio::test]
async fn locator_reuses_the_connection_until_disconnect() {
    let (addr, mut conns) = start_mini_node().await;
    let locator = NodeLocator::new(test_config(addr));

    let first = locator.find_node().await.unwrap();
    let again = locator.find_node().await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    // The node drops the socket.
    let node = conns.recv().await.unwrap();
    drop(node);
    wait_until_closed(&first).await;

    // The next lookup reconnects instead of handing out the dead instance.
    let fresh = locator.find_node().await.unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
    assert!(fresh.is_open());
}

#[tokio::test]
async fn disconnect_fails_pending_requests() {
    let (addr, mut conns) = start_mini_node().await;
    let conn = NodeConnection::connect(&test_config(addr)).await.unwrap();
    let mut node = conns.recv().await.unwrap();

    let call = tokio::spawn({
        let conn = conn.clone();
        async move { conn.request("send-transaction", Body::Text("payload".into())).await }
    });
    let _ = node.recv_frame().await;
    assert_eq!(conn.pending_requests(), 1);

    drop(node);

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, NodeClientError::ConnectionClosed));
    assert_eq!(conn.pending_requests(), 0);
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn request_timeout_cleans_up_its_entry() {
    let (addr, mut conns) = start_mini_node().await;
    let mut config = test_config(addr);
    config.request_timeout_secs = 1;
    let conn = NodeConnection::connect(&config).await.unwrap();
    let mut node = conns.recv().await.unwrap();

    let call = tokio::spawn({
        let conn = conn.clone();
        async move { conn.request("send-transaction", Body::Text("ignored".into())).await }
    });

    // The node receives the request and never answers.
    let _ = node.recv_frame().await;

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, NodeClientError::RequestTimeout { .. }));
    assert_eq!(conn.pending_requests(), 0);
    assert!(conn.is_open());
}

#[tokio::test]
async fn calls_fail_fast_once_closed() {
    let (addr, mut conns) = start_mini_node().await;
    let conn = NodeConnection::connect(&test_config(addr)).await.unwrap();
    let _node = conns.recv().await.unwrap();

    conn.close();
    assert_eq!(conn.state(), ConnectionState::Closed);

    assert!(matches!(
        conn.emit("get-balance-for-address", Body::Text("x".into())),
        Err(NodeClientError::NoConnection)
    ));
    let err = conn
        .request("send-transaction", Body::Text("x".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeClientError::NoConnection));
}

#[tokio::test]
async fn one_frame_can_satisfy_request_and_subscription() {
    let (addr, mut conns) = start_mini_node().await;
    let conn = NodeConnection::connect(&test_config(addr)).await.unwrap();
    let mut node = conns.recv().await.unwrap();

    let mut pushed = conn.subscribe_channel("send-transaction");

    let call = tokio::spawn({
        let conn = conn.clone();
        async move { conn.request("send-transaction", Body::Text("p".into())).await }
    });
    let id = node.recv_frame().await.message_id().unwrap().to_string();
    node.reply_json("send-transaction", &id, json!({"status": "ok"})).await;

    // Pull path resolves the request…
    let reply = call.await.unwrap().unwrap();
    assert_eq!(reply.message_id(), Some(id.as_str()));

    // …and the push path delivers the same frame to the subscriber.
    let also = tokio::time::timeout(Duration::from_secs(5), pushed.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(also.message_id(), Some(id.as_str()));
}

#[tokio::test]
async fn malformed_frames_leave_the_loop_healthy() {
    let (addr, mut conns) = start_mini_node().await;
    let conn = NodeConnection::connect(&test_config(addr)).await.unwrap();
    let mut node = conns.recv().await.unwrap();

    // Undecodable JSON body, then a stale reply nobody is waiting for.
    node.push_raw("event: x\ncontent-type: application/json\n\n{broken").await;
    node.push_raw("event: nobody-subscribed\nmessage-id: stale\n\n{}").await;

    // The receive loop is still up: a normal request works afterwards.
    let call = tokio::spawn({
        let conn = conn.clone();
        async move { conn.request("send-transaction", Body::Text("p".into())).await }
    });
    let id = node.recv_frame().await.message_id().unwrap().to_string();
    node.reply_json("send-transaction", &id, json!({"status": "ok"})).await;

    assert!(call.await.unwrap().is_ok());
    assert!(conn.is_open());
}
