//! Typed operations over the raw frame channel.
//!
//! Callers see strongly-typed payloads; decoding happens exactly once here,
//! at the demultiplexer boundary, instead of each caller re-interpreting
//! header maps and JSON bodies.

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use sw_domain::Transaction;
use sw_protocol::events::{
    BalanceRequest, BalanceUpdate, BlockVerified, TransactionAck, TransactionList,
    TransactionsRequest, BLOCK_VERIFIED, GET_BALANCE_FOR_ADDRESS,
    GET_TRANSACTIONS_FOR_ADDRESS, SEND_TRANSACTION,
};
use sw_protocol::{Body, Frame};

use crate::error::NodeClientError;
use crate::locator::NodeLocator;

/// High-level wallet-facing client. Cheap to clone; the underlying
/// connection is created lazily through the locator.
#[derive(Clone)]
pub struct NodeApi {
    locator: NodeLocator,
}

impl NodeApi {
    pub fn new(locator: NodeLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &NodeLocator {
        &self.locator
    }

    /// Submit a signed transaction; the node replies on the same
    /// correlation id.
    pub async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<TransactionAck, NodeClientError> {
        let conn = self.locator.find_node().await?;
        let reply = conn.request(SEND_TRANSACTION, Body::json(tx)?).await?;
        decode_body(SEND_TRANSACTION, &reply)
    }

    /// The node pushes balances instead of replying: subscribe to the
    /// event, then emit the request that provokes the push, and wait for
    /// the first update.
    pub async fn balance_for_address(
        &self,
        address: &str,
    ) -> Result<BalanceUpdate, NodeClientError> {
        let conn = self.locator.find_node().await?;
        let mut updates = conn.subscribe_channel(GET_BALANCE_FOR_ADDRESS);
        conn.emit(
            GET_BALANCE_FOR_ADDRESS,
            Body::json(&BalanceRequest {
                address: address.to_string(),
            })?,
        )?;

        let pushed = tokio::time::timeout(conn.request_timeout(), updates.recv()).await;
        conn.unsubscribe(GET_BALANCE_FOR_ADDRESS);

        let frame = pushed
            .map_err(|_| NodeClientError::RequestTimeout {
                event: GET_BALANCE_FOR_ADDRESS.to_string(),
            })?
            .ok_or(NodeClientError::ConnectionClosed)?;
        decode_body(GET_BALANCE_FOR_ADDRESS, &frame)
    }

    /// Fetch the transaction history touching `address`.
    pub async fn transactions_for_address(
        &self,
        address: &str,
    ) -> Result<Vec<Transaction>, NodeClientError> {
        let conn = self.locator.find_node().await?;
        let reply = conn
            .request(
                GET_TRANSACTIONS_FOR_ADDRESS,
                Body::json(&TransactionsRequest {
                    address: address.to_string(),
                })?,
            )
            .await?;
        let list: TransactionList = decode_body(GET_TRANSACTIONS_FOR_ADDRESS, &reply)?;
        Ok(list.transactions)
    }

    /// Stream `block-verified` pushes from the node. The subscription lives
    /// on the current connection and is not carried across a reconnect;
    /// the receiver simply dries up when the connection closes.
    pub async fn on_block_verified(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<BlockVerified>, NodeClientError> {
        let conn = self.locator.find_node().await?;
        let (tx, rx) = mpsc::unbounded_channel();
        conn.subscribe(BLOCK_VERIFIED, move |frame| {
            match decode_body::<BlockVerified>(BLOCK_VERIFIED, &frame) {
                Ok(block) => {
                    let _ = tx.send(block);
                }
                Err(e) => tracing::warn!(error = %e, "dropping undecodable block-verified push"),
            }
        });
        Ok(rx)
    }
}

/// Decode a frame's JSON body into `T`. A non-empty text body is JSON-parsed
/// as a fallback — the node does not always stamp `content-type` on pushes.
fn decode_body<T: DeserializeOwned>(event: &str, frame: &Frame) -> Result<T, NodeClientError> {
    match &frame.body {
        Body::Json(value) => Ok(serde_json::from_value(value.clone())?),
        Body::Text(text) if !text.trim().is_empty() => Ok(serde_json::from_str(text)?),
        Body::Text(_) => Err(NodeClientError::MissingBody {
            event: event.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_body_prefers_json() {
        let frame = Frame::json("e", "m", &serde_json::json!({"status": "ok"})).unwrap();
        let ack: TransactionAck = decode_body("e", &frame).unwrap();
        assert!(ack.is_ok());
    }

    #[test]
    fn decode_body_parses_untagged_text() {
        let frame = Frame::text("e", "m", r#"{"status":"ok"}"#);
        let ack: TransactionAck = decode_body("e", &frame).unwrap();
        assert!(ack.is_ok());
    }

    #[test]
    fn decode_body_rejects_empty_text() {
        let frame = Frame::text("e", "m", "");
        let err = decode_body::<TransactionAck>("e", &frame).unwrap_err();
        assert!(matches!(err, NodeClientError::MissingBody { .. }));
    }
}
