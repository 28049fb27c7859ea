use serde::{Deserialize, Serialize};

/// A transfer as it travels to and from the node.
///
/// `signature` covers the canonical `{from, to, amount, timestamp}` payload
/// and `hash` is the SHA-256 of that same payload, so two transactions with
/// equal hashes are the same transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: f64,
    /// Millisecond UNIX timestamp, as the node expects it.
    pub timestamp: i64,
    pub signature: String,
    pub hash: String,
}
