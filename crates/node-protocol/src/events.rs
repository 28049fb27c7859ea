//! The logical operations carried on the node channel, as typed payloads.
//!
//! Event names are the server's routing contract. Payloads are decoded once
//! at the client's API boundary; nothing downstream touches raw header maps.

use serde::{Deserialize, Serialize};

use sw_domain::Transaction;

/// Request/reply: submit a signed transaction.
pub const SEND_TRANSACTION: &str = "send-transaction";
/// Emit-then-push: ask the node to push the balance for an address. The
/// reply arrives on the same event name as a push, not as a correlated
/// reply.
pub const GET_BALANCE_FOR_ADDRESS: &str = "get-balance-for-address";
/// Request/reply: fetch the transactions touching an address.
pub const GET_TRANSACTIONS_FOR_ADDRESS: &str = "get-transactions-for-address";
/// Server push: a block was verified.
pub const BLOCK_VERIFIED: &str = "block-verified";

/// Reply to [`SEND_TRANSACTION`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionAck {
    pub status: String,
}

impl TransactionAck {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Outbound payload for [`GET_BALANCE_FOR_ADDRESS`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceRequest {
    pub address: String,
}

/// Pushed payload for [`GET_BALANCE_FOR_ADDRESS`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceUpdate {
    pub address: String,
    pub balance: f64,
}

/// Outbound payload for [`GET_TRANSACTIONS_FOR_ADDRESS`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionsRequest {
    pub address: String,
}

/// Reply to [`GET_TRANSACTIONS_FOR_ADDRESS`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
}

/// Pushed payload for [`BLOCK_VERIFIED`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockVerified {
    pub hash: String,
    pub height: u64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}
