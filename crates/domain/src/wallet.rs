use serde::{Deserialize, Serialize};

/// Persisted wallet state.
///
/// The address is the hex-encoded public half of the key pair; the private
/// key round-trips through hex so the wallet file is plain JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wallet {
    pub address: String,
    pub private_key: String,
    /// Last balance reported by the node. Informational only; the node is
    /// the source of truth.
    #[serde(default)]
    pub balance: f64,
}
