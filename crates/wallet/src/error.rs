/// Errors from key handling, persistence, and transaction building.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid signature encoding")]
    InvalidSignature,
}
