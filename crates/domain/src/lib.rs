//! Shared domain types for the smpl-wallet workspace: wallet and
//! transaction shapes, configuration, and the common error type.

pub mod config;
pub mod error;
pub mod transaction;
pub mod wallet;

pub use config::{Config, NodeConfig, WalletConfig};
pub use error::{Error, Result};
pub use transaction::Transaction;
pub use wallet::Wallet;
