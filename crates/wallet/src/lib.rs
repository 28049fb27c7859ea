//! `sw-wallet` — keys, persistence, and transaction building.
//!
//! The node client treats these as boundary collaborators: this crate
//! supplies the signing function, the wallet `load`/`save` pair, and the
//! construction of signed transfers the client ships to the node.

pub mod error;
pub mod keys;
pub mod store;
pub mod tx;

pub use error::WalletError;
pub use keys::{verify, Keypair};
pub use store::WalletStore;
pub use tx::{build_transaction, build_transaction_at, verify_transaction, TransactionLedger};
