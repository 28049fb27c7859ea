//! Transaction building and the in-memory ledger.

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

use sw_domain::Transaction;

use crate::error::WalletError;
use crate::keys::Keypair;

/// The canonical signed portion of a transaction. Field order is fixed so
/// signer and verifier hash identical bytes.
#[derive(Serialize)]
struct SigningPayload<'a> {
    from: &'a str,
    to: &'a str,
    amount: f64,
    timestamp: i64,
}

/// Build and sign a transfer from the wallet behind `keypair`, stamped with
/// the current time.
pub fn build_transaction(
    keypair: &Keypair,
    to: &str,
    amount: f64,
) -> Result<Transaction, WalletError> {
    build_transaction_at(keypair, to, amount, Utc::now().timestamp_millis())
}

/// As [`build_transaction`], with an explicit timestamp.
pub fn build_transaction_at(
    keypair: &Keypair,
    to: &str,
    amount: f64,
    timestamp: i64,
) -> Result<Transaction, WalletError> {
    let from = keypair.address();
    let payload = SigningPayload {
        from: &from,
        to,
        amount,
        timestamp,
    };
    let bytes = serde_json::to_vec(&payload)?;

    let signature = keypair.sign(&bytes);
    let hash = hex::encode(Sha256::digest(&bytes));

    Ok(Transaction {
        from,
        to: to.to_string(),
        amount,
        timestamp,
        signature,
        hash,
    })
}

/// Check that `tx.signature` covers the canonical payload and was made by
/// the key behind `tx.from`.
pub fn verify_transaction(tx: &Transaction) -> Result<bool, WalletError> {
    let payload = SigningPayload {
        from: &tx.from,
        to: &tx.to,
        amount: tx.amount,
        timestamp: tx.timestamp,
    };
    let bytes = serde_json::to_vec(&payload)?;
    crate::keys::verify(&tx.from, &bytes, &tx.signature)
}

/// Newest-first transaction list with duplicate suppression by hash.
#[derive(Default)]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front. A transaction whose hash is already present is
    /// ignored; returns whether the transaction was added.
    pub fn add(&mut self, tx: Transaction) -> bool {
        if self.transactions.iter().any(|t| t.hash == tx.hash) {
            return false;
        }
        self.transactions.insert(0, tx);
        true
    }

    /// Replace the list wholesale, e.g. from a node history reply.
    pub fn replace(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_transaction_verifies() {
        let keypair = Keypair::generate();
        let tx = build_transaction_at(&keypair, "to-addr", 5.0, 1_700_000_000_000).unwrap();

        assert_eq!(tx.from, keypair.address());
        assert_eq!(tx.to, "to-addr");
        assert!(verify_transaction(&tx).unwrap());
    }

    #[test]
    fn tampered_amount_fails_verification() {
        let keypair = Keypair::generate();
        let mut tx = build_transaction_at(&keypair, "to-addr", 5.0, 1_700_000_000_000).unwrap();
        tx.amount = 500.0;
        assert!(!verify_transaction(&tx).unwrap());
    }

    #[test]
    fn same_inputs_hash_identically_different_time_does_not() {
        let keypair = Keypair::generate();
        let a = build_transaction_at(&keypair, "B", 1.0, 1000).unwrap();
        let b = build_transaction_at(&keypair, "B", 1.0, 1000).unwrap();
        let c = build_transaction_at(&keypair, "B", 1.0, 2000).unwrap();

        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn ledger_rejects_duplicates_and_keeps_newest_first() {
        let keypair = Keypair::generate();
        let older = build_transaction_at(&keypair, "B", 1.0, 1000).unwrap();
        let newer = build_transaction_at(&keypair, "B", 2.0, 2000).unwrap();

        let mut ledger = TransactionLedger::new();
        assert!(ledger.add(older.clone()));
        assert!(ledger.add(newer.clone()));
        assert!(!ledger.add(older.clone()));

        assert_eq!(ledger.len(), 2);
        let hashes: Vec<_> = ledger.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec![newer.hash.as_str(), older.hash.as_str()]);
    }

    #[test]
    fn replace_seeds_the_ledger() {
        let keypair = Keypair::generate();
        let tx = build_transaction_at(&keypair, "B", 1.0, 1000).unwrap();

        let mut ledger = TransactionLedger::new();
        ledger.replace(vec![tx.clone()]);
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.add(tx));
    }
}
