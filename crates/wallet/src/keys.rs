//! Wallet key pairs: generation, addressing, and signing.
//!
//! The wallet address is the hex-encoded public half of an ed25519 key
//! pair; the private half round-trips through hex so the wallet file stays
//! plain JSON.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use sw_domain::Wallet;

use crate::error::WalletError;

pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generate a fresh key pair from OS randomness.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a key pair from a hex-encoded private key.
    pub fn from_private_hex(private_key: &str) -> Result<Self, WalletError> {
        let bytes: [u8; 32] = hex::decode(private_key)?
            .try_into()
            .map_err(|_| WalletError::InvalidKey("private key must be 32 bytes".into()))?;
        Ok(Self {
            signing: SigningKey::from_bytes(&bytes),
        })
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing.to_bytes())
    }

    /// The wallet address derived from the public half.
    pub fn address(&self) -> String {
        hex::encode(self.signing.verifying_key().as_bytes())
    }

    /// Sign `message`, returning the hex-encoded signature.
    pub fn sign(&self, message: &[u8]) -> String {
        let signature: Signature = self.signing.sign(message);
        hex::encode(signature.to_bytes())
    }

    /// A fresh wallet for this key pair, with a zero balance.
    pub fn to_wallet(&self) -> Wallet {
        Wallet {
            address: self.address(),
            private_key: self.private_key_hex(),
            balance: 0.0,
        }
    }
}

/// Verify a hex-encoded signature made by the key behind `address`.
pub fn verify(address: &str, message: &[u8], signature: &str) -> Result<bool, WalletError> {
    let key_bytes: [u8; 32] = hex::decode(address)?
        .try_into()
        .map_err(|_| WalletError::InvalidKey("address must be 32 bytes".into()))?;
    let key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| WalletError::InvalidKey(e.to_string()))?;

    let sig_bytes: [u8; 64] = hex::decode(signature)?
        .try_into()
        .map_err(|_| WalletError::InvalidSignature)?;
    let signature = Signature::from_bytes(&sig_bytes);

    Ok(key.verify(message, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"hello node");
        assert!(verify(&keypair.address(), b"hello node", &signature).unwrap());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"amount: 5");
        assert!(!verify(&keypair.address(), b"amount: 500", &signature).unwrap());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let signer = Keypair::generate();
        let other = Keypair::generate();
        let signature = signer.sign(b"msg");
        assert!(!verify(&other.address(), b"msg", &signature).unwrap());
    }

    #[test]
    fn private_key_roundtrips_through_hex() {
        let keypair = Keypair::generate();
        let restored = Keypair::from_private_hex(&keypair.private_key_hex()).unwrap();
        assert_eq!(restored.address(), keypair.address());

        // The restored key signs identically (ed25519 is deterministic).
        assert_eq!(restored.sign(b"x"), keypair.sign(b"x"));
    }

    #[test]
    fn bad_private_key_is_rejected() {
        assert!(Keypair::from_private_hex("not hex").is_err());
        assert!(Keypair::from_private_hex("deadbeef").is_err());
    }

    #[test]
    fn to_wallet_matches_the_keypair() {
        let keypair = Keypair::generate();
        let wallet = keypair.to_wallet();
        assert_eq!(wallet.address, keypair.address());
        assert_eq!(wallet.balance, 0.0);
        let restored = Keypair::from_private_hex(&wallet.private_key).unwrap();
        assert_eq!(restored.address(), wallet.address);
    }
}
