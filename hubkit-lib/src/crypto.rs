//! Key pairs, signatures and address derivation.
//!
//! Signatures are Ed25519 over the SHA-256 digest of the message. Addresses
//! are the hex of the first 20 bytes of `SHA-256(public key)`; derivation is
//! one way.

use ed25519_dalek::{Signature as DalekSig, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::{HubError, Result};

/// Number of digest bytes kept when deriving an address.
const ADDRESS_LEN: usize = 20;

/// Identity string derived from a public key; the root of a storage namespace.
///
/// Only [`address_of`] creates one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Get the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ed25519 public key, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a 32-byte key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| HubError::validation(format!("invalid public key: {}", e)))
    }

    /// Raw key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Address derived from this key.
    pub fn address(&self) -> Address {
        address_of(self)
    }
}

impl FromStr for PublicKey {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| HubError::validation(format!("public key is not hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            HubError::validation(format!("public key must be 32 bytes, got {}", v.len()))
        })?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

/// Signing key plus its public half. Only this module touches the secret.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn random() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a key pair from a 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Build a key pair from a hex-encoded 32-byte secret.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| HubError::Config(format!("secret key is not hex: {}", e)))?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| HubError::Config("secret key must be 32 bytes".into()))?;
        Ok(Self::from_secret_bytes(&secret))
    }

    /// Hex-encoded secret, for exporting generated keys.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Public half of the pair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Address owned by this key pair.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Sign `message` with `keypair`.
pub fn sign(keypair: &KeyPair, message: &[u8]) -> [u8; 64] {
    let digest = Sha256::digest(message);
    keypair.signing_key.sign(&digest).to_bytes()
}

/// Verify `signature` over `message` under `public_key`.
///
/// Malformed signatures and mismatches both return `false`; the caller gets
/// no indication of which.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    let digest = Sha256::digest(message);
    public_key
        .0
        .verify(&digest, &DalekSig::from_bytes(&bytes))
        .is_ok()
}

/// Derive the address owned by `public_key`.
pub fn address_of(public_key: &PublicKey) -> Address {
    let digest = Sha256::digest(public_key.0.as_bytes());
    Address(hex::encode(&digest[..ADDRESS_LEN]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::random();
        let signature = sign(&keypair, b"hello hub");
        assert!(verify(&keypair.public_key(), b"hello hub", &signature));
    }

    #[test]
    fn test_modified_message_fails_verification() {
        let keypair = KeyPair::random();
        let signature = sign(&keypair, b"hello hub");
        assert!(!verify(&keypair.public_key(), b"hello hug", &signature));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let signer = KeyPair::random();
        let other = KeyPair::random();
        let signature = sign(&signer, b"hello hub");
        assert!(!verify(&other.public_key(), b"hello hub", &signature));
    }

    #[test]
    fn test_truncated_signature_is_rejected() {
        let keypair = KeyPair::random();
        let signature = sign(&keypair, b"hello hub");
        assert!(!verify(&keypair.public_key(), b"hello hub", &signature[..63]));
    }

    #[test]
    fn test_address_is_deterministic() {
        let keypair = KeyPair::from_secret_bytes(&[7u8; 32]);
        let a = address_of(&keypair.public_key());
        let b = keypair.address();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), ADDRESS_LEN * 2);
    }

    #[test]
    fn test_addresses_differ_between_keys() {
        let a = KeyPair::from_secret_bytes(&[1u8; 32]).address();
        let b = KeyPair::from_secret_bytes(&[2u8; 32]).address();
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_key_hex_round_trip() {
        let keypair = KeyPair::random();
        let hex = keypair.public_key().to_hex();
        let parsed: PublicKey = hex.parse().unwrap();
        assert_eq!(parsed, keypair.public_key());
    }

    #[test]
    fn test_public_key_rejects_bad_input() {
        assert!("zz".parse::<PublicKey>().is_err());
        assert!("abcd".parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_secret_hex_round_trip() {
        let keypair = KeyPair::random();
        let restored = KeyPair::from_secret_hex(&keypair.secret_hex()).unwrap();
        assert_eq!(restored.public_key(), keypair.public_key());
    }

    /// RFC 8032 test vector 1 public key derivation.
    #[test]
    fn test_rfc8032_public_key_derivation() {
        let secret = hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
            .unwrap();
        let secret: [u8; 32] = secret.try_into().unwrap();
        let keypair = KeyPair::from_secret_bytes(&secret);
        assert_eq!(
            keypair.public_key().to_hex(),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }
}
