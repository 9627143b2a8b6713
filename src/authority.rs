//! Authority abstraction for the subsidizer identity
//!
//! The nonced transaction builder only needs the subsidizer's public key;
//! signing happens elsewhere. `KeypairAuthority` loads a Solana CLI keypair
//! so the public key can be taken from the same file the signer uses.

use std::path::Path;

use ed25519_dalek::SigningKey;
use thiserror::Error;

use crate::solana::PublicKey;

#[derive(Error, Debug)]
pub enum AuthorityError {
    #[error("Failed to read keypair file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse keypair JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),
}

/// Anything that can vouch for a public identity.
pub trait Authority: Send + Sync {
    fn public_key(&self) -> PublicKey;
}

/// A bare key is its own authority.
impl Authority for PublicKey {
    fn public_key(&self) -> PublicKey {
        *self
    }
}

/// Authority backed by an ed25519 keypair.
///
/// The secret half is checked against the public half on load and then
/// dropped; only the public key is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypairAuthority {
    public_key: PublicKey,
}

impl KeypairAuthority {
    /// Load from 64 keypair bytes: 32-byte secret seed then 32-byte public key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthorityError> {
        let keypair: &[u8; 64] = bytes.try_into().map_err(|_| {
            AuthorityError::InvalidKeypair(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            ))
        })?;
        if keypair.iter().all(|&b| b == 0) {
            return Err(AuthorityError::InvalidKeypair(
                "all-zero key rejected".to_string(),
            ));
        }

        let signing_key = SigningKey::from_keypair_bytes(keypair)
            .map_err(|e| AuthorityError::InvalidKeypair(e.to_string()))?;

        Ok(Self {
            public_key: PublicKey::new(signing_key.verifying_key().to_bytes()),
        })
    }

    /// Load a keypair file: a JSON array of 64 numbers, or 64 raw bytes.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthorityError> {
        let raw = std::fs::read(path.as_ref())?;
        if raw.len() == 64 {
            return Self::from_bytes(&raw);
        }
        let bytes: Vec<u8> = serde_json::from_slice(&raw)?;
        Self::from_bytes(&bytes)
    }
}

impl Authority for KeypairAuthority {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn keypair_bytes(seed: u8) -> Vec<u8> {
        let signing_key = SigningKey::from_bytes(&[seed; 32]);
        let mut bytes = signing_key.to_bytes().to_vec();
        bytes.extend_from_slice(&signing_key.verifying_key().to_bytes());
        bytes
    }

    #[test]
    fn test_public_key_is_own_authority() {
        let key = PublicKey::new([4u8; 32]);
        assert_eq!(key.public_key(), key);
    }

    #[test]
    fn test_from_bytes_derives_public_key() {
        let bytes = keypair_bytes(7);
        let authority = KeypairAuthority::from_bytes(&bytes).unwrap();
        assert_eq!(authority.public_key().as_bytes()[..], bytes[32..]);
    }

    #[test]
    fn test_rejects_mismatched_halves() {
        let mut bytes = keypair_bytes(7);
        bytes[63] ^= 0xff;
        assert!(matches!(
            KeypairAuthority::from_bytes(&bytes),
            Err(AuthorityError::InvalidKeypair(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_length_and_zero() {
        assert!(KeypairAuthority::from_bytes(&[1u8; 32]).is_err());
        assert!(KeypairAuthority::from_bytes(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let bytes = keypair_bytes(9);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&bytes).unwrap().as_bytes())
            .unwrap();

        let authority = KeypairAuthority::from_file(file.path()).unwrap();
        assert_eq!(
            authority,
            KeypairAuthority::from_bytes(&bytes).unwrap()
        );
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            KeypairAuthority::from_file("/nonexistent/keypair.json"),
            Err(AuthorityError::Io(_))
        ));
    }
}
