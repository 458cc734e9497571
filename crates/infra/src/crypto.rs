//! Token encryption at rest.
//!
//! Platform credentials are encrypted with AES-256-GCM before they are stored
//! in the database. The serialized payload (nonce + ciphertext + algorithm
//! marker) is base64-encoded so it fits in a TEXT column.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use shomer_domain::{Result, ShomerError};

const ALGORITHM: &str = "AES-256-GCM";

/// Serializable encrypted payload container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub algorithm: String,
}

/// AES-256-GCM cipher for credential payloads.
pub struct TokenCipher {
    key: Vec<u8>,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").field("key", &"[REDACTED]").finish()
    }
}

impl TokenCipher {
    /// Create a cipher from a raw 32-byte key.
    pub fn new(key: Vec<u8>) -> Result<Self> {
        if key.len() != 32 {
            return Err(ShomerError::Security(
                "token cipher key must be exactly 32 bytes".into(),
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| ShomerError::Security(format!("failed to create cipher: {e}")))?;

        Ok(Self { key, cipher })
    }

    /// Create a cipher from a 64-character hex key string.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let key = hex::decode(hex_key)
            .map_err(|e| ShomerError::Security(format!("invalid hex cipher key: {e}")))?;
        Self::new(key)
    }

    /// Generate a random 32-byte symmetric key.
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; 32];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt bytes and encode the payload as a base64 string.
    pub fn encrypt_to_string(&self, data: &[u8]) -> Result<String> {
        let nonce_bytes = generate_nonce();
        let ciphertext = self
            .cipher
            .encrypt(&Nonce::from(nonce_bytes), data)
            .map_err(|e| ShomerError::Security(format!("encryption failed: {e}")))?;

        let payload = EncryptedPayload {
            nonce: nonce_bytes.to_vec(),
            ciphertext,
            algorithm: ALGORITHM.to_string(),
        };
        let serialized = serde_json::to_vec(&payload)
            .map_err(|e| ShomerError::Security(format!("payload serialization failed: {e}")))?;
        Ok(BASE64.encode(serialized))
    }

    /// Decode a base64 string and decrypt the contained payload.
    pub fn decrypt_from_string(&self, encrypted: &str) -> Result<Vec<u8>> {
        let decoded = BASE64
            .decode(encrypted)
            .map_err(|e| ShomerError::Security(format!("base64 decode failed: {e}")))?;
        let payload: EncryptedPayload = serde_json::from_slice(&decoded)
            .map_err(|e| ShomerError::Security(format!("payload deserialization failed: {e}")))?;

        if payload.algorithm != ALGORITHM {
            return Err(ShomerError::Security(format!(
                "unsupported algorithm: {}",
                payload.algorithm
            )));
        }

        let nonce_array: [u8; 12] = payload.nonce.as_slice().try_into().map_err(|_| {
            ShomerError::Security("nonce must be exactly 12 bytes for AES-256-GCM".into())
        })?;

        self.cipher
            .decrypt(&Nonce::from(nonce_array), payload.ciphertext.as_ref())
            .map_err(|e| ShomerError::Security(format!("decryption failed: {e}")))
    }

    /// Short fingerprint of the current key, safe to log.
    pub fn key_fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        let result = hasher.finalize();
        BASE64.encode(&result[..8])
    }
}

fn generate_nonce() -> [u8; 12] {
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_key_has_correct_length() {
        assert_eq!(TokenCipher::generate_key().len(), 32);
    }

    #[test]
    fn rejects_invalid_key_size() {
        assert!(TokenCipher::new(vec![0; 16]).is_err());
    }

    #[test]
    fn encrypt_and_decrypt_round_trip() {
        let cipher = TokenCipher::new(TokenCipher::generate_key()).unwrap();

        let plaintext = b"refresh-token-payload";
        let encoded = cipher.encrypt_to_string(plaintext).unwrap();
        let decoded = cipher.decrypt_from_string(&encoded).unwrap();

        assert_eq!(decoded, plaintext);
    }

    #[test]
    fn from_hex_accepts_64_char_key() {
        let key = hex::encode(TokenCipher::generate_key());
        assert!(TokenCipher::from_hex(&key).is_ok());
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let cipher_a = TokenCipher::new(TokenCipher::generate_key()).unwrap();
        let cipher_b = TokenCipher::new(TokenCipher::generate_key()).unwrap();

        let encoded = cipher_a.encrypt_to_string(b"secret").unwrap();
        assert!(cipher_b.decrypt_from_string(&encoded).is_err());
    }

    #[test]
    fn fingerprint_is_stable_per_key() {
        let key = TokenCipher::generate_key();
        let a = TokenCipher::new(key.clone()).unwrap();
        let b = TokenCipher::new(key).unwrap();
        assert_eq!(a.key_fingerprint(), b.key_fingerprint());
    }
}
