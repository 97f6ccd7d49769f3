//! AES-256-GCM encryption/decryption for record blobs.
//!
//! AES-GCM is an AEAD construction, so every blob carries both
//! confidentiality and integrity: tampered or truncated ciphertext fails
//! authentication instead of decoding to garbage.
//!
//! Blob layout: nonce (12 bytes) || ciphertext (plaintext + 16-byte tag).
//! The nonce is random per encryption, so the same plaintext never produces
//! the same blob twice.

use crate::error::{Result, StoreError};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::key_derivation::KEY_LEN;

/// Nonce length (bytes) - 96 bits.
pub const NONCE_LEN: usize = 12;

/// Authentication tag length (bytes) - 128 bits.
pub const TAG_LEN: usize = 16;

/// Encrypts and decrypts record blobs with a fixed 32-byte key.
pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl Encryptor {
    /// Build an encryptor from a 32-byte key.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        // Length is enforced by the array type.
        let cipher = Aes256Gcm::new_from_slice(key).expect("Invalid key length");
        Self { cipher }
    }

    /// Encrypt with a fresh random nonce.
    /// Returns: nonce (12 bytes) || ciphertext (plaintext + 16-byte tag).
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| StoreError::Decode(format!("encryption failed: {}", e)))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(blob)
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// A wrong key, a truncated blob or any bit flip in the ciphertext
    /// yields `StoreError::Decode`, never partial plaintext.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(StoreError::Decode("encrypted blob too short".to_string()));
        }

        let nonce = Nonce::from_slice(&blob[..NONCE_LEN]);
        let ciphertext = &blob[NONCE_LEN..];

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| StoreError::Decode("decryption failed: wrong key or corrupted data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() -> Result<()> {
        let encryptor = Encryptor::new(&test_key());
        let plaintext = br#"{"username":"john_doe","score":100}"#;

        let blob = encryptor.encrypt(plaintext)?;
        let decrypted = encryptor.decrypt(&blob)?;

        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
        Ok(())
    }

    #[test]
    fn test_blob_size() -> Result<()> {
        let encryptor = Encryptor::new(&test_key());
        let plaintext = b"test";

        let blob = encryptor.encrypt(plaintext)?;

        // Blob size = nonce (12) + plaintext + tag (16)
        assert_eq!(blob.len(), NONCE_LEN + plaintext.len() + TAG_LEN);
        Ok(())
    }

    #[test]
    fn test_different_nonce_each_time() -> Result<()> {
        let encryptor = Encryptor::new(&test_key());
        let plaintext = b"same message";

        let blob1 = encryptor.encrypt(plaintext)?;
        let blob2 = encryptor.encrypt(plaintext)?;

        // Same plaintext, different nonce, different blob.
        assert_ne!(blob1, blob2);
        Ok(())
    }

    #[test]
    fn test_wrong_key_fails() -> Result<()> {
        let encryptor1 = Encryptor::new(&test_key());
        let encryptor2 = Encryptor::new(&[1u8; KEY_LEN]);

        let blob = encryptor1.encrypt(b"secret message")?;

        let result = encryptor2.decrypt(&blob);
        assert!(matches!(result, Err(StoreError::Decode(_))));
        Ok(())
    }

    #[test]
    fn test_tampered_blob_fails() -> Result<()> {
        let encryptor = Encryptor::new(&test_key());

        let mut blob = encryptor.encrypt(b"secret message")?;
        if let Some(byte) = blob.last_mut() {
            *byte ^= 0xFF;
        }

        let result = encryptor.decrypt(&blob);
        assert!(matches!(result, Err(StoreError::Decode(_))));
        Ok(())
    }

    #[test]
    fn test_truncated_blob_fails() {
        let encryptor = Encryptor::new(&test_key());

        let result = encryptor.decrypt(&[0u8; NONCE_LEN + TAG_LEN - 1]);
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
