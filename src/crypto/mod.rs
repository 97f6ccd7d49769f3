//! Crypto module - symmetric protection for stored records.
//!
//! This module contains:
//! - AES-256-GCM encryption/decryption for record blobs
//! - Argon2id key derivation from a passphrase
//! - Random key and salt generation
//!
//! The encryption key is caller-supplied, generated once and persisted
//! outside this crate. Losing it makes all encrypted local and remote data
//! permanently unreadable; there is no key-recovery mechanism.

pub mod encryption;
pub mod key_derivation;

pub use encryption::{Encryptor, NONCE_LEN, TAG_LEN};
pub use key_derivation::{derive_key, derive_key_new, generate_key, generate_salt, KEY_LEN, SALT_LEN};
