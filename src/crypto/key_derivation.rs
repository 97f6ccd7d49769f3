//! Key generation and Argon2id key derivation.
//!
//! Two ways to obtain the 32-byte store key:
//! - `generate_key`: fresh random key from the OS RNG. The caller persists
//!   it; this crate never stores it.
//! - `derive_key`: derive the key from a passphrase with Argon2id, which
//!   combines resistance to side-channel and GPU attacks.

use anyhow::{anyhow, bail, Context, Result};
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, Params,
};
use rand::{rngs::OsRng, RngCore};

/// Salt length (bytes).
pub const SALT_LEN: usize = 16;

/// Key length (bytes) - 256 bits for AES-256.
pub const KEY_LEN: usize = 32;

/// Argon2id parameters, balanced between security and interactive latency:
/// 64 MiB memory, 3 iterations, parallelism 4.
const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

/// Generate a fresh random 32-byte store key.
pub fn generate_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    key
}

/// Generate a random salt for key derivation.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 32-byte encryption key from a passphrase with Argon2id.
///
/// The same passphrase and salt always derive the same key, so the salt
/// must be persisted next to the encrypted data.
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> Result<[u8; KEY_LEN]> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(KEY_LEN),
    )
    .map_err(|e| anyhow!("Invalid Argon2 parameters: {}", e))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let salt_string = SaltString::encode_b64(salt)
        .map_err(|e| anyhow!("Cannot encode salt for Argon2: {}", e))?;

    let password_hash = argon2
        .hash_password(passphrase.as_bytes(), &salt_string)
        .map_err(|e| anyhow!("Cannot derive key from passphrase: {}", e))?;

    let hash_output = password_hash.hash.context("No hash output from Argon2")?;

    let hash_bytes = hash_output.as_bytes();
    if hash_bytes.len() < KEY_LEN {
        bail!("Argon2 hash output too short");
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&hash_bytes[..KEY_LEN]);

    Ok(key)
}

/// Derive a key with a freshly generated salt (first-time setup).
/// Returns both so the salt can be stored for later derivations.
pub fn derive_key_new(passphrase: &str) -> Result<([u8; KEY_LEN], [u8; SALT_LEN])> {
    let salt = generate_salt();
    let key = derive_key(passphrase, &salt)?;
    Ok((key, salt))
}
