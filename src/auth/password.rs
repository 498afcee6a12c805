//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so verification picks its parameters up
//! from the stored hash rather than from the current defaults.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::OnceLock;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;

const DUMMY_PASSWORD: &str = "attendance-portal-dummy";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Hash a password with the default Argon2id parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_with(Argon2::default(), password)
}

/// Hash a password with explicit memory (KiB) and iteration costs.
pub fn hash_password_with_cost(
    password: &str,
    memory_kib: u32,
    iterations: u32,
) -> Result<String, PasswordError> {
    let params = Params::new(memory_kib, iterations, 1, None)
        .map_err(|e| PasswordError::Params(e.to_string()))?;
    hash_with(Argon2::new(Algorithm::Argon2id, Version::V0x13, params), password)
}

fn hash_with(argon2: Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a password against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Burn one default-cost verification and report failure.
///
/// Used when no account matches, so unknown and known emails take the same
/// time to reject.
pub fn verify_against_dummy(password: &str) -> bool {
    match dummy_hash() {
        Some(hash) => {
            let _ = verify_password(password, hash);
        }
        None => tracing::error!("Dummy password hash unavailable"),
    }
    false
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password(DUMMY_PASSWORD).ok())
        .as_deref()
}

/// Whether `stored` parses as a PHC hash string.
pub fn is_well_formed(stored: &str) -> bool {
    PasswordHash::new(stored).is_ok()
}
