//! # Partner Passwords
//!
//! Argon2id hashing for channel-partner credentials. Hashes are stored as PHC
//! strings, so parameters travel with the hash.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Hashes a password for storage.
///
/// The 16-byte salt comes from a v4 UUID, which is drawn from the OS RNG.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| DbError::Hashing(e.to_string()))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// A hash of a throwaway password, verified against when the identifier is
/// unknown so both failure paths cost the same.
pub(crate) fn decoy_hash() -> &'static str {
    "$argon2id$v=19$m=19456,t=2,p=1$YXRlbGllcmRlY295c2FsdA$Lq0sYzwQAvLQ0K8iXz6Nf1fV3n6ZsbqG8cW7K8v2A9c"
}
