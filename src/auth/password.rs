//! Password hashing with bcrypt.

use crate::errors::Result;
use tracing::warn;

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
// Minimum cost keeps the test suite fast.
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

/// Hashes a plain-text password for storage.
///
/// # Errors
/// Returns `Error::Bcrypt` if hashing fails.
pub fn hash_password(plain: &str) -> Result<String> {
    Ok(bcrypt::hash(plain, BCRYPT_COST)?)
}

/// Checks a plain-text password against a stored hash.
///
/// A stored value that is not a valid bcrypt hash never matches.
#[must_use]
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or_else(|e| {
        warn!("Stored password hash could not be checked: {e}");
        false
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("", ""));
    }
}
