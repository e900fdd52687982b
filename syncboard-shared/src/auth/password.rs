/// Password hashing using Argon2id
///
/// All account passwords are stored as Argon2id hashes in PHC string
/// format. Parameters follow the OWASP recommendation for interactive
/// logins:
///
/// - Memory: 64 MB (65536 KB)
/// - Iterations: 3 passes
/// - Parallelism: 4 lanes
/// - Output: 32-byte hash
///
/// Length and format rules for incoming passwords are enforced on the
/// request types at the API layer, not here.
///
/// # Example
///
/// ```
/// use syncboard_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("hunter2hunter2")?;
///
/// assert!(verify_password("hunter2hunter2", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, ParamsBuilder, Version};

/// Errors produced by password hashing and verification
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Hashing a new password failed
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The stored hash could not be parsed as a PHC string
    #[error("invalid password hash: {0}")]
    InvalidHash(String),

    /// Verification failed for a reason other than a wrong password
    #[error("password verification failed: {0}")]
    Verify(String),
}

/// Hashes a password with Argon2id and a random 16-byte salt
///
/// # Returns
///
/// The hash in PHC string format, e.g.
/// `$argon2id$v=19$m=65536,t=3,p=4$...$...`. Algorithm, parameters, and
/// salt are embedded, so nothing besides the string needs to be stored.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if parameter construction or hashing
/// fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::Hash(format!("invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// A wrong password is a normal outcome, not an error: the result is
/// `Ok(false)`. Errors are reserved for malformed hashes and internal
/// failures so that callers cannot confuse the two.
///
/// # Errors
///
/// Returns [`PasswordError::InvalidHash`] if the hash does not parse,
/// [`PasswordError::Verify`] for any other verification failure
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    // Parameters come from the hash itself, so the default instance works
    // for verification regardless of what they were at hashing time.
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format_and_params() {
        let hash = hash_password("test_password_123").expect("hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_salts_differ() {
        let hash1 = hash_password("same_password").expect("hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("hash 2 should succeed");

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("correct_password").expect("hash should succeed");

        assert!(verify_password("correct_password", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password").expect("hash should succeed");

        assert!(!verify_password("wrong_password", &hash).expect("verify should succeed"));
        assert!(!verify_password("", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_verify_password_invalid_hash_is_error() {
        assert!(verify_password("password", "not-a-phc-string").is_err());
        assert!(verify_password("password", "$argon2id$truncated").is_err());
    }

    #[test]
    fn test_hash_verify_roundtrip_unicode() {
        let password = "pässwörd-密码-🔒";
        let hash = hash_password(password).expect("hash should succeed");

        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }
}
