//! Argon2 password hashing

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use onehand_core::Password;
use rand::rngs::OsRng;

use super::AuthError;

/// Hash a password into a PHC string.
pub fn hash_password(password: &Password) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC string.
///
/// A wrong password is `Ok(false)`; a malformed stored hash is an error.
pub fn verify_password(candidate: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}

/// Hash checked when no account matches, so a miss costs as much as a
/// wrong password.
static DECOY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let decoy = Password::new("no account has this password").ok()?;
    hash_password(&decoy).ok()
});

/// Run a verification that cannot succeed. Always `false`.
pub fn verify_decoy(candidate: &str) -> bool {
    if let Some(hash) = DECOY_HASH.as_deref() {
        let _ = verify_password(candidate, hash);
    }
    false
}

/// Salt of a stored PHC string. It changes on every password change, so
/// it pins a token to the password it was issued against.
pub fn password_stamp(stored_hash: &str) -> Result<String, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    parsed
        .salt
        .map(|salt| salt.as_str().to_string())
        .ok_or_else(|| AuthError::Hashing("stored hash has no salt".into()))
}
