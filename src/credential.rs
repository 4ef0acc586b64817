//! One-way password hashing (bcrypt).

/// bcrypt work factor used for every new hash.
pub const HASH_COST: u32 = 8;

/// bcrypt only reads the first 72 bytes of its input; longer secrets are
/// refused instead of silently truncated.
pub const MAX_SECRET_BYTES: usize = 72;

#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    /// The caller supplied an unusable secret.
    #[error("{0}")]
    InvalidSecret(String),
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Hash `secret` with a fresh random salt embedded in the output.
pub fn hash_password(secret: &str) -> Result<String, CredentialError> {
    if secret.is_empty() {
        return Err(CredentialError::InvalidSecret("password is required".into()));
    }
    if secret.len() > MAX_SECRET_BYTES {
        return Err(CredentialError::InvalidSecret(format!(
            "password exceeds {MAX_SECRET_BYTES} bytes"
        )));
    }
    bcrypt::hash(secret, HASH_COST).map_err(|e| CredentialError::Encoding(e.to_string()))
}

/// `Ok(false)` on mismatch; errors only when `hash` is not a bcrypt hash.
pub fn verify_password(secret: &str, hash: &str) -> Result<bool, CredentialError> {
    bcrypt::verify(secret, hash).map_err(|e| CredentialError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash_password("correct horse").unwrap();
        assert_ne!(h, "correct horse");
        assert!(verify_password("correct horse", &h).unwrap());
        assert!(!verify_password("battery staple", &h).unwrap());
    }

    #[test]
    fn salt_differs_per_call() {
        let a = hash_password("pw").unwrap();
        let b = hash_password("pw").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("pw", &a).unwrap());
        assert!(verify_password("pw", &b).unwrap());
    }

    #[test]
    fn rejects_empty_and_oversized_secrets() {
        assert!(matches!(hash_password(""), Err(CredentialError::InvalidSecret(_))));
        let long = "x".repeat(MAX_SECRET_BYTES + 1);
        let err = hash_password(&long).unwrap_err();
        assert_eq!(err.to_string(), "password exceeds 72 bytes");
        assert!(hash_password(&"x".repeat(MAX_SECRET_BYTES)).is_ok());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(verify_password("pw", "not-a-hash"), Err(CredentialError::Encoding(_))));
    }
}
