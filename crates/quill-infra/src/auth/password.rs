//! Argon2 password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use quill_core::ports::{AuthError, PasswordService};

/// Argon2id with the crate's default parameters.
#[derive(Default)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// A stored hash that cannot be parsed is an error, a wrong password is `Ok(false)`.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let service = Argon2PasswordService::new();

        let hash = service.hash("correct horse battery").unwrap();

        assert!(service.verify("correct horse battery", &hash).unwrap());
        assert!(!service.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let service = Argon2PasswordService::new();
        assert_ne!(service.hash("same").unwrap(), service.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let service = Argon2PasswordService::new();
        assert!(matches!(
            service.verify("anything", "not-a-phc-string"),
            Err(AuthError::HashingError(_))
        ));
    }
}
