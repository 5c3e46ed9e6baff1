//! Credential value object - stored, one-way transformed secrets.
//!
//! The local user store only ever holds the Argon2 PHC string produced here.
//! The plaintext arrives as a [`SecretString`] and never leaves this module
//! in any other form.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{DomainError, DomainResult};
use crate::secret::SecretString;

/// Stored credential (hash) of a user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    /// Hash a plaintext secret with a fresh random salt.
    ///
    /// # Errors
    /// Returns a credential error if the hasher rejects the input.
    pub fn hash(plain: &SecretString) -> DomainResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain.expose().as_bytes(), &salt)
            .map_err(|e| DomainError::credential(format!("hash failed: {}", e)))?;
        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Wrap an existing hash (from the database).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plaintext secret against this hash.
    ///
    /// Malformed stored hashes never verify.
    pub fn verify(&self, plain: &SecretString) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Self::argon2()
                .verify_password(plain.expose().as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Credential> for String {
    fn from(credential: Credential) -> Self {
        credential.hash
    }
}
