//! One-way credential transform.

use async_trait::async_trait;

use common::AppResult;
use domain::{Credential, SecretString};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Turns a plaintext secret into its stored representation.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, plain: &SecretString) -> AppResult<String>;
}

/// Argon2id with a fresh random salt per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, plain: &SecretString) -> AppResult<String> {
        Ok(Credential::hash(plain)?.into_string())
    }
}
