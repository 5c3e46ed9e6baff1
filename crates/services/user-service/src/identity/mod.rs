//! Identity directory gateway - accounts in the external identity provider.
//!
//! Authentication credentials live in the identity provider; the local store
//! keeps the profile. The two are kept in step by explicit calls from the
//! lifecycle service, not by a shared transaction.

mod keycloak;

use async_trait::async_trait;

use common::AppResult;
use domain::{NewUser, Role, SecretString};

pub use keycloak::KeycloakDirectory;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account to provision in the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryAccount {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Plaintext login secret; the identity provider stores its own hash
    pub password: SecretString,
    /// Client role granted to the account
    pub role: Role,
}

impl From<&NewUser> for DirectoryAccount {
    fn from(candidate: &NewUser) -> Self {
        Self {
            user_name: candidate.user_name.clone(),
            first_name: candidate.first_name.clone(),
            last_name: candidate.last_name.clone(),
            password: candidate.password.clone(),
            role: candidate.role,
        }
    }
}

/// Identity directory trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Create an enabled account and grant its role
    async fn create_account(&self, account: &DirectoryAccount) -> AppResult<()>;

    /// Remove the account registered under `user_name`
    async fn delete_account(&self, user_name: &str) -> AppResult<()>;
}
