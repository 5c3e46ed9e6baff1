//! Service layer - user lifecycle use cases.

mod credential;
mod outcome;
mod user_service;

#[cfg(test)]
mod tests;

pub use credential::{Argon2Hasher, CredentialHasher};
pub use outcome::{DirectorySync, LifecycleOutcome};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use credential::MockCredentialHasher;
