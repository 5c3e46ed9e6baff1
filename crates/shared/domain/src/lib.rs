//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! users and their roles, the deletion rules attached to each role, the
//! work-item references that block deletion, and credential handling.

pub mod constants;
pub mod credential;
pub mod error;
pub mod secret;
pub mod user;
pub mod work_item;

pub use constants::*;
pub use credential::Credential;
pub use error::{DomainError, DomainResult};
pub use secret::SecretString;
pub use user::{
    CredentialChange, DeletionDecision, DeletionRule, NewUser, Role, User, UserDraft, UserUpdate,
};
pub use work_item::{ProjectRef, TaskRef, WorkStatus};
