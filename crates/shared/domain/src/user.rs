//! User domain entity and related types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DELETED_NAME_SEPARATOR, ROLE_ADMIN, ROLE_EMPLOYEE, ROLE_MANAGER};
use crate::credential::Credential;
use crate::error::DomainError;
use crate::secret::SecretString;

/// User roles enumeration
///
/// Serialized as the role description (`"Admin"`, `"Manager"`, `"Employee"`),
/// which is also the client role name granted in the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Employee];

    /// Role description as stored and exchanged
    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Manager => ROLE_MANAGER,
            Role::Employee => ROLE_EMPLOYEE,
        }
    }

    /// Rule deciding whether a user with this role may be soft-deleted
    pub fn deletion_rule(&self) -> DeletionRule {
        DeletionRule::for_role(*self)
    }
}

/// Case-insensitive parse of a role description.
impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.description().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownRole(s.to_string()))
    }
}

impl TryFrom<&str> for Role {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.description().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Which outstanding work, if any, blocks deleting a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionRule {
    /// Deletion is always permitted
    Unconditional,
    /// Permitted only with zero non-completed projects assigned as manager
    NoOpenProjects,
    /// Permitted only with zero non-completed tasks assigned as employee
    NoOpenTasks,
}

impl DeletionRule {
    /// Every role maps to exactly one rule; there is no fallback arm.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => DeletionRule::Unconditional,
            Role::Manager => DeletionRule::NoOpenProjects,
            Role::Employee => DeletionRule::NoOpenTasks,
        }
    }

    /// Decide given the number of open work items found for the rule.
    pub fn decide(&self, open_items: usize) -> DeletionDecision {
        match self {
            DeletionRule::Unconditional => DeletionDecision::Permitted,
            DeletionRule::NoOpenProjects | DeletionRule::NoOpenTasks if open_items == 0 => {
                DeletionDecision::Permitted
            }
            DeletionRule::NoOpenProjects | DeletionRule::NoOpenTasks => {
                DeletionDecision::Blocked { open_items }
            }
        }
    }
}

/// Outcome of the deletion-safety policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionDecision {
    Permitted,
    Blocked { open_items: usize },
}

impl DeletionDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, DeletionDecision::Permitted)
    }
}

/// User domain entity
///
/// The serialized form is the external representation of a user: the stored
/// credential is never emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub credential: Credential,
    pub enabled: bool,
    pub is_deleted: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if user is active (not soft-deleted)
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Name the record takes once soft-deleted: `<user_name>-<id>`
    pub fn deleted_user_name(&self) -> String {
        format!("{}{}{}", self.user_name, DELETED_NAME_SEPARATOR, self.id)
    }

    /// Soft delete the user, freeing the original name for reuse.
    ///
    /// Deleted is terminal: calling this twice does not rename again.
    pub fn soft_delete(&mut self) {
        if self.is_deleted {
            return;
        }
        self.user_name = self.deleted_user_name();
        self.is_deleted = true;
        self.updated_at = Utc::now();
    }

    /// Build the record that replaces `self` after a profile update.
    ///
    /// The durable id, creation time and soft-delete flag come from `self`;
    /// every profile field comes from `update`. `credential` replaces the
    /// stored hash when present.
    pub fn merge(&self, update: UserUpdate, credential: Option<Credential>) -> User {
        User {
            id: self.id,
            user_name: update.user_name,
            first_name: update.first_name,
            last_name: update.last_name,
            credential: credential.unwrap_or_else(|| self.credential.clone()),
            enabled: update.enabled,
            is_deleted: self.is_deleted,
            role: update.role,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// Registration candidate
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Plaintext; hashed before persistence
    pub password: SecretString,
    /// Ignored on creation: new users are always enabled
    #[serde(default)]
    pub enabled: bool,
    pub role: Role,
}

/// Credential part of a profile update
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialChange {
    /// Keep the stored credential
    #[default]
    Keep,
    /// Hash and store this secret
    Replace(SecretString),
}

/// Profile update candidate, matched to the existing record by `user_name`
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
    pub role: Role,
    #[serde(default)]
    pub credential: CredentialChange,
}

/// Validated, hashed record ready for first insertion (no id yet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub credential: Credential,
    pub enabled: bool,
    pub role: Role,
}

impl UserDraft {
    pub fn new(candidate: &NewUser, credential: Credential) -> Self {
        Self {
            user_name: candidate.user_name.clone(),
            first_name: candidate.first_name.clone(),
            last_name: candidate.last_name.clone(),
            credential,
            enabled: candidate.enabled,
            role: candidate.role,
        }
    }
}
