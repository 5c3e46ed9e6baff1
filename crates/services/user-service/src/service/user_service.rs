//! User lifecycle service - creation, update, soft deletion and lookup.
//!
//! Local persistence always happens first. The identity directory is then
//! brought in step with an explicit call whose result is reported, not
//! rolled back.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use common::{AppError, AppResult, OptionExt};
use domain::{
    is_valid_role, Credential, CredentialChange, DeletionDecision, DeletionRule, NewUser, User,
    UserDraft, UserUpdate, DELETION_BLOCKED_MESSAGE,
};

use super::{CredentialHasher, DirectorySync, LifecycleOutcome};
use crate::identity::{DirectoryAccount, IdentityDirectory};
use crate::repository::{ProjectQuery, TaskQuery, UserRepository};

/// User service trait for dependency injection.
///
/// Lookups only ever see active (non-soft-deleted) users.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get the active user with exactly this name
    async fn get_by_user_name(&self, user_name: &str) -> AppResult<User>;

    /// List active users, given name descending
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Register a user locally and in the identity directory
    async fn create_user(&self, candidate: NewUser) -> AppResult<LifecycleOutcome<User>>;

    /// Replace the profile of an existing active user
    async fn update_user(&self, candidate: UserUpdate) -> AppResult<User>;

    /// Soft delete a user if no open work is assigned to them
    async fn delete_user(&self, user_name: &str) -> AppResult<DirectorySync>;

    /// List active users holding the role, matched ignoring case
    async fn list_users_by_role(&self, role: &str) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserService.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    directory: Arc<dyn IdentityDirectory>,
    projects: Arc<dyn ProjectQuery>,
    tasks: Arc<dyn TaskQuery>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserManager {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        directory: Arc<dyn IdentityDirectory>,
        projects: Arc<dyn ProjectQuery>,
        tasks: Arc<dyn TaskQuery>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            repo,
            directory,
            projects,
            tasks,
            hasher,
        }
    }

    /// Apply the deletion-safety rule for the user's role.
    ///
    /// Only the port the rule needs is queried.
    async fn deletion_decision(&self, user: &User) -> AppResult<DeletionDecision> {
        let rule = DeletionRule::for_role(user.role);
        let open_items = match rule {
            DeletionRule::Unconditional => 0,
            DeletionRule::NoOpenProjects => self
                .projects
                .list_open_projects_for_manager(user)
                .await?
                .len(),
            DeletionRule::NoOpenTasks => self.tasks.list_open_tasks_for_employee(user).await?.len(),
        };

        Ok(rule.decide(open_items))
    }

    async fn credential_for(&self, change: &CredentialChange) -> AppResult<Option<Credential>> {
        match change {
            CredentialChange::Keep => Ok(None),
            CredentialChange::Replace(secret) => {
                let hash = self.hasher.hash(secret).await?;
                Ok(Some(Credential::from_hash(hash)))
            }
        }
    }
}

#[async_trait]
impl UserService for UserManager {
    #[tracing::instrument(name = "user.get", skip(self), err)]
    async fn get_by_user_name(&self, user_name: &str) -> AppResult<User> {
        self.repo
            .find_active_by_name(user_name)
            .await?
            .ok_or_not_found()
    }

    #[tracing::instrument(name = "user.list", skip(self), err)]
    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repo.list_active().await
    }

    #[tracing::instrument(
        name = "user.create",
        skip(self, candidate),
        fields(user_name = %candidate.user_name, role = %candidate.role),
        err
    )]
    async fn create_user(&self, mut candidate: NewUser) -> AppResult<LifecycleOutcome<User>> {
        candidate.enabled = true;

        let credential = Credential::from_hash(self.hasher.hash(&candidate.password).await?);
        let user = self
            .repo
            .create(UserDraft::new(&candidate, credential))
            .await?;
        debug!(user_id = user.id, "User persisted");

        let directory: DirectorySync = self
            .directory
            .create_account(&DirectoryAccount::from(&candidate))
            .await
            .into();

        match &directory {
            DirectorySync::Synced => info!(user_id = user.id, "User created"),
            DirectorySync::Failed { reason } => warn!(
                user_id = user.id,
                %reason,
                "User created locally but directory account was not provisioned"
            ),
        }

        Ok(LifecycleOutcome::new(user, directory))
    }

    #[tracing::instrument(
        name = "user.update",
        skip(self, candidate),
        fields(user_name = %candidate.user_name),
        err
    )]
    async fn update_user(&self, candidate: UserUpdate) -> AppResult<User> {
        let credential = self.credential_for(&candidate.credential).await?;

        let existing = self
            .repo
            .find_active_by_name(&candidate.user_name)
            .await?
            .ok_or_not_found()?;

        let user = self.repo.save(existing.merge(candidate, credential)).await?;

        info!(user_id = user.id, "User updated");
        Ok(user)
    }

    #[tracing::instrument(name = "user.delete", skip(self), err)]
    async fn delete_user(&self, user_name: &str) -> AppResult<DirectorySync> {
        let mut user = self
            .repo
            .find_active_by_name(user_name)
            .await?
            .ok_or_not_found()?;

        let decision = self.deletion_decision(&user).await?;
        if let DeletionDecision::Blocked { open_items } = decision {
            info!(user_id = user.id, role = %user.role, open_items, "User deletion blocked");
            return Err(AppError::deletion_blocked(DELETION_BLOCKED_MESSAGE));
        }

        user.soft_delete();
        let user = self.repo.save(user).await?;
        debug!(user_id = user.id, renamed_to = %user.user_name, "User soft deleted");

        let directory: DirectorySync = self.directory.delete_account(user_name).await.into();

        match &directory {
            DirectorySync::Synced => info!(user_id = user.id, "User deleted"),
            DirectorySync::Failed { reason } => warn!(
                user_id = user.id,
                %reason,
                "User deleted locally but directory account was not removed"
            ),
        }

        Ok(directory)
    }

    #[tracing::instrument(name = "user.list_by_role", skip(self), err)]
    async fn list_users_by_role(&self, role: &str) -> AppResult<Vec<User>> {
        let role = role.trim();
        if !is_valid_role(role) {
            debug!("Unknown role requested");
            return Ok(Vec::new());
        }
        self.repo.list_active_by_role(role).await
    }
}
