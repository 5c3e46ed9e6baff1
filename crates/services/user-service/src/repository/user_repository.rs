//! User repository implementation with soft delete support.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{User, UserDraft};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// All query methods return active (non-soft-deleted) records only.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find the active user with exactly this name
    async fn find_active_by_name(&self, user_name: &str) -> AppResult<Option<User>>;

    /// List active users ordered by first name, descending
    async fn list_active(&self) -> AppResult<Vec<User>>;

    /// List active users whose role description matches, ignoring case
    async fn list_active_by_role(&self, role: &str) -> AppResult<Vec<User>>;

    /// Insert a new user; the id is assigned by the store
    async fn create(&self, draft: UserDraft) -> AppResult<User>;

    /// Overwrite the stored record with the same id
    async fn save(&self, user: User) -> AppResult<User>;
}

/// Concrete implementation of UserRepository with soft delete
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_active_by_name(&self, user_name: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::UserName.eq(user_name))
            .filter(user::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        result
            .map(|model| User::try_from(model).map_err(AppError::from))
            .transpose()
    }

    async fn list_active(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(user::Column::IsDeleted.eq(false))
            .order_by_desc(user::Column::FirstName)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        into_users(models)
    }

    async fn list_active_by_role(&self, role: &str) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(Expr::expr(Func::lower(Expr::col(user::Column::Role))).eq(role.to_lowercase()))
            .filter(user::Column::IsDeleted.eq(false))
            .order_by_desc(user::Column::FirstName)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        into_users(models)
    }

    async fn create(&self, draft: UserDraft) -> AppResult<User> {
        let model = ActiveModel::from(draft)
            .insert(&self.db)
            .await
            .map_err(write_error)?;

        User::try_from(model).map_err(AppError::from)
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let model = ActiveModel::from(user)
            .update(&self.db)
            .await
            .map_err(write_error)?;

        User::try_from(model).map_err(AppError::from)
    }
}

fn into_users(models: Vec<user::Model>) -> AppResult<Vec<User>> {
    models
        .into_iter()
        .map(|model| User::try_from(model).map_err(AppError::from))
        .collect()
}

/// Unique name collisions (e.g. concurrent create of a just-freed name)
/// surface as conflicts; a vanished row on update as not found.
fn write_error(err: DbErr) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
        return AppError::conflict("User");
    }
    match err {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => AppError::NotFound,
        other => AppError::from(other),
    }
}
