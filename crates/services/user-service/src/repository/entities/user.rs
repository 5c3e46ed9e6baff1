//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Credential, DomainError, Role, User, UserDraft};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC string, never plaintext
    pub credential: String,
    pub enabled: bool,
    /// Soft delete flag (false = active)
    pub is_deleted: bool,
    /// Role description, e.g. "Manager"
    pub role: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity.
///
/// Fails when the stored role is outside the known role set.
impl TryFrom<Model> for User {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(User {
            id: model.id,
            user_name: model.user_name,
            first_name: model.first_name,
            last_name: model.last_name,
            credential: Credential::from_hash(model.credential),
            enabled: model.enabled,
            is_deleted: model.is_deleted,
            role: Role::try_from(model.role.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Insert model for a new record; the id is assigned by the database.
impl From<UserDraft> for ActiveModel {
    fn from(draft: UserDraft) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            user_name: Set(draft.user_name),
            first_name: Set(draft.first_name),
            last_name: Set(draft.last_name),
            credential: Set(draft.credential.into_string()),
            enabled: Set(draft.enabled),
            is_deleted: Set(false),
            role: Set(draft.role.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// Full-row update model keyed by the durable id.
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        ActiveModel {
            id: Set(user.id),
            user_name: Set(user.user_name),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            credential: Set(user.credential.into_string()),
            enabled: Set(user.enabled),
            is_deleted: Set(user.is_deleted),
            role: Set(user.role.to_string()),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
    }
}
