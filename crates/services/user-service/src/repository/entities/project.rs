//! Project database entity (read-only from this service).

use sea_orm::entity::prelude::*;

use domain::{DomainError, ProjectRef, WorkStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub project_code: String,
    pub project_name: String,
    pub assigned_manager_id: i64,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ProjectRef {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(ProjectRef {
            id: model.id,
            code: model.project_code,
            name: model.project_name,
            status: model.status.parse::<WorkStatus>()?,
        })
    }
}
