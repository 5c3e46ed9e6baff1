//! Task database entity (read-only from this service).

use sea_orm::entity::prelude::*;

use domain::{DomainError, TaskRef, WorkStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub task_subject: String,
    pub project_id: i64,
    pub assigned_employee_id: i64,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for TaskRef {
    type Error = DomainError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(TaskRef {
            id: model.id,
            subject: model.task_subject,
            status: model.status.parse::<WorkStatus>()?,
        })
    }
}
