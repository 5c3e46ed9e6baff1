//! Query ports over projects and tasks.
//!
//! The user lifecycle only needs to know whether someone still has open work,
//! so these traits expose exactly that and nothing of the project/task
//! subsystems behind them.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select};

use super::entities::{project, task};
use common::{AppError, AppResult};
use domain::{ProjectRef, TaskRef, User, WorkStatus};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Projects managed by a user that are not completed.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProjectQuery: Send + Sync {
    async fn list_open_projects_for_manager(&self, manager: &User) -> AppResult<Vec<ProjectRef>>;
}

/// Tasks assigned to a user that are not completed.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TaskQuery: Send + Sync {
    async fn list_open_tasks_for_employee(&self, employee: &User) -> AppResult<Vec<TaskRef>>;
}

pub struct ProjectStore {
    db: DatabaseConnection,
}

impl ProjectStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectQuery for ProjectStore {
    async fn list_open_projects_for_manager(&self, manager: &User) -> AppResult<Vec<ProjectRef>> {
        let models = open_projects(manager.id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        into_open_projects(models)
    }
}

pub struct TaskStore {
    db: DatabaseConnection,
}

impl TaskStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskQuery for TaskStore {
    async fn list_open_tasks_for_employee(&self, employee: &User) -> AppResult<Vec<TaskRef>> {
        let models = open_tasks(employee.id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        into_open_tasks(models)
    }
}

/// Status is compared lowercased; stored descriptions are parsed ignoring case.
fn not_completed(status: impl IntoColumnRef) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(status)))
        .ne(WorkStatus::Completed.description().to_lowercase())
}

fn open_projects(manager_id: i64) -> Select<project::Entity> {
    project::Entity::find()
        .filter(project::Column::AssignedManagerId.eq(manager_id))
        .filter(not_completed(project::Column::Status))
        .order_by_asc(project::Column::Id)
}

fn open_tasks(employee_id: i64) -> Select<task::Entity> {
    task::Entity::find()
        .filter(task::Column::AssignedEmployeeId.eq(employee_id))
        .filter(not_completed(task::Column::Status))
        .order_by_asc(task::Column::Id)
}

fn into_open_projects(models: Vec<project::Model>) -> AppResult<Vec<ProjectRef>> {
    let mut projects = Vec::with_capacity(models.len());
    for model in models {
        let project = ProjectRef::try_from(model)?;
        if !project.status.is_completed() {
            projects.push(project);
        }
    }
    Ok(projects)
}

fn into_open_tasks(models: Vec<task::Model>) -> AppResult<Vec<TaskRef>> {
    let mut tasks = Vec::with_capacity(models.len());
    for model in models {
        let task = TaskRef::try_from(model)?;
        if !task.status.is_completed() {
            tasks.push(task);
        }
    }
    Ok(tasks)
}
