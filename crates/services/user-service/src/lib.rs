//! User Service Library
//!
//! User lifecycle for the ticketing backend: registration, profile updates
//! and soft deletion guarded by open work, kept in step with the Keycloak
//! identity directory. Transport layers embed [`bootstrap`] and call
//! [`service::UserService`].

pub mod config;
pub mod identity;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use crate::config::UserServiceConfig;
use crate::identity::KeycloakDirectory;
use crate::infra::Database;
use crate::repository::{ProjectStore, TaskStore, UserStore};
use crate::service::{Argon2Hasher, UserManager};

/// Connect the database, apply migrations and wire the lifecycle service.
///
/// Entry point for the transport that embeds this crate. Directory settings
/// are checked before any connection is opened.
pub async fn bootstrap(
    config: &UserServiceConfig,
) -> Result<Arc<UserManager>, Box<dyn std::error::Error>> {
    let directory = KeycloakDirectory::new(config.directory.clone())?;
    let db = Database::connect(&config.database).await?;

    let service = UserManager::new(
        Arc::new(UserStore::new(db.get_connection())),
        Arc::new(directory),
        Arc::new(ProjectStore::new(db.get_connection())),
        Arc::new(TaskStore::new(db.get_connection())),
        Arc::new(Argon2Hasher),
    );

    info!(realm = %config.directory.realm, "User service ready");
    Ok(Arc::new(service))
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = UserServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Check that the configured database and identity directory settings are usable.
pub async fn check(config: &UserServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.directory.clone().validated()?;
    let db = Database::connect_without_migrations(&config.database).await?;
    db.ping().await?;
    info!("Database reachable");
    Ok(())
}
