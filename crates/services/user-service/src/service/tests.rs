use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use mockall::Sequence;

use common::{AppError, AppResult};
use domain::{
    Credential, CredentialChange, NewUser, ProjectRef, Role, SecretString, TaskRef, User,
    UserDraft, UserUpdate, WorkStatus,
};

use super::*;
use crate::identity::MockIdentityDirectory;
use crate::repository::{MockProjectQuery, MockTaskQuery, MockUserRepository, UserRepository};

fn user(id: i64, user_name: &str, first_name: &str, role: Role) -> User {
    let now = Utc::now();
    User {
        id,
        user_name: user_name.to_string(),
        first_name: first_name.to_string(),
        last_name: "Doe".to_string(),
        credential: Credential::from_hash("$argon2id$stored"),
        enabled: true,
        is_deleted: false,
        role,
        created_at: now,
        updated_at: now,
    }
}

fn candidate(user_name: &str, role: Role) -> NewUser {
    NewUser {
        user_name: user_name.to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        password: SecretString::new("Abc1"),
        enabled: false,
        role,
    }
}

fn update(user_name: &str, credential: CredentialChange) -> UserUpdate {
    UserUpdate {
        user_name: user_name.to_string(),
        first_name: "Johnny".to_string(),
        last_name: "Doe".to_string(),
        enabled: true,
        role: Role::Manager,
        credential,
    }
}

fn open_project(id: i64) -> ProjectRef {
    ProjectRef {
        id,
        code: format!("PRJ{:03}", id),
        name: "Migration".to_string(),
        status: WorkStatus::InProgress,
    }
}

fn open_task(id: i64) -> TaskRef {
    TaskRef {
        id,
        subject: "Write tests".to_string(),
        status: WorkStatus::Open,
    }
}

/// Mocks for every collaborator; unconfigured calls panic.
struct Collaborators {
    repo: MockUserRepository,
    directory: MockIdentityDirectory,
    projects: MockProjectQuery,
    tasks: MockTaskQuery,
    hasher: MockCredentialHasher,
}

impl Collaborators {
    fn new() -> Self {
        Self {
            repo: MockUserRepository::new(),
            directory: MockIdentityDirectory::new(),
            projects: MockProjectQuery::new(),
            tasks: MockTaskQuery::new(),
            hasher: MockCredentialHasher::new(),
        }
    }

    fn with_active_user(mut self, existing: User) -> Self {
        let name = existing.user_name.clone();
        self.repo
            .expect_find_active_by_name()
            .withf(move |user_name| user_name == name)
            .returning(move |_| Ok(Some(existing.clone())));
        self
    }

    fn into_service(self) -> UserManager {
        UserManager::new(
            Arc::new(self.repo),
            Arc::new(self.directory),
            Arc::new(self.projects),
            Arc::new(self.tasks),
            Arc::new(self.hasher),
        )
    }
}

fn service_over(repo: Arc<dyn UserRepository>) -> UserManager {
    let mut directory = MockIdentityDirectory::new();
    directory.expect_create_account().returning(|_| Ok(()));
    directory.expect_delete_account().returning(|_| Ok(()));

    let mut projects = MockProjectQuery::new();
    projects
        .expect_list_open_projects_for_manager()
        .returning(|manager| {
            if manager.user_name == "ana" {
                Ok(vec![open_project(1), open_project(2)])
            } else {
                Ok(vec![])
            }
        });

    let mut tasks = MockTaskQuery::new();
    tasks
        .expect_list_open_tasks_for_employee()
        .returning(|_| Ok(vec![]));

    UserManager::new(
        repo,
        Arc::new(directory),
        Arc::new(projects),
        Arc::new(tasks),
        Arc::new(Argon2Hasher),
    )
}

/// Store that enforces name uniqueness among all records, like the `users` table.
#[derive(Default)]
struct InMemoryUsers {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_active_by_name(&self, user_name: &str) -> AppResult<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|u| u.is_active() && u.user_name == user_name)
            .cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        let mut active: Vec<User> = rows.iter().filter(|u| u.is_active()).cloned().collect();
        active.sort_by(|a, b| b.first_name.cmp(&a.first_name));
        Ok(active)
    }

    async fn list_active_by_role(&self, role: &str) -> AppResult<Vec<User>> {
        Ok(self
            .list_active()
            .await?
            .into_iter()
            .filter(|u| u.role.description().eq_ignore_ascii_case(role))
            .collect())
    }

    async fn create(&self, draft: UserDraft) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.user_name == draft.user_name) {
            return Err(AppError::conflict("User"));
        }
        let now = Utc::now();
        let created = User {
            id: rows.len() as i64 + 1,
            user_name: draft.user_name,
            first_name: draft.first_name,
            last_name: draft.last_name,
            credential: draft.credential,
            enabled: draft.enabled,
            is_deleted: false,
            role: draft.role,
            created_at: now,
            updated_at: now,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AppError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }
}

// =============================================================================
// Lookup
// =============================================================================

#[tokio::test]
async fn test_get_by_user_name_returns_active_user() {
    let existing = user(7, "john", "John", Role::Manager);
    let service = Collaborators::new()
        .with_active_user(existing.clone())
        .into_service();

    let found = service.get_by_user_name("john").await.unwrap();

    assert_eq!(found, existing);
}

#[tokio::test]
async fn test_get_by_user_name_not_found() {
    let mut mocks = Collaborators::new();
    mocks
        .repo
        .expect_find_active_by_name()
        .returning(|_| Ok(None));

    let result = mocks.into_service().get_by_user_name("ghost").await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_list_users_by_role_unknown_role_matches_nothing() {
    let mut mocks = Collaborators::new();
    mocks.repo.expect_list_active_by_role().times(0);

    let users = mocks.into_service().list_users_by_role("Director").await.unwrap();

    assert!(users.is_empty());
}

#[tokio::test]
async fn test_list_users_by_role_passes_trimmed_role() {
    let mut mocks = Collaborators::new();
    mocks
        .repo
        .expect_list_active_by_role()
        .withf(|role| role == "mAnAgEr")
        .times(1)
        .returning(|_| Ok(vec![user(1, "john", "John", Role::Manager)]));

    let users = mocks
        .into_service()
        .list_users_by_role(" mAnAgEr ")
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_user_forces_enabled_and_stores_only_hash() {
    let mut mocks = Collaborators::new();
    mocks
        .hasher
        .expect_hash()
        .withf(|plain| plain.expose() == "Abc1")
        .times(1)
        .returning(|_| Ok("$argon2id$fresh".to_string()));
    mocks
        .repo
        .expect_create()
        .withf(|draft| draft.enabled && draft.credential.as_str() == "$argon2id$fresh")
        .times(1)
        .returning(|draft| {
            let mut created = user(11, &draft.user_name, &draft.first_name, draft.role);
            created.credential = draft.credential;
            created.enabled = draft.enabled;
            Ok(created)
        });
    mocks
        .directory
        .expect_create_account()
        .withf(|account| {
            account.user_name == "john@manager.com"
                && account.password.expose() == "Abc1"
                && account.role == Role::Manager
        })
        .times(1)
        .returning(|_| Ok(()));

    let outcome = mocks
        .into_service()
        .create_user(candidate("john@manager.com", Role::Manager))
        .await
        .unwrap();

    assert!(outcome.record.enabled);
    assert_eq!(outcome.record.id, 11);
    assert_eq!(outcome.directory, DirectorySync::Synced);
}

#[tokio::test]
async fn test_create_user_persists_before_directory_call() {
    let mut seq = Sequence::new();
    let mut mocks = Collaborators::new();
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Ok("$argon2id$fresh".to_string()));
    mocks
        .repo
        .expect_create()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|draft| Ok(user(3, &draft.user_name, &draft.first_name, draft.role)));
    mocks
        .directory
        .expect_create_account()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let result = mocks
        .into_service()
        .create_user(candidate("mike", Role::Employee))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_user_directory_failure_keeps_local_record() {
    let mut mocks = Collaborators::new();
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Ok("$argon2id$fresh".to_string()));
    mocks
        .repo
        .expect_create()
        .times(1)
        .returning(|draft| Ok(user(5, &draft.user_name, &draft.first_name, draft.role)));
    mocks
        .directory
        .expect_create_account()
        .returning(|_| Err(AppError::external_directory("connection refused")));

    let outcome = mocks
        .into_service()
        .create_user(candidate("mike", Role::Employee))
        .await
        .unwrap();

    assert_eq!(outcome.record.id, 5);
    match outcome.directory {
        DirectorySync::Failed { reason } => assert!(reason.contains("connection refused")),
        DirectorySync::Synced => panic!("expected directory failure"),
    }
}

#[tokio::test]
async fn test_create_user_hash_failure_writes_nothing() {
    let mut mocks = Collaborators::new();
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Err(AppError::internal("hash failed")));
    mocks.repo.expect_create().times(0);
    mocks.directory.expect_create_account().times(0);

    let result = mocks
        .into_service()
        .create_user(candidate("mike", Role::Employee))
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn test_create_user_name_conflict_skips_directory() {
    let mut mocks = Collaborators::new();
    mocks
        .hasher
        .expect_hash()
        .returning(|_| Ok("$argon2id$fresh".to_string()));
    mocks
        .repo
        .expect_create()
        .returning(|_| Err(AppError::conflict("User")));
    mocks.directory.expect_create_account().times(0);

    let result = mocks
        .into_service()
        .create_user(candidate("john", Role::Manager))
        .await;

    assert!(matches!(result, Err(AppError::Conflict(ref entity)) if entity == "User"));
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_user_replace_always_rehashes() {
    let existing = user(7, "john", "John", Role::Employee);
    let mut mocks = Collaborators::new().with_active_user(existing.clone());
    mocks
        .hasher
        .expect_hash()
        .withf(|plain| plain.expose() == "same-as-before")
        .times(1)
        .returning(|_| Ok("$argon2id$rehashed".to_string()));
    mocks
        .repo
        .expect_save()
        .times(1)
        .returning(|user| Ok(user));

    let saved = mocks
        .into_service()
        .update_user(update(
            "john",
            CredentialChange::Replace(SecretString::new("same-as-before")),
        ))
        .await
        .unwrap();

    assert_eq!(saved.credential.as_str(), "$argon2id$rehashed");
}

#[tokio::test]
async fn test_update_user_keep_preserves_hash_and_identity() {
    let existing = user(7, "john", "John", Role::Employee);
    let mut mocks = Collaborators::new().with_active_user(existing.clone());
    mocks.hasher.expect_hash().times(0);
    mocks
        .repo
        .expect_save()
        .withf(|user| user.id == 7)
        .times(1)
        .returning(|user| Ok(user));

    let saved = mocks
        .into_service()
        .update_user(update("john", CredentialChange::Keep))
        .await
        .unwrap();

    assert_eq!(saved.id, existing.id);
    assert_eq!(saved.created_at, existing.created_at);
    assert_eq!(saved.credential, existing.credential);
    assert_eq!(saved.first_name, "Johnny");
    assert_eq!(saved.role, Role::Manager);
    assert!(!saved.is_deleted);
}

#[tokio::test]
async fn test_update_unknown_user_not_found() {
    let mut mocks = Collaborators::new();
    mocks
        .repo
        .expect_find_active_by_name()
        .returning(|_| Ok(None));
    mocks.repo.expect_save().times(0);

    let result = mocks
        .into_service()
        .update_user(update("ghost", CredentialChange::Keep))
        .await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_manager_without_open_projects() {
    let existing = user(7, "john", "John", Role::Manager);
    let mut mocks = Collaborators::new().with_active_user(existing);
    mocks
        .projects
        .expect_list_open_projects_for_manager()
        .withf(|manager| manager.id == 7)
        .times(1)
        .returning(|_| Ok(vec![]));
    mocks.tasks.expect_list_open_tasks_for_employee().times(0);
    mocks
        .repo
        .expect_save()
        .withf(|user| user.is_deleted && user.user_name == "john-7")
        .times(1)
        .returning(|user| Ok(user));
    mocks
        .directory
        .expect_delete_account()
        .withf(|user_name| user_name == "john")
        .times(1)
        .returning(|_| Ok(()));

    let sync = mocks.into_service().delete_user("john").await.unwrap();

    assert_eq!(sync, DirectorySync::Synced);
}

#[tokio::test]
async fn test_delete_manager_with_open_projects_is_blocked() {
    let existing = user(8, "ana", "Ana", Role::Manager);
    let mut mocks = Collaborators::new().with_active_user(existing);
    mocks
        .projects
        .expect_list_open_projects_for_manager()
        .returning(|_| Ok(vec![open_project(1)]));
    mocks.repo.expect_save().times(0);
    mocks.directory.expect_delete_account().times(0);

    let err = mocks.into_service().delete_user("ana").await.unwrap_err();

    assert!(matches!(err, AppError::DeletionBlocked(_)));
    assert_eq!(err.to_string(), "User can not be deleted");
}

#[tokio::test]
async fn test_delete_employee_without_open_tasks() {
    let existing = user(9, "mike", "Mike", Role::Employee);
    let mut mocks = Collaborators::new().with_active_user(existing);
    mocks
        .tasks
        .expect_list_open_tasks_for_employee()
        .times(1)
        .returning(|_| Ok(vec![]));
    mocks.projects.expect_list_open_projects_for_manager().times(0);
    mocks
        .repo
        .expect_save()
        .withf(|user| user.is_deleted && user.user_name == "mike-9")
        .times(1)
        .returning(|user| Ok(user));
    mocks
        .directory
        .expect_delete_account()
        .times(1)
        .returning(|_| Ok(()));

    let result = mocks.into_service().delete_user("mike").await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_delete_employee_with_open_tasks_is_blocked() {
    let existing = user(9, "mike", "Mike", Role::Employee);
    let mut mocks = Collaborators::new().with_active_user(existing);
    mocks
        .tasks
        .expect_list_open_tasks_for_employee()
        .returning(|_| Ok(vec![open_task(4), open_task(5)]));
    mocks.repo.expect_save().times(0);
    mocks.directory.expect_delete_account().times(0);

    let err = mocks.into_service().delete_user("mike").await.unwrap_err();

    assert_eq!(err.to_string(), "User can not be deleted");
}

#[tokio::test]
async fn test_delete_admin_skips_work_item_ports() {
    let existing = user(1, "root", "Root", Role::Admin);
    let mut mocks = Collaborators::new().with_active_user(existing);
    mocks.projects.expect_list_open_projects_for_manager().times(0);
    mocks.tasks.expect_list_open_tasks_for_employee().times(0);
    mocks
        .repo
        .expect_save()
        .times(1)
        .returning(|user| Ok(user));
    mocks
        .directory
        .expect_delete_account()
        .returning(|_| Ok(()));

    let result = mocks.into_service().delete_user("root").await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_delete_unknown_user_not_found() {
    let mut mocks = Collaborators::new();
    mocks
        .repo
        .expect_find_active_by_name()
        .returning(|_| Ok(None));
    mocks.directory.expect_delete_account().times(0);

    let result = mocks.into_service().delete_user("ghost").await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_directory_failure_keeps_soft_delete() {
    let existing = user(1, "root", "Root", Role::Admin);
    let mut mocks = Collaborators::new().with_active_user(existing);
    mocks
        .repo
        .expect_save()
        .withf(|user| user.is_deleted)
        .times(1)
        .returning(|user| Ok(user));
    mocks
        .directory
        .expect_delete_account()
        .returning(|_| Err(AppError::external_directory("account 'root' not found")));

    let sync = mocks.into_service().delete_user("root").await.unwrap();

    assert!(matches!(sync, DirectorySync::Failed { .. }));
}

#[tokio::test]
async fn test_work_item_query_failure_aborts_delete() {
    let existing = user(7, "john", "John", Role::Manager);
    let mut mocks = Collaborators::new().with_active_user(existing);
    mocks
        .projects
        .expect_list_open_projects_for_manager()
        .returning(|_| Err(AppError::internal("projects unavailable")));
    mocks.repo.expect_save().times(0);
    mocks.directory.expect_delete_account().times(0);

    let result = mocks.into_service().delete_user("john").await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

// =============================================================================
// Scenarios over a stateful store
// =============================================================================

#[tokio::test]
async fn test_manager_delete_then_recreate_same_name() {
    let repo = Arc::new(InMemoryUsers::default());
    let service = service_over(repo.clone());

    let first = service
        .create_user(candidate("john", Role::Manager))
        .await
        .unwrap()
        .into_record();
    assert_eq!(service.list_users().await.unwrap().len(), 1);

    service.delete_user("john").await.unwrap();
    assert!(service.list_users().await.unwrap().is_empty());
    assert!(matches!(
        service.get_by_user_name("john").await,
        Err(AppError::NotFound)
    ));

    let second = service
        .create_user(candidate("john", Role::Manager))
        .await
        .unwrap()
        .into_record();

    assert_ne!(first.id, second.id);
    let listed = service.list_users().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, second.id);

    let rows = repo.rows.lock().unwrap();
    let archived = rows.iter().find(|u| u.id == first.id).unwrap();
    assert!(archived.is_deleted);
    assert_eq!(archived.user_name, format!("john-{}", first.id));
}

#[tokio::test]
async fn test_manager_with_open_projects_stays_listed() {
    let service = service_over(Arc::new(InMemoryUsers::default()));
    service
        .create_user(candidate("ana", Role::Manager))
        .await
        .unwrap();

    let err = service.delete_user("ana").await.unwrap_err();

    assert_eq!(err.to_string(), "User can not be deleted");
    let listed = service.list_users().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user_name, "ana");
}

#[tokio::test]
async fn test_created_credential_verifies_against_plaintext() {
    let service = service_over(Arc::new(InMemoryUsers::default()));

    let created = service
        .create_user(candidate("john", Role::Employee))
        .await
        .unwrap()
        .into_record();

    assert_ne!(created.credential.as_str(), "Abc1");
    assert!(created.credential.verify(&SecretString::new("Abc1")));
    assert!(!format!("{:?}", created).contains("Abc1"));
}

#[tokio::test]
async fn test_list_users_sorted_by_first_name_descending() {
    let service = service_over(Arc::new(InMemoryUsers::default()));
    for (name, first) in [("a", "Alice"), ("c", "Carol"), ("b", "Bob")] {
        let mut new_user = candidate(name, Role::Employee);
        new_user.first_name = first.to_string();
        service.create_user(new_user).await.unwrap();
    }

    let names: Vec<String> = service
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.first_name)
        .collect();

    assert_eq!(names, vec!["Carol", "Bob", "Alice"]);
}
