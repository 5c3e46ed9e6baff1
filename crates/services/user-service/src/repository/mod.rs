//! Repository layer for data access.

pub mod entities;
mod user_repository;
mod work_item_queries;

pub use user_repository::{UserRepository, UserStore};
pub use work_item_queries::{ProjectQuery, ProjectStore, TaskQuery, TaskStore};

#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use work_item_queries::{MockProjectQuery, MockTaskQuery};
