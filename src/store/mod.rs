//! Persistence for user records and tasks.
//!
//! Handlers only see the [`CredentialStore`] and [`TaskStore`] traits. Two backends
//! implement both: PostgreSQL through `sqlx` for deployments, and an in-memory
//! version used when no `DATABASE_URL` is configured and throughout the tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Page, Task, UserRecord};

pub use self::memory::{MemoryCredentialStore, MemoryTaskStore};
pub use self::postgres::{PgCredentialStore, PgTaskStore};

/// Lookup and creation of user records.
///
/// Usernames and emails are unique. Implementations enforce this themselves, so
/// `insert` reports a conflict as [`AppError::DuplicateUser`] even when two
/// registrations race past the caller's own check.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError>;

    async fn insert(&self, user: NewUser) -> Result<UserRecord, AppError>;
}

/// Task records, always scoped to their owner.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: Task) -> Result<Task, AppError>;

    /// Newest first, optionally filtered by a case-insensitive substring.
    async fn list(
        &self,
        user_id: Uuid,
        page: Page,
        search: Option<&str>,
    ) -> Result<Vec<Task>, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn update(&self, user_id: Uuid, id: Uuid, text: &str) -> Result<Option<Task>, AppError>;

    /// Returns whether a task was removed.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}
