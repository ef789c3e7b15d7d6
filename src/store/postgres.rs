use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{CredentialStore, TaskStore};
use crate::error::AppError;
use crate::models::{NewUser, Page, Task, UserRecord};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";
const TASK_COLUMNS: &str = "id, user_id, task, created_at, updated_at";

/// Connects to PostgreSQL and applies the bundled migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::Database(format!("migration failed: {}", e)))?;

    log::info!("Connected to PostgreSQL and applied migrations");
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $2 LIMIT 1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let record = UserRecord::new(user);
        let sql = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = USER_COLUMNS
        );

        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(record.id)
            .bind(&record.username)
            .bind(&record.email)
            .bind(&record.password_hash)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                // The UNIQUE constraints are the authority on duplicates.
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::DuplicateUser
                }
                other => other.into(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, task: Task) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks ({cols}) VALUES ($1, $2, $3, $4, $5) RETURNING {cols}",
            cols = TASK_COLUMNS
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.user_id)
            .bind(&task.task)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list(
        &self,
        user_id: Uuid,
        page: Page,
        search: Option<&str>,
    ) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR task ILIKE $2) \
             ORDER BY created_at DESC, id \
             OFFSET $3 LIMIT $4",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .bind(search.map(like_pattern))
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn update(&self, user_id: Uuid, id: Uuid, text: &str) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks SET task = $1, updated_at = NOW() \
             WHERE id = $2 AND user_id = $3 \
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(text)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
    }
}
