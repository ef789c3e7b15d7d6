use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Input structure for creating or updating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The task text. Must be between 1 and 500 characters.
    #[validate(length(min = 1, max = 500))]
    pub task: String,
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// Identifier of the user who owns the task.
    pub user_id: Uuid,
    pub task: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Page size. Defaults to 10, capped at 100.
    pub limit: Option<u32>,
    /// Case-insensitive substring to search for in the task text.
    pub task: Option<String>,
}

/// A resolved window over a user's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl TaskQuery {
    /// Resolves `page`/`limit` into an offset window. Zero for either is rejected.
    pub fn page(&self) -> Result<Page, AppError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 || limit == 0 {
            return Err(AppError::BadRequest(
                "page and limit can't be zero".into(),
            ));
        }
        let limit = limit.min(MAX_LIMIT);
        Ok(Page {
            offset: (page - 1).saturating_mul(limit),
            limit,
        })
    }

    /// The search term, if one was given and is not blank.
    pub fn search(&self) -> Option<&str> {
        self.task
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

impl Task {
    /// Creates a new `Task` owned by `user_id`, with a fresh id and timestamps.
    pub fn new(input: TaskInput, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            task: input.task,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn matches(&self, term: &str) -> bool {
        self.task.to_lowercase().contains(&term.to_lowercase())
    }
}
