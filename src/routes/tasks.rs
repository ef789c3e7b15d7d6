use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskQuery},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ID".into()))
}

/// Retrieves a page of the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `page` (optional, default 1): 1-based page number.
/// - `limit` (optional, default 10, max 100): page size.
/// - `task` (optional): case-insensitive substring to search for.
///
/// ## Responses:
/// - `200 OK`: `{"result": [Task, ...]}`, newest first. An empty page is not an error.
/// - `400 Bad Request`: `page` or `limit` is zero.
#[get("")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let page = query.page()?;
    let tasks = state.tasks.list(user.0.sub, page, query.search()).await?;

    log::info!("Sent {} tasks to {}", tasks.len(), user.0.username);
    Ok(HttpResponse::Ok().json(json!({ "result": tasks })))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: `task` is missing, empty or longer than 500 characters.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .create(Task::new(task_data.into_inner(), user.0.sub))
        .await?;

    log::info!("Added task {}", task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `400 Bad Request`: `id` is not a UUID.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<String>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&task_id)?;

    match state.tasks.get(user.0.sub, id).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Replaces the text of one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: invalid `id` or body.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[patch("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<String>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&task_id)?;
    task_data.validate()?;

    match state.tasks.update(user.0.sub, id, &task_data.task).await? {
        Some(task) => {
            log::info!("Updated task {}", id);
            Ok(HttpResponse::Ok().json(task))
        }
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: `{"message": ...}`.
/// - `400 Bad Request`: `id` is not a UUID.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<String>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&task_id)?;

    if !state.tasks.delete(user.0.sub, id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }

    log::info!("Deleted task {}", id);
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Deleted task {}", id)
    })))
}
