/// Task endpoints
///
/// All handlers act on the caller's own tasks. Someone else's task ID gets
/// the same 404 as an ID that does not exist.
///
/// # Endpoints
///
/// - `GET    /v1/tasks`: list, newest first
/// - `POST   /v1/tasks`: create
/// - `GET    /v1/tasks/:task_id`: fetch one
/// - `PUT    /v1/tasks/:task_id`: partial update
/// - `PATCH  /v1/tasks/:task_id/complete`: set the completion flag
/// - `DELETE /v1/tasks/:task_id`: delete, including any attached image

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{parse_due_date, parse_label, parse_title, FieldError},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tasknest_shared::{
    auth::middleware::AuthContext,
    models::{
        double_option,
        task::{CreateTask, Task, UpdateTask},
    },
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Task as returned by the REST API
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,

    /// Download URL of the attached image, if any
    pub public_url: Option<String>,
}

impl TaskResponse {
    pub fn new(task: Task, state: &AppState) -> Self {
        let public_url = task
            .image_url
            .as_deref()
            .map(|path| state.config.public_object_url(path));
        Self { task, public_url }
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), ValidationError> {
    parse_title(Some(title)).map(|_| ()).map_err(|e| {
        let code = match e {
            FieldError::TitleRequired => "required",
            _ => "length",
        };
        ValidationError::new(code).with_message(e.to_string().into())
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: Option<bool>,

    /// Label value; empty or missing means none
    #[serde(default)]
    pub label: Option<String>,

    /// `YYYY-MM-DD`; empty or missing means none
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Partial update; `null` clears a nullable field, a missing field is kept
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub completed: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub label: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
}

impl UpdateTaskRequest {
    fn into_update(self) -> ApiResult<UpdateTask> {
        Ok(UpdateTask {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            completed: self.completed,
            label: self
                .label
                .map(|label| parse_label(label.as_deref()))
                .transpose()?,
            due_date: self
                .due_date
                .map(|date| parse_due_date(date.as_deref()))
                .transpose()?,
            image_url: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub completed: bool,
}

/// Loads the caller's task or fails with 404
pub(crate) async fn owned_task(state: &AppState, task_id: Uuid, user_id: Uuid) -> ApiResult<Task> {
    Task::find_by_id_and_user(&state.db, task_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = Task::list_by_user(&state.db, auth.user_id).await?;

    Ok(Json(
        tasks
            .into_iter()
            .map(|task| TaskResponse::new(task, &state))
            .collect(),
    ))
}

/// Create a task without consulting the AI
///
/// ```text
/// POST /v1/tasks
///
/// { "title": "Buy milk", "label": "shopping", "due_date": "2025-06-01" }
/// ```
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let label = parse_label(req.label.as_deref())?;
    let due_date = parse_due_date(req.due_date.as_deref())?;

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: auth.user_id,
            title: req.title.trim().to_string(),
            description: req.description,
            completed: req.completed.unwrap_or(false),
            label,
            due_date,
        },
    )
    .await?;

    tracing::info!(user_id = %auth.user_id, task_id = %task.task_id, "Task created");

    Ok((StatusCode::CREATED, Json(TaskResponse::new(task, &state))))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = owned_task(&state, task_id, auth.user_id).await?;
    Ok(Json(TaskResponse::new(task, &state)))
}

/// Save edits to a task
///
/// Only the fields present in the body change.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()?;
    let update = req.into_update()?;

    let task = Task::update(&state.db, task_id, auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::debug!(user_id = %auth.user_id, task_id = %task_id, "Task updated");

    Ok(Json(TaskResponse::new(task, &state)))
}

pub async fn set_completed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CompleteRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::set_completed(&state.db, task_id, auth.user_id, req.completed)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse::new(task, &state)))
}

/// Delete a task and its attachment
///
/// The row is deleted first. A failure to remove the image afterwards is
/// logged and does not fail the request.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = owned_task(&state, task_id, auth.user_id).await?;

    if !Task::delete(&state.db, task_id, auth.user_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    if let Some(path) = task.image_url.as_deref() {
        if let Err(e) = state.store.delete(path).await {
            tracing::warn!(task_id = %task_id, path = %path, error = %e, "Failed to remove attachment of deleted task");
        }
    }

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
