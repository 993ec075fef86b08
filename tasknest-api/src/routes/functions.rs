/// `create-task-with-ai` function endpoint
///
/// ```text
/// POST /functions/v1/create-task-with-ai
/// Authorization: Bearer <access token>
///
/// { "title": "Buy milk", "description": "", "completed": false, "label": "", "due_date": "" }
/// ```
///
/// Creates a task for the caller. When no label is given and a suggester is
/// configured, the AI picks one; an accepted suggestion is recorded in the
/// suggestion log.
///
/// This endpoint keeps its own wire contract, separate from the `/v1` API:
///
/// - success: 200 with the created task row
/// - any failure: 400 with `{"error": "<message>"}`
/// - CORS headers on every response, `OPTIONS` answers 204
///
/// An AI reply that is not a known label leaves the task unlabeled. An AI
/// request that fails (network, non-2xx, malformed body) fails the whole
/// call with 400 and nothing is created.

use crate::{
    app::AppState,
    routes::{parse_due_date, parse_label, parse_title},
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tasknest_shared::{
    auth::middleware::{authenticate, AuthError},
    models::{
        label_suggestion::{CreateLabelSuggestion, LabelSuggestion},
        task::{non_empty, CreateTask, Task, TaskLabel},
        user::User,
    },
};

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST")),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
    ]
}

/// Function failure, always rendered as 400 `{"error": message}`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FunctionError {
    pub message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FunctionErrorBody {
    pub error: String,
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.message, "Error in create-task-with-ai");

        (
            StatusCode::BAD_REQUEST,
            cors_headers(),
            Json(FunctionErrorBody { error: self.message }),
        )
            .into_response()
    }
}

/// Request body; every field except `title` may be omitted or empty
#[derive(Debug, Default, Deserialize)]
pub struct FunctionRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: Option<bool>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub due_date: Option<String>,
}

/// `OPTIONS` preflight
pub async fn preflight() -> Response {
    (StatusCode::NO_CONTENT, cors_headers()).into_response()
}

pub async fn create_task_with_ai(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, FunctionError> {
    let req: FunctionRequest = serde_json::from_slice(&body)
        .map_err(|e| FunctionError::new(format!("Invalid request body: {}", e)))?;

    tracing::info!("Creating task with AI suggestions");

    let auth = authenticate(&headers, state.jwt_secret()).map_err(|e| match e {
        AuthError::MissingCredentials => FunctionError::new(e.to_string()),
        other => {
            tracing::debug!(error = %other, "Function auth rejected");
            FunctionError::new("No user found")
        }
    })?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "User lookup failed");
            FunctionError::new("No user found")
        })?
        .ok_or_else(|| FunctionError::new("No user found"))?;

    let title = parse_title(req.title.as_deref()).map_err(|e| FunctionError::new(e.to_string()))?;

    let description = non_empty(req.description);
    let label = parse_label(req.label.as_deref()).map_err(|e| FunctionError::new(e.to_string()))?;
    let due_date =
        parse_due_date(req.due_date.as_deref()).map_err(|e| FunctionError::new(e.to_string()))?;

    let (label, ai_suggested) = match label {
        Some(label) => (Some(label), false),
        None => match suggest(&state, &title, description.as_deref()).await? {
            Some(label) => (Some(label), true),
            None => (None, false),
        },
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: user.id,
            title: title.clone(),
            description: description.clone(),
            completed: req.completed.unwrap_or(false),
            label,
            due_date,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(user_id = %user.id, error = %e, "Task insert failed");
        FunctionError::new("Failed to create task")
    })?;

    if let (true, Some(suggested_label)) = (ai_suggested, task.label) {
        let logged = LabelSuggestion::create(
            &state.db,
            CreateLabelSuggestion {
                task_id: task.task_id,
                user_id: user.id,
                original_title: title,
                original_description: description,
                suggested_label,
                accepted: true,
            },
        )
        .await;

        match logged {
            Ok(_) => tracing::info!(task_id = %task.task_id, "Logged AI suggestion"),
            Err(e) => tracing::error!(task_id = %task.task_id, error = %e, "Failed to log AI suggestion"),
        }
    }

    Ok((
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"))],
        Json(task),
    )
        .into_response())
}

/// Asks the configured suggester for a label
///
/// `Ok(None)` when no suggester is configured or the reply is not a label.
async fn suggest(
    state: &AppState,
    title: &str,
    description: Option<&str>,
) -> Result<Option<TaskLabel>, FunctionError> {
    let Some(suggester) = state.suggester.as_ref() else {
        return Ok(None);
    };

    let label = suggester
        .suggest_label(title, description)
        .await
        .map_err(|e| FunctionError::new(e.to_string()))?;

    tracing::info!(suggester = suggester.name(), label = ?label, "AI suggested label");
    Ok(label)
}
