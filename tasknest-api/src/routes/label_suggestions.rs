/// AI label suggestion log
///
/// - `GET /v1/label-suggestions`: the caller's suggestions, newest first
/// - `GET /v1/tasks/:task_id/label-suggestions`: suggestions for one task

use crate::{app::AppState, error::ApiResult, routes::tasks::owned_task};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tasknest_shared::{auth::middleware::AuthContext, models::label_suggestion::LabelSuggestion};
use uuid::Uuid;

pub async fn list_label_suggestions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<LabelSuggestion>>> {
    Ok(Json(LabelSuggestion::list_by_user(&state.db, auth.user_id).await?))
}

pub async fn list_for_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<LabelSuggestion>>> {
    owned_task(&state, task_id, auth.user_id).await?;

    Ok(Json(
        LabelSuggestion::list_by_task(&state.db, task_id, auth.user_id).await?,
    ))
}
