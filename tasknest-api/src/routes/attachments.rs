/// Task image attachments
///
/// - `POST   /v1/tasks/:task_id/image`: multipart upload, field `file`
/// - `DELETE /v1/tasks/:task_id/image`: remove the image
/// - `GET    /storage/v1/object/public/task-attachments/*path`: public download
///
/// Uploads must be JPEG or PNG and at most `MAX_UPLOAD_BYTES`. An image is
/// stored at `{user_id}/{task_id}.{ext}`; uploading again replaces it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::tasks::{owned_task, TaskResponse},
};
use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use bytes::Bytes;
use tasknest_shared::{
    auth::middleware::AuthContext,
    models::task::Task,
    storage::{attachment_path, check_size, ImageKind, StorageError},
};
use uuid::Uuid;

const FILE_FIELD: &str = "file";

/// File part pulled out of the multipart body
#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Reads the `file` field; a body over the request limit reports `limit`
async fn read_upload(mut multipart: Multipart, limit: usize) -> ApiResult<Upload> {
    let too_large = |err: MultipartError| -> ApiError {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StorageError::TooLarge { size: limit + 1, limit }.into()
        } else {
            err.into()
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(too_large)? {
        if field.name() == Some(FILE_FIELD) {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(too_large)?;
            return Ok(Upload {
                file_name,
                content_type,
                bytes,
            });
        }
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}

/// Upload or replace a task's image
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<TaskResponse>> {
    let task = owned_task(&state, task_id, auth.user_id).await?;
    let limit = state.config.storage.max_upload_bytes;
    let upload = read_upload(multipart, limit).await?;

    check_size(upload.bytes.len(), limit)?;

    let kind = ImageKind::detect(upload.content_type.as_deref(), upload.file_name.as_deref())
        .ok_or_else(|| {
            StorageError::UnsupportedType(
                upload
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            )
        })?;

    let path = attachment_path(auth.user_id, task_id, kind);

    // A new extension leaves the previous object orphaned
    if let Some(previous) = task.image_url.as_deref().filter(|p| *p != path) {
        if let Err(e) = state.store.delete(previous).await {
            tracing::warn!(task_id = %task_id, path = %previous, error = %e, "Failed to remove replaced attachment");
        }
    }

    let size = upload.bytes.len();
    state.store.put(&path, upload.bytes).await?;

    let task = Task::set_image(&state.db, task_id, auth.user_id, Some(&path))
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, path = %path, size, "Attachment uploaded");

    Ok(Json(TaskResponse::new(task, &state)))
}

/// Remove a task's image
pub async fn remove_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = owned_task(&state, task_id, auth.user_id).await?;

    let path = task
        .image_url
        .ok_or_else(|| ApiError::BadRequest("No image to remove".to_string()))?;

    if !state.store.delete(&path).await? {
        tracing::warn!(task_id = %task_id, path = %path, "Attachment already missing from store");
    }

    let task = Task::set_image(&state.db, task_id, auth.user_id, None)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(user_id = %auth.user_id, task_id = %task_id, "Attachment removed");

    Ok(Json(TaskResponse::new(task, &state)))
}

/// Serve an attachment without authentication
///
/// Honors `If-None-Match` against the content hash.
pub async fn download_object(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let object = state
        .store
        .get(&path)
        .await?
        .ok_or_else(|| ApiError::NotFound("Object not found".to_string()))?;

    let etag = format!("\"{}\"", object.etag);

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').any(|tag| tag.trim() == etag))
        .unwrap_or(false);

    let etag_value = HeaderValue::from_str(&etag)
        .map_err(|e| ApiError::InternalError(format!("Invalid ETag: {}", e)))?;
    let content_type = HeaderValue::from_str(&object.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let cache = (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600"));

    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value), cache]).into_response());
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type), (header::ETAG, etag_value), cache],
        Body::from(object.bytes),
    )
        .into_response())
}
