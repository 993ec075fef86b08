/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check
/// - `auth`: register, login, refresh, current user
/// - `labels`: available task labels
/// - `tasks`: task CRUD and completion
/// - `attachments`: task image upload, removal, and public download
/// - `label_suggestions`: AI label suggestion log
/// - `ai`: suggestion preview
/// - `functions`: the create-task-with-ai function endpoint

pub mod ai;
pub mod attachments;
pub mod auth;
pub mod functions;
pub mod health;
pub mod label_suggestions;
pub mod labels;
pub mod tasks;

use chrono::NaiveDate;
use tasknest_shared::models::task::TaskLabel;

use crate::error::ApiError;

/// Longest accepted task title, in characters
pub const MAX_TITLE_CHARS: usize = 255;

/// Why a title, label, or due date from a request was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Title must be at most {} characters", MAX_TITLE_CHARS)]
    TitleTooLong,

    #[error("Invalid label: {0}. Expected one of work, personal, priority, shopping, home")]
    Label(String),

    #[error("Invalid due date: {0}. Expected YYYY-MM-DD")]
    DueDate(String),
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        let field = match err {
            FieldError::TitleRequired | FieldError::TitleTooLong => "title",
            FieldError::Label(_) => "label",
            FieldError::DueDate(_) => "due_date",
        };
        ApiError::invalid_field(field, err.to_string())
    }
}

/// Trims a title and checks it is present and not too long
pub fn parse_title(value: Option<&str>) -> Result<String, FieldError> {
    let title = value
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(FieldError::TitleRequired)?;

    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(FieldError::TitleTooLong);
    }
    Ok(title.to_string())
}

/// Parses an optional label field; empty text means no label
pub fn parse_label(value: Option<&str>) -> Result<Option<TaskLabel>, FieldError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => TaskLabel::parse(raw)
            .map(Some)
            .ok_or_else(|| FieldError::Label(raw.to_string())),
    }
}

/// Parses an optional `YYYY-MM-DD` due date; empty text means no date
pub fn parse_due_date(value: Option<&str>) -> Result<Option<NaiveDate>, FieldError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FieldError::DueDate(raw.to_string())),
    }
}
