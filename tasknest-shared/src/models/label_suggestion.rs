/// AI label suggestion log
///
/// One row is written every time a task is created with a label chosen by
/// the suggester. Rows are append-only and disappear with their task.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE ai_label_suggestions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(task_id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     original_title VARCHAR(255) NOT NULL,
///     original_description TEXT,
///     suggested_label task_label NOT NULL,
///     accepted BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::TaskLabel;

const SUGGESTION_COLUMNS: &str = "id, task_id, user_id, original_title, original_description, \
                                  suggested_label, accepted, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LabelSuggestion {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,

    /// Title as submitted when the suggestion was made
    pub original_title: String,

    pub original_description: Option<String>,

    pub suggested_label: TaskLabel,

    pub accepted: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateLabelSuggestion {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub original_title: String,
    pub original_description: Option<String>,
    pub suggested_label: TaskLabel,
    pub accepted: bool,
}

impl LabelSuggestion {
    pub async fn create(pool: &PgPool, data: CreateLabelSuggestion) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO ai_label_suggestions \
             (task_id, user_id, original_title, original_description, suggested_label, accepted) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            SUGGESTION_COLUMNS
        );

        sqlx::query_as::<_, LabelSuggestion>(&query)
            .bind(data.task_id)
            .bind(data.user_id)
            .bind(data.original_title)
            .bind(data.original_description)
            .bind(data.suggested_label)
            .bind(data.accepted)
            .fetch_one(pool)
            .await
    }

    /// A user's suggestion history, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM ai_label_suggestions WHERE user_id = $1 ORDER BY created_at DESC",
            SUGGESTION_COLUMNS
        );

        sqlx::query_as::<_, LabelSuggestion>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Suggestions recorded for one of the user's tasks
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM ai_label_suggestions WHERE task_id = $1 AND user_id = $2 \
             ORDER BY created_at DESC",
            SUGGESTION_COLUMNS
        );

        sqlx::query_as::<_, LabelSuggestion>(&query)
            .bind(task_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_serialization() {
        let suggestion = LabelSuggestion {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            original_title: "Buy groceries".to_string(),
            original_description: None,
            suggested_label: TaskLabel::Shopping,
            accepted: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["suggested_label"], "shopping");
        assert_eq!(json["accepted"], true);
        assert!(json["original_description"].is_null());
    }
}
