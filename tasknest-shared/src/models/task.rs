/// Task model and database operations
///
/// A task is a to-do item owned by one user. Every query takes the owner's
/// user ID alongside the task ID, so a task that belongs to someone else
/// behaves exactly like a task that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_label AS ENUM ('work', 'personal', 'priority', 'shopping', 'home');
///
/// CREATE TABLE tasks (
///     task_id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     label task_label,
///     due_date DATE,
///     image_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::models::task::{CreateTask, Task, TaskLabel, UpdateTask};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     user_id,
///     title: "Buy milk".to_string(),
///     description: None,
///     completed: false,
///     label: Some(TaskLabel::Shopping),
///     due_date: None,
/// }).await?;
///
/// Task::set_completed(&pool, task.task_id, user_id, true).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use uuid::Uuid;

const TASK_COLUMNS: &str = "task_id, user_id, title, description, completed, label, due_date, \
                            image_url, created_at, updated_at";

/// Category attached to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_label", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskLabel {
    Work,
    Personal,
    Priority,
    Shopping,
    Home,
}

impl TaskLabel {
    /// Every label, in display order
    pub const ALL: [TaskLabel; 5] = [
        TaskLabel::Work,
        TaskLabel::Personal,
        TaskLabel::Priority,
        TaskLabel::Shopping,
        TaskLabel::Home,
    ];

    /// Stored/wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskLabel::Work => "work",
            TaskLabel::Personal => "personal",
            TaskLabel::Priority => "priority",
            TaskLabel::Shopping => "shopping",
            TaskLabel::Home => "home",
        }
    }

    /// Human-readable name for pickers
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskLabel::Work => "Work",
            TaskLabel::Personal => "Personal",
            TaskLabel::Priority => "Priority",
            TaskLabel::Shopping => "Shopping",
            TaskLabel::Home => "Home",
        }
    }

    /// Lenient parse: surrounding whitespace and case are ignored
    ///
    /// Returns `None` for anything that is not exactly one label word.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|label| label.as_str() == normalized)
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub task_id: Uuid,

    /// Owner
    pub user_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub completed: bool,

    pub label: Option<TaskLabel>,

    /// Calendar date, serialized as `YYYY-MM-DD`
    pub due_date: Option<NaiveDate>,

    /// Object path of the attached image inside the attachment bucket
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub label: Option<TaskLabel>,
    pub due_date: Option<NaiveDate>,
}

/// Partial update of a task
///
/// `None` leaves a column untouched. For nullable columns `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub label: Option<Option<TaskLabel>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub image_url: Option<Option<String>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        *self == UpdateTask::default()
    }
}

/// Collapses empty or whitespace-only text to `None`
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Task {
    /// Inserts a task; an empty description is stored as NULL
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (user_id, title, description, completed, label, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(non_empty(data.description))
            .bind(data.completed)
            .bind(data.label)
            .bind(data.due_date)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID, only if `user_id` owns it
    pub async fn find_by_id_and_user(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE task_id = $1 AND user_id = $2",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// All of a user's tasks, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC, task_id",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Applies a partial update and bumps `updated_at`
    ///
    /// Returns `None` if the task does not exist for this user.
    pub async fn update(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = data.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            builder.push(", description = ").push_bind(non_empty(description));
        }
        if let Some(completed) = data.completed {
            builder.push(", completed = ").push_bind(completed);
        }
        if let Some(label) = data.label {
            builder.push(", label = ").push_bind(label);
        }
        if let Some(due_date) = data.due_date {
            builder.push(", due_date = ").push_bind(due_date);
        }
        if let Some(image_url) = data.image_url {
            builder.push(", image_url = ").push_bind(image_url);
        }

        builder
            .push(" WHERE task_id = ")
            .push_bind(task_id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        builder.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Sets the completion flag
    pub async fn set_completed(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        completed: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        Self::update(
            pool,
            task_id,
            user_id,
            UpdateTask {
                completed: Some(completed),
                ..Default::default()
            },
        )
        .await
    }

    /// Points the task at an attachment path, or clears it with `None`
    pub async fn set_image(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
        image_url: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        Self::update(
            pool,
            task_id,
            user_id,
            UpdateTask {
                image_url: Some(image_url.map(str::to_string)),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes a task; its suggestion log rows cascade
    pub async fn delete(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE task_id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse() {
        assert_eq!(TaskLabel::parse("work"), Some(TaskLabel::Work));
        assert_eq!(TaskLabel::parse("  Shopping\n"), Some(TaskLabel::Shopping));
        assert_eq!(TaskLabel::parse("HOME"), Some(TaskLabel::Home));

        assert_eq!(TaskLabel::parse(""), None);
        assert_eq!(TaskLabel::parse("errands"), None);
        assert_eq!(TaskLabel::parse("work."), None);
        assert_eq!(TaskLabel::parse("work personal"), None);
    }

    #[test]
    fn test_label_strings() {
        for label in TaskLabel::ALL {
            assert_eq!(TaskLabel::parse(label.as_str()), Some(label));
            assert_eq!(label.to_string(), label.as_str());
            assert_eq!(label.display_name().to_lowercase(), label.as_str());
        }
    }

    #[test]
    fn test_label_serde() {
        assert_eq!(serde_json::to_value(TaskLabel::Priority).unwrap(), "priority");
        let label: TaskLabel = serde_json::from_str("\"personal\"").unwrap();
        assert_eq!(label, TaskLabel::Personal);
        assert!(serde_json::from_str::<TaskLabel>("\"Personal\"").is_err());
    }

    #[test]
    fn test_task_serializes_due_date_as_plain_date() {
        let task = Task {
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "File taxes".to_string(),
            description: None,
            completed: false,
            label: Some(TaskLabel::Priority),
            due_date: NaiveDate::from_ymd_opt(2025, 4, 15),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["due_date"], "2025-04-15");
        assert_eq!(json["label"], "priority");
        assert!(json["description"].is_null());
        assert!(json["task_id"].is_string());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some("notes".to_string())), Some("notes".to_string()));
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());
        assert!(!UpdateTask {
            label: Some(None),
            ..Default::default()
        }
        .is_empty());
    }
}
