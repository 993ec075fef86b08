/// Database models for TaskNest
///
/// Each model owns its table and exposes its queries as associated
/// functions taking a `&PgPool`.
///
/// # Models
///
/// - `user`: accounts and credentials
/// - `task`: to-do items, always scoped to their owner
/// - `label_suggestion`: log of AI-proposed labels accepted at task creation
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::models::task::Task;
/// use tasknest_shared::db::pool::{create_pool, DatabaseConfig};
/// # use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_url("postgresql://localhost/tasknest")).await?;
///
/// for task in Task::list_by_user(&pool, user_id).await? {
///     println!("{} {}", task.task_id, task.title);
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Deserializer};

pub mod label_suggestion;
pub mod task;
pub mod user;

/// Deserializes a present field into `Some(value)`, keeping JSON `null` as `Some(None)`
///
/// Combine with `#[serde(default)]` so that a missing field stays `None`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
