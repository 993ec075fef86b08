/// Integration tests for the task, user, and suggestion models
///
/// These tests need a running PostgreSQL database named by `DATABASE_URL`.

use chrono::NaiveDate;
use sqlx::PgPool;
use tasknest_shared::db::migrations::run_migrations;
use tasknest_shared::models::label_suggestion::{CreateLabelSuggestion, LabelSuggestion};
use tasknest_shared::models::task::{CreateTask, Task, TaskLabel, UpdateTask};
use tasknest_shared::models::user::{CreateUser, User};
use uuid::Uuid;

async fn setup() -> Option<(PgPool, User)> {
    let _ = dotenvy::dotenv();
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.expect("Failed to connect");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let user = User::create(
        &pool,
        CreateUser {
            email: format!("model-{}@example.com", Uuid::new_v4()),
            password_hash: "test_hash".to_string(),
            name: None,
        },
    )
    .await
    .unwrap();

    Some((pool, user))
}

fn new_task(user_id: Uuid, title: &str) -> CreateTask {
    CreateTask {
        user_id,
        title: title.to_string(),
        description: None,
        completed: false,
        label: None,
        due_date: None,
    }
}

#[tokio::test]
async fn test_user_email_is_case_insensitive() {
    let Some((pool, user)) = setup().await else {
        return;
    };

    let found = User::find_by_email(&pool, &user.email.to_uppercase())
        .await
        .unwrap()
        .expect("User should be found");
    assert_eq!(found.id, user.id);

    let duplicate = User::create(
        &pool,
        CreateUser {
            email: user.email.to_uppercase(),
            password_hash: "other".to_string(),
            name: None,
        },
    )
    .await;
    assert!(duplicate.is_err(), "Email uniqueness ignores case");

    User::delete(&pool, user.id).await.unwrap();
}

#[tokio::test]
async fn test_update_only_touches_given_fields() {
    let Some((pool, user)) = setup().await else {
        return;
    };

    let due = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let task = Task::create(
        &pool,
        CreateTask {
            description: Some("  ".to_string()),
            label: Some(TaskLabel::Home),
            due_date: Some(due),
            ..new_task(user.id, "Paint fence")
        },
    )
    .await
    .unwrap();
    assert!(task.description.is_none(), "Blank descriptions are stored as NULL");

    let updated = Task::update(
        &pool,
        task.task_id,
        user.id,
        UpdateTask {
            label: Some(None),
            description: Some(Some("White paint".to_string())),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .expect("Task should exist");

    assert_eq!(updated.title, "Paint fence");
    assert_eq!(updated.description.as_deref(), Some("White paint"));
    assert!(updated.label.is_none());
    assert_eq!(updated.due_date, Some(due));
    assert!(updated.updated_at >= task.updated_at);

    let stranger = Task::update(
        &pool,
        task.task_id,
        Uuid::new_v4(),
        UpdateTask {
            title: Some("Nope".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(stranger.is_none());

    User::delete(&pool, user.id).await.unwrap();
}

#[tokio::test]
async fn test_completion_image_and_delete() {
    let Some((pool, user)) = setup().await else {
        return;
    };

    let task = Task::create(&pool, new_task(user.id, "Scan receipts")).await.unwrap();

    let done = Task::set_completed(&pool, task.task_id, user.id, true).await.unwrap().unwrap();
    assert!(done.completed);

    let path = format!("{}/{}.png", user.id, task.task_id);
    let with_image = Task::set_image(&pool, task.task_id, user.id, Some(&path)).await.unwrap().unwrap();
    assert_eq!(with_image.image_url.as_deref(), Some(path.as_str()));

    let cleared = Task::set_image(&pool, task.task_id, user.id, None).await.unwrap().unwrap();
    assert!(cleared.image_url.is_none());
    assert!(cleared.completed);

    assert_eq!(Task::count_by_user(&pool, user.id).await.unwrap(), 1);
    assert!(!Task::delete(&pool, task.task_id, Uuid::new_v4()).await.unwrap());
    assert!(Task::delete(&pool, task.task_id, user.id).await.unwrap());
    assert!(!Task::delete(&pool, task.task_id, user.id).await.unwrap());
    assert_eq!(Task::count_by_user(&pool, user.id).await.unwrap(), 0);

    User::delete(&pool, user.id).await.unwrap();
}

#[tokio::test]
async fn test_suggestion_log_cascades_with_task() {
    let Some((pool, user)) = setup().await else {
        return;
    };

    let task = Task::create(
        &pool,
        CreateTask {
            label: Some(TaskLabel::Work),
            ..new_task(user.id, "Send invoice")
        },
    )
    .await
    .unwrap();

    let logged = LabelSuggestion::create(
        &pool,
        CreateLabelSuggestion {
            task_id: task.task_id,
            user_id: user.id,
            original_title: task.title.clone(),
            original_description: None,
            suggested_label: TaskLabel::Work,
            accepted: true,
        },
    )
    .await
    .unwrap();

    let listed = LabelSuggestion::list_by_user(&pool, user.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, logged.id);

    Task::delete(&pool, task.task_id, user.id).await.unwrap();
    assert!(LabelSuggestion::list_by_user(&pool, user.id).await.unwrap().is_empty());

    User::delete(&pool, user.id).await.unwrap();
}
