//! Common test utilities for integration tests
//!
//! - Test database setup (migrations) and per-test users
//! - JWT token generation
//! - Router built against a temporary attachment directory and a
//!   `StaticSuggester`
//! - Request helpers
//!
//! Tests need `DATABASE_URL` pointing at a disposable PostgreSQL database.
//! Without it, `TestContext::new` returns `None` and the test is skipped.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tasknest_api::app::{build_router, AppState};
use tasknest_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, StorageConfig};
use tasknest_shared::ai::{LabelSuggester, StaticSuggester};
use tasknest_shared::auth::jwt::{create_token, Claims, TokenType};
use tasknest_shared::db::migrations::run_migrations;
use tasknest_shared::models::task::TaskLabel;
use tasknest_shared::models::user::{CreateUser, User};
use tasknest_shared::storage::LocalObjectStore;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-key-32-bytes-min";
pub const MULTIPART_BOUNDARY: &str = "tasknest-test-boundary";

/// Skips the current test when no database is configured
#[macro_export]
macro_rules! require_db {
    ($ctx:expr) => {
        match $ctx {
            Some(ctx) => ctx,
            None => {
                eprintln!("DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub user: User,
    pub jwt_token: String,
    pub suggester: Option<Arc<StaticSuggester>>,
    pub storage: TempDir,
}

impl TestContext {
    /// Context whose suggester always proposes `shopping`
    pub async fn new() -> Option<Self> {
        Self::with_suggester(Some(Arc::new(StaticSuggester::new(Some(TaskLabel::Shopping))))).await
    }

    pub async fn with_suggester(suggester: Option<Arc<StaticSuggester>>) -> Option<Self> {
        let _ = dotenvy::dotenv();
        let database_url = std::env::var("DATABASE_URL").ok()?;

        let db = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        run_migrations(&db).await.expect("Failed to run migrations");

        let storage = tempfile::tempdir().expect("Failed to create temp dir");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
                public_base_url: "http://tasks.test".to_string(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
            },
            storage: StorageConfig {
                root: storage.path().to_path_buf(),
                max_upload_bytes: 1024 * 1024,
            },
            openai: None,
        };

        let (user, jwt_token) = create_user(&db).await;

        let store = Arc::new(LocalObjectStore::new(storage.path()));
        let dyn_suggester = suggester
            .clone()
            .map(|s| s as Arc<dyn LabelSuggester>);
        let app = build_router(AppState::new(db.clone(), config, store, dyn_suggester));

        Some(Self {
            db,
            app,
            user,
            jwt_token,
            suggester,
            storage,
        })
    }

    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Sends a request as the context user and returns status and JSON body
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request_as(&self.jwt_token, method, uri, body).await
    }

    pub async fn request_as(
        &self,
        token: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    /// Uploads `bytes` as the multipart field `file`
    pub async fn upload(&self, task_id: Uuid, file_name: &str, content_type: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/v1/tasks/{}/image", task_id))
            .header(header::AUTHORIZATION, self.auth_header())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(Body::from(multipart_body(file_name, content_type, bytes)))
            .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Creates a task through the REST API and returns its JSON
    pub async fn create_task(&self, body: Value) -> Value {
        let (status, task) = self.request(Method::POST, "/v1/tasks", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", task);
        task
    }

    /// Another user, for ownership checks
    pub async fn other_user(&self) -> (User, String) {
        create_user(&self.db).await
    }

    /// Removes the context user; tasks and suggestion logs cascade
    pub async fn cleanup(self) {
        User::delete(&self.db, self.user.id).await.unwrap();
    }
}

async fn create_user(db: &PgPool) -> (User, String) {
    let user = User::create(
        db,
        CreateUser {
            email: format!("test-{}@example.com", Uuid::new_v4()),
            password_hash: "test_hash".to_string(),
            name: Some("Test User".to_string()),
        },
    )
    .await
    .expect("Failed to create test user");

    let token = create_token(&Claims::new(user.id, TokenType::Access), JWT_SECRET).unwrap();
    (user, token)
}

pub fn multipart_body(file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}
