/// Suggestion preview
///
/// ```text
/// POST /v1/ai/suggest
///
/// { "title": "Buy milk", "description": "" }
/// ```
///
/// ```json
/// { "label": "shopping", "description": "Pick up a carton of milk." }
/// ```
///
/// Nothing is stored. A description is only drafted when none was sent.
/// Answers 503 when no suggester is configured or the AI service fails.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::tasks::validate_title,
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tasknest_shared::{auth::middleware::AuthContext, models::task::TaskLabel};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SuggestRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub label: Option<TaskLabel>,
    pub description: Option<String>,
}

pub async fn suggest(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SuggestRequest>,
) -> ApiResult<Json<SuggestResponse>> {
    req.validate()?;

    let suggester = state
        .suggester
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("AI suggestions are not configured".to_string()))?;

    let description = req.description.as_deref().filter(|d| !d.trim().is_empty());

    let label = suggester.suggest_label(&req.title, description).await?;
    let drafted = match description {
        Some(_) => None,
        None => suggester.suggest_description(&req.title).await?,
    };

    tracing::debug!(
        user_id = %auth.user_id,
        suggester = suggester.name(),
        label = ?label,
        "Suggestion preview"
    );

    Ok(Json(SuggestResponse {
        label,
        description: drafted,
    }))
}

#[cfg(test)]
mod tests {
    use crate::app::{build_router, AppState};
    use crate::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, StorageConfig};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tasknest_shared::ai::{LabelSuggester, StaticSuggester};
    use tasknest_shared::auth::jwt::{create_token, Claims, TokenType};
    use tasknest_shared::models::task::TaskLabel;
    use tasknest_shared::storage::LocalObjectStore;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn router(suggester: Option<Arc<StaticSuggester>>) -> axum::Router {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
                public_base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost:1/unused".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: SECRET.to_string(),
            },
            storage: StorageConfig {
                root: std::env::temp_dir(),
                max_upload_bytes: 1024 * 1024,
            },
            openai: None,
        };
        let pool = PgPoolOptions::new().connect_lazy(&config.database.url).unwrap();
        let store = Arc::new(LocalObjectStore::new(std::env::temp_dir()));
        let suggester = suggester.map(|s| s as Arc<dyn LabelSuggester>);
        build_router(AppState::new(pool, config, store, suggester))
    }

    async fn post_suggest(app: axum::Router, body: Value) -> (StatusCode, Value) {
        let token = create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), SECRET).unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/v1/ai/suggest")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unconfigured_is_503() {
        let (status, body) = post_suggest(router(None), json!({ "title": "Buy milk" })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "AI suggestions are not configured");
    }

    #[tokio::test]
    async fn test_drafts_description_only_when_missing() {
        let suggester = Arc::new(
            StaticSuggester::new(Some(TaskLabel::Shopping)).with_description("Pick up a carton of milk."),
        );

        let (status, body) =
            post_suggest(router(Some(suggester.clone())), json!({ "title": "Buy milk", "description": " " })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "label": "shopping", "description": "Pick up a carton of milk." }));
        assert_eq!(suggester.calls(), 2);

        let (status, body) = post_suggest(
            router(Some(suggester.clone())),
            json!({ "title": "Buy milk", "description": "Two litres" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "label": "shopping", "description": null }));
        assert_eq!(suggester.calls(), 3);
    }

    #[tokio::test]
    async fn test_failing_suggester_is_503() {
        let (status, body) = post_suggest(
            router(Some(Arc::new(StaticSuggester::failing()))),
            json!({ "title": "Buy milk" }),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let suggester = Arc::new(StaticSuggester::new(Some(TaskLabel::Work)));
        let (status, _) = post_suggest(router(Some(suggester.clone())), json!({ "title": "" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) =
            post_suggest(router(Some(suggester.clone())), json!({ "title": "x".repeat(256) })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["message"], "Title must be at most 255 characters");

        assert_eq!(suggester.calls(), 0);
    }
}
