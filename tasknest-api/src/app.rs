/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasknest_api::{app::AppState, config::Config};
/// use tasknest_shared::storage::LocalObjectStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let store = Arc::new(LocalObjectStore::new(&config.storage.root));
/// let state = AppState::new(pool, config, store, None);
/// let app = tasknest_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tasknest_shared::{ai::LabelSuggester, auth::middleware::authenticate, storage::ObjectStore};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Attachment store
    pub store: Arc<dyn ObjectStore>,

    /// Label suggester, `None` when AI is not configured
    pub suggester: Option<Arc<dyn LabelSuggester>>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: Config,
        store: Arc<dyn ObjectStore>,
        suggester: Option<Arc<dyn LabelSuggester>>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            store,
            suggester,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// ├── /v1/
/// │   ├── /auth/            register, login, refresh (public), me
/// │   ├── GET  /labels
/// │   ├── /tasks/           CRUD, completion, image attachment
/// │   ├── GET  /label-suggestions
/// │   └── POST /ai/suggest
/// ├── /functions/v1/create-task-with-ai    own auth and CORS
/// └── GET /storage/v1/object/public/task-attachments/*path
/// ```
///
/// Everything under `/v1` except register, login, and refresh requires a
/// bearer access token.
///
/// # Middleware Stack
///
/// 1. Security headers
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (all routes except the function, which sets its own headers)
/// 4. JWT authentication (protected routes)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth = from_fn_with_state(state.clone(), jwt_auth_layer);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // route_layer covers /me only
    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(auth.clone())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let upload_limit = state.config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let protected_routes = Router::new()
        .route("/labels", get(routes::labels::list_labels))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:task_id/complete", patch(routes::tasks::set_completed))
        .route(
            "/tasks/:task_id/image",
            post(routes::attachments::upload_image)
                .delete(routes::attachments::remove_image)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/tasks/:task_id/label-suggestions",
            get(routes::label_suggestions::list_for_task),
        )
        .route(
            "/label-suggestions",
            get(routes::label_suggestions::list_label_suggestions),
        )
        .route("/ai/suggest", post(routes::ai::suggest))
        .layer(auth);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let storage_routes = Router::new().route(
        "/task-attachments/*path",
        get(routes::attachments::download_object),
    );

    let function_routes = Router::new().route(
        "/create-task-with-ai",
        post(routes::functions::create_task_with_ai).options(routes::functions::preflight),
    );

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .nest("/storage/v1/object/public", storage_routes)
        .layer(cors_layer(&state.config))
        .nest("/functions/v1", function_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token and injects an `AuthContext` into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
