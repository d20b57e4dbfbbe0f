/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use workbuddy_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = workbuddy_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::session_auth_layer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use workbuddy_shared::realtime::RoomHub;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    pub config: Arc<Config>,

    /// Chat rooms of the connected WebSocket clients
    pub hub: Arc<RoomHub>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            hub: Arc::new(RoomHub::new()),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── GET  /ws                                   # WebSocket chat fan-out
/// └── /api/v1
///     ├── POST /login, POST /logout              # public
///     └── (session required)
///         ├── GET  /session
///         ├── GET|POST /users, DELETE /users/:id
///         ├── GET|POST /projects
///         ├── POST /select-project/:id
///         ├── GET  /projects/:id/members, PUT /projects/:id/members/:user_id
///         ├── POST /projects/:id/invitations
///         ├── GET|POST /projects/:id/tasks
///         ├── GET|PUT|DELETE /tasks/:id
///         ├── GET|POST /tasks/:id/comments
///         └── GET|POST /chat/:conversation_id/messages
/// ```
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let protected_routes = Router::new()
        .route("/session", get(routes::auth::current_session))
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route("/users/:user_id", axum::routing::delete(routes::users::delete_user))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/select-project/:project_id", post(routes::projects::select_project))
        .route("/projects/:project_id/members", get(routes::projects::list_members))
        .route(
            "/projects/:project_id/members/:user_id",
            put(routes::projects::add_member),
        )
        .route(
            "/projects/:project_id/invitations",
            post(routes::invitations::create_invitation),
        )
        .route(
            "/projects/:project_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/tasks/:task_id/comments",
            get(routes::comments::list_comments).post(routes::comments::add_comment),
        )
        .route(
            "/chat/:conversation_id/messages",
            get(routes::chat::list_messages).post(routes::chat::post_message),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/ws", get(routes::ws::ws_handler))
        .nest("/api/v1", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Any origin when none are configured, otherwise only the listed ones
///
/// Credentials (the session cookie) are only allowed for listed origins.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins = &config.api.cors_origins;
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
