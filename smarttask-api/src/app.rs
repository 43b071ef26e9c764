/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use smarttask_api::{app::{build_router, text_generator, AppState}, config::Config};
/// use smarttask_shared::store::Stores;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let generator = text_generator(&config.ai)?;
/// let state = AppState::new(Stores::in_memory(), generator, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::{AiConfig, Config}, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use smarttask_shared::{
    ai::{
        gemini::{GeminiClient, GeminiConfig},
        TextGenerator, UnavailableGenerator,
    },
    analytics::AnalyticsEngine,
    auth::{cookies::CookiePolicy, jwt::TokenService, middleware::authenticate},
    store::Stores,
    tasks::TaskService,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub tasks: TaskService,
    pub analytics: AnalyticsEngine,
    pub tokens: TokenService,
    pub cookies: CookiePolicy,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires services on top of `stores`
    ///
    /// # Errors
    ///
    /// Fails when a configured token lifetime is out of range.
    pub fn new(
        stores: Stores,
        generator: Arc<dyn TextGenerator>,
        config: Config,
    ) -> anyhow::Result<Self> {
        let tokens = TokenService::new(config.token_config()?);
        let tasks = TaskService::new(&stores, config.quota_limits());
        let analytics = AnalyticsEngine::new(stores.tasks.clone(), generator, config.ai.timeout);

        Ok(Self {
            tokens,
            tasks,
            analytics,
            cookies: config.cookie_policy(),
            stores,
            config: Arc::new(config),
        })
    }
}

/// Builds the text generator described by `config`
///
/// Without an API key every AI endpoint serves its fallback content.
pub fn text_generator(config: &AiConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let Some(api_key) = &config.api_key else {
        tracing::warn!("GOOGLE_AI_API_KEY not set, AI endpoints will serve fallback content");
        return Ok(Arc::new(UnavailableGenerator));
    };

    let client = GeminiClient::new(GeminiConfig {
        api_key: api_key.clone(),
        model: config.model.clone(),
        base_url: config.base_url.clone(),
        timeout: config.timeout,
    })?;
    Ok(Arc::new(client))
}

/// Whether `origin` is `http://localhost` or `http://127.0.0.1`, any port
pub fn is_loopback_origin(origin: &str) -> bool {
    ["http://localhost", "http://127.0.0.1"].iter().any(|host| {
        origin.strip_prefix(host).is_some_and(|rest| {
            rest.is_empty()
                || rest
                    .strip_prefix(':')
                    .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
        })
    })
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                allowed.contains(origin)
                    || origin.to_str().map(is_loopback_origin).unwrap_or(false)
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api
/// ├── GET  /health
/// ├── /auth                      (public)
/// │   ├── POST /register
/// │   ├── POST /login
/// │   ├── POST /refresh
/// │   └── POST /logout
/// ├── /profile                   (session)
/// │   ├── GET|PATCH /me
/// │   └── POST /change-password
/// ├── /subscription              (session)
/// │   └── POST /upgrade
/// ├── /tasks                     (session)
/// │   ├── POST|GET /
/// │   ├── GET|PATCH|DELETE /:id  (UUID or task number)
/// │   └── POST /:id/time
/// └── /ai                        (session)
///     ├── GET  /analytics/tasks
///     ├── GET  /summary/monthly
///     ├── GET  /insights/productivity
///     └── POST /chat/query
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (per router)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout));

    let profile_routes = Router::new()
        .route(
            "/me",
            get(routes::profile::get_me).patch(routes::profile::update_me),
        )
        .route("/change-password", post(routes::profile::change_password));

    let subscription_routes =
        Router::new().route("/upgrade", post(routes::subscription::upgrade));

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/time", post(routes::tasks::log_time));

    let ai_routes = Router::new()
        .route("/analytics/tasks", get(routes::ai::task_analytics))
        .route("/summary/monthly", get(routes::ai::monthly_summary))
        .route("/insights/productivity", get(routes::ai::productivity_insights))
        .route("/chat/query", post(routes::ai::chat_query));

    let protected = Router::new()
        .nest("/profile", profile_routes)
        .nest("/subscription", subscription_routes)
        .nest("/tasks", task_routes)
        .nest("/ai", ai_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let api = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Resolves the caller from the bearer header or access cookie and injects
/// an `AuthContext` into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&state.tokens, req.headers()).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Rejected unauthenticated request");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}
