/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::AppState, config::Config};
/// use taskboard_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config)?;
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use taskboard_shared::{
    auth::{
        guard,
        jwt::TokenService,
        password::{CredentialVerifier, PasswordError},
    },
    models::User,
    store::Store,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Access token issuer/validator
    pub tokens: Arc<TokenService>,

    /// Password hasher/verifier
    pub credentials: Arc<CredentialVerifier>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates application state from a store and configuration
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if the configured Argon2 cost
    /// is rejected.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Result<Self, PasswordError> {
        let credentials = CredentialVerifier::new(config.password)?;
        let tokens = TokenService::new(config.jwt.clone());

        Ok(Self {
            store,
            tokens: Arc::new(tokens),
            credentials: Arc::new(credentials),
            config: Arc::new(config),
        })
    }
}

/// Authenticated caller, inserted into request extensions by the auth layer
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET   /health                  # Health check (public)
/// ├── POST  /auth/login              # Password login (public)
/// ├── GET   /projects                # List/search projects
/// ├── POST  /projects                # Create project
/// ├── GET   /projects/:id/tasks      # List tasks (role-scoped)
/// ├── POST  /projects/:id/tasks      # Create task
/// └── PATCH /tasks/:id               # Update task (optimistic locking)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/:id", patch(routes::tasks::update_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    let cors = cors_layer(state.config.api.cors_origins.as_deref());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = origins else {
        // CORS_ORIGINS=*: permissive CORS
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::IF_MATCH])
        .expose_headers([header::ETAG])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Authentication middleware layer
///
/// Resolves the caller from the `Authorization` header and injects
/// [`CurrentUser`] into request extensions.
async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let user =
        guard::authenticate(state.store.as_ref(), &state.tokens, authorization.as_deref()).await?;
    tracing::debug!(user_id = user.id, role = user.role.as_str(), "Authenticated request");

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
