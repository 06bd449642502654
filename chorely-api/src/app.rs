/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chorely_api::{app::AppState, config::Config};
/// use chorely_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = chorely_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use chorely_shared::auth::middleware::{session_auth_middleware, AuthError};
use chorely_shared::services::{
    ChoreLedger, CompletionLog, FamilyRegistry, IdentityService, TokenSettings,
};
use chorely_shared::store::Store;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every
/// service shares the same store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,

    pub config: Arc<Config>,

    pub identity: IdentityService,

    pub families: FamilyRegistry,

    pub chores: ChoreLedger,

    pub completions: CompletionLog,
}

impl AppState {
    /// Wires the services on top of `store`
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let identity = IdentityService::new(
            store.clone(),
            TokenSettings {
                secret: config.jwt.secret.clone(),
                ttl: config.session_ttl(),
            },
            config.password_hash,
        );
        let completions = CompletionLog::new(store.clone());
        let chores = ChoreLedger::new(store.clone(), completions.clone(), config.completion_policy);

        Self {
            families: FamilyRegistry::new(store.clone()),
            store,
            config: Arc::new(config),
            identity,
            chores,
            completions,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api/v1
/// ├── GET    /health                    # Health check (public)
/// ├── /auth
/// │   ├── POST   /sign_up               # public
/// │   ├── POST   /sign_in               # public
/// │   ├── DELETE /sign_out
/// │   └── GET    /me
/// ├── /families
/// │   ├── POST   /
/// │   ├── POST   /join
/// │   └── GET    /my_family
/// ├── /chores
/// │   ├── GET    /  POST /
/// │   ├── GET    /:id  PUT /:id  DELETE /:id
/// │   ├── POST   /:id/assign
/// │   └── POST   /:id/complete
/// └── GET    /completions
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Response compression (gzip or brotli, per `Accept-Encoding`)
/// 5. Session authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/sign_up", post(routes::auth::sign_up))
        .route("/auth/sign_in", post(routes::auth::sign_in));

    let protected_routes = Router::new()
        .route("/auth/sign_out", delete(routes::auth::sign_out))
        .route("/auth/me", get(routes::auth::me))
        .route("/families", post(routes::families::create_family))
        .route("/families/join", post(routes::families::join_family))
        .route("/families/my_family", get(routes::families::my_family))
        .route(
            "/chores",
            get(routes::chores::list_chores).post(routes::chores::create_chore),
        )
        .route(
            "/chores/:id",
            get(routes::chores::get_chore)
                .put(routes::chores::update_chore)
                .delete(routes::chores::delete_chore),
        )
        .route("/chores/:id/assign", post(routes::chores::assign_chore))
        .route("/chores/:id/complete", post(routes::chores::complete_chore))
        .route("/completions", get(routes::completions::list_completions))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
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
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .nest("/api/v1", v1_routes)
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Resolves the bearer token and injects an `AuthContext`
async fn session_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    session_auth_middleware(state.identity.clone(), req, next).await
}
