use axum::{Router, extract::FromRef, http::HeaderName};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod accounts;
pub mod auth;
pub mod cascade;
pub mod config;
pub mod dns;
pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod store;
pub mod tokens;

// Module for routing segregation (one router per resource).
pub mod routes;
use routes::{account, media as media_routes, token};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use accounts::AccountManager;
pub use config::AppConfig;
pub use dns::{MockDnsResolver, ResolverState, SystemDnsResolver};
pub use media::MediaManager;
pub use store::{MemoryStore, PostgresStore, StoreState};
pub use tokens::TokenAuthority;

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_account, handlers::read_account, handlers::update_account,
        handlers::delete_account, handlers::create_token, handlers::read_token,
        handlers::extend_token, handlers::delete_token, handlers::create_media,
        handlers::list_media, handlers::update_media, handlers::delete_media,
        handlers::ping
    ),
    components(
        schemas(
            models::AccountPublic, models::CreateAccountRequest, models::UpdateAccountRequest,
            models::Token, models::CredentialsRequest, models::ExtendTokenRequest,
            models::Media, models::CreateMediaRequest, models::UpdateMediaRequest,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "linkstash", description = "Token-authenticated media-link API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all incoming requests. Every
/// manager is constructed once at process start and injected here. No
/// handler registry, no module-level state.
#[derive(Clone)]
pub struct AppState {
    /// Account manager: validated CRUD plus the cascade over media links.
    pub accounts: Arc<AccountManager>,
    /// Token authority: the sole authentication primitive.
    pub tokens: Arc<TokenAuthority>,
    /// Media manager: DNS-validated, owner-scoped media records.
    pub media: Arc<MediaManager>,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// build
    ///
    /// Wires the three managers around a shared store and resolver. Used by
    /// main.rs and by every test that assembles an app over `MemoryStore`.
    pub fn build(store: StoreState, resolver: ResolverState, config: AppConfig) -> Self {
        let tokens = Arc::new(TokenAuthority::new(
            store.clone(),
            config.hashing_secret.clone(),
        ));
        let accounts = Arc::new(AccountManager::new(
            store.clone(),
            tokens.clone(),
            config.hashing_secret.clone(),
        ));
        let media = Arc::new(MediaManager::new(store, tokens.clone(), resolver));
        Self {
            accounts,
            tokens,
            media,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and extractors to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for Arc<TokenAuthority> {
    fn from_ref(app_state: &AppState) -> Arc<TokenAuthority> {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<AccountManager> {
    fn from_ref(app_state: &AppState) -> Arc<AccountManager> {
        app_state.accounts.clone()
    }
}

impl FromRef<AppState> for Arc<MediaManager> {
    fn from_ref(app_state: &AppState) -> Arc<MediaManager> {
        app_state.media.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global
/// middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly. The three resource routers have disjoint
    // paths, so merging cannot collide.
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(account::account_routes())
        .merge(token::token_routes())
        .merge(media_routes::media_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost/first).
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a
                // tracing span correlated by the generated request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: extracts the
/// `x-request-id` header (if present) and includes it alongside the HTTP
/// method and URI, so every log line for a request is correlated by one id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
