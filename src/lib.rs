use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
};
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

pub mod analytics;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod upload;

pub mod routes;
use auth::{ADMIN_ROLE, AccessPolicy};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::{JwtVerifier, Principal, VerifierState};
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_me, handlers::get_presigned_url,
        handlers::get_admin_stats, handlers::get_analytics
    ),
    components(
        schemas(
            auth::Principal, models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::DashboardStats, models::AnalyticsSummary, models::DailyRevenue,
        )
    ),
    tags(
        (name = "storefront", description = "Storefront admin and customer API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, read-only dependencies for every request. Nothing here is mutated after
/// startup; per-request identity travels in the request extensions instead.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub verifier: VerifierState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state with a `JwtVerifier` keyed by `config.jwt_secret`.
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        let verifier = std::sync::Arc::new(JwtVerifier::from_secret(config.jwt_secret.as_bytes()))
            as VerifierState;

        Self {
            repo,
            storage,
            verifier,
            config,
        }
    }
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for VerifierState {
    fn from_ref(app_state: &AppState) -> VerifierState {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// protect
///
/// Applies the access-control stages for `policy` to every route in `router`.
/// Layers added last run first, so authentication always precedes the role check.
pub fn protect(
    router: Router<AppState>,
    state: &AppState,
    policy: AccessPolicy,
) -> Router<AppState> {
    let router = match policy {
        AccessPolicy::Authenticated => router,
        AccessPolicy::Role(role) => router.route_layer(middleware::from_fn(
            move |request: Request, next: Next| auth::require_role(role, request, next),
        )),
    };

    router.route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_auth,
    ))
}

/// create_router
///
/// Assembles the routing tree, applies access control per route group and the
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protect(
            authenticated::authenticated_routes(),
            &state,
            AccessPolicy::Authenticated,
        ))
        .nest(
            "/admin",
            protect(admin::admin_routes(), &state, AccessPolicy::Role(ADMIN_ROLE)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for each request carrying method, URI and the `x-request-id` so all log
/// lines of one request correlate.
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
