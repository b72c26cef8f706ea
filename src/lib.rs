use axum::{Router, extract::FromRef, http::HeaderName, middleware};
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

// Upstream REST client and its catalog cache.
pub mod api;
pub mod cache;

// Session cookie, OAuth callback and request-scoped extractors.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

// Domain logic and presentation.
pub mod enrollment;
pub mod format;
pub mod locale;
pub mod seo;
pub mod views;

pub mod routes;
use routes::{api::api_routes, enrollment::enrollment_routes, public::public_routes};

// --- Public Re-exports ---

pub use api::{ApiState, BackendApi, HttpBackendApi};
pub use cache::CachedBackendApi;
pub use config::AppConfig;

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
/// HTML pages are not part of it.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_session, handlers::check_enrollment),
    components(
        schemas(
            models::SessionResponse, models::AuthUser, models::StudentProfile,
            models::EnrollmentCheck,
        )
    ),
    tags(
        (name = "tiptop-site", description = "Tip-Top Education site API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable state: the upstream API client and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Upstream API, possibly wrapped in the catalog cache.
    pub api: ApiState,
    pub config: AppConfig,
}

impl FromRef<AppState> for ApiState {
    fn from_ref(app_state: &AppState) -> ApiState {
        app_state.api.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles pages, JSON API and Swagger UI behind the OAuth callback middleware, then
/// wraps everything in the request-id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    // Only the JSON endpoints are meant for cross-origin callers.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes())
        .merge(enrollment_routes())
        .merge(api_routes().layer(cors))
        .fallback(handlers::not_found)
        // Wraps every route and the fallback, so `?auth=...` is consumed on any page.
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth::auth_callback,
        ))
        .with_state(state);

    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
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
}

/// trace_span_logger
///
/// Opens the `http_request` span every log line of a request is recorded in, keyed by
/// the `x-request-id` set by `SetRequestIdLayer`.
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
