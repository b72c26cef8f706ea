use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Locale-prefixed pages readable by anyone. Unknown `{locale}` codes are rejected by
/// the handlers with the 404 page.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Bare origin goes to the default locale.
        .route("/", get(handlers::root_redirect))
        .route("/{locale}", get(handlers::home))
        .route("/{locale}/courses", get(handlers::courses))
        .route("/{locale}/courses/{slug}", get(handlers::course_detail))
        // GET /{locale}/articles?category=...&per_page=...
        .route("/{locale}/articles", get(handlers::articles))
        .route("/{locale}/articles/{slug}", get(handlers::article_detail))
        .route("/{locale}/login", get(handlers::login))
        // GET /{locale}/login/google?redirect_to=...
        // 303 into the upstream OAuth flow.
        .route("/{locale}/login/google", get(handlers::login_google))
        .route("/{locale}/contact", get(handlers::contact))
        .route("/{locale}/privacy", get(handlers::privacy))
}
