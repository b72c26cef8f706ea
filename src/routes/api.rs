use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// API Router Module
///
/// JSON endpoints for client-side widgets. Both read the session cookie; the enrollment
/// check answers 401 when there is none.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/session
        .route("/api/session", get(handlers::get_session))
        // GET /api/enrollment-requests/check?course_slug=...
        .route(
            "/api/enrollment-requests/check",
            get(handlers::check_enrollment),
        )
}
