use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Enrollment Router Module
///
/// Pages that act on behalf of a logged-in student. `/enroll/success` is a static segment
/// and wins over `/enroll/{slug}`.
pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        // GET shows the form (or a login prompt); POST submits it.
        .route(
            "/{locale}/enroll/{slug}",
            get(handlers::enroll_form).post(handlers::enroll_submit),
        )
        // GET /{locale}/enroll/success?course=...
        .route("/{locale}/enroll/success", get(handlers::enroll_success))
        // POST /{locale}/logout
        // Form field `redirect_to` picks the page to land on afterwards.
        .route("/{locale}/logout", post(handlers::logout))
}
