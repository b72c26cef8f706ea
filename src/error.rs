use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    locale::Locale,
    seo::{PageOptions, build_page_metadata, site_title},
    views::{PageContext, not_found_page},
};

/// PageError
///
/// Failure of an HTML page handler. Upstream failures never reach here: the API client
/// already degrades them to empty/absent data, which pages turn into `NotFound`.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Page not found")]
    NotFound(Locale),

    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

pub type PageResult<T> = std::result::Result<T, PageError>;

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound(locale) => {
                // Not indexed, so site-relative canonical links are fine here.
                let meta = build_page_metadata(
                    &site_title("Page not found"),
                    None,
                    locale,
                    "",
                    PageOptions {
                        no_index: true,
                        ..PageOptions::default()
                    },
                    "",
                );
                let ctx = PageContext::new(locale, &locale.href(""), None);
                (StatusCode::NOT_FOUND, Html(not_found_page(&ctx, &meta))).into_response()
            }
            PageError::BadRequest { message } => {
                tracing::debug!(%message, "Rejecting bad request");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
        }
    }
}

/// Parses the `{locale}` path segment; unknown codes render the default-locale 404.
pub fn parse_locale(code: &str) -> PageResult<Locale> {
    Locale::from_code(code).ok_or(PageError::NotFound(Locale::default()))
}
