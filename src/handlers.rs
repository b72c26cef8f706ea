use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    AppState,
    api::encode_component,
    auth::{
        AuthFlash, Flash, Session, clear_flash_cookie, clear_session_cookie, flash_cookie,
        sanitize_redirect, with_cookies,
    },
    enrollment::{
        EnrollmentFormValues, SubmissionOutcome, classify_submission, enrollment_closed,
        enrollment_cta, success_status,
    },
    error::{PageError, PageResult, parse_locale},
    locale::Locale,
    models::{ArticleQuery, EnrollmentCheck, SessionResponse},
    seo::{PageMetadata, PageOptions, article_metadata, build_page_metadata, site_title},
    views::{self, EnrollView, Notice, PENDING_NOTICE, PageContext},
};

// --- Query & Form Structs ---

/// RedirectQuery
///
/// `?redirect_to=` on the Google login entry point.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect_to: Option<String>,
}

/// LogoutForm
///
/// Hidden field posted by the logout button.
#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    pub redirect_to: Option<String>,
}

/// SuccessQuery
///
/// `?course=` on the enrollment success page.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub course: Option<String>,
}

/// CheckQuery
///
/// Query parameters of the enrollment check endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckQuery {
    /// Slug of the course to check. Missing on an authenticated request yields 400.
    pub course_slug: Option<String>,
}

// --- Helpers ---

fn page_metadata(
    state: &AppState,
    title: &str,
    description: Option<&str>,
    locale: Locale,
    path: &str,
    no_index: bool,
) -> PageMetadata {
    build_page_metadata(
        title,
        description,
        locale,
        path,
        PageOptions {
            no_index,
            ..PageOptions::default()
        },
        &state.config.app_base_url,
    )
}

fn context(locale: Locale, uri: &Uri) -> PageContext {
    PageContext::new(locale, uri.path(), uri.query())
}

// --- Catalog Pages ---

/// GET / sends visitors to the default locale.
pub async fn root_redirect() -> Redirect {
    Redirect::temporary(&Locale::default().href(""))
}

pub async fn home(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let courses = state.api.get_courses().await;
    let meta = page_metadata(&state, &site_title("Home"), None, locale, "", false);
    Ok(Html(views::home_page(&context(locale, &uri), &meta, &courses)))
}

pub async fn courses(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let courses = state.api.get_courses().await;
    let meta = page_metadata(
        &state,
        &site_title("Courses"),
        Some("Browse the computer courses currently open for enrollment."),
        locale,
        "courses",
        false,
    );
    Ok(Html(views::courses_page(&context(locale, &uri), &meta, &courses)))
}

/// course_detail
///
/// Logged-in visitors trigger an enrollment check so the CTA can show "already enrolled";
/// anonymous visitors skip it.
pub async fn course_detail(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
    session: Session,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let course = state
        .api
        .get_course_by_slug(&slug)
        .await
        .ok_or(PageError::NotFound(locale))?;

    let check = match session.token() {
        Some(token) => Some(state.api.check_enrollment(token, &course.slug).await),
        None => None,
    };
    let cta = enrollment_cta(&course, Utc::now().date_naive(), check.as_ref());

    let subject = course.subject.as_ref().map_or("Course", |s| s.name.as_str());
    let description = format!("{} - {}", course.title, subject);
    let meta = page_metadata(
        &state,
        &site_title(&course.title),
        Some(&description),
        locale,
        &format!("courses/{}", course.slug),
        false,
    );
    Ok(Html(views::course_detail_page(
        &context(locale, &uri),
        &meta,
        &course,
        cta,
    )))
}

pub async fn articles(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<ArticleQuery>,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let articles = state.api.get_articles(&query).await;
    let meta = page_metadata(
        &state,
        &site_title("Articles"),
        Some("News, tips and announcements."),
        locale,
        "articles",
        false,
    );
    Ok(Html(views::articles_page(&context(locale, &uri), &meta, &articles)))
}

pub async fn article_detail(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let article = state
        .api
        .get_article_by_slug(&slug)
        .await
        .ok_or(PageError::NotFound(locale))?;

    let meta = article_metadata(&article, locale, &state.config.app_base_url);
    let share_url = meta.canonical.clone();
    Ok(Html(views::article_detail_page(
        &context(locale, &uri),
        &meta,
        &article,
        &share_url,
    )))
}

pub async fn contact(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let meta = page_metadata(&state, &site_title("Contact"), None, locale, "contact", false);
    Ok(Html(views::contact_page(&context(locale, &uri), &meta)))
}

pub async fn privacy(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let meta = page_metadata(
        &state,
        &site_title("Privacy policy"),
        None,
        locale,
        "privacy",
        false,
    );
    Ok(Html(views::privacy_page(&context(locale, &uri), &meta)))
}

/// Fallback for every unmatched path.
pub async fn not_found(uri: Uri) -> PageError {
    let locale = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .and_then(Locale::from_code)
        .unwrap_or_default();
    PageError::NotFound(locale)
}

// --- Login / Logout ---

pub async fn login(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let meta = page_metadata(&state, &site_title("Login"), None, locale, "login", true);
    Ok(Html(views::login_page(&context(locale, &uri), &meta)))
}

/// login_google
///
/// Hands the browser to the upstream Google OAuth flow. The upstream redirects back to
/// the site-relative `redirect_to` on its configured frontend origin, where
/// `auth_callback` picks up the result.
pub async fn login_google(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<RedirectQuery>,
) -> PageResult<Redirect> {
    let locale = parse_locale(&locale)?;
    let target = sanitize_redirect(query.redirect_to.as_deref(), locale);
    Ok(Redirect::to(&state.api.google_login_url(&target)))
}

/// logout
///
/// Drops the local session even when the upstream logout fails.
pub async fn logout(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    session: Session,
    Form(form): Form<LogoutForm>,
) -> PageResult<Response> {
    let locale = parse_locale(&locale)?;
    if let Some(token) = session.token() {
        state.api.logout(token).await;
    }
    tracing::info!("Student logged out");

    let target = sanitize_redirect(form.redirect_to.as_deref(), locale);
    Ok(with_cookies(
        Redirect::to(&target).into_response(),
        &[
            clear_session_cookie(&state.config),
            flash_cookie(&state.config, &AuthFlash::LoggedOut),
        ],
    ))
}

// --- Enrollment ---

fn flash_notice(flash: &AuthFlash) -> Notice {
    match flash {
        AuthFlash::Success => Notice::Success(flash.message()),
        AuthFlash::Error(_) => Notice::Error(flash.message()),
        AuthFlash::LoggedOut => Notice::Info(flash.message()),
    }
}

fn enroll_metadata(state: &AppState, locale: Locale, title: &str, slug: &str) -> PageMetadata {
    page_metadata(
        state,
        &site_title(&format!("Enroll in {title}")),
        None,
        locale,
        &format!("enroll/{slug}"),
        true,
    )
}

/// enroll_form
///
/// Renders the enrollment page. For a logged-in student the form is prefilled from their
/// profile; an upstream token that no longer resolves to a profile ends the session.
pub async fn enroll_form(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
    session: Session,
    Flash(flash): Flash,
    uri: Uri,
) -> PageResult<Response> {
    let locale = parse_locale(&locale)?;
    let course = state
        .api
        .get_course_by_slug(&slug)
        .await
        .ok_or(PageError::NotFound(locale))?;

    let mut cookies = Vec::new();
    let mut view = EnrollView {
        closed: enrollment_closed(&course, Utc::now().date_naive()),
        return_to: uri.path().to_string(),
        ..EnrollView::default()
    };
    if let Some(flash) = &flash {
        view.notices.push(flash_notice(flash));
        cookies.push(clear_flash_cookie(&state.config));
    }

    if let Some(token) = session.token() {
        match state.api.fetch_me(token).await {
            Some(user) => {
                view.logged_in = true;
                view.values = EnrollmentFormValues::from_profile(&user);
                let check = state.api.check_enrollment(token, &course.slug).await;
                if check.ok && check.has_pending {
                    view.notices.push(Notice::Pending(PENDING_NOTICE.to_string()));
                }
            }
            None => {
                tracing::debug!("Session token rejected upstream; clearing session");
                cookies.push(clear_session_cookie(&state.config));
            }
        }
    }

    let meta = enroll_metadata(&state, locale, &course.title, &course.slug);
    let html = views::enroll_page(&context(locale, &uri), &meta, &course, &view);
    Ok(with_cookies(Html(html).into_response(), &cookies))
}

/// enroll_submit
///
/// Checks for an existing pending request first and never submits a duplicate. Local
/// validation failures and upstream rejections re-render the form with the student's input.
pub async fn enroll_submit(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
    session: Session,
    uri: Uri,
    Form(values): Form<EnrollmentFormValues>,
) -> PageResult<Response> {
    let locale = parse_locale(&locale)?;
    let enroll_href = locale.href(&format!("enroll/{slug}"));
    let Some(token) = session.token() else {
        return Ok(Redirect::to(&enroll_href).into_response());
    };
    let course = state
        .api
        .get_course_by_slug(&slug)
        .await
        .ok_or(PageError::NotFound(locale))?;
    if enrollment_closed(&course, Utc::now().date_naive()) {
        return Err(PageError::BadRequest {
            message: views::CLOSED_NOTICE.to_string(),
        });
    }

    let check = state.api.check_enrollment(token, &course.slug).await;
    let outcome = if check.ok && check.has_pending {
        SubmissionOutcome::AlreadyPending
    } else {
        match values.to_payload(course.id) {
            Ok(payload) => classify_submission(state.api.submit_enrollment(token, &payload).await),
            Err(field_errors) => SubmissionOutcome::Rejected {
                message: "Please correct the highlighted fields.".to_string(),
                field_errors,
            },
        }
    };

    let mut view = EnrollView {
        logged_in: true,
        return_to: enroll_href,
        values,
        ..EnrollView::default()
    };
    match outcome {
        SubmissionOutcome::Submitted { .. } => {
            let success = format!(
                "{}?course={}",
                locale.href("enroll/success"),
                encode_component(&course.slug)
            );
            return Ok(Redirect::to(&success).into_response());
        }
        SubmissionOutcome::AlreadyPending => {
            view.notices.push(Notice::Pending(PENDING_NOTICE.to_string()));
        }
        SubmissionOutcome::Rejected {
            message,
            field_errors,
        } => {
            view.notices.push(Notice::Error(message));
            view.field_errors = field_errors;
        }
    }

    let meta = enroll_metadata(&state, locale, &course.title, &course.slug);
    let html = views::enroll_page(&context(locale, &uri), &meta, &course, &view);
    Ok(Html(html).into_response())
}

/// enroll_success
///
/// Re-derives the outcome from the upstream check on every request.
pub async fn enroll_success(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<SuccessQuery>,
    session: Session,
    uri: Uri,
) -> PageResult<Html<String>> {
    let locale = parse_locale(&locale)?;
    let slug = query.course.as_deref().map(str::trim).unwrap_or_default();

    let check = match session.token() {
        Some(token) if !slug.is_empty() => Some(state.api.check_enrollment(token, slug).await),
        _ => None,
    };
    let status = success_status(slug, session.token(), check.as_ref());

    let meta = page_metadata(
        &state,
        &site_title("Enrollment submitted"),
        None,
        locale,
        "enroll/success",
        true,
    );
    Ok(Html(views::enroll_success_page(
        &context(locale, &uri),
        &meta,
        &status,
    )))
}

// --- JSON API ---

/// get_session
///
/// Reports whether the caller holds a session and, if the upstream still accepts its
/// token, who they are.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = SessionResponse))
)]
pub async fn get_session(
    State(state): State<AppState>,
    session: Session,
) -> Json<SessionResponse> {
    let user = match session.token() {
        Some(token) => state.api.fetch_me(token).await,
        None => None,
    };
    Json(SessionResponse {
        authenticated: user.is_some(),
        user,
    })
}

/// check_enrollment
///
/// Whether the logged-in student already has a pending request for a course.
#[utoipa::path(
    get,
    path = "/api/enrollment-requests/check",
    params(CheckQuery),
    responses(
        (status = 200, description = "Check result", body = EnrollmentCheck),
        (status = 400, description = "Missing course_slug"),
        (status = 401, description = "No session")
    )
)]
pub async fn check_enrollment(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CheckQuery>,
) -> Result<Json<EnrollmentCheck>, StatusCode> {
    let token = session.token().ok_or(StatusCode::UNAUTHORIZED)?;
    let course_slug = query
        .course_slug
        .as_deref()
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Json(state.api.check_enrollment(token, course_slug).await))
}
