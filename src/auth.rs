use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use headers::HeaderMapExt;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    api::encode_component,
    config::{AppConfig, Env},
    locale::Locale,
};

/// Name of the cookie holding the signed session.
pub const SESSION_COOKIE: &str = "tiptop_session";
/// Name of the one-shot cookie carrying the last auth outcome to the next rendered page.
pub const FLASH_COOKIE: &str = "tiptop_auth_flash";
/// Development-only header accepted in place of a session cookie.
pub const TOKEN_BYPASS_HEADER: &str = "x-api-token";

/// SessionClaims
///
/// Payload of the session cookie. The upstream API issues an opaque bearer token after
/// Google login; we keep it server-side-signed so the browser cannot swap in another one
/// and scripts cannot read it (the cookie is HttpOnly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (sub): the upstream API bearer token.
    pub sub: String,
    /// Issued At (iat).
    pub iat: u64,
    /// Expiration Time (exp). Checked on every decode.
    pub exp: u64,
}

/// issue_session
///
/// Signs a session for `api_token` valid for `session_ttl_hours`.
pub fn issue_session(
    config: &AppConfig,
    api_token: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as u64;
    let claims = SessionClaims {
        sub: api_token.to_string(),
        iat: now,
        exp: now + session_max_age(config) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
}

/// decode_session
///
/// Verifies signature and expiry of a session cookie value and returns the upstream token.
/// Any failure (tampered, expired, malformed) simply means "not logged in".
pub fn decode_session(config: &AppConfig, cookie_value: &str) -> Option<String> {
    let decoding_key = DecodingKey::from_secret(config.session_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<SessionClaims>(cookie_value, &decoding_key, &validation) {
        Ok(data) if !data.claims.sub.is_empty() => Some(data.claims.sub),
        Ok(_) => None,
        Err(error) => {
            tracing::debug!(%error, "Ignoring invalid session cookie");
            None
        }
    }
}

fn session_max_age(config: &AppConfig) -> i64 {
    config.session_ttl_hours.max(0) * 3600
}

fn build_cookie(config: &AppConfig, name: &str, value: &str, max_age: i64) -> String {
    let secure = if config.env == Env::Production {
        "; Secure"
    } else {
        ""
    };
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}")
}

pub fn session_cookie(config: &AppConfig, signed: &str) -> String {
    build_cookie(config, SESSION_COOKIE, signed, session_max_age(config))
}

pub fn clear_session_cookie(config: &AppConfig) -> String {
    build_cookie(config, SESSION_COOKIE, "", 0)
}

pub fn flash_cookie(config: &AppConfig, flash: &AuthFlash) -> String {
    // Only needs to survive the redirect that follows.
    build_cookie(config, FLASH_COOKIE, &flash.encode(), 300)
}

pub fn clear_flash_cookie(config: &AppConfig) -> String {
    build_cookie(config, FLASH_COOKIE, "", 0)
}

/// Appends `Set-Cookie` headers to an outgoing response.
pub fn with_cookies(mut response: Response, cookies: &[String]) -> Response {
    for cookie in cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(error) => tracing::warn!(%error, "Dropping unencodable cookie"),
        }
    }
    response
}

fn renders_page(response: &Response) -> bool {
    !response.status().is_redirection()
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"))
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .typed_get::<headers::Cookie>()
        .and_then(|cookies| cookies.get(name).map(str::to_string))
        .filter(|value| !value.is_empty())
}

// --- Extractors ---

/// Session Extractor Result
///
/// The upstream bearer token of the current visitor, if they are logged in.
/// Handlers that need a student use the token to call authenticated upstream endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Session(pub Option<String>);

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Session Extractor Implementation
///
/// Resolution order:
/// 1. Local bypass: in `Env::Local`, a non-empty `x-api-token` header is used verbatim.
///    This lets developers drive the enrollment pages with a token copied from the API.
/// 2. The signed `tiptop_session` cookie, verified with `SESSION_SECRET`.
///
/// Never rejects: anonymous visitors get `Session(None)` and see the login prompt.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(token) = parts
                .headers
                .get(TOKEN_BYPASS_HEADER)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
            {
                return Ok(Session(Some(token.to_string())));
            }
        }

        let token = read_cookie(&parts.headers, SESSION_COOKIE)
            .and_then(|cookie| decode_session(&config, &cookie));
        Ok(Session(token))
    }
}

/// AuthFlash
///
/// The outcome of the last login/logout round trip, shown once on the next enrollment page.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthFlash {
    Success,
    Error(String),
    LoggedOut,
}

impl AuthFlash {
    fn encode(&self) -> String {
        match self {
            AuthFlash::Success => "success".to_string(),
            AuthFlash::LoggedOut => "logged_out".to_string(),
            AuthFlash::Error(message) => format!("error:{}", encode_component(message)),
        }
    }

    pub fn decode(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(AuthFlash::Success),
            "logged_out" => Some(AuthFlash::LoggedOut),
            _ => {
                let encoded = raw.strip_prefix("error:")?;
                let message = url::form_urlencoded::parse(encoded.as_bytes())
                    .next()
                    .map(|(key, _)| key.into_owned())
                    .unwrap_or_default();
                if message.is_empty() {
                    None
                } else {
                    Some(AuthFlash::Error(message))
                }
            }
        }
    }

    /// User-facing text.
    pub fn message(&self) -> String {
        match self {
            AuthFlash::Success => "You are now signed in with Google.".to_string(),
            AuthFlash::Error(reason) => format!("Login failed: {reason}"),
            AuthFlash::LoggedOut => "You have been logged out.".to_string(),
        }
    }
}

/// Flash Extractor
///
/// Reads (but does not clear) the flash cookie. The handler that renders the message must
/// attach `clear_flash_cookie` to its response.
#[derive(Debug, Clone, PartialEq)]
pub struct Flash(pub Option<AuthFlash>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(
            read_cookie(&parts.headers, FLASH_COOKIE).and_then(|raw| AuthFlash::decode(&raw)),
        ))
    }
}

// --- OAuth Callback ---

/// CallbackOutcome
///
/// What the OAuth callback query string asks for. The upstream API redirects back to the
/// page that started the login with `?auth=success&token=...` or `?auth=error&message=...`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// `auth=success`. The token may be missing, in which case only the flash is set.
    Success { token: Option<String> },
    /// `auth=error`, with the upstream message or a default.
    Error { message: String },
}

impl CallbackOutcome {
    /// Classifies a raw query string. Returns `None` when it is not an auth callback.
    pub fn from_query(query: &str) -> Option<Self> {
        let mut auth = None;
        let mut token = None;
        let mut message = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "auth" => auth = Some(value.into_owned()),
                "token" => token = Some(value.into_owned()),
                "message" => message = Some(value.into_owned()),
                _ => {}
            }
        }

        match auth.as_deref() {
            Some("success") => Some(CallbackOutcome::Success {
                token: token.filter(|t| !t.is_empty()),
            }),
            Some("error") => Some(CallbackOutcome::Error {
                message: message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            }),
            _ => None,
        }
    }
}

/// auth_callback
///
/// Middleware that completes the OAuth round trip on whatever page the student returns to.
///
/// * `auth=success`: stores the token in the session cookie, sets the `success` flash.
/// * `auth=error`: clears any session, sets the error flash.
///
/// Both redirect (303) to the bare path so the token never lingers in the address bar,
/// history or referrer headers. Every other request passes through; a pending flash is
/// expired on the first HTML page rendered after it, whether or not that page shows it.
pub async fn auth_callback(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let Some(outcome) = request.uri().query().and_then(CallbackOutcome::from_query) else {
        let had_flash = read_cookie(request.headers(), FLASH_COOKIE).is_some();
        let response = next.run(request).await;
        return if had_flash && renders_page(&response) && !sets_cookie(&response, FLASH_COOKIE) {
            with_cookies(response, &[clear_flash_cookie(&config)])
        } else {
            response
        };
    };
    let bare_path = request.uri().path().to_string();

    let cookies = match outcome {
        CallbackOutcome::Success { token } => {
            let mut cookies = Vec::with_capacity(2);
            if let Some(token) = token {
                match issue_session(&config, &token) {
                    Ok(signed) => cookies.push(session_cookie(&config, &signed)),
                    Err(error) => tracing::error!(%error, "Failed to sign session cookie"),
                }
            }
            tracing::info!(path = %bare_path, "OAuth login completed");
            cookies.push(flash_cookie(&config, &AuthFlash::Success));
            cookies
        }
        CallbackOutcome::Error { message } => {
            tracing::info!(path = %bare_path, reason = %message, "OAuth login failed");
            vec![
                clear_session_cookie(&config),
                flash_cookie(&config, &AuthFlash::Error(message)),
            ]
        }
    };

    with_cookies(Redirect::to(&bare_path).into_response(), &cookies)
}

/// sanitize_redirect
///
/// Accepts only site-relative paths (`/...` but not `//host`) as post-login/logout targets.
/// Anything else falls back to the locale home, closing the open-redirect hole.
pub fn sanitize_redirect(candidate: Option<&str>, locale: Locale) -> String {
    match candidate {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://") =>
        {
            path.to_string()
        }
        _ => locale.href(""),
    }
}
