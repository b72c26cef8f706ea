use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::SystemTime;
use tiptop_site::{
    AppConfig,
    auth::{
        AuthFlash, CallbackOutcome, Flash, Session, SessionClaims, decode_session, flash_cookie,
        issue_session, sanitize_redirect, session_cookie,
    },
    config::Env,
    locale::Locale,
};

// --- Helper Functions ---

const TEST_SESSION_SECRET: &str = "test-session-secret-1234567890";
const UPSTREAM_TOKEN: &str = "42|upstream-bearer-token";

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Signs a session cookie value the way a browser would present it.
fn forge_session(secret: &str, sub: &str, exp: u64) -> String {
    let claims = SessionClaims {
        sub: sub.to_string(),
        iat: now_secs(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn test_config(env: Env) -> AppConfig {
    AppConfig {
        env,
        session_secret: TEST_SESSION_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn get_request_parts(uri: &str) -> Parts {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri.parse::<Uri>().unwrap())
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_cookie(parts: &mut Parts, cookie: &str) {
    parts
        .headers
        .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
}

// --- Session Extractor ---

#[tokio::test]
async fn test_session_from_valid_cookie() {
    let config = test_config(Env::Production);
    let cookie = forge_session(TEST_SESSION_SECRET, UPSTREAM_TOKEN, now_secs() + 3600);

    let mut parts = get_request_parts("/my/enroll/python");
    with_cookie(&mut parts, &format!("tiptop_session={cookie}"));

    let session = Session::from_request_parts(&mut parts, &config).await.unwrap();
    assert_eq!(session.token(), Some(UPSTREAM_TOKEN));
}

#[tokio::test]
async fn test_session_missing_cookie_is_anonymous() {
    let config = test_config(Env::Production);
    let mut parts = get_request_parts("/my");

    let session = Session::from_request_parts(&mut parts, &config).await.unwrap();
    assert_eq!(session, Session(None));
}

#[tokio::test]
async fn test_session_rejects_cookie_signed_with_other_secret() {
    let config = test_config(Env::Production);
    let cookie = forge_session("someone-elses-secret", UPSTREAM_TOKEN, now_secs() + 3600);

    let mut parts = get_request_parts("/my");
    with_cookie(&mut parts, &format!("tiptop_session={cookie}"));

    let session = Session::from_request_parts(&mut parts, &config).await.unwrap();
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_session_rejects_expired_cookie() {
    let config = test_config(Env::Production);
    // Well past the default validation leeway.
    let cookie = forge_session(TEST_SESSION_SECRET, UPSTREAM_TOKEN, now_secs() - 3600);

    let mut parts = get_request_parts("/my");
    with_cookie(&mut parts, &format!("tiptop_session={cookie}"));

    let session = Session::from_request_parts(&mut parts, &config).await.unwrap();
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_local_bypass_header_is_accepted() {
    let config = test_config(Env::Local);
    let mut parts = get_request_parts("/my");
    parts
        .headers
        .insert("x-api-token", HeaderValue::from_static("dev-token"));

    let session = Session::from_request_parts(&mut parts, &config).await.unwrap();
    assert_eq!(session.token(), Some("dev-token"));
}

#[tokio::test]
async fn test_bypass_header_ignored_in_production() {
    let config = test_config(Env::Production);
    let mut parts = get_request_parts("/my");
    parts
        .headers
        .insert("x-api-token", HeaderValue::from_static("dev-token"));

    let session = Session::from_request_parts(&mut parts, &config).await.unwrap();
    assert!(session.token().is_none());
}

#[test]
fn test_issue_then_decode_session() {
    let config = test_config(Env::Local);
    let signed = issue_session(&config, UPSTREAM_TOKEN).unwrap();
    assert_eq!(
        decode_session(&config, &signed).as_deref(),
        Some(UPSTREAM_TOKEN)
    );
    assert_eq!(decode_session(&config, "not-a-jwt"), None);
}

#[test]
fn test_session_cookie_attributes() {
    let local = session_cookie(&test_config(Env::Local), "abc");
    assert!(local.starts_with("tiptop_session=abc;"));
    assert!(local.contains("HttpOnly"));
    assert!(local.contains("SameSite=Lax"));
    assert!(local.contains("Max-Age=604800"));
    assert!(!local.contains("Secure"));

    let production = session_cookie(&test_config(Env::Production), "abc");
    assert!(production.ends_with("; Secure"));
}

// --- Flash ---

#[tokio::test]
async fn test_flash_extractor_reads_error_message() {
    let config = test_config(Env::Local);
    let set_cookie = flash_cookie(&config, &AuthFlash::Error("Account disabled".to_string()));
    // "name=value; Path=..." -> "name=value"
    let pair = set_cookie.split(';').next().unwrap().to_string();

    let mut parts = get_request_parts("/my/enroll/python");
    with_cookie(&mut parts, &pair);

    let Flash(flash) = Flash::from_request_parts(&mut parts, &config).await.unwrap();
    let flash = flash.unwrap();
    assert_eq!(flash, AuthFlash::Error("Account disabled".to_string()));
    assert_eq!(flash.message(), "Login failed: Account disabled");
}

#[test]
fn test_flash_decode_variants() {
    assert_eq!(AuthFlash::decode("success"), Some(AuthFlash::Success));
    assert_eq!(AuthFlash::decode("logged_out"), Some(AuthFlash::LoggedOut));
    assert_eq!(AuthFlash::decode("error:"), None);
    assert_eq!(AuthFlash::decode("something"), None);
    assert_eq!(
        AuthFlash::LoggedOut.message(),
        "You have been logged out."
    );
}

// --- OAuth Callback ---

#[test]
fn test_callback_outcome_classification() {
    assert_eq!(
        CallbackOutcome::from_query("auth=success&token=abc"),
        Some(CallbackOutcome::Success {
            token: Some("abc".to_string())
        })
    );
    assert_eq!(
        CallbackOutcome::from_query("auth=success&token="),
        Some(CallbackOutcome::Success { token: None })
    );
    assert_eq!(
        CallbackOutcome::from_query("auth=error&message=Access%20denied"),
        Some(CallbackOutcome::Error {
            message: "Access denied".to_string()
        })
    );
    assert_eq!(
        CallbackOutcome::from_query("auth=error"),
        Some(CallbackOutcome::Error {
            message: "Authentication failed".to_string()
        })
    );
    assert_eq!(CallbackOutcome::from_query("auth=maybe"), None);
    assert_eq!(CallbackOutcome::from_query("course=python"), None);
}

#[test]
fn test_sanitize_redirect() {
    assert_eq!(
        sanitize_redirect(Some("/en/enroll/python"), Locale::En),
        "/en/enroll/python"
    );
    assert_eq!(sanitize_redirect(Some("//evil.example"), Locale::En), "/en");
    assert_eq!(
        sanitize_redirect(Some("https://evil.example/"), Locale::My),
        "/my"
    );
    assert_eq!(sanitize_redirect(Some("/\\evil.example"), Locale::My), "/my");
    assert_eq!(sanitize_redirect(None, Locale::My), "/my");
}
