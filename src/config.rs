use std::env;

/// AppConfig
///
/// Holds the site's entire configuration state. Loaded once at startup and never mutated,
/// it is pulled into handlers and extractors via `FromRef` from the shared `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Root of the upstream REST API (courses, articles, auth, enrollment-requests).
    pub api_base_url: String,
    // Public origin of this site. Used for canonical, alternate and Open Graph URLs.
    pub app_base_url: String,
    // Runtime environment marker. Controls the token bypass, log format and cookie flags.
    pub env: Env,
    // HMAC key used to sign and verify the session cookie.
    pub session_secret: String,
    // Lifetime of the session cookie, in hours.
    pub session_ttl_hours: i64,
    // TTL of the public catalog cache in seconds. Zero disables the cache.
    pub catalog_cache_secs: u64,
    // Listen address for the HTTP server.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (token header bypass, pretty logs) and production behavior (JSON logs, `Secure` cookies).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_APP_BASE_URL: &str = "https://tiptopeducation.net";
const LOCAL_SESSION_SECRET: &str = "tiptop-local-session-secret-value";

impl Default for AppConfig {
    /// Non-panicking configuration for tests and scaffolding. No environment variables are read.
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            app_base_url: DEFAULT_APP_BASE_URL.to_string(),
            env: Env::Local,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl_hours: 168,
            catalog_cache_secs: 60,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables and applies the fail-fast principle.
    ///
    /// # Panics
    /// Panics if `SESSION_SECRET` is missing in production, or if a numeric variable is set
    /// but cannot be parsed. Starting with a guessable session key would let anyone forge
    /// a logged-in session.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let session_secret = match env {
            Env::Production => env::var("SESSION_SECRET")
                .expect("FATAL: SESSION_SECRET must be set in production."),
            Env::Local => {
                env::var("SESSION_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string())
            }
        };

        Self {
            api_base_url: trim_base(
                env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            ),
            app_base_url: trim_base(
                env::var("APP_BASE_URL").unwrap_or_else(|_| DEFAULT_APP_BASE_URL.to_string()),
            ),
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", 168),
            catalog_cache_secs: parse_var("CATALOG_CACHE_SECS", 60),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_secret,
            env,
        }
    }
}

// Base URLs are joined with "/…" paths, so a trailing slash would double up.
fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {name} must be a number, got {raw:?}")),
        Err(_) => default,
    }
}
