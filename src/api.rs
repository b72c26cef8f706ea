use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    ApiEnvelope, Article, ArticleQuery, AuthUser, Course, EnrollmentCheck,
    EnrollmentRequestPayload, EnrollmentSubmitResult, FieldErrors,
};

/// BackendApi Trait
///
/// The abstract contract for every call the site makes to the upstream REST API.
/// Handlers only ever see this trait, so the HTTP client can be swapped for the caching
/// decorator in production or a stub in router tests.
///
/// Methods return the degraded value the page should render instead of an error: catalog
/// pages show an empty grid when the API is down, detail pages show "not found".
#[async_trait]
pub trait BackendApi: Send + Sync {
    // --- Public Catalog ---
    async fn get_courses(&self) -> Vec<Course>;
    async fn get_course_by_slug(&self, slug: &str) -> Option<Course>;
    async fn get_articles(&self, query: &ArticleQuery) -> Vec<Article>;
    async fn get_article_by_slug(&self, slug: &str) -> Option<Article>;

    // --- Auth ---
    /// Builds the URL that starts the upstream Google OAuth flow. No request is made.
    fn google_login_url(&self, redirect_to: &str) -> String;
    async fn fetch_me(&self, token: &str) -> Option<AuthUser>;
    /// Revokes the token upstream. Failures are ignored; the caller drops the session anyway.
    async fn logout(&self, token: &str);

    // --- Enrollment ---
    async fn submit_enrollment(
        &self,
        token: &str,
        payload: &EnrollmentRequestPayload,
    ) -> EnrollmentSubmitResult;
    async fn check_enrollment(&self, token: &str, course_slug: &str) -> EnrollmentCheck;
}

/// ApiState
///
/// The concrete type used to share upstream API access across the application state.
pub type ApiState = Arc<dyn BackendApi>;

/// ApiError
///
/// Internal failure taxonomy of the HTTP client. Never leaves this module: the trait
/// implementation logs it and falls back to the degraded value.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to upstream API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream API answered {status}")]
    Status { status: StatusCode },

    #[error("upstream API returned an unexpected body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HttpBackendApi
///
/// The concrete `BackendApi` backed by `reqwest`. Endpoint paths are fixed; only the base
/// URL comes from configuration.
#[derive(Clone)]
pub struct HttpBackendApi {
    client: Client,
    base_url: String,
}

const FRONTEND_PREFIX: &str = "/api/v1/frontend";

impl HttpBackendApi {
    /// Creates a client for the API rooted at `base_url` (no trailing slash required).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, FRONTEND_PREFIX, path)
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
    }

    /// Sends the request and decodes the `data` field of a successful response.
    async fn fetch_data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status });
        }
        let bytes = response.bytes().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }

    async fn fetch_list<T: DeserializeOwned>(&self, url: String) -> Vec<T> {
        // `data` must be an array; anything else renders as an empty catalog.
        match self.fetch_data::<Value>(self.client.get(&url)).await {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value(item) {
                    Ok(parsed) => Some(parsed),
                    Err(error) => {
                        tracing::warn!(endpoint = %url, %error, "Skipping malformed catalog entry");
                        None
                    }
                })
                .collect(),
            Ok(_) => {
                tracing::warn!(endpoint = %url, "Catalog response data is not an array");
                Vec::new()
            }
            Err(error) => {
                tracing::warn!(endpoint = %url, %error, "Catalog fetch failed");
                Vec::new()
            }
        }
    }

    async fn fetch_one<T: DeserializeOwned>(&self, url: String) -> Option<T> {
        match self.fetch_data::<Option<T>>(self.client.get(&url)).await {
            Ok(item) => item,
            Err(ApiError::Status { status }) if status == StatusCode::NOT_FOUND => None,
            Err(error) => {
                tracing::warn!(endpoint = %url, %error, "Detail fetch failed");
                None
            }
        }
    }
}

/// Percent-encodes a single query or path component.
pub fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[async_trait]
impl BackendApi for HttpBackendApi {
    async fn get_courses(&self) -> Vec<Course> {
        self.fetch_list(self.endpoint("/courses")).await
    }

    async fn get_course_by_slug(&self, slug: &str) -> Option<Course> {
        self.fetch_one(self.endpoint(&format!("/courses/{}", encode_component(slug))))
            .await
    }

    async fn get_articles(&self, query: &ArticleQuery) -> Vec<Article> {
        // The serializer is not Send; it must be gone before the await below.
        let search = {
            let mut params = url::form_urlencoded::Serializer::new(String::new());
            if let Some(category) = &query.category {
                params.append_pair("category", category);
            }
            if let Some(per_page) = query.per_page {
                params.append_pair("per_page", &per_page.to_string());
            }
            params.finish()
        };

        let mut url = self.endpoint("/articles");
        if !search.is_empty() {
            url.push('?');
            url.push_str(&search);
        }
        self.fetch_list(url).await
    }

    async fn get_article_by_slug(&self, slug: &str) -> Option<Article> {
        self.fetch_one(self.endpoint(&format!("/articles/{}", encode_component(slug))))
            .await
    }

    fn google_login_url(&self, redirect_to: &str) -> String {
        format!(
            "{}?redirect_to={}",
            self.endpoint("/auth/google/redirect"),
            encode_component(redirect_to)
        )
    }

    async fn fetch_me(&self, token: &str) -> Option<AuthUser> {
        let request = self.authorized(self.client.get(self.endpoint("/auth/me")), token);
        match self.fetch_data::<Option<AuthUser>>(request).await {
            Ok(user) => user,
            Err(error) => {
                // 401 here just means the token expired upstream.
                tracing::debug!(%error, "Profile fetch failed");
                None
            }
        }
    }

    async fn logout(&self, token: &str) {
        let request = self.authorized(self.client.post(self.endpoint("/auth/logout")), token);
        if let Err(error) = request.send().await {
            tracing::warn!(%error, "Upstream logout failed; dropping local session anyway");
        }
    }

    async fn submit_enrollment(
        &self,
        token: &str,
        payload: &EnrollmentRequestPayload,
    ) -> EnrollmentSubmitResult {
        let request = self
            .authorized(self.client.post(self.endpoint("/enrollment-requests")), token)
            .json(payload);

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, course_id = payload.course_id, "Enrollment submit failed");
                return EnrollmentSubmitResult {
                    ok: false,
                    message: Some("Network error".to_string()),
                    errors: FieldErrors::new(),
                };
            }
        };

        let status = response.status();
        // An unreadable body is treated as `{}`.
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        if status.is_success() {
            tracing::info!(course_id = payload.course_id, "Enrollment request submitted");
            return EnrollmentSubmitResult {
                ok: true,
                message,
                errors: FieldErrors::new(),
            };
        }

        tracing::info!(
            course_id = payload.course_id,
            status = %status,
            "Enrollment request rejected upstream"
        );
        EnrollmentSubmitResult {
            ok: false,
            message,
            errors: parse_field_errors(body.get("errors")),
        }
    }

    async fn check_enrollment(&self, token: &str, course_slug: &str) -> EnrollmentCheck {
        let url = format!(
            "{}?course_slug={}",
            self.endpoint("/enrollment-requests/check"),
            encode_component(course_slug)
        );
        let request = self.authorized(self.client.get(&url), token);

        let body = match request.send().await {
            Ok(response) if response.status().is_success() => {
                response.json::<Value>().await.unwrap_or(Value::Null)
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), course_slug, "Enrollment check refused");
                return EnrollmentCheck::default();
            }
            Err(error) => {
                tracing::warn!(%error, course_slug, "Enrollment check failed");
                return EnrollmentCheck::default();
            }
        };

        // Some deployments wrap the answer in `data`, others return it flat.
        let source = body.get("data").filter(|d| d.is_object()).unwrap_or(&body);
        EnrollmentCheck {
            ok: true,
            has_pending: source
                .get("has_pending")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            course_name: string_field(source, "course_name"),
            course_slug: string_field(source, "course_slug"),
        }
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Reads a Laravel-style `{"field": ["message", ...]}` map, ignoring anything malformed.
fn parse_field_errors(errors: Option<&Value>) -> FieldErrors {
    let Some(Value::Object(map)) = errors else {
        return FieldErrors::new();
    };
    map.iter()
        .filter_map(|(field, messages)| {
            let messages: Vec<String> = match messages {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Value::String(single) => vec![single.clone()],
                _ => return None,
            };
            Some((field.clone(), messages))
        })
        .collect()
}
