use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Catalog Schemas (Upstream Responses) ---

/// ApiEnvelope
///
/// The upstream API wraps every resource payload in `{ "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// Subject
///
/// The teaching subject a course belongs to (e.g. "Programming").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// CourseSchedule
///
/// One weekly session of a course. Times are 24-hour `HH:MM` strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CourseSchedule {
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
}

/// Course
///
/// A published course as returned by `GET /api/v1/frontend/courses`.
/// Everything except the identity fields is optional upstream and defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Course {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subject: Option<Subject>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default = "default_duration_unit")]
    pub duration_unit: String,
    #[serde(default)]
    pub monthly_fee: Option<f64>,
    #[serde(default)]
    pub total_fee: Option<f64>,
    #[serde(default)]
    pub course_type: Option<String>,
    #[serde(default)]
    pub total_hours: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    // ISO dates (YYYY-MM-DD).
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub enrollment_end_date: Option<String>,
    #[serde(default)]
    pub schedules: Vec<CourseSchedule>,
}

fn default_duration_unit() -> String {
    "month".to_string()
}

/// Article
///
/// A published article (news, tips, announcements). `body` is trusted HTML authored in
/// the upstream CMS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    // RFC 3339 timestamp.
    #[serde(default)]
    pub published_at: Option<String>,
}

/// ArticleQuery
///
/// Optional filters forwarded to the article listing endpoint. Absent values are omitted
/// from the upstream query string.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArticleQuery {
    pub category: Option<String>,
    pub per_page: Option<u32>,
}

// --- Identity Schemas ---

/// AuthUser
///
/// The logged-in student's account as returned by `GET /api/v1/frontend/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub student: Option<StudentProfile>,
}

/// StudentProfile
///
/// Student-specific details, present once the account has enrolled before.
/// Used to prefill the enrollment form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct StudentProfile {
    pub id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub school_type: Option<String>,
    #[serde(default)]
    pub school_other: Option<String>,
    // Upstream field `class`: the class the student last asked for.
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub facebook_link: Option<String>,
}

// --- Enrollment Schemas ---

/// SchoolType
///
/// The kind of school the student attends. `Other` requires a free-text school name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchoolType {
    #[default]
    International,
    Government,
    Private,
    Other,
}

impl SchoolType {
    pub const ALL: [SchoolType; 4] = [
        SchoolType::International,
        SchoolType::Government,
        SchoolType::Private,
        SchoolType::Other,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "international" => Some(SchoolType::International),
            "government" => Some(SchoolType::Government),
            "private" => Some(SchoolType::Private),
            "other" => Some(SchoolType::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchoolType::International => "international",
            SchoolType::Government => "government",
            SchoolType::Private => "private",
            SchoolType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SchoolType::International => "International school",
            SchoolType::Government => "Government school",
            SchoolType::Private => "Private school",
            SchoolType::Other => "Other",
        }
    }
}

/// EnrollmentRequestPayload
///
/// Body of `POST /api/v1/frontend/enrollment-requests`.
/// `school_other` is only sent when `school_type` is `other`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentRequestPayload {
    pub course_id: i64,
    pub name_en: String,
    pub age: u32,
    pub education: String,
    pub class_interest: String,
    pub school_type: SchoolType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_other: Option<String>,
    pub facebook_account: String,
    pub phone: String,
    pub town_address: String,
}

/// Field name -> validation messages, as produced by the upstream validator.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// EnrollmentSubmitResult
///
/// Normalized outcome of an enrollment submission. Transport failures are folded into
/// `ok = false` with a "Network error" message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EnrollmentSubmitResult {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: FieldErrors,
}

/// EnrollmentCheck
///
/// Answer of `GET /api/v1/frontend/enrollment-requests/check`: whether the student already
/// has a pending request for a course. `ok` is false when the check itself failed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct EnrollmentCheck {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub has_pending: bool,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub course_slug: String,
}

/// SessionResponse
///
/// Output schema of `GET /api/session`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<AuthUser>,
}
