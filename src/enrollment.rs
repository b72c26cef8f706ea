use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    format::parse_date,
    models::{
        AuthUser, Course, EnrollmentCheck, EnrollmentRequestPayload, EnrollmentSubmitResult,
        FieldErrors, SchoolType,
    },
};

/// Classes a student can express interest in. The first entry is the form default.
pub const CLASS_OPTIONS: [&str; 6] = [
    "Computer Science",
    "Scratch",
    "3D Modeling",
    "Mobile App Creation",
    "Python",
    "Web Design",
];

/// EnrollmentFormValues
///
/// The enrollment form exactly as typed, all strings. Re-rendered verbatim when a
/// submission is rejected so the student does not lose their input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnrollmentFormValues {
    pub name_en: String,
    pub age: String,
    pub education: String,
    pub class_interest: String,
    pub school_type: String,
    pub school_other: String,
    pub facebook_account: String,
    pub phone: String,
    pub town_address: String,
}

impl Default for EnrollmentFormValues {
    fn default() -> Self {
        Self {
            name_en: String::new(),
            age: String::new(),
            education: String::new(),
            class_interest: CLASS_OPTIONS[0].to_string(),
            school_type: SchoolType::International.as_str().to_string(),
            school_other: String::new(),
            facebook_account: String::new(),
            phone: String::new(),
            town_address: String::new(),
        }
    }
}

impl EnrollmentFormValues {
    /// from_profile
    ///
    /// Prefills the form from the student's account. Class and school type are only taken
    /// when they are values the form can actually select.
    pub fn from_profile(user: &AuthUser) -> Self {
        let mut values = Self {
            name_en: user.name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            town_address: user.address.clone().unwrap_or_default(),
            ..Self::default()
        };

        if let Some(student) = &user.student {
            values.age = student.age.map(|a| a.to_string()).unwrap_or_default();
            values.education = student.education.clone().unwrap_or_default();
            values.facebook_account = student.facebook_link.clone().unwrap_or_default();
            if let Some(class) = student
                .class_name
                .as_deref()
                .filter(|c| CLASS_OPTIONS.contains(c))
            {
                values.class_interest = class.to_string();
            }
            if let Some(school) = student.school_type.as_deref().and_then(SchoolType::parse) {
                values.school_type = school.as_str().to_string();
            }
            if let Some(other) = student.school_other.as_deref().filter(|o| !o.is_empty()) {
                values.school_other = other.to_string();
            }
        }
        values
    }

    /// to_payload
    ///
    /// Trims and validates the form into the upstream payload. Validation mirrors what the
    /// browser enforces with `required`/`min`, so a student with scripting off gets the
    /// same messages instead of an upstream 422.
    pub fn to_payload(&self, course_id: i64) -> Result<EnrollmentRequestPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut required = |field: &str, value: &str| -> String {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                errors
                    .entry(field.to_string())
                    .or_default()
                    .push("This field is required.".to_string());
            }
            trimmed
        };

        let name_en = required("name_en", &self.name_en);
        let education = required("education", &self.education);
        let facebook_account = required("facebook_account", &self.facebook_account);
        let phone = required("phone", &self.phone);
        let town_address = required("town_address", &self.town_address);
        let age_raw = required("age", &self.age);
        let school_type = SchoolType::parse(self.school_type.trim());
        let school_other = match school_type {
            Some(SchoolType::Other) => Some(required("school_other", &self.school_other)),
            _ => None,
        };

        let age = match age_raw.parse::<u32>() {
            Ok(age) if age >= 1 => Some(age),
            _ if age_raw.is_empty() => None,
            _ => {
                errors
                    .entry("age".to_string())
                    .or_default()
                    .push("Age must be a whole number of at least 1.".to_string());
                None
            }
        };

        let class_interest = self.class_interest.trim();
        if !CLASS_OPTIONS.contains(&class_interest) {
            errors
                .entry("class_interest".to_string())
                .or_default()
                .push("Please choose one of the listed classes.".to_string());
        }
        if school_type.is_none() {
            errors
                .entry("school_type".to_string())
                .or_default()
                .push("Please choose a school type.".to_string());
        }

        match (errors.is_empty(), age, school_type) {
            (true, Some(age), Some(school_type)) => Ok(EnrollmentRequestPayload {
                course_id,
                name_en,
                age,
                education,
                class_interest: class_interest.to_string(),
                school_type,
                school_other,
                facebook_account,
                phone,
                town_address,
            }),
            _ => Err(errors),
        }
    }
}

/// SubmissionOutcome
///
/// How the enrollment page should react to a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Submitted { message: Option<String> },
    /// The student already has a request for this course awaiting review.
    AlreadyPending,
    Rejected {
        message: String,
        field_errors: FieldErrors,
    },
}

/// classify_submission
///
/// Maps the upstream result onto an outcome. The upstream signals a duplicate by putting a
/// message mentioning "pending" first in `errors.course_id`; that is shown as the friendly
/// pending notice rather than as an error.
pub fn classify_submission(result: EnrollmentSubmitResult) -> SubmissionOutcome {
    if result.ok {
        return SubmissionOutcome::Submitted {
            message: result.message,
        };
    }

    let duplicate = result
        .errors
        .get("course_id")
        .and_then(|messages| messages.first())
        .is_some_and(|first| first.to_lowercase().contains("pending"));
    if duplicate {
        return SubmissionOutcome::AlreadyPending;
    }

    SubmissionOutcome::Rejected {
        message: result
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Submission failed".to_string()),
        field_errors: result.errors,
    }
}

/// CtaState
///
/// The enroll call-to-action on a course page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtaState {
    /// Enrollment end date has passed.
    Closed,
    /// The logged-in student already has a pending request.
    AlreadyEnrolled,
    CanEnroll,
}

/// True when the course's enrollment window ended strictly before `today`.
pub fn enrollment_closed(course: &Course, today: NaiveDate) -> bool {
    course
        .enrollment_end_date
        .as_deref()
        .and_then(parse_date)
        .is_some_and(|end| today > end)
}

/// enrollment_cta
///
/// `check` is `None` for anonymous visitors (no check is made); they can always start the
/// enrollment flow, which asks them to log in.
pub fn enrollment_cta(course: &Course, today: NaiveDate, check: Option<&EnrollmentCheck>) -> CtaState {
    if enrollment_closed(course, today) {
        return CtaState::Closed;
    }
    match check {
        Some(check) if check.ok && check.has_pending => CtaState::AlreadyEnrolled,
        _ => CtaState::CanEnroll,
    }
}

/// SuccessStatus
///
/// State of the "enrollment submitted" page, which is re-derived from the upstream check
/// so a bookmarked or shared success URL never lies.
#[derive(Debug, Clone, PartialEq)]
pub enum SuccessStatus {
    Success { course_name: String },
    NotFound,
    Unauthenticated,
}

/// success_status
///
/// Pure decision over the inputs; the handler performs the check only when both slug and
/// token are present.
pub fn success_status(
    course_slug: &str,
    token: Option<&str>,
    check: Option<&EnrollmentCheck>,
) -> SuccessStatus {
    if course_slug.is_empty() {
        return SuccessStatus::NotFound;
    }
    if token.is_none() {
        return SuccessStatus::Unauthenticated;
    }
    match check {
        Some(check) if check.ok && check.has_pending => SuccessStatus::Success {
            course_name: check.course_name.clone(),
        },
        _ => SuccessStatus::NotFound,
    }
}
