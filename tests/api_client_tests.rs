use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tiptop_site::{
    api::{ApiState, BackendApi, HttpBackendApi},
    models::{ArticleQuery, EnrollmentRequestPayload, SchoolType},
};

fn client_for(server: &MockServer) -> HttpBackendApi {
    HttpBackendApi::new(&server.base_url()).unwrap()
}

fn sample_payload() -> EnrollmentRequestPayload {
    EnrollmentRequestPayload {
        course_id: 7,
        name_en: "Aung Aung".to_string(),
        age: 14,
        education: "Grade 9".to_string(),
        class_interest: "Python".to_string(),
        school_type: SchoolType::Government,
        school_other: None,
        facebook_account: "fb.com/aung".to_string(),
        phone: "09123456789".to_string(),
        town_address: "Yangon".to_string(),
    }
}

// --- Catalog ---

#[tokio::test]
async fn test_get_courses_unwraps_data_and_skips_malformed_entries() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/frontend/courses");
            then.status(200).json_body(json!({
                "data": [
                    {
                        "id": 1,
                        "slug": "python-basics",
                        "title": "Python Basics",
                        "subject": { "id": 3, "name": "Programming", "slug": "programming" },
                        "duration": 3,
                        "monthly_fee": 60000,
                        "schedules": [
                            { "day_of_week": "Monday", "start_time": "09:00", "end_time": "11:00" }
                        ]
                    },
                    { "title": "missing id and slug" }
                ]
            }));
        })
        .await;

    let courses = client_for(&server).get_courses().await;

    mock.assert_async().await;
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].slug, "python-basics");
    assert_eq!(courses[0].duration_unit, "month");
    assert_eq!(courses[0].monthly_fee, Some(60000.0));
    assert_eq!(courses[0].schedules.len(), 1);
}

#[tokio::test]
async fn test_get_courses_non_array_data_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/frontend/courses");
            then.status(200).json_body(json!({ "data": { "oops": true } }));
        })
        .await;

    assert!(client_for(&server).get_courses().await.is_empty());
}

#[tokio::test]
async fn test_get_courses_server_error_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/frontend/courses");
            then.status(500);
        })
        .await;

    assert!(client_for(&server).get_courses().await.is_empty());
}

#[tokio::test]
async fn test_get_course_by_slug_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/frontend/courses/missing");
            then.status(404).json_body(json!({ "message": "Not found" }));
        })
        .await;

    assert!(client_for(&server).get_course_by_slug("missing").await.is_none());
}

#[tokio::test]
async fn test_get_articles_forwards_only_present_filters() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/frontend/articles")
                .query_param("category", "news");
            then.status(200).json_body(json!({
                "data": [{ "id": 5, "slug": "open-day", "title": "Open Day", "category": "news" }]
            }));
        })
        .await;

    let query = ArticleQuery {
        category: Some("news".to_string()),
        per_page: None,
    };
    let articles = client_for(&server).get_articles(&query).await;

    mock.assert_async().await;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].category.as_deref(), Some("news"));
}

#[tokio::test]
async fn test_filtered_article_read_runs_on_spawned_task() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/frontend/articles")
                .query_param("category", "news")
                .query_param("per_page", "3");
            then.status(200).json_body(json!({
                "data": [{ "id": 5, "slug": "open-day", "title": "Open Day" }]
            }));
        })
        .await;

    let api: ApiState = Arc::new(client_for(&server));
    let query = ArticleQuery {
        category: Some("news".to_string()),
        per_page: Some(3),
    };
    // tokio::spawn only accepts Send futures.
    let articles = tokio::spawn(async move { api.get_articles(&query).await })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(articles[0].slug, "open-day");
}

#[tokio::test]
async fn test_get_article_by_slug() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/frontend/articles/open-day");
            then.status(200).json_body(json!({
                "data": { "id": 5, "slug": "open-day", "title": "Open Day", "body": "<p>Hi</p>" }
            }));
        })
        .await;

    let article = client_for(&server)
        .get_article_by_slug("open-day")
        .await
        .unwrap();
    assert_eq!(article.body.as_deref(), Some("<p>Hi</p>"));
}

// --- Auth ---

#[test]
fn test_google_login_url_encodes_redirect() {
    let api = HttpBackendApi::new("https://api.tiptop.test/").unwrap();
    assert_eq!(
        api.google_login_url("https://tiptop.test/en/enroll/python?x=1"),
        "https://api.tiptop.test/api/v1/frontend/auth/google/redirect?redirect_to=https%3A%2F%2Ftiptop.test%2Fen%2Fenroll%2Fpython%3Fx%3D1"
    );
}

#[tokio::test]
async fn test_fetch_me_sends_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/frontend/auth/me")
                .header("authorization", "Bearer tok-1")
                .header("accept", "application/json");
            then.status(200).json_body(json!({
                "data": {
                    "id": 9,
                    "name": "Aung Aung",
                    "email": "aung@example.com",
                    "student": { "id": 2, "age": 14, "class": "Python", "school_type": "private" }
                }
            }));
        })
        .await;

    let user = client_for(&server).fetch_me("tok-1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(user.name, "Aung Aung");
    let student = user.student.unwrap();
    assert_eq!(student.class_name.as_deref(), Some("Python"));
    assert_eq!(student.age, Some(14));
}

#[tokio::test]
async fn test_fetch_me_unauthorized_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/frontend/auth/me");
            then.status(401).json_body(json!({ "message": "Unauthenticated." }));
        })
        .await;

    assert!(client_for(&server).fetch_me("expired").await.is_none());
}

#[tokio::test]
async fn test_logout_posts_with_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/frontend/auth/logout")
                .header("authorization", "Bearer tok-1");
            then.status(500);
        })
        .await;

    // Failure is swallowed.
    client_for(&server).logout("tok-1").await;
    mock.assert_async().await;
}

// --- Enrollment ---

#[tokio::test]
async fn test_submit_enrollment_success() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/frontend/enrollment-requests")
                .header("authorization", "Bearer tok-1")
                .json_body(json!({
                    "course_id": 7,
                    "name_en": "Aung Aung",
                    "age": 14,
                    "education": "Grade 9",
                    "class_interest": "Python",
                    "school_type": "government",
                    "facebook_account": "fb.com/aung",
                    "phone": "09123456789",
                    "town_address": "Yangon"
                }));
            then.status(201).json_body(json!({ "message": "Request received" }));
        })
        .await;

    let result = client_for(&server)
        .submit_enrollment("tok-1", &sample_payload())
        .await;

    mock.assert_async().await;
    assert!(result.ok);
    assert_eq!(result.message.as_deref(), Some("Request received"));
}

#[tokio::test]
async fn test_submit_enrollment_validation_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/frontend/enrollment-requests");
            then.status(422).json_body(json!({
                "message": "The given data was invalid.",
                "errors": {
                    "course_id": ["You already have a pending request for this course."],
                    "phone": "The phone format is invalid."
                }
            }));
        })
        .await;

    let result = client_for(&server)
        .submit_enrollment("tok-1", &sample_payload())
        .await;

    assert!(!result.ok);
    assert_eq!(result.message.as_deref(), Some("The given data was invalid."));
    assert_eq!(
        result.errors["course_id"],
        vec!["You already have a pending request for this course.".to_string()]
    );
    assert_eq!(
        result.errors["phone"],
        vec!["The phone format is invalid.".to_string()]
    );
}

#[tokio::test]
async fn test_submit_enrollment_unparsable_error_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/frontend/enrollment-requests");
            then.status(500).body("<html>oops</html>");
        })
        .await;

    let result = client_for(&server)
        .submit_enrollment("tok-1", &sample_payload())
        .await;
    assert!(!result.ok);
    assert!(result.message.is_none());
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_submit_enrollment_network_error() {
    // Nothing listens on the discard port.
    let api = HttpBackendApi::new("http://127.0.0.1:9").unwrap();
    let result = api.submit_enrollment("tok-1", &sample_payload()).await;
    assert!(!result.ok);
    assert_eq!(result.message.as_deref(), Some("Network error"));
}

#[tokio::test]
async fn test_check_enrollment_reads_wrapped_and_flat_bodies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/frontend/enrollment-requests/check")
                .query_param("course_slug", "python-basics");
            then.status(200).json_body(json!({
                "data": { "has_pending": true, "course_name": "Python Basics", "course_slug": "python-basics" }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/frontend/enrollment-requests/check")
                .query_param("course_slug", "scratch");
            then.status(200).json_body(json!({ "has_pending": false, "course_name": "Scratch" }));
        })
        .await;

    let api = client_for(&server);

    let wrapped = api.check_enrollment("tok-1", "python-basics").await;
    assert!(wrapped.ok);
    assert!(wrapped.has_pending);
    assert_eq!(wrapped.course_name, "Python Basics");

    let flat = api.check_enrollment("tok-1", "scratch").await;
    assert!(flat.ok);
    assert!(!flat.has_pending);
    assert_eq!(flat.course_name, "Scratch");
    assert_eq!(flat.course_slug, "");
}

#[tokio::test]
async fn test_check_enrollment_failure_is_not_ok() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/frontend/enrollment-requests/check");
            then.status(401);
        })
        .await;

    let check = client_for(&server).check_enrollment("tok-1", "python").await;
    assert!(!check.ok);
    assert!(!check.has_pending);
}
