//! Integration tests for the typed services, against a mocked Learn instance.

use integrations_blackboard::auth::TOKEN_ENDPOINT;
use integrations_blackboard::{
    Availability, BlackboardClient, BlackboardConfig, BlackboardErrorKind, CourseRole,
    MemoryTokenStore, NewUser,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "bearer",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

async fn client_for(server: &MockServer) -> BlackboardClient {
    let config = BlackboardConfig::builder()
        .base_url(server.uri())
        .client_id("test-id")
        .client_secret("test-secret")
        .build()
        .unwrap();
    BlackboardClient::with_store(config, Arc::new(MemoryTokenStore::new()))
        .await
        .unwrap()
}

fn new_user() -> NewUser {
    NewUser {
        username: "jdoe".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jdoe@example.edu".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn test_create_user_sends_expected_payload() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/learn/api/public/v1/users"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({
            "userName": "jdoe",
            "password": "hunter2",
            "institutionRoleIds": [],
            "availability": {"available": "Yes"},
            "name": {
                "given": "Jane",
                "family": "Doe",
                "preferredDisplayName": "GivenName",
            },
            "contact": {"email": "jdoe@example.edu"},
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.users().create(new_user()).await.unwrap();
}

#[tokio::test]
async fn test_create_user_conflict_maps_to_already_exists() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/learn/api/public/v1/users"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.users().create(new_user()).await.unwrap_err();
    assert_eq!(err.kind(), BlackboardErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_create_user_database_error_quirk_maps_to_already_exists() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/learn/api/public/v1/users"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("A database error occurred while creating the user"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.users().create(new_user()).await.unwrap_err();
    assert_eq!(err.kind(), BlackboardErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_create_user_forbidden_maps_to_insufficient_privileges() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/learn/api/public/v1/users"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.users().create(new_user()).await.unwrap_err();
    assert_eq!(err.kind(), BlackboardErrorKind::InsufficientPrivileges);
}

#[tokio::test]
async fn test_user_exists_maps_statuses() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/learn/api/public/v1/users/userName:present"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userName": "present"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/learn/api/public/v1/users/userName:absent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/learn/api/public/v1/users/userName:broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.users().exists("present").await.unwrap());
    assert!(!client.users().exists("absent").await.unwrap());
    // Any status other than 200/404 is an error, never a `false`.
    assert!(client.users().exists("broken").await.is_err());
}

#[tokio::test]
async fn test_get_user_parses_response() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/learn/api/public/v1/users/userName:jdoe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "_42_1",
            "userName": "jdoe",
            "name": {"given": "Jane", "family": "Doe"},
            "availability": {"available": "Disabled"},
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let user = client.users().get_by_username(" jdoe ").await.unwrap();

    assert_eq!(user.id, "_42_1");
    assert_eq!(user.name.unwrap().family, "Doe");
    assert_eq!(user.availability.unwrap().available, Availability::Disabled);
}

#[tokio::test]
async fn test_update_password_patches_user() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("PATCH"))
        .and(path("/learn/api/public/v1/users/userName:jdoe"))
        .and(body_json(json!({"password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.users().update_password("jdoe", "s3cret").await.unwrap();
}

#[tokio::test]
async fn test_update_name_requires_some_name() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let err = client
        .users()
        .update_name("jdoe", None, Some("  "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), BlackboardErrorKind::ValidationError);
}

#[tokio::test]
async fn test_course_copy_returns_task_uri() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/learn/api/public/v2/courses/courseId:CS101/copy"))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", "/learn/api/public/v1/courses/_9_1/tasks/xyz"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let task_uri = client.courses().copy("CS101", "CS101-COPY").await.unwrap();
    assert_eq!(task_uri, "/learn/api/public/v1/courses/_9_1/tasks/xyz");
}

#[tokio::test]
async fn test_course_copy_without_location_is_an_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/learn/api/public/v2/courses/courseId:CS101/copy"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.courses().copy("CS101", "CS101-COPY").await.is_err());
}

#[tokio::test]
async fn test_enroll_user_puts_membership() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("PUT"))
        .and(path(
            "/learn/api/public/v1/courses/courseId:CS101/users/userName:jdoe",
        ))
        .and(body_json(json!({
            "courseRoleId": "Student",
            "availability": {"available": "Yes"},
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .courses()
        .enroll_user("CS101", "jdoe", CourseRole::Student, Availability::Yes)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_remove_user_expects_no_content() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("DELETE"))
        .and(path(
            "/learn/api/public/v1/courses/courseId:CS101/users/userName:jdoe",
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.courses().remove_user("CS101", "jdoe").await.unwrap();
}

#[tokio::test]
async fn test_course_update_requires_a_field() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let err = client
        .courses()
        .update("CS101", &Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), BlackboardErrorKind::ValidationError);
}

#[tokio::test]
async fn test_announcements_list_unwraps_results_envelope() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/learn/api/public/v1/courses/courseId:CS101/announcements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "_1_1", "title": "Welcome", "body": "<p>Hi</p>", "position": 1},
                {"id": "_2_1", "title": "Midterm", "body": "<p>Soon</p>", "position": 2},
            ],
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let announcements = client.announcements().list("CS101").await.unwrap();

    assert_eq!(announcements.len(), 2);
    assert_eq!(announcements[0].title, "Welcome");
    assert_eq!(announcements[1].position, 2);
}

#[tokio::test]
async fn test_remaining_calls_reads_rate_limit_header() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/learn/api/public/v1/users"))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Rate-Limit-Remaining", "1499")
                .set_body_json(json!({"results": []})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.remaining_calls().await.unwrap(), 1499);
}

#[tokio::test]
async fn test_remaining_calls_without_header_is_an_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/learn/api/public/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.remaining_calls().await.is_err());
}
