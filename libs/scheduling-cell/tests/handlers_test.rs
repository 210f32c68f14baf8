// libs/scheduling-cell/tests/handlers_test.rs
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::router::{scheduling_routes, SchedulingState};
use scheduling_cell::services::booking::BookingCoordinator;
use scheduling_cell::services::calendar::SupabaseCalendarStore;
use shared_utils::test_utils::{appointment_row, JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: axum::Router,
    jwt_secret: String,
}

impl TestApp {
    fn new(mock_server: &MockServer) -> Self {
        let test_config = TestConfig::with_storage_url(&mock_server.uri());
        let jwt_secret = test_config.jwt_secret.clone();

        let config = test_config.to_arc();
        let store = Arc::new(SupabaseCalendarStore::new(&config));
        let coordinator = Arc::new(BookingCoordinator::new(store));

        let router = scheduling_routes(SchedulingState {
            config,
            coordinator,
        });

        Self { router, jwt_secret }
    }

    fn token_for(&self, user: &TestUser) -> String {
        JwtTestUtils::create_test_token(user, &self.jwt_secret, Some(24))
    }
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn booking_returns_the_committed_date() {
    let mock_server = MockServer::start().await;
    let app = TestApp::new(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4();

    // Empty calendar on read.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Value>::new()))
        .mount(&mock_server)
        .await;

    // Commit succeeds and echoes the stored row.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(vec![appointment_row(
            Uuid::new_v4(),
            doctor_id,
            Some(Uuid::parse_str(&patient.id).unwrap()),
            "2025-02-10T10:00:00Z",
            "upcoming",
        )]))
        .mount(&mock_server)
        .await;

    let token = app.token_for(&patient);
    let request = post_json(
        "/book",
        Some(&token),
        json!({ "doctor_id": doctor_id, "priority": "High" }),
    );

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["date"], "2025-02-10 10:00");
}

#[tokio::test]
async fn losing_the_commit_race_maps_to_conflict() {
    let mock_server = MockServer::start().await;
    let app = TestApp::new(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Value>::new()))
        .mount(&mock_server)
        .await;

    // The unique index rejected the insert.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let patient = TestUser::patient("patient@example.com");
    let token = app.token_for(&patient);
    let request = post_json(
        "/book",
        Some(&token),
        json!({ "doctor_id": Uuid::new_v4(), "priority": "Medium" }),
    );

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn calendar_outage_maps_to_service_unavailable() {
    let mock_server = MockServer::start().await;
    let app = TestApp::new(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage down"))
        .mount(&mock_server)
        .await;

    let patient = TestUser::patient("patient@example.com");
    let token = app.token_for(&patient);
    let request = post_json(
        "/book",
        Some(&token),
        json!({ "doctor_id": Uuid::new_v4(), "priority": "Low" }),
    );

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn booking_without_a_token_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let app = TestApp::new(&mock_server);

    let request = post_json(
        "/book",
        None,
        json!({ "doctor_id": Uuid::new_v4(), "priority": "High" }),
    );

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cancelling_someone_elses_appointment_is_forbidden() {
    let mock_server = MockServer::start().await;
    let app = TestApp::new(&mock_server);

    let appointment_id = Uuid::new_v4();

    // The appointment belongs to an unrelated doctor and patient.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            appointment_id,
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            "2025-02-11T10:00:00Z",
            "upcoming",
        )]))
        .mount(&mock_server)
        .await;

    let stranger = TestUser::patient("stranger@example.com");
    let token = app.token_for(&stranger);
    let request = post_json(
        &format!("/{}/cancel", appointment_id),
        Some(&token),
        json!({}),
    );

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn doctor_listing_rejects_non_doctors() {
    let mock_server = MockServer::start().await;
    let app = TestApp::new(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let token = app.token_for(&patient);

    let response = app
        .router
        .oneshot(get_request("/doctor", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patient_listing_returns_calendar_rows() {
    let mock_server = MockServer::start().await;
    let app = TestApp::new(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let patient_id = Uuid::parse_str(&patient.id).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(patient_id),
            "2025-02-11T10:00:00Z",
            "upcoming",
        )]))
        .mount(&mock_server)
        .await;

    let token = app.token_for(&patient);
    let response = app
        .router
        .oneshot(get_request("/patient", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["appointments"].as_array().unwrap().len(), 1);
}
