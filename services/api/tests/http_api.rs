//! End-to-end tests for the HTTP surface, driven through the router over the
//! in-memory store.

use api_lib::{config::Config, web::router, web::state::AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use mentorship_core::{FixedClock, InMemoryDatabase};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-that-is-long-enough";

fn test_app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "AUTH_TOKEN_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .expect("test config");
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
    ));
    let state = AppState::new(Arc::new(InMemoryDatabase::new()), Arc::new(config), clock);
    router(Arc::new(state)).expect("router")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, cookie, json)
}

async fn signup(app: &Router, email: &str, role: &str) -> String {
    let (status, _, body) = send(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "email": email, "password": "password123", "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

fn session_body() -> Value {
    json!({
        "title": "Rust ownership",
        "description": "Borrowing without tears",
        "subject": "Programming",
        "duration": 60,
        "price": 25.0,
        "date": "2025-02-01",
        "time": "10:00",
        "maxStudents": 5
    })
}

async fn create_session(app: &Router, mentor_token: &str) -> String {
    let (status, _, body) =
        send(app, "POST", "/sessions", Some(mentor_token), Some(session_body())).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

fn booking_body(session_id: &str) -> Value {
    json!({ "sessionId": session_id, "bookedDate": "2025-02-01", "bookedTime": "10:00" })
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, _, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_signup_sets_cookie_and_login_round_trips() {
    let app = test_app();
    let (status, cookie, body) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "email": "Ada@Example.com", "password": "password123", "role": "mentor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["identity"]["email"], "ada@example.com");
    assert_eq!(body["identity"]["role"], "MENTOR");
    assert_eq!(body["identity"]["hasProfile"], false);
    let cookie = cookie.expect("auth cookie");
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));

    let (status, _, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, _, me) = send(&app, "GET", "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@example.com");
}

#[tokio::test]
async fn test_duplicate_email_and_bad_password() {
    let app = test_app();
    signup(&app, "ada@example.com", "STUDENT").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "email": "ada@example.com", "password": "password123", "role": "STUDENT" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "EMAIL_TAKEN");

    let (status, _, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "not-the-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_cookie_authenticates_and_logout_clears_it() {
    let app = test_app();
    let token = signup(&app, "ada@example.com", "STUDENT").await;

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::COOKIE, format!("theme=dark; auth-token={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, cookie, _) = send(&app, "POST", "/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(cookie.unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthenticated() {
    let app = test_app();
    let (status, _, body) = send(&app, "GET", "/sessions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "UNAUTHENTICATED");

    let (status, _, _) = send(&app, "GET", "/sessions", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_guards() {
    let app = test_app();
    let mentor = signup(&app, "mentor@example.com", "MENTOR").await;
    let student = signup(&app, "student@example.com", "STUDENT").await;

    let (status, _, body) =
        send(&app, "POST", "/sessions", Some(&student), Some(session_body())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "FORBIDDEN");

    let session_id = create_session(&app, &mentor).await;
    let (status, _, _) = send(
        &app,
        "POST",
        "/bookings",
        Some(&mentor),
        Some(booking_body(&session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_session_validation_error() {
    let app = test_app();
    let mentor = signup(&app, "mentor@example.com", "MENTOR").await;
    let mut body = session_body();
    body["duration"] = json!(5);

    let (status, _, body) = send(&app, "POST", "/sessions", Some(&mentor), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_mentor_publishes_and_student_books() {
    let app = test_app();
    let mentor = signup(&app, "mentor@example.com", "MENTOR").await;
    let student = signup(&app, "student@example.com", "STUDENT").await;

    let (status, _, _) = send(
        &app,
        "PUT",
        "/profile",
        Some(&mentor),
        Some(json!({ "displayName": "Grace", "preferredLanguage": "French" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let session_id = create_session(&app, &mentor).await;

    // Students see it in the catalog with the mentor's card.
    let (status, _, catalog) = send(&app, "GET", "/sessions", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    let catalog = catalog.as_array().unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0]["id"], session_id.as_str());
    assert_eq!(catalog[0]["mentor"]["displayName"], "Grace");
    assert_eq!(catalog[0]["mentor"]["preferredLanguage"], "French");

    // First booking succeeds, the repeat is rejected.
    let (status, _, booking) = send(
        &app,
        "POST",
        "/bookings",
        Some(&student),
        Some(booking_body(&session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "PENDING");
    assert_eq!(booking["sessionId"], session_id.as_str());

    let (status, _, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&student),
        Some(booking_body(&session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "ALREADY_BOOKED");

    // The student's own list joins the session and mentor.
    let (status, _, mine) = send(&app, "GET", "/bookings/mine", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["session"]["title"], "Rust ownership");
    assert_eq!(mine[0]["mentor"]["displayName"], "Grace");

    // The mentor's view lists the booking with the student's email.
    let (status, _, owned) = send(&app, "GET", "/sessions/mine", Some(&mentor), None).await;
    assert_eq!(status, StatusCode::OK);
    let owned = owned.as_array().unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0]["bookings"][0]["studentEmail"], "student@example.com");
}

#[tokio::test]
async fn test_deactivated_session_is_hidden_and_unbookable() {
    let app = test_app();
    let mentor = signup(&app, "mentor@example.com", "MENTOR").await;
    let student = signup(&app, "student@example.com", "STUDENT").await;
    let session_id = create_session(&app, &mentor).await;

    let (status, _, body) = send(
        &app,
        "PATCH",
        &format!("/sessions/{}/active", session_id),
        Some(&mentor),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);

    let (_, _, catalog) = send(&app, "GET", "/sessions", Some(&student), None).await;
    assert!(catalog.as_array().unwrap().is_empty());

    let (status, _, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&student),
        Some(booking_body(&session_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "SESSION_UNAVAILABLE");
}

#[tokio::test]
async fn test_booking_unknown_session_and_malformed_id() {
    let app = test_app();
    let student = signup(&app, "student@example.com", "STUDENT").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&student),
        Some(booking_body("00000000-0000-0000-0000-000000000000")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "SESSION_NOT_FOUND");

    let (status, _, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&student),
        Some(booking_body("not-a-uuid")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_bodies_use_the_error_envelope() {
    let app = test_app();
    let mentor = signup(&app, "mentor@example.com", "MENTOR").await;
    let student = signup(&app, "student@example.com", "STUDENT").await;
    let session_id = create_session(&app, &mentor).await;

    // Missing field.
    let (status, _, body) = send(
        &app,
        "POST",
        "/bookings",
        Some(&student),
        Some(json!({ "sessionId": session_id, "bookedTime": "10:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("bookedDate"));

    // Wrong field type.
    let mut draft = session_body();
    draft["duration"] = json!("sixty");
    let (status, _, body) = send(&app, "POST", "/sessions", Some(&mentor), Some(draft)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "VALIDATION_ERROR");

    // Not JSON at all.
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("email=ada@example.com"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["kind"], "VALIDATION_ERROR");

    // Path segment that is not a UUID.
    let (status, _, body) = send(
        &app,
        "PATCH",
        "/sessions/not-a-uuid/active",
        Some(&mentor),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_email_login_matches_wrong_password() {
    let app = test_app();
    signup(&app, "ada@example.com", "STUDENT").await;

    let mut kinds = Vec::new();
    for email in ["ada@example.com", "nobody@example.com"] {
        let (status, _, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": "not-the-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        kinds.push(body["error"].clone());
    }
    assert_eq!(kinds[0], kinds[1]);
    assert_eq!(kinds[0]["kind"], "INVALID_CREDENTIALS");
}
