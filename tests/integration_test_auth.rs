mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{auth_from_response, TestApp};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_signup_then_session_reports_user() {
    let app = TestApp::new().await;
    let auth = app.signup("Ana@Example.com", "Ana").await;

    let (status, body) = app.request("GET", "/api/v1/auth/session", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert_eq!(body["user"]["display_name"], "Ana");
    assert_eq!(body["csrf_token"], auth.csrf_token.as_str());
}

#[tokio::test]
async fn test_duplicate_signup_is_conflict() {
    let app = TestApp::new().await;
    app.signup("dup@example.com", "First").await;

    let (status, body) = app.request("POST", "/api/v1/auth/signup", None, Some(json!({
        "email": "DUP@example.com", "password": "another-pass", "display_name": "Second"
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_signup_rejects_short_password() {
    let app = TestApp::new().await;
    let (status, _) = app.request("POST", "/api/v1/auth/signup", None, Some(json!({
        "email": "short@example.com", "password": "123", "display_name": "Short"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.signup("bruno@example.com", "Bruno").await;

    let (status, body) = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "bruno@example.com", "password": "wrong-password"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "bruno@example.com", "password": "correct-horse"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["display_name"], "Bruno");
}

#[tokio::test]
async fn test_session_requires_cookie() {
    let app = TestApp::new().await;
    let (status, _) = app.request("GET", "/api/v1/auth/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("GET", "/api/v1/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mutations_require_matching_csrf_header() {
    let app = TestApp::new().await;
    let auth = app.signup("csrf@example.com", "Carla").await;
    let event = app.create_event(&auth, "Garden party").await;
    let uri = format!("/api/v1/events/{}", event["id"].as_str().unwrap());

    let response = app.router.clone().oneshot(
        Request::builder()
            .method("PUT")
            .uri(&uri)
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "title": "No token" }).to_string()))
            .unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.router.clone().oneshot(
        Request::builder()
            .method("PUT")
            .uri(&uri)
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header("X-CSRF-Token", "not-the-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "title": "Bad token" }).to_string()))
            .unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (status, body) = app.request("PUT", &uri, Some(&auth), Some(json!({ "title": "Good token" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Good token");
}

#[tokio::test]
async fn test_refresh_rotates_and_old_token_is_rejected() {
    let app = TestApp::new().await;
    let auth = app.signup("rotate@example.com", "Rita").await;

    let refresh = |token: String| {
        let router = app.router.clone();
        async move {
            router.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/refresh")
                    .header(header::COOKIE, format!("refresh_token={}", token))
                    .body(Body::empty())
                    .unwrap()
            ).await.unwrap()
        }
    };

    let response = refresh(auth.refresh_token.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = auth_from_response(response).await;
    assert_ne!(rotated.refresh_token, auth.refresh_token);
    assert_eq!(rotated.user_id, auth.user_id);

    let response = refresh(auth.refresh_token.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("GET", "/api/v1/auth/session", Some(&rotated), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = TestApp::new().await;
    let auth = app.signup("bye@example.com", "Beto").await;

    let response = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/logout")
            .header(header::COOKIE, format!("refresh_token={}", auth.refresh_token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/refresh")
            .header(header::COOKIE, format!("refresh_token={}", auth.refresh_token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
