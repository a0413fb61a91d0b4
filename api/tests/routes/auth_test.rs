use crate::helpers::{json_body, make_test_app, request, seed};
use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;
use tower::ServiceExt;

#[tokio::test]
#[serial]
async fn login_returns_a_usable_token() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "lecturer1", "password": "password123" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["id"], f.lecturer.id);
    assert_eq!(json["data"]["role"], "lecturer");
    assert!(json["data"]["expires_at"].as_str().is_some());

    let token = json["data"]["token"].as_str().unwrap().to_owned();
    let report = app
        .oneshot(request("GET", "/api/attendance/report", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(report.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn wrong_password_is_unauthorized() {
    let (app, state) = make_test_app().await;
    seed(&state).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "lecturer1", "password": "nope" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid username or password");
}

#[tokio::test]
#[serial]
async fn unknown_user_and_empty_fields() {
    let (app, _) = make_test_app().await;

    let unknown = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "ghost", "password": "password123" })),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let empty = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "", "password": "" })),
        ))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let json = json_body(empty).await;
    assert_eq!(json["message"], "Password is required; Username is required");
}
