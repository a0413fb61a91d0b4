use crate::helpers::{json_body, make_test_app, request};
use axum::http::StatusCode;
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_ok_json() {
    let (app, _) = make_test_app().await;

    let response = app
        .oneshot(request("GET", "/api/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
    assert_eq!(json["message"], "Health check passed");
}
