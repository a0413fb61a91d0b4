use axum::{Json, extract::State, http::StatusCode};
use db::models::user;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use util::validation::format_validation_errors;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct LoginResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub token: String,
    pub expires_at: String,
}

/// POST /auth/login
///
/// ### Request Body
/// ```json
/// { "username": "lecturer1", "password": "secret123" }
/// ```
///
/// ### Responses
/// - `200 OK` with the user, a bearer token and its RFC 3339 expiry
/// - `400 Bad Request` when a field is empty
/// - `401 Unauthorized` on unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<ApiResponse<LoginResponse>>) {
    if let Err(e) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&e))),
        );
    }

    let found = match user::Model::find_by_username(state.db(), &req.username).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(error = %e, "user lookup failed during login");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            );
        }
    };

    let Some(account) = found.filter(|u| u.verify_password(&req.password)) else {
        tracing::info!(username = %req.username, "rejected login");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid username or password")),
        );
    };

    let (token, expires_at) = match generate_jwt(account.id, account.role) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, user_id = account.id, "failed to sign JWT");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            );
        }
    };

    let response = LoginResponse {
        id: account.id,
        username: account.username,
        email: account.email,
        role: account.role.to_string(),
        token,
        expires_at,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(response, "Login successful")),
    )
}
