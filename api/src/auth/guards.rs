use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::{group_member, user::Role};
use services::AttendanceSessionManager;
use services::principal::Principal;
use std::collections::HashMap;
use util::state::AppState;

#[derive(serde::Serialize, Default)]
pub struct Empty;

type GuardError = (StatusCode, Json<ApiResponse<Empty>>);

fn deny(status: StatusCode, msg: &str) -> GuardError {
    (status, Json(ApiResponse::error(msg)))
}

/// Extracts and validates the user, then inserts it back into the request extensions.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardError> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| deny(StatusCode::UNAUTHORIZED, "Authentication required"))?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

fn path_id(params: &HashMap<String, String>, key: &str) -> Result<i64, GuardError> {
    params
        .get(key)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| deny(StatusCode::BAD_REQUEST, &format!("Missing or invalid {key}")))
}

/// Lecturer or admin.
pub async fn allow_lecturer_or_admin(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if !matches!(user.0.role, Role::Lecturer | Role::Admin) {
        return Err(deny(
            StatusCode::FORBIDDEN,
            "Lecturer or admin access required",
        ));
    }

    Ok(next.run(req).await)
}

pub async fn allow_student(req: Request<Body>, next: Next) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if user.0.role != Role::Student {
        return Err(deny(StatusCode::FORBIDDEN, "Student access required"));
    }

    Ok(next.run(req).await)
}

/// Live events of a session: its lecturer or an admin.
pub async fn allow_attendance_session_ws(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let session_id = path_id(&params, "session_id")?;

    let manager = AttendanceSessionManager::for_db(app_state.db_clone(), app_state.ws_clone());
    match manager.session_details(session_id, &user.principal()).await {
        Ok(_) => Ok(next.run(req).await),
        Err(e) => {
            let (status, msg) = crate::routes::attendance::common::status_for(&e);
            Err(deny(status, &msg))
        }
    }
}

/// Group notices: lecturers, admins, and students enrolled in the group.
pub async fn allow_attendance_group_ws(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let group_id = path_id(&params, "group_id")?;

    let principal: Principal = user.principal();
    if principal.can_manage_sessions() {
        return Ok(next.run(req).await);
    }

    match group_member::Model::is_member(app_state.db(), group_id, principal.id).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err(deny(StatusCode::FORBIDDEN, "Not a member of this group")),
        Err(e) => {
            tracing::warn!(error = %e, group_id, user_id = principal.id, "group membership check failed; denying");
            Err(deny(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error while checking group membership",
            ))
        }
    }
}
