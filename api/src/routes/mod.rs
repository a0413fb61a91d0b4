//! HTTP route entry point for `/api/...`.
//!
//! - `/health` → liveness (public)
//! - `/auth` → login (public)
//! - `/attendance` → sessions, QR codes, marking, overrides and reports (role-guarded per route)

use crate::routes::{
    attendance::attendance_routes, auth::auth_routes, health::health_routes,
};
use axum::Router;
use util::state::AppState;

pub mod attendance;
pub mod auth;
pub mod health;

/// Builds the `/api` router. Guards are applied inside each route group since
/// they differ per endpoint.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest("/attendance", attendance_routes())
}
