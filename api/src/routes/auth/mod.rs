use axum::{Router, routing::post};
use util::state::AppState;

pub mod post;

use post::login;

/// Routes under `/api/auth`.
///
/// - `POST /login` → exchange username and password for a JWT
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
