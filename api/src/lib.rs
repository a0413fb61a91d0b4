pub mod auth;
pub mod response;
pub mod routes;
pub mod ws;

use axum::{
    Router,
    middleware::from_fn,
};
use tower_http::cors::CorsLayer;
use util::state::AppState;

use crate::{auth::middleware::log_request, routes::routes, ws::ws_routes};

/// Full application router: `/api` HTTP routes and `/ws` topics, with request
/// logging and CORS applied.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", routes())
        .nest("/ws", ws_routes(app_state.clone()))
        .layer(from_fn(log_request))
        .layer(CorsLayer::very_permissive())
        .with_state(app_state)
}
