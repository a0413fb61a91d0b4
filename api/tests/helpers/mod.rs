pub mod app;
pub mod ws;

pub use app::{Fixture, json_body, make_test_app, request, seed};
pub use ws::{connect_ws, spawn_server};
