use api::{app, auth::generate_jwt};
use axum::{
    body::Body,
    http::{Request, header::CONTENT_TYPE},
    response::Response,
};
use db::models::{
    group, group_member, subject,
    user::{self, Role},
};
use db::test_utils::setup_test_db;
use serde_json::Value;
use std::convert::Infallible;
use tower::ServiceExt;
use tower::util::BoxCloneService;
use util::{state::AppState, ws::WebSocketManager};

pub type TestApp = BoxCloneService<Request<Body>, Response, Infallible>;

/// Full router over a fresh in-memory database.
pub async fn make_test_app() -> (TestApp, AppState) {
    let db = setup_test_db().await;
    let state = AppState::new(db, WebSocketManager::new());
    let service = app(state.clone()).into_service().boxed_clone();
    (service, state)
}

pub struct Seeded {
    pub id: i64,
    pub token: String,
}

/// Lecturers, an admin, two enrolled students, one outsider, a subject and a group.
pub struct Fixture {
    pub lecturer: Seeded,
    pub other_lecturer: Seeded,
    pub admin: Seeded,
    pub student: Seeded,
    pub classmate: Seeded,
    pub outsider: Seeded,
    pub subject_id: i64,
    pub group_id: i64,
}

async fn seed_user(state: &AppState, username: &str, role: Role) -> Seeded {
    let u = user::Model::create(
        state.db(),
        username,
        &format!("{username}@test.com"),
        "password123",
        role,
    )
    .await
    .unwrap();
    let (token, _) = generate_jwt(u.id, role).unwrap();
    Seeded { id: u.id, token }
}

pub async fn seed(state: &AppState) -> Fixture {
    let lecturer = seed_user(state, "lecturer1", Role::Lecturer).await;
    let other_lecturer = seed_user(state, "lecturer2", Role::Lecturer).await;
    let admin = seed_user(state, "admin1", Role::Admin).await;
    let student = seed_user(state, "student1", Role::Student).await;
    let classmate = seed_user(state, "student2", Role::Student).await;
    let outsider = seed_user(state, "student3", Role::Student).await;

    let subject = subject::Model::create(state.db(), "COS301", "Software Engineering")
        .await
        .unwrap();
    let group = group::Model::create(state.db(), "Group A").await.unwrap();
    group_member::Model::add(state.db(), group.id, student.id)
        .await
        .unwrap();
    group_member::Model::add(state.db(), group.id, classmate.id)
        .await
        .unwrap();

    Fixture {
        lecturer,
        other_lecturer,
        admin,
        student,
        classmate,
        outsider,
        subject_id: subject.id,
        group_id: group.id,
    }
}

/// Builds a JSON request, with a bearer token when one is given.
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("Authorization", format!("Bearer {t}"));
    }
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
