use crate::helpers::{connect_ws, json_body, make_test_app, request, seed, spawn_server};
use axum::http::StatusCode;
use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::{Value, json};
use serial_test::serial;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

async fn next_event<S>(socket: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("timed out waiting for WS event")
            .expect("socket closed")
            .expect("WS error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
#[serial]
async fn group_members_hear_about_new_sessions() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let addr = spawn_server(app.clone()).await;

    let (mut socket, _) = connect_ws(
        &addr,
        &format!("attendance/groups/{}", f.group_id),
        &f.student.token,
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let created = app
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(json!({ "subject_id": f.subject_id, "group_id": f.group_id, "class_type": "online" })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let session_id = json_body(created).await["data"]["id"].as_i64().unwrap();

    let event = next_event(&mut socket).await;
    assert_eq!(event["event"], "attendance.session_created");
    assert_eq!(event["topic"], format!("attendance:group:{}", f.group_id));
    assert_eq!(event["payload"]["data"]["attendanceId"], session_id);
    assert_eq!(event["payload"]["type"], "attendance");
}

#[tokio::test]
#[serial]
async fn session_topic_streams_marks_but_not_tokens() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let addr = spawn_server(app.clone()).await;

    let created = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(json!({ "subject_id": f.subject_id, "group_id": f.group_id, "class_type": "online" })),
        ))
        .await
        .unwrap();
    let session_id = json_body(created).await["data"]["id"].as_i64().unwrap();

    let (mut socket, _) = connect_ws(
        &addr,
        &format!("attendance/sessions/{session_id}"),
        &f.lecturer.token,
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let qr = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/attendance/sessions/{session_id}/qr"),
            Some(&f.lecturer.token),
            None,
        ))
        .await
        .unwrap();
    let token = json_body(qr).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_owned();

    let event = next_event(&mut socket).await;
    assert_eq!(event["event"], "attendance.qr_generated");
    assert!(event["payload"].get("token").is_none());

    let marked = app
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.student.token),
            Some(json!({ "attendanceId": session_id, "token": token })),
        ))
        .await
        .unwrap();
    assert_eq!(marked.status(), StatusCode::OK);

    let event = next_event(&mut socket).await;
    assert_eq!(event["event"], "attendance.marked");
    assert_eq!(event["payload"]["student_id"], f.student.id);

    socket
        .send(Message::Text(r#"{"type":"ping"}"#.into()))
        .await
        .unwrap();
    let pong = next_event(&mut socket).await;
    assert_eq!(pong["event"], "pong");
}

#[tokio::test]
#[serial]
async fn topic_guards_reject_outsiders() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let addr = spawn_server(app.clone()).await;

    let created = app
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(json!({ "subject_id": f.subject_id, "group_id": f.group_id, "class_type": "online" })),
        ))
        .await
        .unwrap();
    let session_id = json_body(created).await["data"]["id"].as_i64().unwrap();

    let student_on_session = connect_ws(
        &addr,
        &format!("attendance/sessions/{session_id}"),
        &f.student.token,
    )
    .await;
    assert!(student_on_session.is_err());

    let outsider_on_group = connect_ws(
        &addr,
        &format!("attendance/groups/{}", f.group_id),
        &f.outsider.token,
    )
    .await;
    assert!(outsider_on_group.is_err());
}
