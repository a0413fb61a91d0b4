use crate::helpers::{Fixture, json_body, make_test_app, request, seed};
use axum::http::StatusCode;
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;

const LAT: f64 = -1.2864;
const LON: f64 = 36.8172;

fn physical_session(f: &Fixture) -> Value {
    json!({
        "subjectId": f.subject_id,
        "groupId": f.group_id,
        "classType": "physical",
        "location": { "latitude": LAT, "longitude": LON }
    })
}

async fn create_session(app: &crate::helpers::app::TestApp, f: &Fixture) -> i64 {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(physical_session(f)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["data"]["id"].as_i64().unwrap()
}

async fn issue_qr(app: &crate::helpers::app::TestApp, token: &str, session_id: i64) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/attendance/sessions/{session_id}/qr"),
            Some(token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(
        json["data"]["qr_code"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    json["data"]["token"].as_str().unwrap().to_owned()
}

fn mark_body(session_id: i64, token: &str, lat: f64, lon: f64) -> Value {
    json!({ "attendanceId": session_id, "lat": lat, "lon": lon, "token": token })
}

#[tokio::test]
#[serial]
async fn lecturer_creates_a_physical_session() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(physical_session(&f)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["lecturer_id"], f.lecturer.id);
    assert_eq!(json["data"]["class_type"], "physical");
    assert_eq!(json["data"]["location"]["radius_meters"], 100.0);
    assert!(json["data"]["qr_expiry"].is_null());
    assert_eq!(json["data"]["records"], json!([]));
}

#[tokio::test]
#[serial]
async fn second_session_on_the_same_day_conflicts() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    create_session(&app, &f).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.admin.token),
            Some(physical_session(&f)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(response).await["message"],
        "Attendance session already exists for this date"
    );
}

#[tokio::test]
#[serial]
async fn create_rejects_bad_input_and_wrong_roles() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;

    let no_location = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(json!({ "subject_id": f.subject_id, "group_id": f.group_id })),
        ))
        .await
        .unwrap();
    assert_eq!(no_location.status(), StatusCode::BAD_REQUEST);

    let bad_radius = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(json!({
                "subject_id": f.subject_id,
                "group_id": f.group_id,
                "location": { "latitude": LAT, "longitude": LON, "radius": 5000 }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(bad_radius.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(bad_radius).await["message"],
        "radius must be between 10 and 1000 meters"
    );

    let as_student = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.student.token),
            Some(physical_session(&f)),
        ))
        .await
        .unwrap();
    assert_eq!(as_student.status(), StatusCode::FORBIDDEN);

    let anonymous = app
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            None,
            Some(physical_session(&f)),
        ))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn student_marks_once_within_the_geofence() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let session_id = create_session(&app, &f).await;
    let token = issue_qr(&app, &f.lecturer.token, session_id).await;

    let first = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.student.token),
            Some(mark_body(session_id, &token, LAT, LON)),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let json = json_body(first).await;
    assert_eq!(json["data"]["student_id"], f.student.id);
    assert_eq!(json["data"]["status"], "present");
    assert_eq!(json["data"]["marked_by"], "qr");

    let again = app
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.student.token),
            Some(mark_body(session_id, &token, LAT, LON)),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(again).await["message"],
        "Attendance already marked for this session"
    );
}

#[tokio::test]
#[serial]
async fn mark_rejects_superseded_token_and_distant_students() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let session_id = create_session(&app, &f).await;
    let stale = issue_qr(&app, &f.lecturer.token, session_id).await;
    // Tokens embed the issue time in milliseconds.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let current = issue_qr(&app, &f.lecturer.token, session_id).await;
    assert_ne!(stale, current);

    let superseded = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.student.token),
            Some(mark_body(session_id, &stale, LAT, LON)),
        ))
        .await
        .unwrap();
    assert_eq!(superseded.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(superseded).await["message"], "QR code has expired");

    let far_away = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.student.token),
            Some(mark_body(session_id, &current, LAT + 0.01, LON)),
        ))
        .await
        .unwrap();
    assert_eq!(far_away.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(far_away).await["message"],
        "You are not within the required location for this class"
    );

    let unknown = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.student.token),
            Some(mark_body(session_id + 100, &current, LAT, LON)),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let lecturer_marking = app
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.lecturer.token),
            Some(mark_body(session_id, &current, LAT, LON)),
        ))
        .await
        .unwrap();
    assert_eq!(lecturer_marking.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn only_the_owning_lecturer_or_an_admin_manage_a_session() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let session_id = create_session(&app, &f).await;

    let other = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/attendance/sessions/{session_id}/qr"),
            Some(&f.other_lecturer.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::FORBIDDEN);

    issue_qr(&app, &f.admin.token, session_id).await;

    let override_by_other = app
        .oneshot(request(
            "PUT",
            &format!("/api/attendance/sessions/{session_id}/records/{}", f.student.id),
            Some(&f.other_lecturer.token),
            Some(json!({ "status": "absent" })),
        ))
        .await
        .unwrap();
    assert_eq!(override_by_other.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn manual_override_creates_then_updates_a_record() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let session_id = create_session(&app, &f).await;
    let uri = format!(
        "/api/attendance/sessions/{session_id}/records/{}",
        f.classmate.id
    );

    let created = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            Some(&f.lecturer.token),
            Some(json!({ "status": "late", "excuseReason": "Bus delay" })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let json = json_body(created).await;
    assert_eq!(json["data"]["status"], "late");
    assert_eq!(json["data"]["marked_by"], "manual");
    assert_eq!(json["data"]["excuse_reason"], "Bus delay");

    let updated = app
        .clone()
        .oneshot(request(
            "PUT",
            &uri,
            Some(&f.lecturer.token),
            Some(json!({ "status": "present" })),
        ))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let json = json_body(updated).await;
    assert_eq!(json["data"]["status"], "present");
    assert_eq!(json["data"]["excuse_reason"], "Bus delay");

    let details = app
        .oneshot(request(
            "GET",
            &format!("/api/attendance/sessions/{session_id}"),
            Some(&f.lecturer.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(details.status(), StatusCode::OK);
    let records = json_body(details).await["data"]["records"].clone();
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn report_counts_present_against_the_roster() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let session_id = create_session(&app, &f).await;
    let token = issue_qr(&app, &f.lecturer.token, session_id).await;

    let marked = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/mark",
            Some(&f.student.token),
            Some(mark_body(session_id, &token, LAT, LON)),
        ))
        .await
        .unwrap();
    assert_eq!(marked.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!(
                "/api/attendance/report?subjectId={}&groupId={}",
                f.subject_id, f.group_id
            ),
            Some(&f.lecturer.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["total_sessions"], 1);
    assert_eq!(json["data"]["overall_attendance"], 50.0);
    let session = &json["data"]["sessions"][0];
    assert_eq!(session["total_students"], 2);
    assert_eq!(session["present_count"], 1);
    assert_eq!(session["absent_count"], 1);

    let as_student = app
        .oneshot(request(
            "GET",
            "/api/attendance/report",
            Some(&f.student.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(as_student.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn history_only_shows_the_callers_records() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let session_id = create_session(&app, &f).await;
    let token = issue_qr(&app, &f.lecturer.token, session_id).await;

    for student in [&f.student, &f.classmate] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/attendance/mark",
                Some(&student.token),
                Some(mark_body(session_id, &token, LAT, LON)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mine = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/attendance/me",
            Some(&f.student.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(mine.status(), StatusCode::OK);
    let json = json_body(mine).await;
    let sessions = json["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    let records = sessions[0]["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["student_id"], f.student.id);

    let outsider = app
        .oneshot(request(
            "GET",
            "/api/attendance/me",
            Some(&f.outsider.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(json_body(outsider).await["data"], json!([]));
}

async fn create_online_on(app: &crate::helpers::app::TestApp, f: &Fixture, date: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/attendance/sessions",
            Some(&f.lecturer.token),
            Some(json!({
                "subjectId": f.subject_id,
                "groupId": f.group_id,
                "classType": "online",
                "date": date
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["data"]["id"].as_i64().unwrap()
}

async fn report_ids(app: &crate::helpers::app::TestApp, token: &str, query: &str) -> Vec<i64> {
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/attendance/report?{query}"),
            Some(token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["data"]["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["session_id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[serial]
async fn report_and_history_filter_by_date_range() {
    let (app, state) = make_test_app().await;
    let f = seed(&state).await;
    let monday = create_online_on(&app, &f, "2025-11-10T09:00:00Z").await;
    let tuesday = create_online_on(&app, &f, "2025-11-11T15:00:00Z").await;
    let wednesday = create_online_on(&app, &f, "2025-11-12T09:00:00Z").await;

    // A date-only end covers the whole day.
    let ids = report_ids(
        &app,
        &f.lecturer.token,
        "startDate=2025-11-11&endDate=2025-11-11",
    )
    .await;
    assert_eq!(ids, vec![tuesday]);

    let ids = report_ids(&app, &f.lecturer.token, "start_date=2025-11-11").await;
    assert_eq!(ids, vec![tuesday, wednesday]);

    let ids = report_ids(&app, &f.lecturer.token, "endDate=2025-11-11T12:00:00Z").await;
    assert_eq!(ids, vec![monday]);

    let malformed = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/attendance/report?startDate=11/11/2025",
            Some(&f.lecturer.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let json = json_body(malformed).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("start_date"));

    for session_id in [monday, wednesday] {
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/attendance/sessions/{session_id}/records/{}", f.student.id),
                Some(&f.lecturer.token),
                Some(json!({ "status": "present" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let mine = app
        .oneshot(request(
            "GET",
            "/api/attendance/me?startDate=2025-11-11&endDate=2025-11-12",
            Some(&f.student.token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(mine.status(), StatusCode::OK);
    let json = json_body(mine).await;
    let sessions = json["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], wednesday);
}
