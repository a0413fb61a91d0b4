use serde::Serialize;
use services::notifier::session_topic;
use services::store::AttendanceRecord;
use util::ws::WebSocketManager;

use super::payload;
use crate::ws::event::{Event, emit};

#[derive(Debug, Serialize)]
pub struct QrGeneratedEvent {
    #[serde(flatten)]
    pub payload: payload::QrGenerated,
}
impl Event for QrGeneratedEvent {
    const NAME: &'static str = "attendance.qr_generated";
    fn topic_path(&self) -> String {
        session_topic(self.payload.session_id)
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceMarkedEvent {
    #[serde(flatten)]
    pub payload: payload::AttendanceMarked,
}
impl Event for AttendanceMarkedEvent {
    const NAME: &'static str = "attendance.marked";
    fn topic_path(&self) -> String {
        session_topic(self.payload.session_id)
    }
}

#[derive(Debug, Serialize)]
pub struct RecordUpdatedEvent {
    #[serde(flatten)]
    pub payload: payload::RecordUpdated,
}
impl Event for RecordUpdatedEvent {
    const NAME: &'static str = "attendance.record_updated";
    fn topic_path(&self) -> String {
        session_topic(self.payload.session_id)
    }
}

/* ---------- one-liner helpers ---------- */

pub async fn qr_generated(ws: &WebSocketManager, session_id: i64, expiry: i64) {
    let ev = QrGeneratedEvent {
        payload: payload::QrGenerated { session_id, expiry },
    };
    emit(ws, &ev).await;
}

pub async fn attendance_marked(ws: &WebSocketManager, record: &AttendanceRecord) {
    let ev = AttendanceMarkedEvent {
        payload: payload::AttendanceMarked {
            session_id: record.session_id,
            student_id: record.student_id,
            status: record.status.to_string(),
            marked_at: record.marked_at.to_rfc3339(),
        },
    };
    emit(ws, &ev).await;
}

pub async fn record_updated(ws: &WebSocketManager, record: &AttendanceRecord) {
    let ev = RecordUpdatedEvent {
        payload: payload::RecordUpdated {
            session_id: record.session_id,
            student_id: record.student_id,
            status: record.status.to_string(),
            marked_by: record.marked_by.to_string(),
            excuse_reason: record.excuse_reason.clone(),
        },
    };
    emit(ws, &ev).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use services::store::{MarkedBy, RecordStatus};

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            session_id: 9,
            student_id: 4,
            status: RecordStatus::Present,
            marked_at: Utc.with_ymd_and_hms(2025, 11, 10, 9, 5, 0).unwrap(),
            marked_by: MarkedBy::Qr,
            excuse_reason: None,
            latitude: Some(-1.2864),
            longitude: Some(36.8172),
        }
    }

    #[tokio::test]
    async fn marked_event_goes_to_session_topic() {
        let ws = WebSocketManager::new();
        let mut rx = ws.subscribe("attendance:session:9").await;

        attendance_marked(&ws, &record()).await;

        let raw = rx.recv().await.unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["event"], "attendance.marked");
        assert_eq!(v["payload"]["student_id"], 4);
        assert_eq!(v["payload"]["status"], "present");
    }

    #[tokio::test]
    async fn qr_event_does_not_carry_the_token() {
        let ws = WebSocketManager::new();
        let mut rx = ws.subscribe("attendance:session:9").await;

        qr_generated(&ws, 9, 1_735_690_500_000).await;

        let raw = rx.recv().await.unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["event"], "attendance.qr_generated");
        assert_eq!(v["payload"]["expiry"], 1_735_690_500_000i64);
        assert!(v["payload"].get("token").is_none());
    }
}
