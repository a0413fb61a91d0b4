//! Best-effort "session opened" notices.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use util::ws::{self, WebSocketManager};

use crate::store::{AttendanceSession, ClassType};

pub const SESSION_CREATED_EVENT: &str = "attendance.session_created";

/// Topic carrying notices for every member of a group.
pub fn group_topic(group_id: i64) -> String {
    format!("attendance:group:{group_id}")
}

/// Topic carrying live QR and marking events of one session.
pub fn session_topic(session_id: i64) -> String {
    format!("attendance:session:{session_id}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipients {
    pub group_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub recipients: Recipients,
    pub data: Value,
}

impl Notice {
    pub fn session_opened(session: &AttendanceSession) -> Self {
        let class = match session.session.class_type {
            ClassType::Physical => "Physical",
            ClassType::Online => "Online",
        };
        Self {
            title: "New Attendance Session".into(),
            body: format!("{class} class attendance is now open"),
            kind: "attendance".into(),
            recipients: Recipients {
                group_id: session.session.group_id,
            },
            data: serde_json::json!({ "attendanceId": session.id() }),
        }
    }
}

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notice: Notice) -> Result<(), NotifyError>;
}

/// Publishes notices on the recipient group's WebSocket topic.
#[derive(Clone)]
pub struct WsNotifier {
    ws: WebSocketManager,
}

impl WsNotifier {
    pub fn new(ws: WebSocketManager) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl Notifier for WsNotifier {
    async fn send(&self, notice: Notice) -> Result<(), NotifyError> {
        let topic = group_topic(notice.recipients.group_id);
        let reached = ws::emit(&self.ws, &topic, SESSION_CREATED_EVENT, &notice).await;
        tracing::debug!(topic = %topic, reached, "session notice published");
        Ok(())
    }
}
