//! Short-lived QR tokens bound to an attendance session.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use image::{DynamicImage, Luma};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use util::config;

use crate::error::{AttendanceError, Result};

/// What the QR code encodes. Field order is fixed so the token text is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub attendance_id: i64,
    /// Issue time, epoch milliseconds.
    pub timestamp: i64,
    /// Expiry, epoch milliseconds.
    pub expiry: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedQr {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct QrTokenIssuer {
    validity: Duration,
}

impl Default for QrTokenIssuer {
    fn default() -> Self {
        Self::new(Duration::minutes(15))
    }
}

impl QrTokenIssuer {
    pub fn new(validity: Duration) -> Self {
        Self { validity }
    }

    /// Issuer using `QR_VALIDITY_MINUTES`.
    pub fn from_config() -> Self {
        Self::new(Duration::minutes(config::qr_validity_minutes()))
    }

    /// Issues a token for `session_id`. Times are truncated to milliseconds so
    /// the persisted expiry matches the payload exactly.
    pub fn issue(&self, session_id: i64, now: DateTime<Utc>) -> Result<IssuedQr> {
        let issued_ms = now.timestamp_millis();
        let expiry_ms = issued_ms + self.validity.num_milliseconds();
        let expiry = DateTime::from_timestamp_millis(expiry_ms)
            .ok_or_else(|| AttendanceError::Infrastructure("QR expiry out of range".into()))?;

        let payload = QrPayload {
            attendance_id: session_id,
            timestamp: issued_ms,
            expiry: expiry_ms,
        };
        let token = serde_json::to_string(&payload)
            .map_err(|e| AttendanceError::Infrastructure(format!("QR payload encoding: {e}")))?;

        Ok(IssuedQr { token, expiry })
    }

    pub fn decode(token: &str) -> Option<QrPayload> {
        serde_json::from_str(token).ok()
    }
}

/// Renders `token` as a PNG QR code wrapped in a `data:` URL.
pub fn render_data_url(token: &str) -> Result<String> {
    let code = QrCode::new(token.as_bytes())
        .map_err(|e| AttendanceError::Infrastructure(format!("QR encoding: {e}")))?;
    let image = code.render::<Luma<u8>>().build();

    let dynamic_image = DynamicImage::ImageLuma8(image);
    let mut buffer = Cursor::new(Vec::new());
    dynamic_image
        .write_to(&mut buffer, image::ImageOutputFormat::Png)
        .map_err(|e| AttendanceError::Infrastructure(format!("QR rendering: {e}")))?;

    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(buffer.get_ref())
    ))
}
