//! Wire shapes of the command endpoint and the push channel.
//!
//! ## Poll endpoint
//!
//! `GET /api/devices/{id}/commands` with `Authorization: Bearer <token>`.
//!
//! | Status | Meaning                                   |
//! |--------|-------------------------------------------|
//! | 200    | JSON command (see below)                  |
//! | 204    | No new command                            |
//! | other  | [`FetchError::Status`]                    |
//!
//! The kind field is named `command`.  Two body layouts are accepted:
//!
//! ```text
//! {"id": 12, "command": "vibrate", "message": "optional body"}
//! {"command": {"id": 12, "command": "vibrate"}}
//! ```
//!
//! In the nested layout the inner `id` wins; the outer one is ignored.
//!
//! ## Push channel
//!
//! ```text
//! {"data": {"type": "vibrate"}, "notification": {"title": "...", "body": "..."}}
//! ```
//!
//! Push envelopes never carry an id.

use serde::Deserialize;
use serde_json::Value;

use crate::app::commands::{CommandEnvelope, DeviceId, FetchOutcome};
use crate::classify::KIND_NOTIFICATION;
use crate::error::{FetchError, Malformed};

pub const STATUS_OK: u16 = 200;
pub const STATUS_NO_CONTENT: u16 = 204;

// ── Poll endpoint ─────────────────────────────────────────────

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    command: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// Map an HTTP status + body to a fetch result.
pub fn decode_response(status: u16, body: &[u8]) -> Result<FetchOutcome, FetchError> {
    match status {
        STATUS_NO_CONTENT => Ok(FetchOutcome::NoContent),
        STATUS_OK => Ok(FetchOutcome::Command(decode_command(body)?)),
        other => Err(FetchError::Status(other)),
    }
}

/// Decode a 200 body into an envelope.
pub fn decode_command(body: &[u8]) -> Result<CommandEnvelope, Malformed> {
    let raw: RawEnvelope = serde_json::from_slice(body).map_err(|_| Malformed::InvalidJson)?;
    let message = raw.message.as_ref().and_then(Value::as_str).map(str::to_owned);

    let (kind, id) = match raw.command {
        Some(Value::String(kind)) => (kind, raw.id.as_ref().and_then(Value::as_u64)),
        Some(Value::Object(inner)) => {
            let kind = inner
                .get("command")
                .and_then(Value::as_str)
                .ok_or(Malformed::MissingKind)?
                .to_owned();
            (kind, inner.get("id").and_then(Value::as_u64))
        }
        _ => return Err(Malformed::MissingKind),
    };
    if kind.is_empty() {
        return Err(Malformed::MissingKind);
    }

    Ok(CommandEnvelope { id, kind, message })
}

/// Path of the command endpoint for `device`, relative to the API base.
pub fn commands_path(device: &DeviceId) -> String {
    format!("/api/devices/{}/commands", percent_encode(device.as_str()))
}

fn percent_encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

// ── Push channel ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushData {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A message as delivered by the push provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushMessage {
    #[serde(default)]
    pub data: Option<PushData>,
    #[serde(default)]
    pub notification: Option<PushNotification>,
}

impl PushMessage {
    pub fn parse(body: &[u8]) -> Result<Self, Malformed> {
        serde_json::from_slice(body).map_err(|_| Malformed::InvalidJson)
    }

    /// Turn the message into an id-less envelope.
    ///
    /// `data.type` names the kind.  A message with only a notification
    /// block is treated as a plain `notification`.  `None` if neither
    /// is present.
    pub fn to_envelope(&self) -> Option<CommandEnvelope> {
        let body = self.notification.as_ref().and_then(|n| n.body.clone());
        let kind = match self.data.as_ref().and_then(|d| d.kind.as_deref()) {
            Some(kind) if !kind.is_empty() => kind.to_owned(),
            _ if self.notification.is_some() => KIND_NOTIFICATION.to_owned(),
            _ => return None,
        };
        Some(CommandEnvelope {
            id: None,
            kind,
            message: body,
        })
    }
}
