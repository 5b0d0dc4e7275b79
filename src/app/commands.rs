//! Inbound data: device identity, credentials and command envelopes.
//!
//! These are what the outside world (HTTP poll endpoint, push channel,
//! auth layer) hands to the engine.

use core::fmt;

/// Monotonically assigned identifier of one command instance.
pub type CommandId = u64;

/// Opaque key naming the monitored device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<u32> for DeviceId {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

/// Bearer credential supplied by the auth layer.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the HTTP `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} bytes>)", self.0.len())
    }
}

/// One unit of device-state information, pull- or push-delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEnvelope {
    /// `None` means "unidentified, always act" (push deliveries).
    pub id: Option<CommandId>,
    /// Semantic event name, e.g. `"vibrate"`.
    pub kind: String,
    /// Optional body text overriding the default notification body.
    pub message: Option<String>,
}

impl CommandEnvelope {
    pub fn new(id: Option<CommandId>, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Successful result of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 200 with a decodable command.
    Command(CommandEnvelope),
    /// 204: nothing new since the last poll.
    NoContent,
}
