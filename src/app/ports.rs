//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   CommandSource ─┐                          ┌─▶ EffectSink
//! CredentialStore ─┼─▶ PollLoop ─▶ Engine ────┼─▶ AckSignal
//!        TimePort ─┘                          └─▶ EventSink
//! ```
//!
//! Driven adapters (HTTP client, token storage, notification / vibration
//! APIs, the UI interaction listener) implement these traits.  The
//! [`Engine`](super::service::Engine) and [`PollLoop`](crate::poll::PollLoop)
//! consume them via generics, so the domain core never touches a
//! platform API directly.
//!
//! ## Contract notes
//!
//! - **EffectSink** calls are fire-and-forget and must be idempotent;
//!   `stop_vibrating` with nothing in flight is a no-op.
//! - **CredentialStore** is read once per poll tick.  `None` is a normal
//!   condition (user logged out), not an error.
//! - **CommandSource** must report a 204 as `Ok(FetchOutcome::NoContent)`.

use core::fmt;

use super::commands::{Credential, DeviceId, FetchOutcome};
use super::events::EngineEvent;
use crate::error::FetchError;
use crate::wire::PushMessage;

// ───────────────────────────────────────────────────────────────
// Command source (driven adapter: backend → domain)
// ───────────────────────────────────────────────────────────────

/// Pull side of the device-state endpoint.
pub trait CommandSource {
    /// Fetch the newest command for `device`.
    async fn fetch_latest(
        &self,
        device: &DeviceId,
        credential: &Credential,
    ) -> Result<FetchOutcome, FetchError>;
}

// ───────────────────────────────────────────────────────────────
// Credential store (driven adapter: auth layer → domain)
// ───────────────────────────────────────────────────────────────

pub trait CredentialStore {
    fn get(&self) -> Option<Credential>;
}

// ───────────────────────────────────────────────────────────────
// Effect sink (driven adapter: domain → notification / haptics / UI)
// ───────────────────────────────────────────────────────────────

/// Which notification style to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// No sound, no vibration.
    Silent,
    /// Sticky alarm notification.
    Persistent,
}

/// A platform notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Stays visible until the user dismisses or taps it.
    pub requires_ack: bool,
}

/// Observable alarm effects.
pub trait EffectSink {
    fn show_notification(&mut self, notification: &Notification);

    /// Start one haptic burst (alternating buzz / pause durations in ms).
    fn vibrate(&mut self, pattern: &[u32]);

    /// Cancel any in-flight haptic burst.
    fn stop_vibrating(&mut self);

    /// Show a short in-app banner (not a platform notification).
    fn show_banner(&mut self, text: &str);

    /// Remove the in-app banner.
    fn clear_banner(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Acknowledgement signal (driving adapter: UI → domain)
// ───────────────────────────────────────────────────────────────

/// Registration handle returned by [`AckSignal::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u32);

/// Broad "the user touched something" source.
///
/// The adapter forwards each interaction to
/// [`Engine::on_user_interaction`](super::service::Engine::on_user_interaction)
/// for every listener that is still attached.
pub trait AckSignal {
    fn attach(&mut self, device: &DeviceId) -> ListenerId;

    fn detach(&mut self, listener: ListenerId);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / status display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`EngineEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &EngineEvent);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds plus an async sleep.
pub trait TimePort {
    fn now_ms(&self) -> u64;

    /// Resolve once `now_ms() >= deadline_ms`.
    async fn sleep_until(&self, deadline_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Push delivery
// ───────────────────────────────────────────────────────────────

/// Out-of-band delivery into the engine (push provider callback side).
/// Implemented by the runtime's push inbox.
pub trait PushDelivery {
    /// Returns `false` if the delivery was dropped (inbox full).
    fn deliver(&self, device: DeviceId, message: PushMessage) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from loading [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Document is not valid JSON for the config schema.
    Parse,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config parse error"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
