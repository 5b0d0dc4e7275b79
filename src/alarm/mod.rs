//! Alarm controller: per-device state machine driving observable effects.
//!
//! ```text
//!                Persistent                     Persistent
//!   ┌──────┐ ─────────────────▶ ┌─────────────┐ ──────────┐
//!   │ Idle │                    │ AlarmActive │           │ cancel old timer,
//!   └──────┘ ◀───────────────── └─────────────┘ ◀─────────┘ detach old listener
//!      ▲         acknowledge         │
//!      │      (stop vibrating)       │
//!      └─ ack while Idle: no-op      └─ tick: burst every period
//!
//!   Silent    → quiet notification, state untouched
//!   Transient → in-app banner, auto-dismissed, state untouched
//!   None      → nothing
//! ```
//!
//! Time is injected: callers pass `now_ms` and call [`AlarmController::tick`]
//! often enough for the vibration period and banner delay.  The runtime
//! does this from its alarm clock task; tests step it by hand.

pub mod session;

use std::collections::HashMap;

use log::{debug, info};

use crate::app::commands::{CommandEnvelope, DeviceId};
use crate::app::events::EngineEvent;
use crate::app::ports::{AckSignal, EffectSink, EventSink, ListenerId, Notification, NotificationKind};
use crate::classify::{AlarmClass, banner_text};
use crate::config::{EngineConfig, VibrationPattern};
use session::{AlarmSession, BannerTimer};

pub const SILENT_TITLE: &str = "Your kid is awake";
pub const SILENT_BODY: &str = "Don't worry, we are putting them back to sleep.";
pub const ALARM_TITLE: &str = "Alarm!";
pub const ALARM_BODY: &str = "Your kid is awake, please check on them.";

/// Alarm state of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmState {
    Idle,
    AlarmActive,
}

/// Timing parameters taken from [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct AlarmTiming {
    pub period_ms: u64,
    pub pattern: VibrationPattern,
    pub dismiss_ms: u64,
}

impl From<&EngineConfig> for AlarmTiming {
    fn from(c: &EngineConfig) -> Self {
        Self {
            period_ms: u64::from(c.vibration_period_ms),
            pattern: c.vibration_pattern.clone(),
            dismiss_ms: u64::from(c.transient_dismiss_ms),
        }
    }
}

pub struct AlarmController {
    timing: AlarmTiming,
    sessions: HashMap<DeviceId, AlarmSession>,
    banner: Option<BannerTimer>,
}

impl AlarmController {
    pub fn new(timing: AlarmTiming) -> Self {
        Self {
            timing,
            sessions: HashMap::new(),
            banner: None,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self, device: &DeviceId) -> AlarmState {
        if self.sessions.contains_key(device) {
            AlarmState::AlarmActive
        } else {
            AlarmState::Idle
        }
    }

    pub fn session(&self, device: &DeviceId) -> Option<&AlarmSession> {
        self.sessions.get(device)
    }

    /// Number of live repeat timers across all devices.
    pub fn active_timers(&self) -> usize {
        self.sessions.len()
    }

    pub fn banner_visible(&self) -> bool {
        self.banner.is_some()
    }

    // ── Commands ──────────────────────────────────────────────

    /// Act on a classified envelope.
    #[allow(clippy::too_many_arguments)]
    pub fn handle(
        &mut self,
        device: &DeviceId,
        class: AlarmClass,
        envelope: &CommandEnvelope,
        now_ms: u64,
        effects: &mut impl EffectSink,
        ack: &mut impl AckSignal,
        events: &mut impl EventSink,
    ) {
        match class {
            AlarmClass::None => {}
            AlarmClass::Transient => {
                effects.show_banner(banner_text(&envelope.kind));
                self.banner = Some(BannerTimer {
                    dismiss_at_ms: now_ms.saturating_add(self.timing.dismiss_ms),
                });
            }
            AlarmClass::Silent => {
                effects.show_notification(&Notification {
                    kind: NotificationKind::Silent,
                    title: SILENT_TITLE.to_owned(),
                    body: body_or(envelope, SILENT_BODY),
                    requires_ack: false,
                });
            }
            AlarmClass::Persistent => self.activate(device, envelope, now_ms, effects, ack, events),
        }
    }

    fn activate(
        &mut self,
        device: &DeviceId,
        envelope: &CommandEnvelope,
        now_ms: u64,
        effects: &mut impl EffectSink,
        ack: &mut impl AckSignal,
        events: &mut impl EventSink,
    ) {
        // Old timer and listener go before the new ones exist.
        let rearm = match self.sessions.remove(device) {
            Some(old) => {
                old.end(ack);
                true
            }
            None => false,
        };

        effects.show_notification(&Notification {
            kind: NotificationKind::Persistent,
            title: ALARM_TITLE.to_owned(),
            body: body_or(envelope, ALARM_BODY),
            requires_ack: true,
        });
        effects.vibrate(&self.timing.pattern);
        let listener = ack.attach(device);
        self.sessions.insert(
            device.clone(),
            AlarmSession::new(listener, now_ms, self.timing.period_ms),
        );

        if rearm {
            info!("Alarm[{}]: re-armed", device);
            events.emit(&EngineEvent::AlarmRearmed {
                device: device.clone(),
            });
        } else {
            info!("Alarm[{}]: activated", device);
            events.emit(&EngineEvent::AlarmChanged {
                device: device.clone(),
                from: AlarmState::Idle,
                to: AlarmState::AlarmActive,
            });
        }
    }

    /// Advance timers: repeat bursts and banner auto-dismiss.
    pub fn tick(&mut self, now_ms: u64, effects: &mut impl EffectSink) {
        for session in self.sessions.values_mut() {
            if session.timer_mut().poll(now_ms) {
                effects.vibrate(&self.timing.pattern);
            }
        }
        if let Some(banner) = self.banner {
            if now_ms >= banner.dismiss_at_ms {
                effects.clear_banner();
                self.banner = None;
            }
        }
    }

    /// User interaction delivered to `listener`.
    ///
    /// Returns `true` if it ended an active alarm.  Listeners that do not
    /// belong to a live session (stale, or nothing active) are ignored.
    pub fn acknowledge(
        &mut self,
        listener: ListenerId,
        effects: &mut impl EffectSink,
        ack: &mut impl AckSignal,
        events: &mut impl EventSink,
    ) -> bool {
        let device = self
            .sessions
            .iter()
            .find(|(_, s)| s.listener() == listener)
            .map(|(d, _)| d.clone());
        let Some(device) = device else {
            debug!("Alarm: interaction on {:?} with no active session", listener);
            return false;
        };
        if let Some(session) = self.sessions.remove(&device) {
            info!(
                "Alarm[{}]: acknowledged after {} burst(s)",
                device,
                session.timer().fired()
            );
            session.end(ack);
        }
        effects.stop_vibrating();
        events.emit(&EngineEvent::AlarmChanged {
            device,
            from: AlarmState::AlarmActive,
            to: AlarmState::Idle,
        });
        true
    }

    /// Release every session and the banner (engine teardown).
    pub fn release_all(&mut self, effects: &mut impl EffectSink, ack: &mut impl AckSignal) {
        if self.sessions.is_empty() && self.banner.is_none() {
            return;
        }
        for (_, session) in self.sessions.drain() {
            session.end(ack);
        }
        effects.stop_vibrating();
        if self.banner.take().is_some() {
            effects.clear_banner();
        }
    }
}

fn body_or(envelope: &CommandEnvelope, default: &str) -> String {
    match envelope.message.as_deref() {
        Some(m) if !m.is_empty() => m.to_owned(),
        _ => default.to_owned(),
    }
}
