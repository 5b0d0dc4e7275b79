//! Engine: the hexagonal core shared by every consumer.
//!
//! [`Engine`] owns the alarm controller and the effect-side ports.  Poll
//! loops (after their own deduplication) and the push path both feed it
//! envelopes through [`Engine::dispatch`]:
//!
//! ```text
//!  PollLoop ─▶ Deduplicator ─┐                         ┌─▶ EffectSink
//!                            ├─▶ classify ─▶ Alarm ────┼─▶ AckSignal
//!  Push ─────────────────────┘                         └─▶ EventSink
//! ```
//!
//! One engine is instantiated per consumer (foreground app, setup test
//! screen); a [`PollProfile`] picks the interval and which classes the
//! consumer acts on.

use log::{debug, info};

use super::commands::{CommandEnvelope, DeviceId};
use super::events::{Dispatch, EngineEvent};
use super::ports::{AckSignal, EffectSink, EventSink, ListenerId};
use crate::alarm::{AlarmController, AlarmState, AlarmTiming};
use crate::classify::{AlarmClass, classify};
use crate::config::EngineConfig;
use crate::wire::PushMessage;

// ───────────────────────────────────────────────────────────────
// Poll profile
// ───────────────────────────────────────────────────────────────

/// Which consumer a poll loop serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollProfile {
    /// Main app: every class is acted on.
    Foreground,
    /// Setup test screen: only motion / sound banners.
    TestMode,
}

impl PollProfile {
    pub fn interval_ms(self, config: &EngineConfig) -> u32 {
        match self {
            Self::Foreground => config.foreground_interval_ms,
            Self::TestMode => config.test_mode_interval_ms,
        }
    }

    pub fn accepts(self, class: AlarmClass) -> bool {
        match self {
            Self::Foreground => true,
            Self::TestMode => class == AlarmClass::Transient,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Engine
// ───────────────────────────────────────────────────────────────

pub struct Engine<E, A, V> {
    config: EngineConfig,
    alarm: AlarmController,
    effects: E,
    ack: A,
    events: V,
}

impl<E: EffectSink, A: AckSignal, V: EventSink> Engine<E, A, V> {
    pub fn new(config: EngineConfig, effects: E, ack: A, events: V) -> Self {
        let alarm = AlarmController::new(AlarmTiming::from(&config));
        Self {
            config,
            alarm,
            effects,
            ack,
            events,
        }
    }

    // ── Pipeline ──────────────────────────────────────────────

    /// Classify and act on one admitted envelope.
    pub fn dispatch(
        &mut self,
        device: &DeviceId,
        envelope: &CommandEnvelope,
        profile: PollProfile,
        now_ms: u64,
    ) -> Dispatch {
        let class = classify(&envelope.kind);
        if class == AlarmClass::None {
            debug!("Engine[{}]: unknown kind '{}'", device, envelope.kind);
            return Dispatch::Ignored {
                kind: envelope.kind.clone(),
            };
        }
        if !profile.accepts(class) {
            return Dispatch::Filtered(class);
        }

        info!(
            "Engine[{}]: '{}' → {} (id={:?})",
            device,
            envelope.kind,
            class.name(),
            envelope.id
        );
        self.alarm.handle(
            device,
            class,
            envelope,
            now_ms,
            &mut self.effects,
            &mut self.ack,
            &mut self.events,
        );
        Dispatch::Handled(class)
    }

    /// Feed a push-delivered envelope.  Push envelopes carry no id and
    /// skip deduplication.
    pub fn handle_push(&mut self, device: &DeviceId, envelope: &CommandEnvelope, now_ms: u64) -> Dispatch {
        let outcome = self.dispatch(device, envelope, PollProfile::Foreground, now_ms);
        self.events.emit(&EngineEvent::Push {
            device: device.clone(),
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Decode a raw push message and feed it.
    pub fn handle_push_message(
        &mut self,
        device: &DeviceId,
        message: &PushMessage,
        now_ms: u64,
    ) -> Option<Dispatch> {
        match message.to_envelope() {
            Some(envelope) => Some(self.handle_push(device, &envelope, now_ms)),
            None => {
                self.events.emit(&EngineEvent::PushUnparsable {
                    device: device.clone(),
                });
                None
            }
        }
    }

    /// Advance alarm timers.
    pub fn tick(&mut self, now_ms: u64) {
        self.alarm.tick(now_ms, &mut self.effects);
    }

    /// A user interaction reached `listener`.
    pub fn on_user_interaction(&mut self, listener: ListenerId) -> bool {
        self.alarm
            .acknowledge(listener, &mut self.effects, &mut self.ack, &mut self.events)
    }

    /// Release every alarm resource.
    pub fn shutdown(&mut self) {
        self.alarm.release_all(&mut self.effects, &mut self.ack);
    }

    /// Emit a status event.
    pub fn report(&mut self, event: EngineEvent) {
        self.events.emit(&event);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn alarm_state(&self, device: &DeviceId) -> AlarmState {
        self.alarm.state(device)
    }

    pub fn alarm(&self) -> &AlarmController {
        &self.alarm
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    pub fn ack(&self) -> &A {
        &self.ack
    }

    pub fn events(&self) -> &V {
        &self.events
    }
}
