//! Mock platform adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full effect
//! history.  [`SimClock`] sleeps by jumping virtual time forward, so
//! poll loops run to completion instantly under `block_on`.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use lullabuddy::app::commands::{CommandEnvelope, Credential, DeviceId, FetchOutcome};
use lullabuddy::app::events::EngineEvent;
use lullabuddy::app::ports::{
    AckSignal, CommandSource, CredentialStore, EffectSink, EventSink, ListenerId, Notification,
    NotificationKind, TimePort,
};
use lullabuddy::app::service::Engine;
use lullabuddy::config::EngineConfig;
use lullabuddy::error::FetchError;
use lullabuddy::poll::StopSignal;

// ── Effects ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectCall {
    Notify(Notification),
    Vibrate(Vec<u32>),
    StopVibrating,
    Banner(String),
    ClearBanner,
}

#[derive(Debug, Default)]
pub struct MockEffects {
    pub calls: Vec<EffectCall>,
}

impl MockEffects {
    pub fn vibrations(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, EffectCall::Vibrate(_)))
            .count()
    }

    pub fn stops(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, EffectCall::StopVibrating))
            .count()
    }

    pub fn notifications(&self) -> Vec<&Notification> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EffectCall::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn notifications_of(&self, kind: NotificationKind) -> usize {
        self.notifications().iter().filter(|n| n.kind == kind).count()
    }

    pub fn banners(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EffectCall::Banner(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn banner_clears(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, EffectCall::ClearBanner))
            .count()
    }
}

impl EffectSink for MockEffects {
    fn show_notification(&mut self, notification: &Notification) {
        self.calls.push(EffectCall::Notify(notification.clone()));
    }

    fn vibrate(&mut self, pattern: &[u32]) {
        self.calls.push(EffectCall::Vibrate(pattern.to_vec()));
    }

    fn stop_vibrating(&mut self) {
        self.calls.push(EffectCall::StopVibrating);
    }

    fn show_banner(&mut self, text: &str) {
        self.calls.push(EffectCall::Banner(text.to_string()));
    }

    fn clear_banner(&mut self) {
        self.calls.push(EffectCall::ClearBanner);
    }
}

// ── Acknowledgement ──────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockAck {
    next: u32,
    pub attached: Vec<ListenerId>,
    pub detached: Vec<ListenerId>,
}

impl MockAck {
    /// Listeners attached and not yet detached.
    pub fn live(&self) -> Vec<ListenerId> {
        self.attached
            .iter()
            .copied()
            .filter(|l| !self.detached.contains(l))
            .collect()
    }
}

impl AckSignal for MockAck {
    fn attach(&mut self, _device: &DeviceId) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.attached.push(id);
        id
    }

    fn detach(&mut self, listener: ListenerId) {
        self.detached.push(listener);
    }
}

// ── Events ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingEvents {
    pub events: Vec<EngineEvent>,
}

impl EventSink for RecordingEvents {
    fn emit(&mut self, event: &EngineEvent) {
        self.events.push(event.clone());
    }
}

// ── Clock ────────────────────────────────────────────────────

/// Virtual clock: `sleep_until` jumps straight to the deadline.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<u64>,
}

impl SimClock {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl TimePort for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    async fn sleep_until(&self, deadline_ms: u64) {
        if deadline_ms > self.now.get() {
            self.now.set(deadline_ms);
        }
    }
}

// ── Command source ───────────────────────────────────────────

/// Replies from a script, one entry per fetch.  When the script runs
/// out it answers "no content" and raises the stop signal, which ends
/// a `PollLoop::run` after the current cycle.
pub struct ScriptedSource {
    script: RefCell<VecDeque<Result<FetchOutcome, FetchError>>>,
    pub calls: Cell<usize>,
    pub seen_tokens: RefCell<Vec<String>>,
    clock: Option<Rc<SimClock>>,
    fetch_ms: u64,
    stop: Option<Rc<StopSignal>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<FetchOutcome, FetchError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
            seen_tokens: RefCell::new(Vec::new()),
            clock: None,
            fetch_ms: 0,
            stop: None,
        }
    }

    /// Each fetch takes `fetch_ms` of virtual time.
    pub fn with_latency(mut self, clock: Rc<SimClock>, fetch_ms: u64) -> Self {
        self.clock = Some(clock);
        self.fetch_ms = fetch_ms;
        self
    }

    pub fn stopping(mut self, stop: Rc<StopSignal>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl CommandSource for ScriptedSource {
    async fn fetch_latest(
        &self,
        _device: &DeviceId,
        credential: &Credential,
    ) -> Result<FetchOutcome, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.seen_tokens
            .borrow_mut()
            .push(credential.token().to_string());
        if let Some(clock) = &self.clock {
            clock.advance(self.fetch_ms);
        }
        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(reply) => reply,
            None => {
                if let Some(stop) = &self.stop {
                    stop.signal(());
                }
                Ok(FetchOutcome::NoContent)
            }
        }
    }
}

pub fn command(id: u64, kind: &str) -> Result<FetchOutcome, FetchError> {
    Ok(FetchOutcome::Command(CommandEnvelope::new(Some(id), kind)))
}

pub fn no_content() -> Result<FetchOutcome, FetchError> {
    Ok(FetchOutcome::NoContent)
}

// ── Credentials ──────────────────────────────────────────────

/// Credential store that counts reads.
#[derive(Debug, Default)]
pub struct CountingCredentials {
    pub token: Option<String>,
    pub reads: Cell<usize>,
}

impl CountingCredentials {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            reads: Cell::new(0),
        }
    }
}

impl CredentialStore for CountingCredentials {
    fn get(&self) -> Option<Credential> {
        self.reads.set(self.reads.get() + 1);
        self.token.as_deref().map(Credential::new)
    }
}

// ── Engine ───────────────────────────────────────────────────

pub type TestEngine = Engine<MockEffects, MockAck, RecordingEvents>;

pub fn test_config() -> EngineConfig {
    EngineConfig::default()
}

pub fn engine() -> RefCell<TestEngine> {
    engine_with(test_config())
}

pub fn engine_with(config: EngineConfig) -> RefCell<TestEngine> {
    RefCell::new(Engine::new(
        config,
        MockEffects::default(),
        MockAck::default(),
        RecordingEvents::default(),
    ))
}

pub fn device() -> DeviceId {
    DeviceId::from(42u32)
}
