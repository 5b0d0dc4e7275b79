//! Poll loop: periodic fetch → dedup → classify → act driver.
//!
//! One [`PollLoop`] per started consumer/device pair.  The loop owns a
//! [`PollState`] that exists only between [`PollLoop::start`] and
//! [`PollLoop::stop`].  Dedup memory lives in that state, so stopping one
//! loop never affects another loop polling the same device.
//!
//! ```text
//!   start ──▶ cycle ──▶ skip missed ticks ──▶ sleep until next tick ──┐
//!               ▲                                                     │
//!               └─────────────────────────────────────────────────────┘
//!   stop signal at any await point ──▶ stop (alarm sessions untouched)
//! ```
//!
//! Single-flight is structural: [`PollLoop::cycle`] takes `&mut self`,
//! so a second cycle cannot start while one is awaiting the source.
//! Ticks that fall due while a fetch is in flight are skipped, not
//! queued, and reported as [`EngineEvent::TicksSkipped`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::info;

use crate::app::commands::{CommandId, DeviceId, FetchOutcome};
use crate::app::events::{Dispatch, EngineEvent};
use crate::app::ports::{
    AckSignal, CommandSource, CredentialStore, EffectSink, EventSink, TimePort,
};
use crate::app::service::{Engine, PollProfile};
use crate::dedup::Deduplicator;
use crate::error::PollError;

/// Stop request for a running loop.
pub type StopSignal = Signal<NoopRawMutex, ()>;

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The source answered "no new command".
    NoContent,
    /// A command went through the pipeline.
    Delivered(Dispatch),
    /// No credential, transport failure or malformed body.
    Failed(PollError),
    /// The loop is not started.
    NotRunning,
}

// ── Tick schedule ─────────────────────────────────────────────

/// Fixed-rate tick times `start + k * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    next_ms: u64,
    interval_ms: u64,
}

impl TickSchedule {
    /// First tick is due at `start_ms`.
    pub fn new(start_ms: u64, interval_ms: u64) -> Self {
        Self {
            next_ms: start_ms,
            interval_ms: interval_ms.max(1),
        }
    }

    pub fn next_ms(&self) -> u64 {
        self.next_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Consume the due tick; the following one becomes next.
    pub fn take(&mut self) {
        self.next_ms = self.next_ms.saturating_add(self.interval_ms);
    }

    /// Skip every tick that fell due before `now_ms`.  Returns how many.
    pub fn skip_missed(&mut self, now_ms: u64) -> u64 {
        if now_ms <= self.next_ms {
            return 0;
        }
        let missed = (now_ms - self.next_ms).div_ceil(self.interval_ms);
        self.next_ms = self.next_ms.saturating_add(missed * self.interval_ms);
        missed
    }
}

// ── Poll state ────────────────────────────────────────────────

/// Per-session state of a running loop.
#[derive(Debug, Clone)]
pub struct PollState {
    schedule: TickSchedule,
    cycles: u64,
    dedup: Deduplicator,
}

impl PollState {
    pub fn schedule(&self) -> &TickSchedule {
        &self.schedule
    }

    /// Completed cycles in this session.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

// ── Poll loop ─────────────────────────────────────────────────

pub struct PollLoop {
    device: DeviceId,
    profile: PollProfile,
    interval_ms: u32,
    state: Option<PollState>,
}

impl PollLoop {
    pub fn new(device: DeviceId, profile: PollProfile, interval_ms: u32) -> Self {
        Self {
            device,
            profile,
            interval_ms,
            state: None,
        }
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn profile(&self) -> PollProfile {
        self.profile
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&PollState> {
        self.state.as_ref()
    }

    /// Id of the last command this session admitted.
    pub fn last_seen(&self) -> Option<CommandId> {
        self.state
            .as_ref()
            .and_then(|s| s.dedup.last_seen(&self.device))
    }

    /// Create the poll state.  A loop that is already running keeps its
    /// current state.
    pub fn start<E, A, V>(&mut self, engine: &RefCell<Engine<E, A, V>>, now_ms: u64)
    where
        E: EffectSink,
        A: AckSignal,
        V: EventSink,
    {
        if self.state.is_some() {
            return;
        }
        info!(
            "Poll[{}]: start ({:?}, every {} ms)",
            self.device, self.profile, self.interval_ms
        );
        self.state = Some(PollState {
            schedule: TickSchedule::new(now_ms, u64::from(self.interval_ms)),
            cycles: 0,
            dedup: Deduplicator::new(),
        });
        engine.borrow_mut().report(EngineEvent::LoopStarted {
            device: self.device.clone(),
            interval_ms: self.interval_ms,
        });
    }

    /// Destroy the poll state and its dedup memory.  Alarm sessions for
    /// the device keep running; only acknowledgement ends those.
    pub fn stop<E, A, V>(&mut self, engine: &RefCell<Engine<E, A, V>>)
    where
        E: EffectSink,
        A: AckSignal,
        V: EventSink,
    {
        let Some(state) = self.state.take() else {
            return;
        };
        info!(
            "Poll[{}]: stop after {} cycle(s)",
            self.device, state.cycles
        );
        engine.borrow_mut().report(EngineEvent::LoopStopped {
            device: self.device.clone(),
        });
    }

    /// Run one fetch-dedup-classify-act cycle and report its outcome.
    ///
    /// No credential means the source is not called at all.  Errors
    /// never escape: they come back as [`CycleOutcome::Failed`] and go
    /// out through the event sink.
    pub async fn cycle<E, A, V, S, C, T>(
        &mut self,
        engine: &RefCell<Engine<E, A, V>>,
        source: &S,
        credentials: &C,
        clock: &T,
    ) -> CycleOutcome
    where
        E: EffectSink,
        A: AckSignal,
        V: EventSink,
        S: CommandSource,
        C: CredentialStore,
        T: TimePort,
    {
        if self.state.is_none() {
            return CycleOutcome::NotRunning;
        }

        let outcome = match credentials.get() {
            None => CycleOutcome::Failed(PollError::Unauthenticated),
            Some(credential) => match source.fetch_latest(&self.device, &credential).await {
                Ok(FetchOutcome::NoContent) => CycleOutcome::NoContent,
                Ok(FetchOutcome::Command(envelope)) => {
                    let admitted = self
                        .state
                        .as_mut()
                        .is_some_and(|s| s.dedup.admit(&self.device, &envelope));
                    if admitted {
                        let now_ms = clock.now_ms();
                        CycleOutcome::Delivered(engine.borrow_mut().dispatch(
                            &self.device,
                            &envelope,
                            self.profile,
                            now_ms,
                        ))
                    } else {
                        // admit() only rejects identified envelopes.
                        CycleOutcome::Delivered(Dispatch::Duplicate(envelope.id.unwrap_or_default()))
                    }
                }
                Err(e) => CycleOutcome::Failed(PollError::from(e)),
            },
        };

        if let Some(state) = self.state.as_mut() {
            state.cycles += 1;
        }
        engine.borrow_mut().report(EngineEvent::Poll {
            device: self.device.clone(),
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Drive the loop until `stop` is signalled.
    ///
    /// The first cycle runs immediately; later ones on the fixed-rate
    /// schedule.  The stop signal is honoured mid-fetch and mid-sleep.
    pub async fn run<E, A, V, S, C, T>(
        &mut self,
        engine: &RefCell<Engine<E, A, V>>,
        source: &S,
        credentials: &C,
        clock: &T,
        stop: &StopSignal,
    ) where
        E: EffectSink,
        A: AckSignal,
        V: EventSink,
        S: CommandSource,
        C: CredentialStore,
        T: TimePort,
    {
        self.start(engine, clock.now_ms());

        loop {
            if stop.signaled() {
                break;
            }
            if let Some(state) = self.state.as_mut() {
                state.schedule.take();
            }

            let completed = future::or(
                async {
                    self.cycle(engine, source, credentials, clock).await;
                    true
                },
                async {
                    stop.wait().await;
                    false
                },
            )
            .await;
            if !completed {
                break;
            }

            let now_ms = clock.now_ms();
            let Some(state) = self.state.as_mut() else {
                break;
            };
            let missed = state.schedule.skip_missed(now_ms);
            let deadline = state.schedule.next_ms();
            if missed > 0 {
                engine.borrow_mut().report(EngineEvent::TicksSkipped {
                    device: self.device.clone(),
                    missed,
                });
            }

            let woke = future::or(
                async {
                    clock.sleep_until(deadline).await;
                    true
                },
                async {
                    stop.wait().await;
                    false
                },
            )
            .await;
            if !woke {
                break;
            }
        }

        stop.reset();
        self.stop(engine);
    }
}
