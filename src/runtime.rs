//! Cooperative runtime: one executor driving every engine task.
//!
//! `edge-executor` schedules the tasks; timers come from the
//! `async-io-mini` reactor behind the [`TimePort`].  Everything runs on
//! the calling thread, so engine state is shared as `Rc<RefCell<..>>`
//! and no borrow is held across an `.await`.
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────┐
//!  │  futures_lite::future::block_on                        │
//!  │  ┌──────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                    │  │
//!  │  │                                                  │  │
//!  │  │  ┌─────────────┐  ┌────────────┐  ┌───────────┐  │  │
//!  │  │  │ Alarm clock │  │ Push inbox │  │ PollLoop  │  │  │
//!  │  │  │ tick ⏱      │  │ wake-on-   │  │ one per   │  │  │
//!  │  │  │             │  │ send       │  │ start()   │  │  │
//!  │  │  └─────────────┘  └────────────┘  └───────────┘  │  │
//!  │  └──────────────────────────────────────────────────┘  │
//!  └────────────────────────────────────────────────────────┘
//! ```

use core::cell::{Cell, RefCell};
use core::future::Future;
use std::rc::Rc;

use edge_executor::{LocalExecutor, Task};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::commands::DeviceId;
use crate::app::events::EngineEvent;
use crate::app::ports::{
    AckSignal, CommandSource, CredentialStore, EffectSink, EventSink, ListenerId, PushDelivery,
    TimePort,
};
use crate::app::service::{Engine, PollProfile};
use crate::error::StartError;
use crate::poll::{PollLoop, StopSignal};
use crate::wire::PushMessage;

/// Executor run-queue depth.  Each live task holds at most one queued
/// runnable, so the number of live tasks must never exceed this.
pub const MAX_TASKS: usize = 8;

/// Concurrent poll loops; the alarm clock and push inbox take the rest.
pub const MAX_POLL_LOOPS: usize = MAX_TASKS - 2;

/// Push messages buffered before deliveries are dropped.
pub const PUSH_INBOX_DEPTH: usize = 8;

type PushInbox = Channel<NoopRawMutex, (DeviceId, PushMessage), PUSH_INBOX_DEPTH>;
type SharedEngine<E, A, V> = Rc<RefCell<Engine<E, A, V>>>;

// ── Handle ───────────────────────────────────────────────────

/// Handle of a started poll loop.  Stopping (or dropping) it signals
/// the loop, which finishes its cleanup on the next executor turn.
pub struct PollHandle {
    device: DeviceId,
    stop: Rc<StopSignal>,
    task: Option<Task<()>>,
}

impl PollHandle {
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Signal the loop to stop; consumes the handle.
    pub fn stop(self) {
        self.stop.signal(());
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop.signal(());
        if let Some(task) = self.task.take() {
            task.detach();
        }
    }
}

/// Occupied poll-loop slot, released when the loop task finishes.
struct LoopSlot(Rc<Cell<usize>>);

impl LoopSlot {
    fn claim(live: &Rc<Cell<usize>>) -> Result<Self, StartError> {
        if live.get() >= MAX_POLL_LOOPS {
            return Err(StartError::LoopLimit {
                max: MAX_POLL_LOOPS,
            });
        }
        live.set(live.get() + 1);
        Ok(Self(live.clone()))
    }
}

impl Drop for LoopSlot {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

// ── Tasks ────────────────────────────────────────────────────

/// Advance alarm timers every `tick_ms`.
async fn alarm_clock<E, A, V, T>(engine: SharedEngine<E, A, V>, clock: Rc<T>, tick_ms: u64)
where
    E: EffectSink,
    A: AckSignal,
    V: EventSink,
    T: TimePort,
{
    loop {
        let deadline = clock.now_ms().saturating_add(tick_ms);
        clock.sleep_until(deadline).await;
        engine.borrow_mut().tick(clock.now_ms());
    }
}

/// Feed push messages into the engine as they arrive.
async fn push_inbox<E, A, V, T>(engine: SharedEngine<E, A, V>, clock: Rc<T>, inbox: Rc<PushInbox>)
where
    E: EffectSink,
    A: AckSignal,
    V: EventSink,
    T: TimePort,
{
    loop {
        let (device, message) = inbox.receive().await;
        engine
            .borrow_mut()
            .handle_push_message(&device, &message, clock.now_ms());
    }
}

// ── Runtime ──────────────────────────────────────────────────

pub struct EngineRuntime<'a, E, A, V, T> {
    executor: LocalExecutor<'a, MAX_TASKS>,
    engine: SharedEngine<E, A, V>,
    clock: Rc<T>,
    inbox: Rc<PushInbox>,
    live_loops: Rc<Cell<usize>>,
}

impl<'a, E, A, V, T> EngineRuntime<'a, E, A, V, T>
where
    E: EffectSink + 'a,
    A: AckSignal + 'a,
    V: EventSink + 'a,
    T: TimePort + 'a,
{
    /// Wrap `engine` and spawn the alarm clock and push inbox tasks.
    pub fn new(engine: Engine<E, A, V>, clock: T) -> Self {
        let tick_ms = u64::from(engine.config().alarm_tick_ms);
        let executor: LocalExecutor<'a, MAX_TASKS> = LocalExecutor::new();
        let engine: SharedEngine<E, A, V> = Rc::new(RefCell::new(engine));
        let clock = Rc::new(clock);
        let inbox: Rc<PushInbox> = Rc::new(Channel::new());

        executor
            .spawn(alarm_clock(engine.clone(), clock.clone(), tick_ms))
            .detach();
        executor
            .spawn(push_inbox(engine.clone(), clock.clone(), inbox.clone()))
            .detach();

        info!("Runtime: started (alarm tick {} ms)", tick_ms);
        Self {
            executor,
            engine,
            clock,
            inbox,
            live_loops: Rc::new(Cell::new(0)),
        }
    }

    pub fn engine(&self) -> &RefCell<Engine<E, A, V>> {
        &self.engine
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }

    /// Poll loops whose task has not finished yet.  A stopped loop keeps
    /// its slot until the executor has run its cleanup.
    pub fn live_loops(&self) -> usize {
        self.live_loops.get()
    }

    /// Start a poll loop for `device`.  The first cycle runs on the next
    /// executor turn.  Fails once [`MAX_POLL_LOOPS`] loops are live.
    pub fn start<S, C>(
        &self,
        device: DeviceId,
        profile: PollProfile,
        source: S,
        credentials: C,
    ) -> Result<PollHandle, StartError>
    where
        S: CommandSource + 'a,
        C: CredentialStore + 'a,
    {
        let slot = LoopSlot::claim(&self.live_loops).inspect_err(|e| {
            warn!("Runtime: poll loop for {} refused: {}", device, e);
        })?;
        let interval_ms = profile.interval_ms(self.engine.borrow().config());
        let stop = Rc::new(StopSignal::new());

        let engine = self.engine.clone();
        let clock = self.clock.clone();
        let signal = stop.clone();
        let mut poll = PollLoop::new(device.clone(), profile, interval_ms);
        let task = self.executor.spawn(async move {
            let _slot = slot;
            poll.run(&*engine, &source, &credentials, &*clock, &*signal)
                .await;
        });

        Ok(PollHandle {
            device,
            stop,
            task: Some(task),
        })
    }

    /// Stop a poll loop.  Alarm sessions it started keep running.
    pub fn stop(&self, handle: PollHandle) {
        info!("Runtime: stopping poll loop for {}", handle.device());
        handle.stop();
    }

    /// Parse a raw push payload and queue it.
    pub fn push_bytes(&self, device: DeviceId, body: &[u8]) -> bool {
        match PushMessage::parse(body) {
            Ok(message) => self.deliver(device, message),
            Err(e) => {
                warn!("Runtime: push for {} not decodable: {}", device, e);
                self.engine
                    .borrow_mut()
                    .report(EngineEvent::PushUnparsable { device });
                false
            }
        }
    }

    /// Forward a user interaction to `listener`.
    pub fn user_interaction(&self, listener: ListenerId) -> bool {
        self.engine.borrow_mut().on_user_interaction(listener)
    }

    /// Release every alarm resource.
    pub fn shutdown(&self) {
        info!("Runtime: shutdown");
        self.engine.borrow_mut().shutdown();
    }

    /// Drive every task until `fut` completes.
    pub fn run_until<F: Future + 'a>(&self, fut: F) -> F::Output {
        futures_lite::future::block_on(self.executor.run(fut))
    }
}

impl<'a, E, A, V, T> PushDelivery for EngineRuntime<'a, E, A, V, T>
where
    E: EffectSink + 'a,
    A: AckSignal + 'a,
    V: EventSink + 'a,
    T: TimePort + 'a,
{
    fn deliver(&self, device: DeviceId, message: PushMessage) -> bool {
        if self.inbox.try_send((device, message)).is_err() {
            warn!("Runtime: push inbox full, dropping message");
            return false;
        }
        true
    }
}
