//! End-to-end runs on the cooperative runtime with the real clock.
//!
//! Intervals are shrunk to a few milliseconds; assertions use lower
//! bounds so scheduler jitter cannot flip them.

use core::time::Duration;

use async_io_mini::Timer;
use lullabuddy::adapters::time::MonotonicClock;
use lullabuddy::alarm::AlarmState;
use lullabuddy::app::events::EngineEvent;
use lullabuddy::app::service::{Engine, PollProfile};
use lullabuddy::config::EngineConfig;
use lullabuddy::error::StartError;
use lullabuddy::runtime::{EngineRuntime, MAX_POLL_LOOPS, PollHandle};

use crate::mock_platform::*;

type TestRuntime<'a> = EngineRuntime<'a, MockEffects, MockAck, RecordingEvents, MonotonicClock>;

fn fast_config() -> EngineConfig {
    let mut c = EngineConfig::default();
    c.foreground_interval_ms = 20;
    c.test_mode_interval_ms = 20;
    c.vibration_period_ms = 40;
    c.vibration_pattern = heapless::Vec::from_slice(&[5]).unwrap_or_default();
    c.transient_dismiss_ms = 30;
    c.alarm_tick_ms = 5;
    c
}

fn runtime<'a>() -> TestRuntime<'a> {
    let engine = Engine::new(
        fast_config(),
        MockEffects::default(),
        MockAck::default(),
        RecordingEvents::default(),
    );
    EngineRuntime::new(engine, MonotonicClock::new())
}

fn wait(rt: &TestRuntime<'_>, ms: u64) {
    rt.run_until(Timer::after(Duration::from_millis(ms)));
}

fn count_events(rt: &TestRuntime<'_>, pred: impl Fn(&EngineEvent) -> bool) -> usize {
    rt.engine()
        .borrow()
        .events()
        .events
        .iter()
        .filter(|e| pred(e))
        .count()
}

#[test]
fn polled_alarm_runs_until_acknowledged() {
    let rt = runtime();
    let source = ScriptedSource::new(vec![command(1, "vibrate"), command(1, "vibrate")]);
    let handle = rt.start(
        device(),
        PollProfile::Foreground,
        source,
        CountingCredentials::token("t"),
    )
    .expect("free loop slot");

    wait(&rt, 150);
    assert!(count_events(&rt, |e| matches!(e, EngineEvent::Poll { .. })) >= 3);
    {
        let e = rt.engine().borrow();
        assert_eq!(e.alarm_state(&device()), AlarmState::AlarmActive);
        assert_eq!(e.effects().notifications().len(), 1);
        assert!(e.effects().vibrations() >= 2);
    }

    rt.stop(handle);
    wait(&rt, 30);
    assert_eq!(
        count_events(&rt, |e| matches!(e, EngineEvent::LoopStopped { .. })),
        1
    );
    // Stopping the loop leaves the alarm running.
    assert_eq!(
        rt.engine().borrow().alarm_state(&device()),
        AlarmState::AlarmActive
    );

    let listener = rt
        .engine()
        .borrow()
        .alarm()
        .session(&device())
        .map(|s| s.listener());
    assert!(rt.user_interaction(listener.expect("session")));
    let vibrations = rt.engine().borrow().effects().vibrations();
    wait(&rt, 100);
    let e = rt.engine().borrow();
    assert_eq!(e.alarm_state(&device()), AlarmState::Idle);
    assert_eq!(e.effects().stops(), 1);
    assert_eq!(e.effects().vibrations(), vibrations);
}

#[test]
fn dropped_handle_stops_the_loop() {
    let rt = runtime();
    let handle = rt.start(
        device(),
        PollProfile::TestMode,
        ScriptedSource::new(Vec::new()),
        CountingCredentials::absent(),
    )
    .expect("free loop slot");
    wait(&rt, 50);
    drop(handle);
    wait(&rt, 30);
    let polls = count_events(&rt, |e| matches!(e, EngineEvent::Poll { .. }));
    wait(&rt, 60);
    assert_eq!(
        count_events(&rt, |e| matches!(e, EngineEvent::Poll { .. })),
        polls
    );
    assert_eq!(
        count_events(&rt, |e| matches!(e, EngineEvent::LoopStopped { .. })),
        1
    );
}

fn start_idle_loop(rt: &TestRuntime<'_>) -> Result<PollHandle, StartError> {
    rt.start(
        device(),
        PollProfile::TestMode,
        ScriptedSource::new(Vec::new()),
        CountingCredentials::absent(),
    )
}

#[test]
fn start_past_the_loop_limit_is_refused() {
    let rt = runtime();
    let mut handles: Vec<PollHandle> = (0..MAX_POLL_LOOPS)
        .map(|_| start_idle_loop(&rt).expect("free loop slot"))
        .collect();
    assert_eq!(rt.live_loops(), MAX_POLL_LOOPS);
    assert_eq!(
        start_idle_loop(&rt).err(),
        Some(StartError::LoopLimit {
            max: MAX_POLL_LOOPS
        })
    );

    // Every admitted loop plus the built-in tasks fit the run queue.
    wait(&rt, 60);
    assert_eq!(
        count_events(&rt, |e| matches!(e, EngineEvent::LoopStarted { .. })),
        MAX_POLL_LOOPS
    );

    // A stopped loop frees its slot once its task has finished.
    rt.stop(handles.pop().expect("handle"));
    wait(&rt, 30);
    assert_eq!(rt.live_loops(), MAX_POLL_LOOPS - 1);
    let _again = start_idle_loop(&rt).expect("slot freed by stop");
    wait(&rt, 30);
    assert_eq!(
        count_events(&rt, |e| matches!(e, EngineEvent::LoopStarted { .. })),
        MAX_POLL_LOOPS + 1
    );
}

#[test]
fn transient_banner_clears_on_its_own() {
    let rt = runtime();
    let _handle = rt.start(
        device(),
        PollProfile::TestMode,
        ScriptedSource::new(vec![command(2, "motion_detected")]),
        CountingCredentials::token("t"),
    )
    .expect("free loop slot");
    wait(&rt, 100);
    let e = rt.engine().borrow();
    assert_eq!(e.effects().banners(), vec!["Motion detected"]);
    assert_eq!(e.effects().banner_clears(), 1);
    assert_eq!(e.alarm_state(&device()), AlarmState::Idle);
}

#[test]
fn push_bytes_feed_the_engine() {
    let rt = runtime();
    assert!(rt.push_bytes(device(), br#"{"data": {"type": "vibrate"}}"#));
    assert!(rt.push_bytes(device(), br#"{"data": {"type": "vibrate"}}"#));
    assert!(!rt.push_bytes(device(), b"not json"));
    wait(&rt, 10);

    let e = rt.engine().borrow();
    assert_eq!(e.effects().notifications().len(), 2);
    assert_eq!(e.alarm().active_timers(), 1);
    assert_eq!(
        e.events()
            .events
            .iter()
            .filter(|ev| matches!(ev, EngineEvent::PushUnparsable { .. }))
            .count(),
        1
    );
}

#[test]
fn shutdown_stops_vibration() {
    let rt = runtime();
    rt.push_bytes(device(), br#"{"data": {"type": "warning"}}"#);
    wait(&rt, 10);
    rt.shutdown();
    let vibrations = rt.engine().borrow().effects().vibrations();
    wait(&rt, 100);
    let e = rt.engine().borrow();
    assert_eq!(e.effects().vibrations(), vibrations);
    assert_eq!(e.effects().stops(), 1);
    assert!(e.ack().live().is_empty());
}
