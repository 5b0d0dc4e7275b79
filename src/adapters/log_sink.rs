//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`EngineEvent`] through the
//! `log` facade with a fixed tag per area.  The embedding app decides
//! where the lines go.

use log::{debug, info, warn};

use crate::app::events::{Dispatch, EngineEvent};
use crate::app::ports::EventSink;
use crate::error::PollError;
use crate::poll::CycleOutcome;

/// Adapter that logs every [`EngineEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::LoopStarted {
                device,
                interval_ms,
            } => {
                info!("LOOP | {} started, every {} ms", device, interval_ms);
            }
            EngineEvent::LoopStopped { device } => {
                info!("LOOP | {} stopped", device);
            }
            EngineEvent::TicksSkipped { device, missed } => {
                info!("LOOP | {} skipped {} tick(s)", device, missed);
            }
            EngineEvent::Poll { device, outcome } => log_cycle(device, outcome),
            EngineEvent::Push { device, outcome } => {
                log_dispatch("PUSH", device, outcome);
            }
            EngineEvent::PushUnparsable { device } => {
                warn!("PUSH | {} unparsable message dropped", device);
            }
            EngineEvent::AlarmChanged { device, from, to } => {
                info!("ALARM | {} {:?} -> {:?}", device, from, to);
            }
            EngineEvent::AlarmRearmed { device } => {
                info!("ALARM | {} re-armed", device);
            }
        }
    }
}

fn log_cycle(device: &impl core::fmt::Display, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::NoContent => debug!("POLL | {} no content", device),
        CycleOutcome::Delivered(d) => log_dispatch("POLL", device, d),
        CycleOutcome::Failed(PollError::Unauthenticated) => {
            debug!("POLL | {} unauthenticated, fetch skipped", device);
        }
        CycleOutcome::Failed(e) => warn!("POLL | {} {} ({})", device, e.tag(), e),
        CycleOutcome::NotRunning => debug!("POLL | {} not running", device),
    }
}

fn log_dispatch(tag: &str, device: &impl core::fmt::Display, outcome: &Dispatch) {
    match outcome {
        Dispatch::Duplicate(id) => debug!("{} | {} duplicate id={}", tag, device, id),
        Dispatch::Ignored { kind } => debug!("{} | {} unknown kind '{}'", tag, device, kind),
        Dispatch::Filtered(class) => {
            debug!("{} | {} {} filtered by profile", tag, device, class.name());
        }
        Dispatch::Handled(class) => info!("{} | {} {}", tag, device, class.name()),
    }
}
