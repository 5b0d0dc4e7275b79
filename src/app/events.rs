//! Outbound engine events.
//!
//! The [`Engine`](super::service::Engine) and
//! [`PollLoop`](crate::poll::PollLoop) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  This is the status /
//! debug channel: every poll result, including failures, ends up here
//! instead of being thrown across the poll boundary.

use super::commands::{CommandId, DeviceId};
use crate::alarm::AlarmState;
use crate::classify::AlarmClass;
use crate::poll::CycleOutcome;

/// What the engine did with one admitted-or-rejected envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Same id as the last admitted command for this device.
    Duplicate(CommandId),
    /// Unknown kind, classified [`AlarmClass::None`].
    Ignored { kind: String },
    /// Known class, but the poll profile does not act on it.
    Filtered(AlarmClass),
    /// Class handed to the alarm controller.
    Handled(AlarmClass),
}

/// Structured events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A poll loop started for `device`.
    LoopStarted { device: DeviceId, interval_ms: u32 },

    /// A poll loop stopped; its per-device poll state is gone.
    LoopStopped { device: DeviceId },

    /// Result of one fetch-classify-act cycle.
    Poll { device: DeviceId, outcome: CycleOutcome },

    /// A cycle overran; this many ticks were skipped, not queued.
    TicksSkipped { device: DeviceId, missed: u64 },

    /// A push-delivered envelope went through the pipeline.
    Push { device: DeviceId, outcome: Dispatch },

    /// A push message carried nothing the engine understands.
    PushUnparsable { device: DeviceId },

    /// The device's alarm state machine changed state.
    AlarmChanged {
        device: DeviceId,
        from: AlarmState,
        to: AlarmState,
    },

    /// A persistent alarm re-armed while already active.
    AlarmRearmed { device: DeviceId },
}
