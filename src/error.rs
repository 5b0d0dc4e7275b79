//! Error taxonomy for the polling engine.
//!
//! Nothing in here is fatal.  Poll-side variants end up as a
//! [`CycleOutcome::Failed`](crate::poll::CycleOutcome::Failed) reported
//! through the event sink; the poll loop keeps running until it is
//! explicitly stopped.  [`StartError`] is returned to the caller that
//! asked for a new loop.

use core::fmt;

// ---------------------------------------------------------------------------
// Payload errors
// ---------------------------------------------------------------------------

/// A 200 response whose body could not be turned into a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// Body is not valid JSON (or not a JSON object).
    InvalidJson,
    /// JSON parsed, but no string `command` field was found.
    MissingKind,
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "body is not a JSON object"),
            Self::MissingKind => write!(f, "no parsable command in payload"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch errors (CommandSource → PollLoop)
// ---------------------------------------------------------------------------

/// Everything a [`CommandSource`](crate::app::ports::CommandSource) can
/// fail with.  "No content" is *not* an error, see
/// [`FetchOutcome::NoContent`](crate::app::commands::FetchOutcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, DNS failure, TLS failure, etc.
    Network,
    /// The request did not complete in time.
    Timeout,
    /// Server answered with a status other than 200 or 204.
    Status(u16),
    /// Server answered 200 but the body was unusable.
    Malformed(Malformed),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network error"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Status(code) => write!(f, "server responded {code}"),
            Self::Malformed(m) => write!(f, "malformed payload: {m}"),
        }
    }
}

impl From<Malformed> for FetchError {
    fn from(m: Malformed) -> Self {
        Self::Malformed(m)
    }
}

// ---------------------------------------------------------------------------
// Poll errors (what a cycle reports)
// ---------------------------------------------------------------------------

/// Why a poll cycle did not produce a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollError {
    /// No bearer credential available; the source was not called.
    Unauthenticated,
    /// Network, timeout or unexpected status.
    Transport(FetchError),
    /// The response parsed but carried no recognisable command.
    MalformedPayload(Malformed),
}

impl PollError {
    /// Short stable tag for log lines and metrics keys.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Transport(_) => "transport",
            Self::MalformedPayload(_) => "malformed",
        }
    }
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no credential available"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::MalformedPayload(m) => write!(f, "malformed payload: {m}"),
        }
    }
}

impl From<FetchError> for PollError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Malformed(m) => Self::MalformedPayload(m),
            other => Self::Transport(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime errors
// ---------------------------------------------------------------------------

/// Why [`EngineRuntime::start`](crate::runtime::EngineRuntime::start)
/// refused a new loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// Every poll-loop slot of the executor is taken.
    LoopLimit { max: usize },
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoopLimit { max } => write!(f, "poll loop limit reached ({max} running)"),
        }
    }
}
