//! Owned alarm resources.
//!
//! An [`AlarmSession`] owns the two things a persistent alarm acquires:
//! the repeat timer and the acknowledgement listener registration.  The
//! timer is plain data, so dropping the session cancels it; the listener
//! has to be handed back to the [`AckSignal`] port, which [`AlarmSession::end`]
//! does.  Every exit path (acknowledgement, re-arm, shutdown) goes through
//! `end`.

use crate::app::ports::{AckSignal, ListenerId};

/// Fixed-rate timer for repeated vibration bursts.
///
/// Anchored at activation time: bursts are due at `start + k * period`.
/// If the clock jumps past several due points only one burst fires and
/// the missed ones are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatTimer {
    next_due_ms: u64,
    period_ms: u64,
    fired: u32,
}

impl RepeatTimer {
    /// Start a timer whose immediate burst has already been emitted.
    pub fn start(now_ms: u64, period_ms: u64) -> Self {
        Self {
            next_due_ms: now_ms.saturating_add(period_ms),
            period_ms: period_ms.max(1),
            fired: 1,
        }
    }

    /// Returns `true` if a burst is due at `now_ms`, and re-arms.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_due_ms {
            return false;
        }
        let behind = now_ms - self.next_due_ms;
        let steps = behind / self.period_ms + 1;
        self.next_due_ms = self.next_due_ms.saturating_add(steps * self.period_ms);
        self.fired = self.fired.saturating_add(1);
        true
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    /// Bursts emitted so far, including the immediate one.
    pub fn fired(&self) -> u32 {
        self.fired
    }
}

/// One active persistent alarm for one device.
#[derive(Debug)]
pub struct AlarmSession {
    listener: ListenerId,
    timer: RepeatTimer,
}

impl AlarmSession {
    pub fn new(listener: ListenerId, now_ms: u64, period_ms: u64) -> Self {
        Self {
            listener,
            timer: RepeatTimer::start(now_ms, period_ms),
        }
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    pub fn timer(&self) -> &RepeatTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut RepeatTimer {
        &mut self.timer
    }

    /// Release the session: the timer is dropped with `self` and the
    /// listener is detached.
    pub fn end(self, ack: &mut impl AckSignal) {
        ack.detach(self.listener);
    }
}

/// Auto-dismiss deadline for the transient banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerTimer {
    pub dismiss_at_ms: u64,
}
