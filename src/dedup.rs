//! Per-device repeat suppression.
//!
//! The poll endpoint keeps returning the newest command until the device
//! side moves on, so the same id shows up on many consecutive polls.
//! [`Deduplicator::admit`] lets each id through once per device.
//! Envelopes without an id (push deliveries) are always admitted and
//! never touch the stored state.

use std::collections::HashMap;

use crate::app::commands::{CommandEnvelope, CommandId, DeviceId};

#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    last_seen: HashMap<DeviceId, CommandId>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the envelope should be acted on.
    ///
    /// Admission of an identified envelope records its id as the device's
    /// last-seen id before returning.
    pub fn admit(&mut self, device: &DeviceId, envelope: &CommandEnvelope) -> bool {
        let Some(id) = envelope.id else {
            return true;
        };
        if self.last_seen.get(device) == Some(&id) {
            return false;
        }
        self.last_seen.insert(device.clone(), id);
        true
    }

    pub fn last_seen(&self, device: &DeviceId) -> Option<CommandId> {
        self.last_seen.get(device).copied()
    }
}
