//! Lullabuddy command polling & alarm engine.
//!
//! Polls a monitored device's command endpoint, suppresses repeats,
//! classifies each command and drives the local alarm (notification,
//! repeating vibration, auto-dismissed banner) until the parent
//! acknowledges it.  Push-delivered messages feed the same pipeline.
//!
//! Platform specifics (HTTP stack, notification and haptics APIs, the
//! UI interaction listener) sit behind the port traits in
//! [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod alarm;
pub mod app;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod poll;
pub mod runtime;
pub mod wire;
