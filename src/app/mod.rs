//! Application core: pipeline wiring, zero platform I/O.
//!
//! Data types flowing in ([`commands`]), status flowing out ([`events`]),
//! the port traits the outside world implements ([`ports`]), and the
//! [`Engine`](service::Engine) that ties classification and the alarm
//! controller together.  Deduplication belongs to each poll loop.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
