//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements      | Connects to                    |
//! |----------------|-----------------|--------------------------------|
//! | `credentials`  | CredentialStore | Token slot written by auth     |
//! | `http_source`  | CommandSource   | Device commands REST endpoint  |
//! | `log_sink`     | EventSink       | `log` facade                   |
//! | `time`         | TimePort        | `Instant` + async-io-mini timer|
//!
//! Effect and acknowledgement adapters are platform UI code and live in
//! the embedding app.

pub mod credentials;
pub mod http_source;
pub mod log_sink;
pub mod time;
