//! Relays payment-provider card webhooks to Pushover.
//!
//! `receiver` accepts `POST /`, decodes the event and answers immediately;
//! `dispatcher` pushes the formatted message from a detached task.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod receiver;
pub mod telemetry;
pub mod types;

pub use config::Config;
pub use dispatcher::{Dispatcher, Notifier, PushoverClient};
pub use receiver::ServerState;
