//! Event system infrastructure for the login stream server.
//!
//! This crate provides the event system that decouples whoever produces login
//! events from the transports that deliver them (like SSE sessions).
//!
//! # Architecture
//!
//! - **LoginEvent**: The synthetic "user logged in" notification
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//! - **LoginEventSource**: Periodic producer that publishes fresh events
//!
//! This crate has no dependencies on the other workspace crates, so the `sse`
//! crate can depend on it without creating cycles.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;

pub mod source;

pub use source::{LoginEventSource, SourceHandle};

/// Username carried by generated events unless configured otherwise.
pub const DEFAULT_USERNAME: &str = "Alexander";

/// Upper bound (inclusive) of a generated event id.
pub const MAX_EVENT_ID: u8 = 10;

/// A synthetic "user logged in" notification.
///
/// All fields are strings on the wire, including `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub id: String,
    pub username: String,
    pub time: String,
}

impl LoginEvent {
    /// Build a fresh event stamped with the current local time.
    pub fn generate(username: &str) -> Self {
        // A uniform real in [0, 10) rounded to the nearest integer, so the
        // end points are half as likely as the interior ids.
        let raw: f64 = rand::thread_rng().gen_range(0.0..f64::from(MAX_EVENT_ID));
        Self {
            id: (raw.round() as u8).to_string(),
            username: username.to_string(),
            time: local_time_of_day(),
        }
    }
}

/// The current local time of day, see [`time_of_day`].
pub fn local_time_of_day() -> String {
    time_of_day(&Local::now())
}

/// Formats a timestamp as a locale-style time of day, e.g. `3:04:05 PM`.
pub fn time_of_day<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%-I:%M:%S %p").to_string()
}

/// Trait for handling login events.
/// Implementations can perform side effects like fanning the event out to
/// open SSE sessions or logging it.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &LoginEvent);
}

/// Publishes login events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers, one after the other.
    pub async fn publish(&self, event: LoginEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
