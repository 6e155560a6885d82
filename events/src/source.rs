//! Periodic producer of synthetic login events.

use crate::{EventPublisher, LoginEvent};
use log::*;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Publishes one freshly generated [`LoginEvent`] per period to every handler
/// registered on the publisher.
///
/// The source runs on its own cadence, independent of any session's heartbeat.
pub struct LoginEventSource {
    publisher: EventPublisher,
    period: Duration,
    username: String,
}

impl LoginEventSource {
    pub fn new(publisher: EventPublisher, period: Duration, username: impl Into<String>) -> Self {
        Self {
            publisher,
            period,
            username: username.into(),
        }
    }

    /// Spawn the ticking task. The first event is published one full period
    /// after this call.
    pub fn spawn(self) -> SourceHandle {
        info!(
            "Starting login event source, publishing every {}ms",
            self.period.as_millis()
        );

        let first_tick = Instant::now() + self.period;
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let event = LoginEvent::generate(&self.username);
                trace!("Login event source publishing event id {}", event.id);
                self.publisher.publish(event).await;
            }
        });

        SourceHandle { task }
    }
}

/// Owns the running source task. Dropping the handle stops the source.
pub struct SourceHandle {
    task: JoinHandle<()>,
}

impl SourceHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
