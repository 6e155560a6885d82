use crate::connection::ConnectionRegistry;
use crate::message::Frame;
use crate::session::{SessionOptions, StreamSession};
use events::LoginEvent;
use log::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
    live_heartbeats: Arc<AtomicUsize>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            live_heartbeats: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open a new stream session subscribed to login events.
    pub fn open_session(&self, options: SessionOptions) -> StreamSession {
        let session = StreamSession::open(
            self.registry.clone(),
            self.live_heartbeats.clone(),
            options,
        );
        debug!(
            "{} SSE session(s) subscribed after open",
            self.subscriber_count()
        );
        session
    }

    /// Relay a login event to every open session.
    /// Returns the number of sessions it was written to.
    pub fn broadcast_login(&self, event: &LoginEvent) -> usize {
        let delivered = self.registry.broadcast(&Frame::Login(event.clone()));
        debug!(
            "Relayed login event id {} to {} SSE session(s)",
            event.id, delivered
        );
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn active_heartbeats(&self) -> usize {
        self.live_heartbeats.load(Ordering::SeqCst)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
