use crate::Manager;
use async_trait::async_trait;
use events::{EventHandler, LoginEvent};
use std::sync::Arc;

/// Relays published login events to every open SSE session.
///
/// Each session only ever receives the event on its own output; the manager's
/// registry performs the per-session fan-out.
pub struct SseLoginEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseLoginEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseLoginEventHandler {
    async fn handle(&self, event: &LoginEvent) {
        self.sse_manager.broadcast_login(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Frame;
    use crate::session::SessionOptions;
    use events::EventPublisher;

    #[tokio::test]
    async fn test_published_event_reaches_open_sessions() {
        let manager = Arc::new(Manager::new());
        let publisher =
            EventPublisher::new().with_handler(Arc::new(SseLoginEventHandler::new(manager.clone())));
        let mut first = manager.open_session(SessionOptions::default());
        let mut second = manager.open_session(SessionOptions::default());

        let event = LoginEvent::generate("Alexander");
        publisher.publish(event.clone()).await;

        for session in [&mut first, &mut second] {
            assert!(matches!(session.try_next_frame(), Some(Frame::Retry(_))));
            assert_eq!(session.try_next_frame(), Some(Frame::Login(event.clone())));
        }
    }
}
