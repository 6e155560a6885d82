use axum::response::sse::Event;
use events::LoginEvent;
use std::time::Duration;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Unit written to a stream session's output.
///
/// Frames stay transport-agnostic until [`Frame::into_event`] renders them in
/// SSE wire format at the HTTP edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Client reconnection delay directive (`retry:<millis>`).
    Retry(Duration),
    /// A relayed login notification, carried as raw JSON in the `data` field.
    Login(LoginEvent),
    /// Human-readable time-of-day line written by the session's own timer.
    Heartbeat { time: String },
}

impl EventType for Frame {
    fn event_type(&self) -> &'static str {
        match self {
            Frame::Retry(_) => "retry",
            Frame::Login(_) => "user_logged_in",
            Frame::Heartbeat { .. } => "heartbeat",
        }
    }
}

impl Frame {
    pub fn heartbeat(time: impl Into<String>) -> Self {
        Frame::Heartbeat { time: time.into() }
    }

    /// Render the frame as an SSE event.
    ///
    /// A retry frame renders as a bare `retry:` field with no event name, so it
    /// reaches the wire as exactly `retry:<millis>\n\n`.
    pub fn into_event(self) -> Result<Event, serde_json::Error> {
        let event = match &self {
            Frame::Retry(interval) => Event::default().retry(*interval),
            Frame::Login(login) => {
                let data = serde_json::to_string(login)?;
                Event::default().event(self.event_type()).data(data)
            }
            Frame::Heartbeat { time } => Event::default()
                .event(self.event_type())
                .data(format!("The time is {time}")),
        };
        Ok(event)
    }
}
