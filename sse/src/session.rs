use crate::connection::{ConnectionId, ConnectionRegistry};
use crate::heartbeat::{Heartbeat, TickPublisher};
use crate::message::Frame;
use crate::subscription::Subscription;
use log::*;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Reconnection delay announced to clients when a stream opens.
pub const DEFAULT_RETRY: Duration = Duration::from_millis(5000);

/// Period of the per-session heartbeat timer.
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_millis(1000);

/// Lifecycle of a stream session. `Closing` is only observable while
/// [`StreamSession::close`] is releasing resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

#[derive(Clone)]
pub struct SessionOptions {
    pub retry: Duration,
    pub heartbeat_period: Duration,
    /// When set, each heartbeat tick first publishes a freshly generated login
    /// event to every open session, this one included.
    pub tick_publisher: Option<TickPublisher>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            retry: DEFAULT_RETRY,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            tick_publisher: None,
        }
    }
}

/// Server-side state of one open SSE connection.
///
/// A session owns exactly one registry subscription and exactly one heartbeat
/// timer. Both are released together by [`StreamSession::close`], which also
/// runs on drop, so a session that goes away for any reason leaves nothing
/// behind.
pub struct StreamSession {
    state: SessionState,
    subscription: Subscription,
    heartbeat: Heartbeat,
    output: UnboundedReceiver<Frame>,
}

impl StreamSession {
    pub(crate) fn open(
        registry: Arc<ConnectionRegistry>,
        live_heartbeats: Arc<AtomicUsize>,
        options: SessionOptions,
    ) -> Self {
        let (sender, output) = mpsc::unbounded_channel();

        // The retry directive must precede anything the subscription or the
        // timer can write. The receiver is alive, so this cannot fail.
        let _ = sender.send(Frame::Retry(options.retry));

        let subscription = Subscription::new(registry, sender.clone());
        let heartbeat = Heartbeat::start(
            sender,
            options.heartbeat_period,
            options.tick_publisher,
            live_heartbeats,
        );

        info!("Opened SSE session {}", subscription.connection_id());

        Self {
            state: SessionState::Open,
            subscription,
            heartbeat,
            output,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        self.subscription.connection_id()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Wait for the next frame to write to the client. Returns `None` once the
    /// session is closed.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        if !self.is_open() {
            return None;
        }
        match self.output.recv().await {
            Some(frame) => Some(frame),
            None => {
                // Every writer is gone; nothing can reach this session again.
                self.close();
                None
            }
        }
    }

    /// Take the next already-queued frame without waiting.
    pub fn try_next_frame(&mut self) -> Option<Frame> {
        if !self.is_open() {
            return None;
        }
        self.output.try_recv().ok()
    }

    /// Tear the session down: cancel the heartbeat, then deregister the
    /// subscription. Returns `false` if the session was already closed.
    pub fn close(&mut self) -> bool {
        if self.state != SessionState::Open {
            return false;
        }
        self.state = SessionState::Closing;

        self.heartbeat.cancel();
        self.subscription.release();

        // Refuse late writes and discard whatever was still queued.
        self.output.close();
        while self.output.try_recv().is_ok() {}

        self.state = SessionState::Closed;
        info!("Closed SSE session {}", self.id());
        true
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.close() {
            debug!("SSE session {} released on drop", self.id());
        }
    }
}
