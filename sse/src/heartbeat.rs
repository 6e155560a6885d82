use crate::message::Frame;
use events::{local_time_of_day, EventPublisher, LoginEvent};
use log::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Login-event publishing performed on each heartbeat tick, before the
/// heartbeat line is written.
#[derive(Clone)]
pub struct TickPublisher {
    pub publisher: EventPublisher,
    pub username: String,
}

struct HeartbeatState {
    released: AtomicBool,
    live: Arc<AtomicUsize>,
}

impl HeartbeatState {
    fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.live.fetch_sub(1, Ordering::SeqCst);
        true
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// A session's periodic timer.
///
/// Counts itself in `live` from start until it is cancelled, dropped, or stops
/// on its own because its output is gone.
pub struct Heartbeat {
    task: JoinHandle<()>,
    state: Arc<HeartbeatState>,
}

impl Heartbeat {
    /// Start ticking. The first tick fires one full `period` after start.
    pub fn start(
        sender: UnboundedSender<Frame>,
        period: Duration,
        tick_publisher: Option<TickPublisher>,
        live: Arc<AtomicUsize>,
    ) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        let state = Arc::new(HeartbeatState {
            released: AtomicBool::new(false),
            live,
        });

        let first_tick = Instant::now() + period;
        let task_state = state.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if task_state.is_released() {
                    break;
                }

                if let Some(tick) = &tick_publisher {
                    tick.publisher
                        .publish(LoginEvent::generate(&tick.username))
                        .await;
                    // Publishing yields; the session may have closed meanwhile.
                    if task_state.is_released() {
                        break;
                    }
                }

                if sender.send(Frame::heartbeat(local_time_of_day())).is_err() {
                    debug!("Heartbeat output closed, stopping timer");
                    task_state.release();
                    break;
                }
            }
        });

        Self { task, state }
    }

    /// Stop the timer. Returns `true` only for the call that released it.
    pub fn cancel(&self) -> bool {
        self.task.abort();
        self.state.release()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_released()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use events::EventHandler;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CountingHandler {
        count: AtomicUsize,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &LoginEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_one_period_after_start() {
        let live = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let heartbeat = Heartbeat::start(tx, Duration::from_millis(1000), None, live);

        // The task has not run yet when the clock moves.
        tokio::time::advance(Duration::from_millis(1000)).await;
        tokio::task::yield_now().await;

        assert!(matches!(rx.try_recv(), Ok(Frame::Heartbeat { .. })));
        drop(heartbeat);
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_timer_publishes_nothing_on_a_late_tick() {
        let live = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(CountingHandler::default());
        let tick_publisher = TickPublisher {
            publisher: EventPublisher::new().with_handler(handler.clone()),
            username: "Alexander".to_string(),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let heartbeat = Heartbeat::start(
            tx,
            Duration::from_millis(100),
            Some(tick_publisher),
            live.clone(),
        );

        // Released by another thread while the task itself keeps running.
        assert!(heartbeat.state.release());
        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;

        assert_eq!(handler.count.load(Ordering::SeqCst), 0);
        assert!(rx.recv().await.is_none());
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_writes_once_per_period() {
        let live = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let heartbeat = Heartbeat::start(tx, Duration::from_millis(1000), None, live.clone());
        assert_eq!(live.load(Ordering::SeqCst), 1);

        let start = Instant::now();
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Frame::Heartbeat { .. }));
        assert_eq!(start.elapsed(), Duration::from_millis(1000));

        let second = rx.recv().await.unwrap();
        assert!(matches!(second, Frame::Heartbeat { .. }));
        assert_eq!(start.elapsed(), Duration::from_millis(2000));

        drop(heartbeat);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_writes() {
        let live = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let heartbeat = Heartbeat::start(tx, Duration::from_millis(100), None, live.clone());

        assert!(heartbeat.cancel());
        assert!(!heartbeat.cancel());
        assert!(heartbeat.is_cancelled());
        assert_eq!(live.load(Ordering::SeqCst), 0);

        // Once the aborted task is gone its sender is dropped with it.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_stops_itself_when_output_is_gone() {
        let live = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let heartbeat = Heartbeat::start(tx, Duration::from_millis(100), None, live.clone());
        drop(rx);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(heartbeat.is_cancelled());
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert!(!heartbeat.cancel());
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
