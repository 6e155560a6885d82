//! HTTP layer: routes, controllers and the SSE endpoint.

use events::{EventPublisher, LoginEventSource, SourceHandle};
use log::*;
use service::config::{Config, LoginEventSourceMode};
use sse::{Manager, SessionOptions, SseLoginEventHandler, TickPublisher};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::{Error, Result};

mod controller;
pub mod error;
pub mod router;

/// State shared by every request handler.
/// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Arc<Manager>,
    pub event_publisher: EventPublisher,
}

impl AppState {
    /// Wire the SSE manager and the login event publisher together. Nothing is
    /// shared with other `AppState` instances, so tests get isolated streams.
    pub fn new(config: Config) -> Self {
        let sse_manager = Arc::new(Manager::new());
        let event_publisher = EventPublisher::new()
            .with_handler(Arc::new(SseLoginEventHandler::new(sse_manager.clone())));

        Self {
            config,
            sse_manager,
            event_publisher,
        }
    }

    /// Options for a newly opened stream, per the configured event source.
    pub fn session_options(&self) -> SessionOptions {
        let tick_publisher = match self.config.login_event_source {
            LoginEventSourceMode::Shared => None,
            LoginEventSourceMode::PerSession => Some(TickPublisher {
                publisher: self.event_publisher.clone(),
                username: self.config.login_username.clone(),
            }),
        };

        SessionOptions {
            retry: self.config.retry(),
            heartbeat_period: self.config.heartbeat_interval(),
            tick_publisher,
        }
    }

    /// Start the process-wide login event source when running in shared mode.
    /// The source stops when the returned handle is dropped.
    pub fn start_login_event_source(&self) -> Option<SourceHandle> {
        match self.config.login_event_source {
            LoginEventSourceMode::Shared => Some(
                LoginEventSource::new(
                    self.event_publisher.clone(),
                    self.config.login_event_interval(),
                    self.config.login_username.clone(),
                )
                .spawn(),
            ),
            LoginEventSourceMode::PerSession => {
                info!("Login events are published by each open stream");
                None
            }
        }
    }
}

/// Bind the configured address and serve requests until the server stops.
pub async fn init_server(app_state: AppState) -> Result<()> {
    let addr = app_state.config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| Error::bind(&addr, err))?;

    info!("Server running on http://{addr}");

    axum::serve(listener, router::define_routes(app_state))
        .await
        .map_err(Error::from)
}
