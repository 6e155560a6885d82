//! Server-Sent Events (SSE) infrastructure for the login event stream.
//!
//! This crate owns everything about an open stream except HTTP itself: the
//! subscriber registry that login events fan out through, the per-session
//! heartbeat timer, and the session lifecycle that ties the two together.
//!
//! # Architecture
//!
//! - **Registry keyed by connection**: every open session holds one entry in
//!   the `ConnectionRegistry`; a broadcast visits entries in registration
//!   order and writes only to each entry's own output channel.
//! - **Owned handles**: registration (`Subscription`) and the periodic timer
//!   (`Heartbeat`) are handles released on drop. A `StreamSession` owns both,
//!   so dropping a session can never leave a dangling subscriber or a running
//!   timer behind.
//! - **Explicit composition**: there is no global emitter. The server's
//!   composition root builds one `Manager` and hands it to the HTTP layer and
//!   to the `SseLoginEventHandler`; tests build their own.
//!
//! # Session lifecycle
//!
//! 1. `Manager::open_session` queues the retry directive, registers the
//!    session and starts its heartbeat. The session is `Open`.
//! 2. Login events published through `events::EventPublisher` reach the
//!    `SseLoginEventHandler`, which relays them to every open session.
//! 3. The heartbeat writes a time-of-day frame once per period and, when
//!    configured, publishes a fresh login event first.
//! 4. When the client goes away the HTTP body drops the session. The session
//!    passes through `Closing`, cancels the heartbeat, deregisters, and ends
//!    `Closed`. Calling `close` again does nothing.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry and type-safe ConnectionId
//! - `heartbeat`: per-session periodic timer
//! - `login_event_handler`: bridge from published login events to sessions
//! - `manager`: entry point for opening sessions and relaying events
//! - `message`: frame types and their SSE rendering
//! - `session`: StreamSession state machine
//! - `subscription`: owned registry registration

pub mod connection;
pub mod heartbeat;
pub mod login_event_handler;
pub mod manager;
pub mod message;
pub mod session;
pub mod subscription;

pub use heartbeat::TickPublisher;
pub use login_event_handler::SseLoginEventHandler;
pub use manager::Manager;
pub use message::Frame;
pub use session::{SessionOptions, SessionState, StreamSession};
