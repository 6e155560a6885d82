use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use log::*;
use std::convert::Infallible;

/// SSE handler that opens a login event stream for the requesting client.
///
/// The session lives inside the response body stream. When the client goes
/// away hyper drops the body, which drops the session and releases its
/// heartbeat and subscription.
pub(crate) async fn stream(State(app_state): State<AppState>) -> impl IntoResponse {
    let mut session = app_state
        .sse_manager
        .open_session(app_state.session_options());

    debug!("Establishing SSE session {}", session.id());

    let events = stream! {
        while let Some(frame) = session.next_frame().await {
            match frame.into_event() {
                Ok(event) => yield Ok::<Event, Infallible>(event),
                Err(e) => error!("Failed to serialize SSE frame for session {}: {e}", session.id()),
            }
        }

        debug!("SSE session {} has no more frames, cleaning up", session.id());
        session.close();
    };

    let sse = Sse::new(events).keep_alive(KeepAlive::new().interval(app_state.config.keep_alive()));

    (
        [(CONNECTION, "keep-alive"), (ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        sse,
    )
}
