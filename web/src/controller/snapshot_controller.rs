use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use events::local_time_of_day;
use log::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct Snapshot {
    message: String,
    time: String,
}

/// GET a one-shot JSON message stamped with the server's local time of day.
pub async fn index(State(app_state): State<AppState>) -> impl IntoResponse {
    debug!("GET snapshot");

    let snapshot = Snapshot {
        message: app_state.config.snapshot_message.clone(),
        time: local_time_of_day(),
    };

    (StatusCode::OK, Json(snapshot))
}
