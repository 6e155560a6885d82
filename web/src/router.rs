use crate::controller::{health_check_controller, snapshot_controller, stream_controller};
use crate::error::Error;
use crate::AppState;
use axum::{routing::get, Router};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(snapshot_routes(app_state.clone()))
        .merge(stream_routes(app_state))
        .fallback(not_found)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn snapshot_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(snapshot_controller::index))
        .with_state(app_state)
}

fn stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/stream", get(stream_controller::stream))
        .with_state(app_state)
}

async fn not_found() -> Error {
    Error::not_found()
}
