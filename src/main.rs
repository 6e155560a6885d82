use log::*;
use service::{config::Config, logging::Logger};
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
    }

    info!(
        "Starting login_stream_rs ({} environment, {} login event source)",
        config.runtime_env(),
        config.login_event_source
    );

    let app_state = AppState::new(config);

    // Held for the lifetime of the server; dropping it stops the source.
    let _login_event_source = app_state.start_login_event_source();

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
