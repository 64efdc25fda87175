//! Address book HTTP server entry point.
//!
//! Configuration comes from `ADDRESSBOOK_*` environment variables; see
//! `addressbook_server::config`.

use addressbook_core::init_logging;
use addressbook_server::{router, AppState, ServerConfig};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let log_dir = config
        .log_dir
        .to_str()
        .ok_or("log directory path is not valid UTF-8")?;
    init_logging(&config.log_level, log_dir)?;

    let state = AppState::open(&config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        "event=http_listen module=server status=ok bind={} version={}",
        config.bind,
        addressbook_core::core_version()
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=http_stop module=server status=ok");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("event=http_stop module=server status=error error_code=signal_failed error={err}");
    }
}
