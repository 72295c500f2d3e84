use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use lure::capture::{self, CaptureService};
use lure::config::Config;

/// Serves the fake sign-on page and records every submission
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Starting lure daemon...");

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("lure.toml"));
    let config = Config::load_or_default(&config_path)?.capture;

    if let Some(dir) = config.log_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    // Setup graceful shutdown signal handling
    let shutdown = Arc::new(Notify::new());
    let s = shutdown.clone();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal, gracefully stopping...");
        s.notify_one();
    })?;

    let (service, writer_task) = CaptureService::from_config(&config);
    let app = capture::router(Arc::new(service), config.trust_proxy_headers);

    let listener = TcpListener::bind(&config.bind_address).await?;
    log::info!(
        "Login page listening on http://{} (recording to {:?})",
        listener.local_addr()?,
        config.log_path
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await?;

    // The router owned the last writer handle; wait for queued lines to land.
    if let Err(e) = writer_task.await {
        log::error!("Attack log writer ended abnormally: {}", e);
    }

    log::info!("lure daemon stopped");
    Ok(())
}
