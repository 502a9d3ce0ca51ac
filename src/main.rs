//! Device status watcher binary

use device_watch::monitor::await_run;
use device_watch::{Config, DeviceMonitor, Notifier, TelegramNotifier};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the real environment still applies.
    let dotenv = dotenvy::dotenv();

    initialize_tracing();

    info!("Starting device_watch v{}", env!("CARGO_PKG_VERSION"));
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Could not load .env file: {}", e);
        }
    }

    let config = Config::from_env();

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    for name in config.missing_credentials() {
        warn!("{} is not set; requests that need it will be rejected", name);
    }

    info!(
        "Monitor configuration - Roster: {}, Status API: {}, Notify on check error: {}",
        config.roster_path, config.status_api_url, config.notify_on_check_error
    );

    let notifier: Arc<dyn Notifier> = match TelegramNotifier::new(&config) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            error!("Failed to create notifier: {}", e);
            std::process::exit(1);
        }
    };

    let monitor = match DeviceMonitor::new(config, Arc::clone(&notifier)) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("Failed to create monitor: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting run {}", monitor.run_id());

    // The run is a single sequential task; spawning it only lets us observe a panic.
    let run = tokio::spawn(async move { monitor.run().await });

    await_run(run, notifier.as_ref()).await;
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
