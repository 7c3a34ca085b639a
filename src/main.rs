//! slirc-bridge binary.

use std::sync::Arc;

use anyhow::Context;
use slirc_bridge::config::{self, Config, LogConfig, LogFormat};
use slirc_bridge::irc::TcpConnector;
use slirc_bridge::lifecycle::Cooldowns;
use slirc_bridge::{App, BridgeError, open_settings};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match log.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                    _ = term.recv() => info!("Received SIGTERM"),
                }
                return;
            }
            Err(e) => error!(error = %e, "Unable to install SIGTERM handler"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Unable to listen for Ctrl+C");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = Config::locate(std::env::args().nth(1))?;
    let mut config =
        Config::load(&path).with_context(|| format!("loading {}", path.display()))?;

    init_tracing(&config.log);
    info!(path = %path.display(), "Loaded configuration");

    config.normalize();
    config::validate(&config).map_err(|errors| {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        BridgeError::from(errors)
    })?;

    let settings = open_settings(&config)?;
    info!(data_dir = %config.data_dir.display(), "Opened settings store");

    let app = App::start(
        config,
        Arc::new(TcpConnector),
        settings,
        Cooldowns::default(),
    );

    wait_for_signal().await;
    info!("Shutting down");
    app.stop().await;

    Ok(())
}
