mod api;
mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use teetime_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use teetime_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let notifier_provider = app.state.pipeline.notifier_provider();
    let router = api::router(app.state.clone())
        .merge(health::router(app.db_pool.clone(), notifier_provider));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        notifier_provider,
        "teetime-server listening"
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut drain_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(event_name = "system.server.signal_error", error = %error, "shutdown signal listener failed");
        }
        let _ = shutdown_tx.send(true);
    });

    let server = async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    };
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let drain_deadline = async move {
        let _ = drain_rx.changed().await;
        info!(event_name = "system.server.stopping", correlation_id = "shutdown", "draining in-flight requests");
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "in-flight requests did not finish before the grace period"
            );
        }
    }

    app.db_pool.close().await;
    info!(event_name = "system.server.stopped", correlation_id = "shutdown", "teetime-server stopped");
    Ok(())
}
