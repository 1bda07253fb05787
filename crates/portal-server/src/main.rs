//! Result Portal Server - Main entry point

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use portal_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::{info, warn};

use portal_server::{
    api,
    config::Config,
    db::{self, PgRecordStore},
    features::FeatureState,
    notify::SnsNotifier,
    provision,
    storage::S3BlobStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("portal-server")
        .filter_directives("portal_server=debug,tower_http=debug,sqlx=info")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    info!("Starting Result Portal Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the record store")?;

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let blobs = S3BlobStore::new(&sdk_config, config.storage.clone());
    let sns = SnsNotifier::client(&sdk_config, &config.storage.region);

    let topic_arn = if config.auto_provision {
        provision::provision(&pool, &blobs, &sns, &config.notifications)
            .await
            .topic_arn
    } else {
        config.notifications.topic_arn.clone()
    };
    match &topic_arn {
        Some(arn) => info!(topic_arn = %arn, "Notifier ready"),
        None => warn!("No notification topic available; continuing without notifications"),
    }

    let state = FeatureState::new(
        Arc::new(PgRecordStore::new(pool)),
        Arc::new(blobs),
        Arc::new(SnsNotifier::new(sns, topic_arn)),
        &config.notifications,
    );

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
