// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use order::buffer::ChangeBuffer;
use order::config::{load_config, Settings};
use order::constants::timing;
use order::kubernetes::{create_client, KubeCache, KubePatcher};
use order::processor::Processor;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env();
    let config = Arc::new(load_config(&settings.config_path)?);

    init_tracing(config.debug_output);
    info!(
        "Starting Order with {} managed resources from {}",
        config.rules.len(),
        settings.config_path.display()
    );

    let client = create_client(&settings).await?;
    info!("Connected to Kubernetes cluster");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, finishing current tick");
        let _ = shutdown_tx.send(true);
    });

    let buffer = ChangeBuffer::new();
    let (cache, informers) = KubeCache::start(
        client.clone(),
        Arc::clone(&config),
        buffer.clone(),
        shutdown_rx.clone(),
    );
    let informer_tasks: Vec<_> = informers.into_iter().map(tokio::spawn).collect();

    info!("Waiting for caches to sync...");
    cache.wait_until_synced(timing::SYNC_TIMEOUT).await?;

    let processor = Processor::new(cache, KubePatcher::new(client), buffer, config);
    processor.run(shutdown_rx).await;

    for task in informer_tasks {
        if let Err(e) = task.await {
            warn!("Informer task ended abnormally: {}", e);
        }
    }

    info!("Order stopped");
    Ok(())
}

/// `RUST_LOG` takes precedence over the configured verbosity
fn init_tracing(debug_output: bool) {
    let default_level = if debug_output { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
