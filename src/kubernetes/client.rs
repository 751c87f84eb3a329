// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation from an explicit kubeconfig or the in-cluster service account

use crate::config::Settings;
use crate::error::{OrderError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use std::path::Path;
use tracing::{info, instrument};

/// Create the API client.
///
/// Uses the kubeconfig file named by the settings when present, otherwise the
/// in-cluster configuration.
#[instrument(skip(settings))]
pub async fn create_client(settings: &Settings) -> Result<Client> {
    let config = match &settings.kubeconfig {
        Some(path) => config_from_kubeconfig(path).await?,
        None => {
            info!("Using in-cluster configuration");
            KConfig::incluster().map_err(|e| {
                OrderError::KubeconfigError(format!("Failed to load in-cluster config: {}", e))
            })?
        }
    };

    Client::try_from(config)
        .map_err(|e| OrderError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Build a client config from a kubeconfig file on disk
async fn config_from_kubeconfig(path: &Path) -> Result<KConfig> {
    info!("Using kubeconfig at {}", path.display());

    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        OrderError::KubeconfigError(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })?;

    KConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| OrderError::KubeconfigError(format!("Failed to create config: {}", e)))
}
