// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

/// Kubernetes annotation keys used by Order
pub mod annotations {
    /// RFC3339 timestamp of the last rolling restart Order performed
    pub const LAST_ROLLING_RESTART: &str = "order.kube-system.com/last-rolling-restart";
    /// SHA-256 digest over the managed resources loaded at the last restart
    pub const MANAGED_RESOURCES_HASH: &str = "order.kube-system.com/managed-resources-hash";
}

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "order";

/// Namespace excluded from actions unless explicitly whitelisted
pub const SYSTEM_NAMESPACE: &str = "kube-system";

/// Config file schema version this build understands
pub const CONFIG_VERSION: f64 = 0.1;

/// Default location of the mounted config file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/order/config.yaml";

/// Safety lower bounds for configured durations
pub mod bounds {
    use super::Duration;

    pub const CONTROLLER_RESYNC: Duration = Duration::from_secs(15);
    pub const RESTART_COOLDOWN: Duration = Duration::from_secs(30);
    pub const POD_CONTROLLER_STAGGER: Duration = Duration::from_secs(5);
}

/// Control loop and cache sync timing
pub mod timing {
    use super::Duration;

    /// Interval between control loop ticks
    pub const PROCESSOR_TICK: Duration = Duration::from_secs(5);
    /// How often to report progress while waiting for caches to sync
    pub const SYNC_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);
    /// Give up on start-up if caches have not synced by then
    pub const SYNC_TIMEOUT: Duration = Duration::from_secs(300);
}
