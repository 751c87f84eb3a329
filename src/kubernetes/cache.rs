// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Local, eventually consistent view of watched resources and pod controllers.

use crate::buffer::ChangeBuffer;
use crate::constants::timing;
use crate::error::{OrderError, Result};
use crate::kubernetes::informer::run_informer;
use crate::kubernetes::objects::{PodController, WatchedObject};
use crate::types::{
    NamespaceFilter, OrderConfig, ResourceKind, WatchedResource, Workload, WorkloadKind,
};
use crate::watchers::ChangeObserver;
use futures::future::BoxFuture;
use futures::FutureExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::runtime::reflector::{self, Store};
use kube::{Api, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// Read access to the cluster state the processor works from
pub trait ClusterCache {
    /// Workloads of one kind within the configured namespaces
    fn list_workloads(&self, kind: WorkloadKind) -> Vec<Workload>;

    /// Watched resources of one kind within the configured namespaces
    fn list_resources(&self, kind: ResourceKind) -> Vec<WatchedResource>;
}

/// Informer-backed cache over the six watched kinds
#[derive(Clone)]
pub struct KubeCache {
    secrets: Store<Secret>,
    config_maps: Store<ConfigMap>,
    daemon_sets: Store<DaemonSet>,
    deployments: Store<Deployment>,
    jobs: Store<Job>,
    stateful_sets: Store<StatefulSet>,
    namespaces: NamespaceFilter,
}

/// Informer tasks driving a [`KubeCache`]
pub type Informers = Vec<BoxFuture<'static, ()>>;

impl KubeCache {
    /// Create the stores and the informers feeding them.
    ///
    /// Resource informers also push managed changes into `buffer`. Nothing is watched
    /// until the returned futures are polled.
    pub fn start(
        client: Client,
        config: Arc<OrderConfig>,
        buffer: ChangeBuffer,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, Informers) {
        let resync = config.scope.controller_resync_period;
        let mut informers: Informers = Vec::new();

        let secrets = resource_informer::<Secret>(
            &client, &config, &buffer, resync, &shutdown, &mut informers,
        );
        let config_maps = resource_informer::<ConfigMap>(
            &client, &config, &buffer, resync, &shutdown, &mut informers,
        );
        let daemon_sets = workload_informer::<DaemonSet>(&client, resync, &shutdown, &mut informers);
        let deployments = workload_informer::<Deployment>(&client, resync, &shutdown, &mut informers);
        let jobs = workload_informer::<Job>(&client, resync, &shutdown, &mut informers);
        let stateful_sets =
            workload_informer::<StatefulSet>(&client, resync, &shutdown, &mut informers);

        let cache = Self {
            secrets,
            config_maps,
            daemon_sets,
            deployments,
            jobs,
            stateful_sets,
            namespaces: config.scope.namespaces.clone(),
        };
        (cache, informers)
    }

    /// Block until every store has completed its initial listing.
    ///
    /// Logs progress while waiting and fails once `timeout` has passed.
    #[instrument(skip(self))]
    pub async fn wait_until_synced(&self, timeout: Duration) -> Result<()> {
        let started = Instant::now();

        for (name, mut ready) in self.readiness() {
            loop {
                match tokio::time::timeout(timing::SYNC_PROGRESS_INTERVAL, &mut ready).await {
                    Ok(true) => {
                        debug!("{} cache synced", name);
                        break;
                    }
                    Ok(false) => {
                        return Err(OrderError::CacheSyncError(format!(
                            "{} informer stopped before its cache synced",
                            name
                        )));
                    }
                    Err(_) if started.elapsed() >= timeout => {
                        return Err(OrderError::CacheSyncError(format!(
                            "{} cache not synced after {}",
                            name,
                            humantime::format_duration(timeout)
                        )));
                    }
                    Err(_) => info!("Waiting for {} cache to sync...", name),
                }
            }
        }

        info!("All caches synced");
        Ok(())
    }

    fn readiness(&self) -> Vec<(&'static str, BoxFuture<'static, bool>)> {
        vec![
            (ResourceKind::Secret.config_name(), ready(&self.secrets)),
            (ResourceKind::ConfigMap.config_name(), ready(&self.config_maps)),
            (WorkloadKind::DaemonSet.config_name(), ready(&self.daemon_sets)),
            (WorkloadKind::Deployment.config_name(), ready(&self.deployments)),
            (WorkloadKind::Job.config_name(), ready(&self.jobs)),
            (WorkloadKind::StatefulSet.config_name(), ready(&self.stateful_sets)),
        ]
    }

    fn workloads<K: PodController>(&self, store: &Store<K>) -> Vec<Workload> {
        store
            .state()
            .iter()
            .map(|obj| obj.to_workload())
            .filter(|w| self.namespaces.allows(w.namespace()))
            .collect()
    }

    fn resources<K: WatchedObject>(&self, store: &Store<K>) -> Vec<WatchedResource> {
        store
            .state()
            .iter()
            .map(|obj| obj.to_watched())
            .filter(|r| self.namespaces.allows(&r.reference.namespace))
            .collect()
    }
}

impl ClusterCache for KubeCache {
    fn list_workloads(&self, kind: WorkloadKind) -> Vec<Workload> {
        match kind {
            WorkloadKind::DaemonSet => self.workloads(&self.daemon_sets),
            WorkloadKind::Deployment => self.workloads(&self.deployments),
            WorkloadKind::Job => self.workloads(&self.jobs),
            WorkloadKind::StatefulSet => self.workloads(&self.stateful_sets),
        }
    }

    fn list_resources(&self, kind: ResourceKind) -> Vec<WatchedResource> {
        match kind {
            ResourceKind::Secret => self.resources(&self.secrets),
            ResourceKind::ConfigMap => self.resources(&self.config_maps),
        }
    }
}

fn ready<K: kube::Resource<DynamicType = ()> + Clone + Send + Sync + 'static>(
    store: &Store<K>,
) -> BoxFuture<'static, bool> {
    let store = store.clone();
    async move { store.wait_until_ready().await.is_ok() }.boxed()
}

fn resource_informer<K: WatchedObject>(
    client: &Client,
    config: &Arc<OrderConfig>,
    buffer: &ChangeBuffer,
    resync: Duration,
    shutdown: &watch::Receiver<bool>,
    informers: &mut Informers,
) -> Store<K> {
    let (store, writer) = reflector::store::<K>();
    let mut observer = ChangeObserver::new(Arc::clone(config), buffer.clone());
    informers.push(
        run_informer(
            K::KIND.config_name(),
            Api::<K>::all(client.clone()),
            writer,
            resync,
            shutdown.clone(),
            move |event| observer.observe(event),
        )
        .boxed(),
    );
    store
}

fn workload_informer<K: PodController>(
    client: &Client,
    resync: Duration,
    shutdown: &watch::Receiver<bool>,
    informers: &mut Informers,
) -> Store<K> {
    let (store, writer) = reflector::store::<K>();
    informers.push(
        run_informer(
            K::KIND.config_name(),
            Api::<K>::all(client.clone()),
            writer,
            resync,
            shutdown.clone(),
            |_| {},
        )
        .boxed(),
    );
    store
}
