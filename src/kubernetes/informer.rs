// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Long-running watch that keeps a reflector store populated.

use futures::StreamExt;
use kube::runtime::reflector::store::Writer;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::pin::pin;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Watch `api`, apply every event to `writer` and hand it to `on_event`.
///
/// The watch is restarted every `resync` period, which re-lists all objects into the
/// store. Returns once `shutdown` flips or its sender goes away.
pub async fn run_informer<K, F>(
    name: &'static str,
    api: Api<K>,
    mut writer: Writer<K>,
    resync: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut on_event: F,
) where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    F: FnMut(&watcher::Event<K>) + Send,
{
    info!("Starting {} informer", name);

    'resync: loop {
        let mut stream = pin!(watcher(api.clone(), watcher::Config::default()).default_backoff());
        let mut resync_timer = pin!(tokio::time::sleep(resync));

        loop {
            tokio::select! {
                _ = shutdown.changed() => break 'resync,
                _ = &mut resync_timer => {
                    debug!("Resyncing {} informer", name);
                    continue 'resync;
                }
                event = stream.next() => match event {
                    Some(Ok(event)) => {
                        writer.apply_watcher_event(&event);
                        on_event(&event);
                    }
                    Some(Err(e)) => warn!("{} watch error: {}", name, e),
                    None => {
                        warn!("{} watch stream ended, restarting", name);
                        continue 'resync;
                    }
                },
            }
        }
    }

    info!("Shutting down {} informer", name);
}
