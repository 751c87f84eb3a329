// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns watch events on Secrets and ConfigMaps into work items.

use crate::buffer::ChangeBuffer;
use crate::kubernetes::objects::WatchedObject;
use crate::types::{OrderConfig, ResourceRef, WatchedResource};
use kube::runtime::watcher::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Pushes managed resources into the change buffer when their version moves.
///
/// One observer serves one informer. Deletions are not actioned since workloads cannot
/// start without the resources they mount.
pub struct ChangeObserver {
    config: Arc<OrderConfig>,
    buffer: ChangeBuffer,
    last_seen: HashMap<ResourceRef, String>,
}

impl ChangeObserver {
    pub fn new(config: Arc<OrderConfig>, buffer: ChangeBuffer) -> Self {
        Self {
            config,
            buffer,
            last_seen: HashMap::new(),
        }
    }

    pub fn observe<K: WatchedObject>(&mut self, event: &Event<K>) {
        match event {
            Event::Apply(obj) | Event::InitApply(obj) => {
                self.record(obj.to_watched());
            }
            Event::Delete(obj) => self.forget(&obj.to_watched().reference),
            Event::Init | Event::InitDone => {}
        }
    }

    /// Push the resource if it is managed and its version differs from the last one
    /// seen. Returns whether a work item was pushed.
    pub fn record(&mut self, resource: WatchedResource) -> bool {
        if !self.config.manages(&resource.reference) {
            return false;
        }

        if self.last_seen.get(&resource.reference) == Some(&resource.version) {
            debug!(
                "Ignoring update to {} with unchanged version {}",
                resource.reference, resource.version
            );
            return false;
        }

        debug!(
            "Observed {} at version {}",
            resource.reference, resource.version
        );
        self.last_seen
            .insert(resource.reference.clone(), resource.version.clone());
        self.buffer.push(resource.reference, resource.version);
        true
    }

    pub fn forget(&mut self, reference: &ResourceRef) {
        if self.last_seen.remove(reference).is_some() {
            debug!("{} deleted, no action taken", reference);
        }
    }
}
