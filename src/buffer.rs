// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deduplicating buffer of watched resources with pending changes.
//!
//! Entries are keyed purely by resource identity. Resource versions are opaque and not
//! ordered, so a push always overwrites whatever is stored for the same identity. Pop
//! order is unspecified: processing reads live state and is cooldown-gated, so order
//! does not affect the outcome.

use crate::types::ResourceRef;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A pending change for one watched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub resource: ResourceRef,
    /// Version observed when the change was pushed
    pub pending_version: String,
    pub last_processed: DateTime<Utc>,
    /// Number of times the item has been popped
    pub attempts: u32,
}

/// Shared handle to the change buffer. Clones refer to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct ChangeBuffer {
    items: Arc<Mutex<HashMap<ResourceRef, WorkItem>>>,
}

impl ChangeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the entry for the resource
    pub fn push(&self, resource: ResourceRef, pending_version: String) {
        let item = WorkItem {
            resource: resource.clone(),
            pending_version,
            last_processed: Utc::now(),
            attempts: 0,
        };
        self.lock().insert(resource, item);
    }

    /// Remove and return an arbitrary entry with its attempt count incremented
    pub fn pop(&self) -> Option<WorkItem> {
        let mut items = self.lock();
        let key = items.keys().next().cloned()?;
        let mut item = items.remove(&key)?;
        item.attempts = item.attempts.saturating_add(1);
        Some(item)
    }

    /// Put back an item that could not be fully actioned, stamping it as processed now.
    ///
    /// A push that arrived after the item was popped carries a newer observation and is
    /// kept instead. Returns whether the item was stored.
    pub fn requeue(&self, mut item: WorkItem) -> bool {
        let mut items = self.lock();
        if items.contains_key(&item.resource) {
            return false;
        }
        item.last_processed = Utc::now();
        items.insert(item.resource.clone(), item);
        true
    }

    #[cfg(test)]
    pub fn get(&self, resource: &ResourceRef) -> Option<WorkItem> {
        self.lock().get(resource).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceRef, WorkItem>> {
        // The map stays consistent even if a holder panicked, nothing spans two operations
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
