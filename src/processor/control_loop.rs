// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Periodic drain of the change buffer into rolling restarts.

use crate::buffer::{ChangeBuffer, WorkItem};
use crate::constants::timing;
use crate::kubernetes::{ClusterCache, RestartAnnotations, WorkloadPatcher};
use crate::processor::fingerprint::fingerprint;
use crate::processor::policy::{effective_cooldown, parse_last_restart, permitted};
use crate::processor::references::matches;
use crate::processor::scope::{in_scope, rule_admits};
use crate::types::{
    ManagedResourceRule, OrderConfig, ResourceKind, WatchedResource, Workload, WorkloadKind,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Counters describing the work done in one tick
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    pub items: usize,
    pub discarded: usize,
    pub restarted: usize,
    pub up_to_date: usize,
    pub deferred: usize,
    pub failed: usize,
}

enum ItemOutcome {
    Done,
    Discarded,
    Retry,
}

enum WorkloadOutcome {
    Restarted,
    UpToDate,
    Deferred,
    Failed,
}

/// Consumes the change buffer and restarts affected workloads
pub struct Processor<C, P> {
    cache: C,
    patcher: P,
    buffer: ChangeBuffer,
    config: Arc<OrderConfig>,
    last_global_action: Option<DateTime<Utc>>,
}

impl<C, P> Processor<C, P>
where
    C: ClusterCache,
    P: WorkloadPatcher,
{
    pub fn new(cache: C, patcher: P, buffer: ChangeBuffer, config: Arc<OrderConfig>) -> Self {
        Self {
            cache,
            patcher,
            buffer,
            config,
            last_global_action: None,
        }
    }

    /// Time of the last successful restart, shared across all workloads
    pub fn last_global_action(&self) -> Option<DateTime<Utc>> {
        self.last_global_action
    }

    /// Tick until `shutdown` flips. A tick in progress always completes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(timing::PROCESSOR_TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Processor started, ticking every {}",
            humantime::format_duration(timing::PROCESSOR_TICK)
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            let summary = self.process_tick(Utc::now()).await;
            if summary.items > 0 {
                debug!(?summary, "Tick complete");
            }
        }

        info!(
            "Processor stopped with {} pending items",
            self.buffer.len()
        );
    }

    /// Drain the buffer once.
    ///
    /// Items with a workload that was deferred or failed are requeued after the drain so
    /// they are retried on a later tick, not within this one.
    pub async fn process_tick(&mut self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut retry = Vec::new();

        while let Some(item) = self.buffer.pop() {
            summary.items += 1;
            match self.process_item(&item, now, &mut summary).await {
                ItemOutcome::Done => {}
                ItemOutcome::Discarded => summary.discarded += 1,
                ItemOutcome::Retry => retry.push(item),
            }
        }

        for item in retry {
            debug!(
                "Requeueing {} after {} attempts",
                item.resource, item.attempts
            );
            self.buffer.requeue(item);
        }

        summary
    }

    async fn process_item(
        &mut self,
        item: &WorkItem,
        now: DateTime<Utc>,
        summary: &mut TickSummary,
    ) -> ItemOutcome {
        let config = Arc::clone(&self.config);
        let rules = config.rules_for(&item.resource);
        if rules.is_empty() {
            debug!("{} is no longer managed, discarding", item.resource);
            return ItemOutcome::Discarded;
        }

        let resources = self.cached_resources();
        if !resources.iter().any(|r| r.reference == item.resource) {
            debug!("{} is no longer cached, discarding", item.resource);
            return ItemOutcome::Discarded;
        }

        let mut retry = false;
        for workload in self.affected_workloads(item, &rules) {
            match self.reconcile_workload(&workload, &resources, now).await {
                WorkloadOutcome::Restarted => summary.restarted += 1,
                WorkloadOutcome::UpToDate => summary.up_to_date += 1,
                WorkloadOutcome::Deferred => {
                    summary.deferred += 1;
                    retry = true;
                }
                WorkloadOutcome::Failed => {
                    summary.failed += 1;
                    retry = true;
                }
            }
        }

        if retry {
            ItemOutcome::Retry
        } else {
            ItemOutcome::Done
        }
    }

    fn cached_resources(&self) -> Vec<WatchedResource> {
        ResourceKind::ALL
            .iter()
            .flat_map(|kind| self.cache.list_resources(*kind))
            .collect()
    }

    /// In-scope workloads that reference the item's resource or are whitelisted for it
    fn affected_workloads(&self, item: &WorkItem, rules: &[&ManagedResourceRule]) -> Vec<Workload> {
        WorkloadKind::ALL
            .iter()
            .flat_map(|kind| self.cache.list_workloads(*kind))
            .filter(|w| {
                matches(w, &item.resource) || rules.iter().any(|r| r.whitelists(&w.reference))
            })
            .filter(|w| in_scope(&w.reference, rules.iter().copied(), &self.config.scope))
            .collect()
    }

    async fn reconcile_workload(
        &mut self,
        workload: &Workload,
        resources: &[WatchedResource],
        now: DateTime<Utc>,
    ) -> WorkloadOutcome {
        let config = Arc::clone(&self.config);
        let consumed = consumed_resources(workload, resources, &config);
        let digest = fingerprint(consumed.iter().copied());

        if workload.applied_fingerprint() == Some(digest.as_str()) {
            debug!("{} already runs the current resources", workload.reference);
            return WorkloadOutcome::UpToDate;
        }

        let rules = consumed
            .iter()
            .flat_map(|r| config.rules_for(&r.reference))
            .filter(|rule| rule_admits(rule, &workload.reference));
        let cooldown = effective_cooldown(
            config.scope.default_restart_cooldown,
            rules,
            &workload.reference,
        );

        let annotation = workload.last_restart_annotation();
        let last_restart = parse_last_restart(annotation, now);
        if last_restart.defaulted && annotation.is_some() {
            warn!(
                "Unreadable restart timestamp on {}, treating it as restarted just now",
                workload.reference
            );
        }

        if !permitted(
            last_restart.at,
            cooldown,
            self.last_global_action,
            config.scope.pod_controller_stagger,
            now,
        ) {
            debug!(
                "Restart of {} deferred by cooldown or stagger",
                workload.reference
            );
            return WorkloadOutcome::Deferred;
        }

        let annotations = RestartAnnotations::new(now, digest);
        match self
            .patcher
            .apply_annotations(&workload.reference, &annotations)
            .await
        {
            Ok(()) => {
                self.last_global_action = Some(now);
                info!("Triggered rolling restart of {}", workload.reference);
                WorkloadOutcome::Restarted
            }
            Err(e) if e.is_conflict() => {
                info!(
                    "Conflicting update on {}, retrying on a later tick",
                    workload.reference
                );
                WorkloadOutcome::Failed
            }
            Err(e) => {
                warn!("Failed to restart {}: {}", workload.reference, e);
                WorkloadOutcome::Failed
            }
        }
    }
}

/// Managed resources whose changes would roll this workload
pub fn consumed_resources<'a>(
    workload: &Workload,
    resources: &'a [WatchedResource],
    config: &OrderConfig,
) -> Vec<&'a WatchedResource> {
    resources
        .iter()
        .filter(|r| {
            config.rules_for(&r.reference).iter().any(|rule| {
                (matches(workload, &r.reference) || rule.whitelists(&workload.reference))
                    && rule_admits(rule, &workload.reference)
            })
        })
        .collect()
}
