// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Validated runtime configuration: scope settings and managed resource rules.

use crate::constants::{bounds, SYSTEM_NAMESPACE};
use crate::types::resources::{ResourceRef, WorkloadRef};
use std::collections::BTreeSet;
use std::time::Duration;

/// Namespaces in which workloads may be actioned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceFilter {
    /// Only these namespaces, the system namespace included if listed
    Whitelist(BTreeSet<String>),
    /// Everything except these namespaces and the system namespace
    Blacklist(BTreeSet<String>),
}

impl NamespaceFilter {
    pub fn allows(&self, namespace: &str) -> bool {
        match self {
            NamespaceFilter::Whitelist(allowed) => allowed.contains(namespace),
            NamespaceFilter::Blacklist(denied) => {
                namespace != SYSTEM_NAMESPACE && !denied.contains(namespace)
            }
        }
    }
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        NamespaceFilter::Blacklist(BTreeSet::new())
    }
}

/// Global scope and timing settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    pub namespaces: NamespaceFilter,
    pub controller_resync_period: Duration,
    pub default_restart_cooldown: Duration,
    pub pod_controller_stagger: Duration,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            namespaces: NamespaceFilter::default(),
            controller_resync_period: bounds::CONTROLLER_RESYNC,
            default_restart_cooldown: bounds::RESTART_COOLDOWN,
            pod_controller_stagger: bounds::POD_CONTROLLER_STAGGER,
        }
    }
}

/// A pod controller nominated by a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerRef {
    pub workload: WorkloadRef,
    /// Cooldown override for this controller only
    pub restart_cooldown: Option<Duration>,
}

impl ControllerRef {
    pub fn new(workload: WorkloadRef) -> Self {
        Self {
            workload,
            restart_cooldown: None,
        }
    }
}

/// Declares that changes to one resource should roll the workloads consuming it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedResourceRule {
    pub resource: ResourceRef,
    /// Rolled on change even without a structural reference
    pub whitelisted_controllers: Vec<ControllerRef>,
    /// Never rolled for this resource
    pub blacklisted_controllers: Vec<WorkloadRef>,
    pub avoid_all_unless_whitelisted: bool,
    pub restart_cooldown: Option<Duration>,
}

impl ManagedResourceRule {
    pub fn new(resource: ResourceRef) -> Self {
        Self {
            resource,
            whitelisted_controllers: Vec::new(),
            blacklisted_controllers: Vec::new(),
            avoid_all_unless_whitelisted: false,
            restart_cooldown: None,
        }
    }

    pub fn manages(&self, resource: &ResourceRef) -> bool {
        &self.resource == resource
    }

    pub fn whitelists(&self, workload: &WorkloadRef) -> bool {
        self.whitelisted_controllers
            .iter()
            .any(|c| &c.workload == workload)
    }

    pub fn blacklists(&self, workload: &WorkloadRef) -> bool {
        self.blacklisted_controllers.iter().any(|c| c == workload)
    }

    /// Strictest cooldown this rule imposes on the workload, if it overrides the default
    pub fn cooldown_for(&self, workload: &WorkloadRef) -> Option<Duration> {
        self.whitelisted_controllers
            .iter()
            .filter(|c| &c.workload == workload)
            .filter_map(|c| c.restart_cooldown)
            .chain(self.restart_cooldown)
            .max()
    }
}

/// Complete parsed configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderConfig {
    pub scope: ScopeConfig,
    pub rules: Vec<ManagedResourceRule>,
    pub debug_output: bool,
}

impl OrderConfig {
    /// All rules naming the resource
    pub fn rules_for(&self, resource: &ResourceRef) -> Vec<&ManagedResourceRule> {
        self.rules.iter().filter(|r| r.manages(resource)).collect()
    }

    pub fn manages(&self, resource: &ResourceRef) -> bool {
        self.rules.iter().any(|r| r.manages(resource))
    }
}
