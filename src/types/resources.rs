// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identities of watched resources and of the workloads that consume them.

use crate::constants::annotations;
use crate::error::OrderError;
use k8s_openapi::api::core::v1::PodSpec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kinds of mountable objects whose changes Order watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Secret,
    ConfigMap,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Secret, ResourceKind::ConfigMap];

    /// Kubernetes kind name, also used as the fingerprint tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::ConfigMap => "ConfigMap",
        }
    }

    /// Plural name used in the config file
    pub fn config_name(&self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secrets",
            ResourceKind::ConfigMap => "ConfigMaps",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.config_name() == s)
            .ok_or_else(|| {
                OrderError::InvalidConfig(format!(
                    "unknown managed resource type '{}', expected one of Secrets, ConfigMaps",
                    s
                ))
            })
    }
}

/// Kinds of pod controllers Order can roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkloadKind {
    DaemonSet,
    Deployment,
    Job,
    StatefulSet,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 4] = [
        WorkloadKind::DaemonSet,
        WorkloadKind::Deployment,
        WorkloadKind::Job,
        WorkloadKind::StatefulSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::Job => "Job",
            WorkloadKind::StatefulSet => "StatefulSet",
        }
    }

    /// Plural name used in the config file
    pub fn config_name(&self) -> &'static str {
        match self {
            WorkloadKind::DaemonSet => "DaemonSets",
            WorkloadKind::Deployment => "Deployments",
            WorkloadKind::Job => "Jobs",
            WorkloadKind::StatefulSet => "StatefulSets",
        }
    }

    /// Whether patching the pod template rolls the pods. Job templates are immutable.
    pub fn supports_template_roll(&self) -> bool {
        !matches!(self, WorkloadKind::Job)
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkloadKind::ALL
            .into_iter()
            .find(|kind| kind.config_name() == s)
            .ok_or_else(|| {
                OrderError::InvalidConfig(format!(
                    "unknown pod controller type '{}', expected one of DaemonSets, Deployments, Jobs, StatefulSets",
                    s
                ))
            })
    }
}

/// Identity of a watched resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Snapshot of a watched resource as seen in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedResource {
    pub reference: ResourceRef,
    /// Cluster-assigned unique id, changes when the object is recreated
    pub uid: String,
    /// Opaque resource version, not guaranteed to be ordered or numeric
    pub version: String,
}

/// Identity of a pod controller
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkloadRef {
    pub kind: WorkloadKind,
    pub name: String,
    pub namespace: String,
}

impl WorkloadRef {
    pub fn new(kind: WorkloadKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Read-only view of a pod controller: its identity, its own annotations and its pod template
#[derive(Debug, Clone)]
pub struct Workload {
    pub reference: WorkloadRef,
    pub annotations: BTreeMap<String, String>,
    pub pod_spec: Option<PodSpec>,
}

impl Workload {
    pub fn new(reference: WorkloadRef, pod_spec: Option<PodSpec>) -> Self {
        Self {
            reference,
            annotations: BTreeMap::new(),
            pod_spec,
        }
    }

    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }

    pub fn namespace(&self) -> &str {
        &self.reference.namespace
    }

    /// Raw value of the last-rolling-restart annotation
    pub fn last_restart_annotation(&self) -> Option<&str> {
        self.annotations
            .get(annotations::LAST_ROLLING_RESTART)
            .map(String::as_str)
    }

    /// Fingerprint recorded at the last rolling restart
    pub fn applied_fingerprint(&self) -> Option<&str> {
        self.annotations
            .get(annotations::MANAGED_RESOURCES_HASH)
            .map(String::as_str)
    }
}
