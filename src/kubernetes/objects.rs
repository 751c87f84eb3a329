// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Conversions from Kubernetes objects into Order's domain types.

use crate::types::{ResourceKind, ResourceRef, WatchedResource, Workload, WorkloadKind, WorkloadRef};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, PodSpec, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A mountable object kind whose changes are watched
pub trait WatchedObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + DeserializeOwned
    + Debug
    + Send
    + Sync
    + 'static
{
    const KIND: ResourceKind;

    fn to_watched(&self) -> WatchedResource {
        WatchedResource {
            reference: ResourceRef::new(
                Self::KIND,
                &self.namespace().unwrap_or_default(),
                &self.name_any(),
            ),
            uid: self.uid().unwrap_or_default(),
            version: self.resource_version().unwrap_or_default(),
        }
    }
}

impl WatchedObject for Secret {
    const KIND: ResourceKind = ResourceKind::Secret;
}

impl WatchedObject for ConfigMap {
    const KIND: ResourceKind = ResourceKind::ConfigMap;
}

/// A workload kind owning a pod template
pub trait PodController:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + DeserializeOwned
    + Debug
    + Send
    + Sync
    + 'static
{
    const KIND: WorkloadKind;

    fn pod_spec(&self) -> Option<&PodSpec>;

    fn to_workload(&self) -> Workload {
        let reference = WorkloadRef::new(
            Self::KIND,
            &self.namespace().unwrap_or_default(),
            &self.name_any(),
        );
        Workload {
            reference,
            annotations: self.annotations().clone(),
            pod_spec: self.pod_spec().cloned(),
        }
    }
}

impl PodController for DaemonSet {
    const KIND: WorkloadKind = WorkloadKind::DaemonSet;

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref().and_then(|s| s.template.spec.as_ref())
    }
}

impl PodController for Deployment {
    const KIND: WorkloadKind = WorkloadKind::Deployment;

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref().and_then(|s| s.template.spec.as_ref())
    }
}

impl PodController for Job {
    const KIND: WorkloadKind = WorkloadKind::Job;

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref().and_then(|s| s.template.spec.as_ref())
    }
}

impl PodController for StatefulSet {
    const KIND: WorkloadKind = WorkloadKind::StatefulSet;

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref().and_then(|s| s.template.spec.as_ref())
    }
}
