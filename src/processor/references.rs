// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Structural reference matching between pod templates and watched resources.

use crate::types::{ResourceKind, ResourceRef, Workload};
use k8s_openapi::api::core::v1::{Container, EnvFromSource, EnvVar, PodSpec, Volume};

/// Whether the workload's pod template mounts or injects the resource.
///
/// A workload can only reference resources in its own namespace. A workload without a
/// pod template has no references.
pub fn matches(workload: &Workload, resource: &ResourceRef) -> bool {
    if workload.namespace() != resource.namespace {
        return false;
    }

    workload
        .pod_spec
        .as_ref()
        .is_some_and(|spec| pod_spec_references(spec, resource.kind, &resource.name))
}

fn pod_spec_references(spec: &PodSpec, kind: ResourceKind, name: &str) -> bool {
    let mut containers = spec
        .containers
        .iter()
        .chain(spec.init_containers.iter().flatten());

    spec.volumes
        .iter()
        .flatten()
        .any(|volume| volume_references(volume, kind, name))
        || containers.any(|container| container_references(container, kind, name))
}

fn volume_references(volume: &Volume, kind: ResourceKind, name: &str) -> bool {
    let direct = match kind {
        ResourceKind::Secret => volume
            .secret
            .as_ref()
            .is_some_and(|s| s.secret_name.as_deref() == Some(name)),
        ResourceKind::ConfigMap => volume
            .config_map
            .as_ref()
            .is_some_and(|c| c.name == name),
    };

    direct
        || volume
            .projected
            .as_ref()
            .and_then(|p| p.sources.as_ref())
            .is_some_and(|sources| {
                sources.iter().any(|source| match kind {
                    ResourceKind::Secret => source.secret.as_ref().is_some_and(|s| s.name == name),
                    ResourceKind::ConfigMap => {
                        source.config_map.as_ref().is_some_and(|c| c.name == name)
                    }
                })
            })
}

fn container_references(container: &Container, kind: ResourceKind, name: &str) -> bool {
    container
        .env
        .iter()
        .flatten()
        .any(|env| env_references(env, kind, name))
        || container
            .env_from
            .iter()
            .flatten()
            .any(|source| env_from_references(source, kind, name))
}

fn env_references(env: &EnvVar, kind: ResourceKind, name: &str) -> bool {
    let Some(value_from) = env.value_from.as_ref() else {
        return false;
    };

    match kind {
        ResourceKind::Secret => value_from
            .secret_key_ref
            .as_ref()
            .is_some_and(|r| r.name == name),
        ResourceKind::ConfigMap => value_from
            .config_map_key_ref
            .as_ref()
            .is_some_and(|r| r.name == name),
    }
}

fn env_from_references(source: &EnvFromSource, kind: ResourceKind, name: &str) -> bool {
    match kind {
        ResourceKind::Secret => source.secret_ref.as_ref().is_some_and(|r| r.name == name),
        ResourceKind::ConfigMap => source
            .config_map_ref
            .as_ref()
            .is_some_and(|r| r.name == name),
    }
}
