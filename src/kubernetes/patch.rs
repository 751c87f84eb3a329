// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Writes restart annotations to pod controllers, which triggers a rolling restart.

use crate::constants::{annotations, OPERATOR_NAME};
use crate::error::Result;
use crate::kubernetes::objects::PodController;
use crate::types::{WorkloadKind, WorkloadRef};
use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{debug, instrument};

/// Annotation values recorded on a workload when Order restarts it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartAnnotations {
    /// RFC3339 restart time
    pub restarted_at: String,
    pub fingerprint: String,
}

impl RestartAnnotations {
    pub fn new(now: DateTime<Utc>, fingerprint: String) -> Self {
        Self {
            restarted_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            fingerprint,
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                annotations::LAST_ROLLING_RESTART.to_string(),
                self.restarted_at.clone(),
            ),
            (
                annotations::MANAGED_RESOURCES_HASH.to_string(),
                self.fingerprint.clone(),
            ),
        ])
    }
}

/// Applies restart annotations to a workload
pub trait WorkloadPatcher {
    fn apply_annotations(
        &self,
        workload: &WorkloadRef,
        annotations: &RestartAnnotations,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Patches workloads through the Kubernetes API with server-side apply
#[derive(Clone)]
pub struct KubePatcher {
    client: Client,
}

impl KubePatcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[instrument(skip(self, annotations), fields(workload = %workload))]
    async fn patch<K: PodController>(
        &self,
        workload: &WorkloadRef,
        annotations: &RestartAnnotations,
    ) -> Result<()> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &workload.namespace);
        let body = restart_patch::<K>(workload, annotations);
        let params = PatchParams::apply(OPERATOR_NAME).force();

        api.patch(&workload.name, &params, &Patch::Apply(&body))
            .await?;

        debug!("Applied restart annotations to {}", workload);
        Ok(())
    }
}

impl WorkloadPatcher for KubePatcher {
    async fn apply_annotations(
        &self,
        workload: &WorkloadRef,
        annotations: &RestartAnnotations,
    ) -> Result<()> {
        match workload.kind {
            WorkloadKind::DaemonSet => self.patch::<DaemonSet>(workload, annotations).await,
            WorkloadKind::Deployment => self.patch::<Deployment>(workload, annotations).await,
            WorkloadKind::Job => self.patch::<Job>(workload, annotations).await,
            WorkloadKind::StatefulSet => self.patch::<StatefulSet>(workload, annotations).await,
        }
    }
}

/// Apply body setting the annotations on the workload and, where the kind allows it,
/// on its pod template so the controller rolls its pods
pub fn restart_patch<K: PodController>(
    workload: &WorkloadRef,
    annotations: &RestartAnnotations,
) -> serde_json::Value {
    let annotations = annotations.to_map();
    let mut body = json!({
        "apiVersion": K::api_version(&()),
        "kind": K::kind(&()),
        "metadata": {
            "name": workload.name,
            "namespace": workload.namespace,
            "annotations": annotations,
        },
    });

    if workload.kind.supports_template_roll() {
        body["spec"] = json!({
            "template": {
                "metadata": {
                    "annotations": annotations,
                },
            },
        });
    }

    body
}
