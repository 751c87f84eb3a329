// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Environment settings and config file loading.

use crate::constants::{bounds, CONFIG_VERSION, DEFAULT_CONFIG_PATH};
use crate::error::{OrderError, Result};
use crate::types::{
    ControllerRef, ManagedResourceRule, NamespaceFilter, OrderConfig, ResourceKind, ResourceRef,
    ScopeConfig, WorkloadKind, WorkloadRef,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    /// Location of the YAML config file
    pub config_path: PathBuf,
    /// Explicit kubeconfig, in-cluster credentials are used when unset
    pub kubeconfig: Option<PathBuf>,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Self {
        let config_path = env::var("ORDER_CONFIG_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let kubeconfig = env::var("KUBECONFIG").ok().filter(|p| !p.is_empty());

        Settings {
            config_path: PathBuf::from(config_path),
            kubeconfig: kubeconfig.map(PathBuf::from),
        }
    }
}

/// Config file as written by the operator
#[derive(Debug, Deserialize)]
struct ConfigFile {
    version: f64,
    #[serde(default)]
    namespaces: Vec<String>,
    #[serde(default)]
    namespace_blacklist: Vec<String>,
    controller_resync_duration: Option<String>,
    default_restart_cooldown: Option<String>,
    pod_controller_stagger: Option<String>,
    #[serde(default)]
    managed_resources: Vec<ManagedResourceEntry>,
    #[serde(default)]
    debug_output: bool,
}

#[derive(Debug, Deserialize)]
struct ManagedResourceEntry {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    namespace: String,
    #[serde(default)]
    whitelisted_controllers: Vec<ControllerEntry>,
    #[serde(default)]
    blacklisted_controllers: Vec<ControllerEntry>,
    #[serde(default)]
    avoid_all_controllers_unless_whitelisted: bool,
    restart_cooldown: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ControllerEntry {
    #[serde(rename = "type")]
    controller_type: String,
    name: String,
    namespace: String,
    restart_cooldown: Option<String>,
}

/// Read, parse and validate the config file
pub fn load_config(path: &Path) -> Result<OrderConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| OrderError::ConfigReadError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
}

/// Parse and validate config file contents
pub fn parse_config(contents: &str) -> Result<OrderConfig> {
    let file: ConfigFile = serde_yaml::from_str(contents)?;
    file.validate()
}

impl ConfigFile {
    fn validate(self) -> Result<OrderConfig> {
        if self.version != CONFIG_VERSION {
            return Err(OrderError::InvalidConfig(format!(
                "config version {} is not supported, expected {}",
                self.version, CONFIG_VERSION
            )));
        }

        let namespaces = match (self.namespaces.is_empty(), self.namespace_blacklist.is_empty()) {
            (false, false) => {
                return Err(OrderError::InvalidConfig(
                    "namespaces and namespace_blacklist are mutually exclusive".to_string(),
                ))
            }
            (false, true) => NamespaceFilter::Whitelist(self.namespaces.into_iter().collect()),
            _ => NamespaceFilter::Blacklist(
                self.namespace_blacklist.into_iter().collect::<BTreeSet<_>>(),
            ),
        };

        let scope = ScopeConfig {
            namespaces,
            controller_resync_period: parse_duration(
                "controller_resync_duration",
                self.controller_resync_duration.as_deref(),
                bounds::CONTROLLER_RESYNC,
            )?,
            default_restart_cooldown: parse_duration(
                "default_restart_cooldown",
                self.default_restart_cooldown.as_deref(),
                bounds::RESTART_COOLDOWN,
            )?,
            pod_controller_stagger: parse_duration(
                "pod_controller_stagger",
                self.pod_controller_stagger.as_deref(),
                bounds::POD_CONTROLLER_STAGGER,
            )?,
        };

        let rules = self
            .managed_resources
            .into_iter()
            .map(ManagedResourceEntry::validate)
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderConfig {
            scope,
            rules,
            debug_output: self.debug_output,
        })
    }
}

impl ManagedResourceEntry {
    fn validate(self) -> Result<ManagedResourceRule> {
        let kind: ResourceKind = self.resource_type.parse()?;
        if self.name.is_empty() || self.namespace.is_empty() {
            return Err(OrderError::InvalidConfig(format!(
                "managed resource of type {} needs both a name and a namespace",
                self.resource_type
            )));
        }

        let whitelisted_controllers = self
            .whitelisted_controllers
            .into_iter()
            .map(|entry| {
                let restart_cooldown = parse_optional_cooldown(entry.restart_cooldown.as_deref())?;
                Ok(ControllerRef {
                    workload: entry.workload_ref()?,
                    restart_cooldown,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let blacklisted_controllers = self
            .blacklisted_controllers
            .into_iter()
            .map(|entry| {
                if entry.restart_cooldown.is_some() {
                    return Err(OrderError::InvalidConfig(format!(
                        "restart_cooldown has no effect on blacklisted controller {}/{}",
                        entry.namespace, entry.name
                    )));
                }
                entry.workload_ref()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ManagedResourceRule {
            resource: ResourceRef::new(kind, &self.namespace, &self.name),
            whitelisted_controllers,
            blacklisted_controllers,
            avoid_all_unless_whitelisted: self.avoid_all_controllers_unless_whitelisted,
            restart_cooldown: parse_optional_cooldown(self.restart_cooldown.as_deref())?,
        })
    }
}

impl ControllerEntry {
    fn workload_ref(&self) -> Result<WorkloadRef> {
        let kind: WorkloadKind = self.controller_type.parse()?;
        Ok(WorkloadRef::new(kind, &self.namespace, &self.name))
    }
}

/// Parse a duration field; absent falls back to the safety bound, below the bound is rejected
fn parse_duration(field: &str, value: Option<&str>, lower_bound: Duration) -> Result<Duration> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(lower_bound);
    };

    let parsed = humantime::parse_duration(value.trim()).map_err(|e| {
        OrderError::InvalidConfig(format!("{} '{}' is not a valid duration: {}", field, value, e))
    })?;

    if parsed < lower_bound {
        return Err(OrderError::InvalidConfig(format!(
            "{} '{}' is below the safety threshold of {}",
            field,
            value,
            humantime::format_duration(lower_bound)
        )));
    }

    Ok(parsed)
}

fn parse_optional_cooldown(value: Option<&str>) -> Result<Option<Duration>> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => parse_duration("restart_cooldown", Some(v), bounds::RESTART_COOLDOWN).map(Some),
        None => Ok(None),
    }
}
