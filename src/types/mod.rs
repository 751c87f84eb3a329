// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Domain types for watched resources, workloads and the parsed configuration.

pub mod resources;
pub mod rules;

pub use resources::{ResourceKind, ResourceRef, WatchedResource, Workload, WorkloadKind, WorkloadRef};
pub use rules::{ControllerRef, ManagedResourceRule, NamespaceFilter, OrderConfig, ScopeConfig};
