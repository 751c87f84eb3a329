// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes plumbing: client creation, informer-backed caches and workload patching.

pub mod cache;
pub mod client;
pub mod informer;
pub mod objects;
pub mod patch;

pub use cache::{ClusterCache, KubeCache};
pub use client::create_client;
pub use patch::{KubePatcher, RestartAnnotations, WorkloadPatcher};
