// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decides whether a workload may ever be actioned under the configured rules.

use crate::types::{ManagedResourceRule, ScopeConfig, WorkloadRef};
use tracing::debug;

/// Whether a rule lets the workload be actioned for its resource
pub fn rule_admits(rule: &ManagedResourceRule, workload: &WorkloadRef) -> bool {
    if rule.blacklists(workload) {
        debug!(
            "Ignoring {} due to blacklist of {}",
            workload, rule.resource
        );
        return false;
    }

    if rule.avoid_all_unless_whitelisted && !rule.whitelists(workload) {
        debug!(
            "Ignoring {} as {} only applies to whitelisted controllers",
            workload, rule.resource
        );
        return false;
    }

    true
}

/// Whether the workload is eligible for any action.
///
/// The workload's namespace must pass the namespace filter and at least one rule must
/// admit it. Being in scope does not mean a restart is currently due.
pub fn in_scope<'a, I>(workload: &WorkloadRef, rules: I, scope: &ScopeConfig) -> bool
where
    I: IntoIterator<Item = &'a ManagedResourceRule>,
{
    if !scope.namespaces.allows(&workload.namespace) {
        debug!("Ignoring {} outside of configured namespaces", workload);
        return false;
    }

    rules.into_iter().any(|rule| rule_admits(rule, workload))
}
