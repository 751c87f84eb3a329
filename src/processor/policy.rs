// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Restart cooldown and cluster-wide stagger policy.

use crate::types::{ManagedResourceRule, WorkloadRef};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Last restart time read from a workload annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastRestart {
    pub at: DateTime<Utc>,
    /// The annotation was absent or unreadable and `at` is a substitute
    pub defaulted: bool,
}

/// Read the last-rolling-restart annotation.
///
/// An unparsable value is treated as `now` so a corrupt timestamp never causes a
/// restart storm. An absent value means Order has never restarted the workload and
/// maps to the Unix epoch.
pub fn parse_last_restart(value: Option<&str>, now: DateTime<Utc>) -> LastRestart {
    // Absent is not "now": a never-annotated workload would otherwise never roll
    let Some(value) = value else {
        return LastRestart {
            at: DateTime::<Utc>::UNIX_EPOCH,
            defaulted: true,
        };
    };

    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(at) => LastRestart {
            at: at.with_timezone(&Utc),
            defaulted: false,
        },
        Err(_) => LastRestart {
            at: now,
            defaulted: true,
        },
    }
}

/// Time elapsed since `then`, zero if `then` lies in the future
pub fn elapsed_since(then: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(then)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Whether a restart may happen now.
///
/// Both the workload's cooldown and the global stagger must have elapsed. No previous
/// global action means the stagger is satisfied.
pub fn permitted(
    last_restart: DateTime<Utc>,
    cooldown: Duration,
    last_global_action: Option<DateTime<Utc>>,
    stagger: Duration,
    now: DateTime<Utc>,
) -> bool {
    let cooled_down = elapsed_since(last_restart, now) >= cooldown;
    let staggered = last_global_action.map_or(true, |at| elapsed_since(at, now) >= stagger);
    cooled_down && staggered
}

/// Most conservative cooldown across the default and every rule matching the workload
pub fn effective_cooldown<'a, I>(default: Duration, rules: I, workload: &WorkloadRef) -> Duration
where
    I: IntoIterator<Item = &'a ManagedResourceRule>,
{
    rules
        .into_iter()
        .filter_map(|rule| rule.cooldown_for(workload))
        .fold(default, Duration::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ControllerRef, ResourceKind, ResourceRef, WorkloadKind};
    use chrono::TimeZone;

    const COOLDOWN: Duration = Duration::from_secs(120);
    const STAGGER: Duration = Duration::from_secs(10);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_parse_valid_timestamp() {
        let parsed = parse_last_restart(Some("2026-03-01T12:00:00Z"), at(0));
        assert!(!parsed.defaulted);
        assert_eq!(parsed.at, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let parsed = parse_last_restart(Some("2026-03-01T14:00:00+02:00"), at(0));
        assert_eq!(parsed.at, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_corrupt_timestamp_defaults_to_now() {
        let now = at(0);
        let parsed = parse_last_restart(Some("yesterday-ish"), now);
        assert!(parsed.defaulted);
        assert_eq!(parsed.at, now);
    }

    #[test]
    fn test_parse_absent_timestamp_is_epoch() {
        let parsed = parse_last_restart(None, at(0));
        assert!(parsed.defaulted);
        assert_eq!(parsed.at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_corrupt_timestamp_blocks_restart() {
        let now = at(0);
        let last = parse_last_restart(Some("not-a-time"), now);
        assert!(!permitted(last.at, COOLDOWN, None, STAGGER, now));
    }

    #[test]
    fn test_never_restarted_is_permitted() {
        let now = at(0);
        let last = parse_last_restart(None, now);
        assert!(permitted(last.at, COOLDOWN, None, STAGGER, now));
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive() {
        let last = at(0);
        assert!(!permitted(last, COOLDOWN, None, STAGGER, at(119)));
        assert!(permitted(last, COOLDOWN, None, STAGGER, at(120)));
        assert!(permitted(last, COOLDOWN, None, STAGGER, at(121)));
    }

    #[test]
    fn test_cooldown_monotonic_across_durations() {
        let last = at(0);
        for cooldown_secs in [30u64, 60, 300, 3600] {
            let cooldown = Duration::from_secs(cooldown_secs);
            for elapsed in 0..cooldown_secs as i64 {
                assert!(!permitted(last, cooldown, None, STAGGER, at(elapsed)));
            }
            assert!(permitted(last, cooldown, None, STAGGER, at(cooldown_secs as i64)));
        }
    }

    #[test]
    fn test_stagger_blocks_back_to_back_actions() {
        let last = at(0);
        let now = at(500);
        assert!(!permitted(last, COOLDOWN, Some(now), STAGGER, now));
        assert!(!permitted(last, COOLDOWN, Some(at(495)), STAGGER, now));
        assert!(permitted(last, COOLDOWN, Some(at(490)), STAGGER, now));
    }

    #[test]
    fn test_future_timestamp_blocks_restart() {
        assert!(!permitted(at(100), COOLDOWN, None, STAGGER, at(0)));
    }

    #[test]
    fn test_effective_cooldown_takes_maximum() {
        let web = WorkloadRef::new(WorkloadKind::Deployment, "apps", "web");
        let mut lenient = ManagedResourceRule::new(ResourceRef::new(ResourceKind::Secret, "apps", "a"));
        lenient.restart_cooldown = Some(Duration::from_secs(60));
        let mut strict = ManagedResourceRule::new(ResourceRef::new(ResourceKind::Secret, "apps", "b"));
        strict.restart_cooldown = Some(Duration::from_secs(900));
        let mut per_entry =
            ManagedResourceRule::new(ResourceRef::new(ResourceKind::ConfigMap, "apps", "c"));
        per_entry.whitelisted_controllers.push(ControllerRef {
            workload: web.clone(),
            restart_cooldown: Some(Duration::from_secs(1800)),
        });

        assert_eq!(
            effective_cooldown(COOLDOWN, [&lenient, &strict], &web),
            Duration::from_secs(900)
        );
        assert_eq!(
            effective_cooldown(COOLDOWN, [&lenient, &strict, &per_entry], &web),
            Duration::from_secs(1800)
        );
    }

    #[test]
    fn test_effective_cooldown_never_below_default() {
        let web = WorkloadRef::new(WorkloadKind::Deployment, "apps", "web");
        let mut rule = ManagedResourceRule::new(ResourceRef::new(ResourceKind::Secret, "apps", "a"));
        rule.restart_cooldown = Some(Duration::from_secs(30));

        assert_eq!(effective_cooldown(COOLDOWN, [&rule], &web), COOLDOWN);
        assert_eq!(effective_cooldown(COOLDOWN, std::iter::empty(), &web), COOLDOWN);
    }
}
