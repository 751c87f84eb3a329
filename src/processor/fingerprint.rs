// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Order-independent digest over the resource versions a workload consumes.

use crate::types::WatchedResource;
use sha2::{Digest, Sha256};

const ENTRY_SEPARATOR: &str = "-";

/// SHA-256 over `{kind}:{uid}:{version}` entries sorted by uid, as lowercase hex.
///
/// Entries are sorted by uid rather than name so resources with the same name in
/// different namespaces, or a recreated resource, stay distinguishable. Ties on uid
/// fall back to the full entry so any enumeration order yields the same digest.
pub fn fingerprint<'a, I>(resources: I) -> String
where
    I: IntoIterator<Item = &'a WatchedResource>,
{
    let mut entries: Vec<(&str, String)> = resources
        .into_iter()
        .map(|r| {
            (
                r.uid.as_str(),
                format!("{}:{}:{}", r.reference.kind.as_str(), r.uid, r.version),
            )
        })
        .collect();
    entries.sort();

    let joined = entries
        .into_iter()
        .map(|(_, entry)| entry)
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR);

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}
