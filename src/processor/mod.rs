// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decision logic turning buffered resource changes into rolling restarts.

pub mod control_loop;
pub mod fingerprint;
pub mod policy;
pub mod references;
pub mod scope;

pub use control_loop::{Processor, TickSummary};
pub use fingerprint::fingerprint;
pub use scope::in_scope;
