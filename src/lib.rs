// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod buffer;
pub mod config;
pub mod constants;
pub mod error;
pub mod kubernetes;
pub mod processor;
pub mod types;
pub mod watchers;

#[cfg(test)]
pub mod test_utils;
