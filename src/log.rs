// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Timestamped debug logging sink.
//!
//! A single process-wide sink that writes timestamped lines to stderr.
//! Purely observational: nothing in the crate changes behaviour based on
//! whether logging is enabled. Each [`crate::btree::BPlusTree`] carries its
//! own `debug` flag and only calls [`emit`] when that flag is set, but the
//! sink itself (and its formatting) is shared process-wide.
//!
//! ## Example
//!
//! ```rust
//! bptree::log::emit("split", "leaf page promoted key=42");
//! ```

use chrono::Local;
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Serialises writes to stderr so interleaved log lines from concurrent
/// callers (e.g. benchmarks spawning multiple trees) never tear mid-line.
static SINK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Write a single timestamped debug line: `[RFC3339] <scope>: <message>`.
///
/// ## Input
/// - `scope`: short tag identifying the operation (`"insert"`, `"split"`,
///   `"rebalance"`, ...)
/// - `message`: human-readable detail
pub fn emit(scope: &str, message: &str) {
    let _guard = SINK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    eprintln!("[{}] {}: {}", Local::now().to_rfc3339(), scope, message);
}
