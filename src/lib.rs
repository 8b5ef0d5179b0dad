// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! An in-memory, single-threaded B+-tree ordered index.
//!
//! ## Features
//!
//! - **Ordered index**: point lookup, ascending range scan, and forward
//!   iteration over a single in-memory tree.
//! - **Balanced by construction**: insertion splits and deletion
//!   borrows/merges keep every leaf at equal depth.
//! - **Bulk load**: O(n) bottom-up construction from presorted input.
//! - **Invariant audit**: a full structural self-check for use in tests
//!   and debugging.
//!
//! ## Quick Start
//!
//! ```rust
//! use bptree::btree::BPlusTree;
//!
//! let mut tree = BPlusTree::new(5, false)?;
//!
//! tree.put("apple".to_string(), 1)?;
//! tree.put("banana".to_string(), 2)?;
//!
//! assert_eq!(tree.get(&"apple".to_string()), Some(&1));
//! assert!(tree.check_invariants());
//! # Ok::<(), bptree::error::BTreeError>(())
//! ```
//!
//! ## Architecture
//!
//! This crate is organised into modules:
//!
//! - **btree**: the tree itself — node layout, insertion, deletion,
//!   range scan, bulk load, and the ascending iterator.
//! - **error**: structured error types shared by every operation.
//! - **log**: a timestamped debug-logging sink, enabled per tree via a
//!   `debug` flag.
//!
//! ## Non-goals
//!
//! This crate does not provide persistence, crash recovery, or
//! concurrent access — it is a plain in-memory structure meant to be
//! owned and synchronised by its caller.

pub mod btree;
pub mod error;
pub mod log;

pub use btree::{BPlusTree, Order, Stats};
pub use error::{BTreeError, BTreeResult};
