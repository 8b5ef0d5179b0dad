// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! In-memory B+-tree ordered index.
//!
//! See [`BPlusTree`] for the main entry point.

mod iter;
mod node;
mod tree;
mod types;

pub use iter::Iter;
pub use node::{InternalNode, LeafNode, Node};
pub use tree::{BPlusTree, Stats};
pub use types::Order;
