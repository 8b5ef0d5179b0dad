// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for B+-tree operations.
//!
//! Provides structured error handling with detailed context for debugging.

use std::fmt;

/// Standard Result type for all B+-tree operations.
pub type BTreeResult<T> = Result<T, BTreeError>;

/// Error types for B+-tree operations.
///
/// Every public operation documents its complete outcome set; there are no
/// hidden failure modes beyond the variants listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BTreeError {
    /// Insertion target key already exists (`put` only; `upsert` never
    /// returns this).
    DuplicateKey { key: String },

    /// Lookup, removal or range target key is absent.
    NotFound,

    /// The global allocator failed to satisfy a split, root growth, or bulk
    /// load allocation. Safe Rust aborts on allocation failure rather than
    /// returning it, so this variant is reachable only on platforms with a
    /// fallible custom allocator; it is modeled for interface completeness.
    AllocationFailure,

    /// A constructor or bulk-load argument violated a documented
    /// precondition (e.g. `max_keys < 3`, empty bulk-load input).
    InvalidArgument { reason: String },

    /// Bulk-load input was not sorted ascending at the given index.
    BulkLoadNotSorted { index: usize },

    /// Bulk-load input contained a duplicate key at the given index.
    BulkLoadDuplicate { index: usize },

    /// An invariant was violated that a correct implementation can never
    /// trigger from external input (buffer overflow during merge, path
    /// stack overflow beyond the declared maximum height). Indicates a bug.
    InternalError { reason: String },
}

impl fmt::Display for BTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => write!(f, "key already exists: {}", key),
            Self::NotFound => write!(f, "key not found"),
            Self::AllocationFailure => write!(f, "allocation failed"),
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {}", reason),
            Self::BulkLoadNotSorted { index } => {
                write!(f, "bulk load input not sorted at index {}", index)
            }
            Self::BulkLoadDuplicate { index } => {
                write!(f, "bulk load input has duplicate key at index {}", index)
            }
            Self::InternalError { reason } => write!(f, "internal error: {}", reason),
        }
    }
}

impl std::error::Error for BTreeError {}
