// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! bptree-demo CLI tool.
//!
//! Command-line demonstration of the B+-tree index: build a tree from
//! stdin or generated data, inspect it, and run range scans.

use anyhow::{Context, Result};
use bptree::btree::BPlusTree;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bptree-demo")]
#[command(author = "Vivian Voss <ask@vvoss.dev>")]
#[command(version = "0.1.0")]
#[command(about = "Build and inspect an in-memory B+-tree", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert `count` generated integer keys and print stats.
    Build {
        /// Number of keys to insert
        count: usize,

        /// Maximum keys per node
        #[arg(short, long, default_value_t = 32)]
        max_keys: u16,

        /// Enable per-operation debug logging
        #[arg(long)]
        debug: bool,
    },

    /// Build a tree via bulk load and print stats plus an invariant check.
    BulkLoad {
        /// Number of keys to bulk-load
        count: usize,

        /// Maximum keys per node
        #[arg(short, long, default_value_t = 32)]
        max_keys: u16,
    },

    /// Build a tree, then scan and print all keys in `[start, end]`.
    Range {
        /// Number of generated keys to insert before scanning
        count: usize,

        /// Inclusive start of the range
        start: i64,

        /// Inclusive end of the range
        end: i64,

        /// Maximum keys per node
        #[arg(short, long, default_value_t = 32)]
        max_keys: u16,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { count, max_keys, debug } => {
            let mut tree = BPlusTree::new(max_keys, debug)
                .with_context(|| format!("invalid max_keys={}", max_keys))?;
            for k in 0..count as i64 {
                tree.put(k, k * 2)?;
            }
            print_stats(&tree);
        }
        Commands::BulkLoad { count, max_keys } => {
            let mut tree = BPlusTree::new(max_keys, false)
                .with_context(|| format!("invalid max_keys={}", max_keys))?;
            let pairs: Vec<(i64, i64)> = (0..count as i64).map(|k| (k, k * 2)).collect();
            tree.bulk_load(pairs)?;
            print_stats(&tree);
            println!("invariants hold: {}", tree.check_invariants());
        }
        Commands::Range { count, start, end, max_keys } => {
            let mut tree = BPlusTree::new(max_keys, false)
                .with_context(|| format!("invalid max_keys={}", max_keys))?;
            for k in 0..count as i64 {
                tree.put(k, k * 2)?;
            }
            for value in tree.get_range(&start, &end) {
                println!("{}", value);
            }
        }
    }

    Ok(())
}

fn print_stats(tree: &BPlusTree<i64, i64>) {
    let stats = tree.stats();
    println!("B+-Tree Statistics:");
    println!("  Count:      {}", stats.count);
    println!("  Height:     {}", stats.height);
    println!("  Node count: {}", stats.node_count);
}
