//! State-based Last-Write-Wins directed graph CRDT.
//!
//! Replicas of [`LwwGraph`] are mutated independently, without any
//! coordination, and reconciled by exchanging full state and joining it.
//! The join is a pointwise `max` over per-key timestamps, which makes it
//! commutative, associative, and idempotent: every replica that has seen
//! the same set of states converges to the same graph.
//!
//! Module hierarchy follows type dependency order:
//! - time: wall-clock stamp primitive (Layer 0)
//! - crdt: the join trait (Layer 1)
//! - graph: LwwGraph, the replicated structure (Layer 2)

#![forbid(unsafe_code)]

pub mod crdt;
pub mod graph;
pub mod time;

pub use crdt::Crdt;
pub use graph::LwwGraph;
pub use time::WallClock;
