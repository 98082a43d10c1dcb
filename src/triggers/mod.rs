//! Workflow Composition Hints
//!
//! Optional guidance for sequencing workflows. Every workflow runs on its
//! own; triggers and chains only suggest what usually comes next.
//!
//! - [`graph`]: Trigger edges, named chains and greedy chain building

pub mod graph;

pub use graph::{format_chain, NamedChain, TriggerEdge, TriggerGraph, DEFAULT_MAX_CHAIN_LENGTH};
