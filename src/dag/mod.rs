// src/dag/mod.rs

//! Pure graph structure and algorithms over a [`crate::plan::Plan`]:
//! cycle detection with path reporting, deterministic topological ordering,
//! readiness computation and wave grouping. No I/O, no concurrency.

pub mod algo;
pub mod graph;

pub use algo::{ready_tasks, topological_order, validate_acyclic, wave_grouping};
pub use graph::DepGraph;
