// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the dependency graph and readiness computation from [`crate::dag`]
//! - the work-execution workers from [`crate::exec`]
//! - goal evaluation from [`crate::goal`]
//! - the adaptive mode FSM
//! into the run controller's dispatch loop, which is the sole writer of task
//! status and the event timeline.

pub mod adaptive;
pub mod runtime;

pub use adaptive::{AdaptiveController, Mode};
pub use runtime::Executor;
