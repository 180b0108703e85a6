// src/engine/adaptive.rs

//! Adaptive strategy switching.
//!
//! The current execution mode is held as data and re-read by the dispatch
//! loop at every task/wave boundary, so a switch takes effect at the next
//! natural boundary rather than interrupting anything mid-task.
//!
//! Efficiency signal: completed tasks per wall-clock second, measured over
//! the most recent boundary. Sequential throughput projected onto a wave of
//! width `w` is `seq * w`; parallel mode is adopted when
//! `seq < threshold * seq * w` (equivalently `threshold * w > 1`) and the
//! upcoming wave actually has width to exploit. Once a parallel measurement
//! exists it replaces the projection. Parallel mode is abandoned when its
//! measured throughput falls below `threshold * seq` or the upcoming wave
//! has width <= 1.

use std::time::Duration;

use tracing::{debug, info};

/// Concrete dispatch mode. `Strategy::Adaptive` resolves to one of these at
/// every boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    Parallel,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Sequential => "sequential",
            Mode::Parallel => "parallel",
        }
    }
}

/// Boundary-by-boundary throughput tracker and mode switch decider.
#[derive(Debug)]
pub struct AdaptiveController {
    enabled: bool,
    threshold: f64,
    mode: Mode,
    seq_throughput: Option<f64>,
    par_throughput: Option<f64>,
}

impl AdaptiveController {
    /// `enabled == false` pins the mode forever (plain Sequential/Parallel
    /// strategies).
    pub fn new(enabled: bool, initial: Mode, threshold: f64) -> Self {
        Self {
            enabled,
            threshold,
            mode: initial,
            seq_throughput: None,
            par_throughput: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Record the throughput of one finished boundary (a single task in
    /// sequential mode, a wave in parallel mode).
    pub fn record_boundary(&mut self, completed: usize, elapsed: Duration) {
        if !self.enabled || completed == 0 {
            return;
        }

        let secs = elapsed.as_secs_f64().max(1e-9);
        let throughput = completed as f64 / secs;

        match self.mode {
            Mode::Sequential => self.seq_throughput = Some(throughput),
            Mode::Parallel => self.par_throughput = Some(throughput),
        }

        debug!(
            mode = self.mode.as_str(),
            throughput,
            "recorded boundary throughput"
        );
    }

    /// Decide whether to flip the mode, given the width of the next wave of
    /// ready work. Called at most once per boundary. Returns the previous
    /// mode when a switch happened.
    pub fn evaluate_switch(&mut self, next_wave_width: usize) -> Option<Mode> {
        if !self.enabled {
            return None;
        }

        let switched_from = match self.mode {
            Mode::Sequential => {
                let seq = self.seq_throughput?;
                if next_wave_width <= 1 {
                    return None;
                }
                // Baseline projection until a real parallel measurement
                // exists.
                let projected = self
                    .par_throughput
                    .unwrap_or(seq * next_wave_width as f64);
                if seq < self.threshold * projected {
                    Some(Mode::Sequential)
                } else {
                    None
                }
            }
            Mode::Parallel => {
                let par = self.par_throughput?;
                if next_wave_width <= 1 {
                    Some(Mode::Parallel)
                } else {
                    match self.seq_throughput {
                        Some(seq) if par < self.threshold * seq => Some(Mode::Parallel),
                        _ => None,
                    }
                }
            }
        };

        if let Some(from) = switched_from {
            self.mode = match from {
                Mode::Sequential => Mode::Parallel,
                Mode::Parallel => Mode::Sequential,
            };
            info!(
                from = from.as_str(),
                to = self.mode.as_str(),
                "adaptive strategy switch"
            );
        }

        switched_from
    }
}
