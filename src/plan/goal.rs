// src/plan/goal.rs

//! Goal criteria: named, operator-based comparisons used to decide whether a
//! plan's objective is already satisfied before all tasks finish.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Comparison operator applied to an observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl CriterionOp {
    /// Apply the operator with the observed value on the left-hand side.
    pub fn compare(self, observed: f64, expected: f64) -> bool {
        match self {
            CriterionOp::Eq => observed == expected,
            CriterionOp::Ne => observed != expected,
            CriterionOp::Ge => observed >= expected,
            CriterionOp::Le => observed <= expected,
            CriterionOp::Gt => observed > expected,
            CriterionOp::Lt => observed < expected,
        }
    }
}

/// One named predicate over the plan's observable progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalCriterion {
    /// Name resolved by the goal observer (e.g. "completed_tasks").
    pub name: String,

    pub expected: f64,

    pub operator: CriterionOp,

    /// Updated by the evaluator on every check.
    #[serde(default)]
    pub satisfied: bool,
}

impl GoalCriterion {
    pub fn new(name: impl Into<String>, operator: CriterionOp, expected: f64) -> Self {
        Self {
            name: name.into(),
            expected,
            operator,
            satisfied: false,
        }
    }
}

/// Optional success predicate over a plan's progress. The goal is met when
/// **all** criteria are satisfied.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoalState {
    #[serde(default)]
    pub criteria: Vec<GoalCriterion>,

    /// Set once, on first satisfaction.
    #[serde(skip)]
    pub met_at: Option<Instant>,
}

impl GoalState {
    pub fn new(criteria: Vec<GoalCriterion>) -> Self {
        Self {
            criteria,
            met_at: None,
        }
    }

    pub fn is_met(&self) -> bool {
        self.met_at.is_some()
    }
}
