// src/dag/algo.rs

use std::collections::{BTreeSet, HashSet};

use crate::dag::graph::DepGraph;
use crate::errors::{PlanError, Result};
use crate::plan::{Plan, Task, TaskStatus};

/// DFS colouring for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Verify the dependency relation forms a DAG.
///
/// On failure the error carries the concrete cycle as a sequence of task IDs
/// with the first ID repeated at the end (e.g. `a -> b -> a`), so the
/// decomposer can surface exactly which edges are wrong to its caller or an
/// LLM retry path.
pub fn validate_acyclic(plan: &Plan) -> Result<()> {
    let graph = DepGraph::from_plan(plan);
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut stack = Vec::new();

    // Roots are visited in insertion order for deterministic reporting.
    for idx in 0..graph.len() {
        if marks[idx] == Mark::Unvisited {
            if let Some(path) = dfs_cycle(&graph, idx, &mut marks, &mut stack) {
                return Err(PlanError::CycleDetected { path });
            }
        }
    }

    Ok(())
}

fn dfs_cycle(
    graph: &DepGraph,
    node: usize,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
) -> Option<Vec<String>> {
    marks[node] = Mark::OnStack;
    stack.push(node);

    let mut successors: Vec<usize> = graph.dependents_of(node).collect();
    successors.sort_unstable();

    for next in successors {
        match marks[next] {
            Mark::OnStack => {
                // Slice the recursion stack from the first occurrence of
                // `next` to close the loop.
                let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut path: Vec<String> = stack[start..]
                    .iter()
                    .map(|&n| graph.id_at(n).to_string())
                    .collect();
                path.push(graph.id_at(next).to_string());
                return Some(path);
            }
            Mark::Unvisited => {
                if let Some(path) = dfs_cycle(graph, next, marks, stack) {
                    return Some(path);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node] = Mark::Done;
    None
}

/// Kahn's-algorithm topological ordering, O(V+E).
///
/// Ties (multiple tasks with all dependencies satisfied) are broken by plan
/// insertion order, so the ordering is deterministic for a given plan.
pub fn topological_order(plan: &Plan) -> Result<Vec<String>> {
    let graph = DepGraph::from_plan(plan);
    let mut in_degree: Vec<usize> = (0..graph.len())
        .map(|idx| graph.dependencies_of(idx).count())
        .collect();

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(idx, _)| idx)
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(&idx) = ready.first() {
        ready.remove(&idx);
        order.push(graph.id_at(idx).to_string());

        for next in graph.dependents_of(idx) {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() != graph.len() {
        // Leftover nodes mean a cycle; re-run the DFS for the path.
        return match validate_acyclic(plan) {
            Err(err) => Err(err),
            Ok(()) => Err(PlanError::InvalidPlan(
                "topological order did not cover all tasks".to_string(),
            )),
        };
    }

    Ok(order)
}

/// All Pending tasks whose dependencies are a subset of `completed`.
///
/// Sequential execution degenerates this to one-at-a-time; parallel execution
/// uses the full batch as a wave.
pub fn ready_tasks<'a>(plan: &'a Plan, completed: &HashSet<String>) -> Vec<&'a Task> {
    plan.tasks
        .iter()
        .filter(|task| {
            task.status == TaskStatus::Pending
                && task.dependencies.iter().all(|dep| completed.contains(dep))
        })
        .collect()
}

/// Group tasks into maximal parallel waves by repeatedly computing readiness
/// against a simulated completed set.
///
/// Already-Completed tasks seed the simulation, so mid-run the result
/// describes only the remaining work. Tasks downstream of a Failed or Blocked
/// task never become ready and are simply absent from the result.
pub fn wave_grouping(plan: &Plan) -> Result<Vec<Vec<String>>> {
    validate_acyclic(plan)?;

    let mut completed: HashSet<String> = plan
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|t| t.id.clone())
        .collect();

    let mut waves = Vec::new();

    loop {
        // ready_tasks only looks at Pending status, so tasks already
        // simulated as completed must be filtered out each round.
        let wave: Vec<String> = ready_tasks(plan, &completed)
            .iter()
            .filter(|t| !completed.contains(&t.id))
            .map(|t| t.id.clone())
            .collect();

        if wave.is_empty() {
            break;
        }

        completed.extend(wave.iter().cloned());
        waves.push(wave);
    }

    Ok(waves)
}
