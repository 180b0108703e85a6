// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;

use crate::plan::Plan;

/// Dependency graph over a plan's tasks.
///
/// Nodes are task positions in the plan's insertion order; an edge `dep -> task`
/// means `task` waits for `dep`. Built from a structurally validated plan
/// (unique IDs, no unknown references), so construction cannot fail.
#[derive(Debug, Clone)]
pub struct DepGraph {
    graph: DiGraphMap<usize, ()>,
    index_of: HashMap<String, usize>,
    ids: Vec<String>,
}

impl DepGraph {
    pub fn from_plan(plan: &Plan) -> Self {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        let mut index_of = HashMap::new();
        let mut ids = Vec::with_capacity(plan.tasks.len());

        for (idx, task) in plan.tasks.iter().enumerate() {
            graph.add_node(idx);
            index_of.insert(task.id.clone(), idx);
            ids.push(task.id.clone());
        }

        for (idx, task) in plan.tasks.iter().enumerate() {
            for dep in &task.dependencies {
                if let Some(&dep_idx) = index_of.get(dep) {
                    graph.add_edge(dep_idx, idx, ());
                }
            }
        }

        Self {
            graph,
            index_of,
            ids,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    pub fn id_at(&self, idx: usize) -> &str {
        &self.ids[idx]
    }

    /// Direct dependencies of a task, as node indices.
    pub fn dependencies_of(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph.neighbors_directed(idx, Direction::Incoming)
    }

    /// Direct dependents of a task, as node indices.
    pub fn dependents_of(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// All tasks that transitively depend on `id`, in deduplicated
    /// discovery order. Used for the Blocked cascade: one traversal,
    /// not per-dependent polling.
    pub fn transitive_dependents(&self, id: &str) -> Vec<String> {
        let Some(root) = self.index_of(id) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.ids.len()];
        let mut stack: Vec<usize> = self.dependents_of(root).collect();
        let mut out = Vec::new();

        while let Some(idx) = stack.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            out.push(self.ids[idx].clone());
            stack.extend(self.dependents_of(idx));
        }

        out
    }
}
