//! Dependency graph for tasks
//!
//! Resolves dependency references, reports cycles and produces a
//! deterministic topological order. Uses petgraph for graph storage and
//! strongly connected component search.

use chrono::NaiveDate;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use thiserror::Error;

use super::id::TaskId;
use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Dependency cycle detected: {}", format_cycle(.0))]
    CycleDetected(Vec<TaskId>),

    #[error("Task {task} depends on unknown task {missing}")]
    UnresolvedDependency { task: TaskId, missing: TaskId },

    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),
}

/// Renders a cycle as `a → b → a`
pub fn format_cycle(cycle: &[TaskId]) -> String {
    cycle
        .iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}

#[derive(Debug, Clone)]
struct Node {
    id: TaskId,
    due_date: Option<NaiveDate>,
}

/// A dependency graph for tasks
///
/// Edges point from a dependency to its dependent: `dep -> task` means
/// "dep must be completed before task".
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Node, ()>,
    node_map: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    /// Builds a graph from a collection of tasks
    ///
    /// Fails on duplicate ids, on the first unresolved dependency (tasks and
    /// their dependencies are visited in ascending id order), and on cycles.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Result<Self, GraphError> {
        let mut tasks: Vec<&Task> = tasks.into_iter().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));

        let mut graph = Self::default();

        // First pass: add all nodes
        for task in &tasks {
            if graph.node_map.contains_key(&task.id) {
                return Err(GraphError::DuplicateTask(task.id.clone()));
            }
            let idx = graph.graph.add_node(Node {
                id: task.id.clone(),
                due_date: task.due_date,
            });
            graph.node_map.insert(task.id.clone(), idx);
        }

        // Second pass: add all edges
        for task in &tasks {
            let task_idx = graph.node_map[&task.id];
            for dep_id in &task.depends_on {
                let dep_idx = graph.node_map.get(dep_id).copied().ok_or_else(|| {
                    GraphError::UnresolvedDependency {
                        task: task.id.clone(),
                        missing: dep_id.clone(),
                    }
                })?;
                graph.graph.add_edge(dep_idx, task_idx, ());
            }
        }

        if let Some(cycle) = graph.find_cycle() {
            return Err(GraphError::CycleDetected(cycle));
        }

        Ok(graph)
    }

    /// Finds one dependency cycle, if any
    ///
    /// The cycle is reported along the depends-on direction, starting and
    /// ending at the smallest id on the cycle: `[a, b, a]` means a depends
    /// on b and b depends on a. The choice is deterministic.
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        // Self-dependencies are single-node components that tarjan_scc
        // does not flag on their own
        let self_loop = self
            .graph
            .node_indices()
            .filter(|&idx| self.graph.contains_edge(idx, idx))
            .map(|idx| self.graph[idx].id.clone())
            .min();

        let component = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .min_by(|a, b| self.min_id(a).cmp(&self.min_id(b)));

        let component = match (component, self_loop) {
            (Some(scc), Some(id)) if Some(&id) < self.min_id(&scc) => {
                return Some(vec![id.clone(), id])
            }
            (Some(scc), _) => scc,
            (None, Some(id)) => return Some(vec![id.clone(), id]),
            (None, None) => return None,
        };

        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let start = component
            .iter()
            .copied()
            .min_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id))?;

        let mut path = vec![start];
        let mut seen: HashMap<NodeIndex, usize> = HashMap::from([(start, 0)]);
        let mut current = start;

        loop {
            // Every member of a non-trivial component has a dependency inside it
            let next = self
                .graph
                .neighbors_directed(current, Direction::Incoming)
                .filter(|idx| members.contains(idx))
                .min_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id))?;

            if let Some(&pos) = seen.get(&next) {
                let mut cycle: Vec<TaskId> = path[pos..]
                    .iter()
                    .map(|idx| self.graph[*idx].id.clone())
                    .collect();
                // The walk can close on a later node; rotate so the smallest id leads
                let lead = cycle
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.cmp(b.1))
                    .map(|(i, _)| i)?;
                cycle.rotate_left(lead);
                cycle.push(cycle[0].clone());
                return Some(cycle);
            }

            seen.insert(next, path.len());
            path.push(next);
            current = next;
        }
    }

    fn min_id(&self, nodes: &[NodeIndex]) -> Option<&TaskId> {
        nodes.iter().map(|idx| &self.graph[*idx].id).min()
    }

    /// Returns all tasks in topological order (dependencies before dependents)
    ///
    /// Uses Kahn's algorithm. Among tasks whose dependencies are all placed,
    /// the one with the earliest declared due date goes first (tasks without
    /// a due date last), then the smallest id.
    pub fn topological_order(&self) -> Result<Vec<TaskId>, GraphError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let degree = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count();
                (idx, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<(bool, Option<NaiveDate>, TaskId, NodeIndex)>> =
            in_degree
                .iter()
                .filter(|(_, degree)| **degree == 0)
                .map(|(idx, _)| Reverse(self.order_key(*idx)))
                .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());

        while let Some(Reverse((_, _, id, idx))) = ready.pop() {
            order.push(id);

            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(self.order_key(dependent)));
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            return Err(GraphError::CycleDetected(
                self.find_cycle().unwrap_or_default(),
            ));
        }

        Ok(order)
    }

    fn order_key(&self, idx: NodeIndex) -> (bool, Option<NaiveDate>, TaskId, NodeIndex) {
        let node = &self.graph[idx];
        (node.due_date.is_none(), node.due_date, node.id.clone(), idx)
    }

    /// Returns the direct dependencies of a task, sorted by id
    pub fn dependencies(&self, task_id: &TaskId) -> Vec<TaskId> {
        let task_idx = match self.node_map.get(task_id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        let mut ids: Vec<TaskId> = self
            .graph
            .neighbors_directed(task_idx, Direction::Incoming)
            .map(|idx| self.graph[idx].id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of tasks directly depending on this one
    pub fn fan_out(&self, task_id: &TaskId) -> usize {
        match self.node_map.get(task_id) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, Direction::Outgoing)
                .count(),
            None => 0,
        }
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        TaskId::new(s).unwrap()
    }

    fn task(name: &str, deps: &[&str]) -> Task {
        let mut task = Task::new(id(name), format!("Task {}", name), 8.0);
        for dep in deps {
            task.add_dependency(id(dep));
        }
        task
    }

    fn task_due(name: &str, deps: &[&str], day: u32) -> Task {
        let mut task = task(name, deps);
        task.set_due_date(NaiveDate::from_ymd_opt(2025, 1, day).unwrap());
        task
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::from_tasks(&Vec::<Task>::new()).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.topological_order().unwrap().is_empty());
    }

    #[test]
    fn dependencies_and_fan_out() {
        let tasks = [task("a", &[]), task("b", &["a"]), task("c", &["a"])];
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.dependencies(&id("b")), vec![id("a")]);
        assert!(graph.dependencies(&id("a")).is_empty());
        assert_eq!(graph.fan_out(&id("a")), 2);
        assert_eq!(graph.fan_out(&id("b")), 0);
        assert_eq!(graph.fan_out(&id("missing")), 0);
    }

    #[test]
    fn two_task_cycle_names_both() {
        let tasks = [task("a", &["b"]), task("b", &["a"])];
        let err = DependencyGraph::from_tasks(&tasks).unwrap_err();

        assert_eq!(err, GraphError::CycleDetected(vec![id("a"), id("b"), id("a")]));
        assert_eq!(err.to_string(), "Dependency cycle detected: a → b → a");
    }

    #[test]
    fn longer_cycle_is_reported_from_smallest_id() {
        // c -> d -> e -> c, with an acyclic tail hanging off
        let tasks = [
            task("a", &[]),
            task("c", &["d"]),
            task("d", &["e", "a"]),
            task("e", &["c"]),
            task("f", &["c"]),
        ];
        let err = DependencyGraph::from_tasks(&tasks).unwrap_err();

        assert_eq!(
            err,
            GraphError::CycleDetected(vec![id("c"), id("d"), id("e"), id("c")])
        );
    }

    #[test]
    fn cycle_entered_midway_still_starts_at_smallest_id() {
        // The walk from a runs a -> d -> c -> e and closes back on d
        let tasks = [
            task("a", &["d"]),
            task("c", &["e"]),
            task("d", &["c"]),
            task("e", &["d", "f"]),
            task("f", &["a"]),
        ];
        let err = DependencyGraph::from_tasks(&tasks).unwrap_err();

        assert_eq!(
            err,
            GraphError::CycleDetected(vec![id("c"), id("e"), id("d"), id("c")])
        );
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let tasks = [task("a", &["a"])];
        let err = DependencyGraph::from_tasks(&tasks).unwrap_err();
        assert_eq!(err, GraphError::CycleDetected(vec![id("a"), id("a")]));
    }

    #[test]
    fn unresolved_dependency() {
        let tasks = [task("a", &[]), task("b", &["ghost"])];
        let err = DependencyGraph::from_tasks(&tasks).unwrap_err();

        assert_eq!(
            err,
            GraphError::UnresolvedDependency {
                task: id("b"),
                missing: id("ghost"),
            }
        );
    }

    #[test]
    fn unresolved_reported_before_cycle() {
        let tasks = [task("a", &["b"]), task("b", &["a"]), task("c", &["zzz"])];
        let err = DependencyGraph::from_tasks(&tasks).unwrap_err();
        assert!(matches!(err, GraphError::UnresolvedDependency { .. }));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let tasks = [task("a", &[]), task("a", &[])];
        let err = DependencyGraph::from_tasks(&tasks).unwrap_err();
        assert_eq!(err, GraphError::DuplicateTask(id("a")));
    }

    #[test]
    fn topological_order_respects_dependencies() {
        // a depends on b, b depends on c
        let tasks = [task("a", &["b"]), task("b", &["c"]), task("c", &[])];
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![id("c"), id("b"), id("a")]);
    }

    #[test]
    fn ties_break_by_due_date_then_id() {
        let tasks = [
            task("a", &[]),
            task_due("b", &[], 20),
            task_due("c", &[], 10),
            task("d", &[]),
            task_due("e", &["c"], 5),
        ];
        let graph = DependencyGraph::from_tasks(&tasks).unwrap();
        let order = graph.topological_order().unwrap();

        // c (due 10) is ready first; once placed, e (due 5) becomes the
        // earliest ready task; then b (due 20); undated a, d last by id
        assert_eq!(order, vec![id("c"), id("e"), id("b"), id("a"), id("d")]);
    }

    #[test]
    fn order_independent_of_input_order() {
        let forward = [task("a", &[]), task("b", &["a"]), task("c", &[])];
        let backward = [task("c", &[]), task("b", &["a"]), task("a", &[])];

        let first = DependencyGraph::from_tasks(&forward)
            .unwrap()
            .topological_order()
            .unwrap();
        let second = DependencyGraph::from_tasks(&backward)
            .unwrap()
            .topological_order()
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn long_chain() {
        let tasks: Vec<Task> = (0..500)
            .map(|i| {
                let name = format!("t{:03}", i);
                if i == 0 {
                    task(&name, &[])
                } else {
                    task(&name, &[&format!("t{:03}", i - 1)])
                }
            })
            .collect();

        let graph = DependencyGraph::from_tasks(&tasks).unwrap();
        let order = graph.topological_order().unwrap();

        assert_eq!(order.len(), 500);
        assert_eq!(order.first(), Some(&id("t000")));
        assert_eq!(order.last(), Some(&id("t499")));
    }
}
