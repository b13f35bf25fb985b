use std::collections::{HashMap, HashSet};

use crate::error::GraphError;
use crate::model::Task;

/// Task dependency graph (DAG)
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    /// Dependency edges: task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Original insertion order (for stable sorting)
    insertion_order: Vec<String>,
}

impl TaskGraph {
    /// Construct task graph from task list
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Result<Self, GraphError> {
        let mut graph = Self::default();

        for task in tasks {
            if graph.edges.contains_key(&task.id) {
                return Err(GraphError::DuplicateTaskId(task.id.clone()));
            }

            graph
                .edges
                .insert(task.id.clone(), task.dependencies.clone());
            graph.insertion_order.push(task.id.clone());

            for dep in &task.dependencies {
                graph
                    .reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
            }
        }

        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    pub fn dependents(&self, task_id: &str) -> &[String] {
        self.reverse_edges
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validate dependency relationships
    pub fn validate(&self) -> Result<(), GraphError> {
        for task_id in &self.insertion_order {
            for dep in &self.edges[task_id] {
                if !self.edges.contains_key(dep) {
                    return Err(GraphError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = self.cycle_path() {
            return Err(GraphError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Topological sort using Kahn's algorithm
    ///
    /// Returns execution stages where tasks in the same stage can run in parallel,
    /// each stage in insertion order.
    pub fn topological_sort(&self) -> Result<Vec<Vec<String>>, GraphError> {
        // edges[A] = [B, C] means A depends on B and C, so A's in-degree is 2.
        // Dependencies outside the graph are ignored here; `validate` reports them.
        let mut in_degree: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .map(|id| {
                let known = self.edges[id]
                    .iter()
                    .filter(|d| self.edges.contains_key(*d))
                    .count();
                (id.as_str(), known)
            })
            .collect();

        let mut stages: Vec<Vec<String>> = Vec::new();
        let mut current_stage: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|id| in_degree[id.as_str()] == 0)
            .cloned()
            .collect();

        let mut processed = 0;

        while !current_stage.is_empty() {
            processed += current_stage.len();

            let mut next_stage = Vec::new();
            for task_id in &current_stage {
                for dependent in self.dependents(task_id) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            next_stage.push(dependent.clone());
                        }
                    }
                }
            }

            next_stage.sort_by_key(|id| self.position(id));
            stages.push(std::mem::replace(&mut current_stage, next_stage));
        }

        if processed != self.len() {
            let cycle = self
                .cycle_path()
                .unwrap_or_else(|| "unable to complete topological sort".to_string());
            return Err(GraphError::CircularDependency(cycle));
        }

        Ok(stages)
    }

    /// First dependency cycle found, formatted as `a -> b -> a`.
    pub fn cycle_path(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(stack.join(" -> "));
            }
        }

        None
    }

    fn position(&self, id: &str) -> usize {
        self.insertion_order
            .iter()
            .position(|k| k == id)
            .unwrap_or(usize::MAX)
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        if let Some(dependencies) = self.edges.get(node) {
            for dep in dependencies {
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(dep.clone());
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Contract;
    use pretty_assertions::assert_eq;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, id, 1, Contract::new(id))
            .unwrap()
            .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_stages_follow_insertion_order() {
        let tasks = vec![
            task("report", &["clean", "fetch"]),
            task("fetch", &[]),
            task("clean", &["fetch"]),
            task("notify", &[]),
        ];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        assert_eq!(
            graph.topological_sort().unwrap(),
            vec![
                vec!["fetch".to_string(), "notify".to_string()],
                vec!["clean".to_string()],
                vec!["report".to_string()],
            ]
        );
    }

    #[test]
    fn test_cycle_detected_with_path() {
        let tasks = vec![task("a", &["c"]), task("b", &["a"]), task("c", &["b"])];
        let graph = TaskGraph::from_tasks(&tasks).unwrap();
        assert_eq!(graph.cycle_path().as_deref(), Some("a -> c -> b -> a"));
        assert!(matches!(
            graph.validate(),
            Err(GraphError::CircularDependency(_))
        ));
        assert!(graph.topological_sort().is_err());
    }

    #[test]
    fn test_missing_dependency() {
        let mut orphan = task("b", &[]);
        orphan.dependencies.push("ghost".into());
        let graph = TaskGraph::from_tasks([&orphan]).unwrap();
        assert_eq!(
            graph.validate(),
            Err(GraphError::DependencyNotFound {
                task_id: "b".into(),
                missing_dep: "ghost".into(),
            })
        );
    }

    #[test]
    fn test_duplicate_id() {
        let tasks = vec![task("a", &[]), task("a", &[])];
        assert_eq!(
            TaskGraph::from_tasks(&tasks).unwrap_err(),
            GraphError::DuplicateTaskId("a".into())
        );
    }
}
