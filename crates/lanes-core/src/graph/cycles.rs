//! Cycle detection for the relation graph.
//!
//! # Overview
//!
//! Relations of every kind form one directed graph, and that graph must stay
//! acyclic: a task cannot transitively be its own parent, blocker or
//! relative. Two checks live here:
//!
//! - [`detect_cycle_on_add`] answers "would adding `from → to` close a loop?"
//!   by searching for an existing path `to → … → from`. It runs before every
//!   edge insert.
//! - [`find_cycle`] scans a whole graph for any loop. Inserts never create
//!   one, so this only fires on data written behind the engine's back; the
//!   integrity checker uses it.
//!
//! Both are O(V+E).

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::HashMap;
use std::fmt;

use super::relations::RelationGraph;
use crate::model::TaskId;

// ---------------------------------------------------------------------------
// CyclePath
// ---------------------------------------------------------------------------

/// An ordered loop of task ids.
///
/// The first and last entries are the same task, so `[A, B, C, A]` reads
/// "A → B → C → A".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath {
    tasks: Vec<TaskId>,
}

impl CyclePath {
    #[must_use]
    pub const fn new(tasks: Vec<TaskId>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    /// Number of distinct tasks in the loop.
    pub fn len(&self) -> usize {
        self.tasks.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A two-task loop (`A → B → A`).
    pub fn is_mutual(&self) -> bool {
        self.len() == 2
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .tasks
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → ");
        if self.is_mutual() {
            write!(f, "mutual cycle: {joined}")
        } else {
            write!(f, "cycle ({} tasks): {joined}", self.len())
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Would adding `from → to` close a cycle?
///
/// Returns the loop the new edge would create, starting and ending at
/// `from`. A self-edge is reported as the one-task loop `[from, from]`.
pub fn detect_cycle_on_add(graph: &RelationGraph, from: TaskId, to: TaskId) -> Option<CyclePath> {
    if from == to {
        return Some(CyclePath::new(vec![from, from]));
    }

    let back = graph.path_between(to, from)?;
    let mut tasks = Vec::with_capacity(back.len() + 1);
    tasks.push(from);
    tasks.extend(back);
    Some(CyclePath::new(tasks))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the current DFS stack.
    Gray,
    /// Fully explored.
    Black,
}

/// Find any cycle in `graph`, scanning nodes in ascending id order.
pub fn find_cycle(graph: &RelationGraph) -> Option<CyclePath> {
    let mut color: HashMap<TaskId, Color> = HashMap::new();

    for root in graph.nodes() {
        if color.contains_key(&root) {
            continue;
        }

        // Iterative DFS: each frame is (node, remaining successors).
        let mut stack: Vec<(TaskId, Vec<TaskId>)> = vec![(root, successors(graph, root))];
        color.insert(root, Color::Gray);

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            let Some(next) = pending.pop() else {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            };

            match color.get(&next) {
                Some(Color::Gray) => {
                    let start = stack
                        .iter()
                        .position(|(id, _)| *id == next)
                        .unwrap_or_default();
                    let mut tasks: Vec<TaskId> = stack[start..].iter().map(|(id, _)| *id).collect();
                    tasks.push(next);
                    return Some(CyclePath::new(tasks));
                }
                Some(Color::Black) => {}
                None => {
                    color.insert(next, Color::Gray);
                    stack.push((next, successors(graph, next)));
                }
            }
        }
    }

    None
}

fn successors(graph: &RelationGraph, node: TaskId) -> Vec<TaskId> {
    let mut next: Vec<TaskId> = graph
        .edges_for(node)
        .into_iter()
        .filter(|edge| edge.from == node)
        .map(|edge| edge.to)
        .collect();
    // popped from the back, so reverse to visit in ascending order
    next.reverse();
    next
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
