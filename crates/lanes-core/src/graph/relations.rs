//! In-memory relation graph over all task edges.
//!
//! # Overview
//!
//! Every relation is a tagged triple `(from, to, kind)` held in one adjacency
//! map. Parent/child, blocking and related edges live side by side: the kind
//! only matters when deriving blocked status, never for reachability.
//!
//! The graph is a snapshot. [`RelationGraph::load`] reads the current
//! `task_relations` table; mutating operations in [`crate::graph`] validate
//! against a snapshot and then write through the relation store.
//!
//! # Invariants
//!
//! - at most one edge per ordered pair `(from, to)`; inserting an existing
//!   pair replaces its kind
//! - no self-edges
//! - acyclic across all kinds combined

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use anyhow::Result;
use rusqlite::Connection;

use super::cycles::detect_cycle_on_add;
use crate::db::relations as store;
use crate::error::LanesError;
use crate::model::{ProjectId, Relation, RelationKind, TaskId};

// ---------------------------------------------------------------------------
// RelationGraph
// ---------------------------------------------------------------------------

/// Adjacency snapshot of relation edges.
///
/// Outgoing edges are keyed by source then target, so lookups of a specific
/// pair and ordered iteration are both cheap. A reverse index supports
/// "who points at me" queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    /// from → (to → kind)
    outgoing: HashMap<TaskId, BTreeMap<TaskId, RelationKind>>,
    /// to → set of from
    incoming: HashMap<TaskId, BTreeSet<TaskId>>,
}

impl RelationGraph {
    /// Build a graph from edge triples. Later duplicates of a pair win.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = Relation>,
    {
        let mut graph = Self::default();
        for edge in edges {
            graph.upsert_unchecked(edge);
        }
        graph
    }

    /// Load every edge from the relation store.
    ///
    /// # Errors
    ///
    /// Returns an error if the relation query fails.
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self::from_edges(store::list_all_edges(conn)?))
    }

    /// Load the edges of one project. Both endpoints of an edge always
    /// share a project, so this is the project's complete graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the relation query fails.
    pub fn load_project(conn: &Connection, project: ProjectId) -> Result<Self> {
        Ok(Self::from_edges(store::list_project_edges(conn, project)?))
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Kind of the edge `from → to`, if present.
    #[must_use]
    pub fn kind_of(&self, from: TaskId, to: TaskId) -> Option<RelationKind> {
        self.outgoing.get(&from).and_then(|targets| targets.get(&to)).copied()
    }

    /// All edges in deterministic order (by source, then target).
    #[must_use]
    pub fn edges(&self) -> Vec<Relation> {
        let mut sources: Vec<&TaskId> = self.outgoing.keys().collect();
        sources.sort_unstable();
        sources
            .into_iter()
            .flat_map(|from| {
                self.outgoing[from]
                    .iter()
                    .map(move |(to, kind)| Relation::new(*from, *to, *kind))
            })
            .collect()
    }

    /// Every edge touching `task`, outgoing first.
    #[must_use]
    pub fn edges_for(&self, task: TaskId) -> Vec<Relation> {
        let mut edges: Vec<Relation> = self
            .outgoing
            .get(&task)
            .into_iter()
            .flatten()
            .map(|(to, kind)| Relation::new(task, *to, *kind))
            .collect();
        for from in self.incoming.get(&task).into_iter().flatten() {
            if let Some(kind) = self.kind_of(*from, task) {
                edges.push(Relation::new(*from, task, kind));
            }
        }
        edges
    }

    /// Tasks reachable over one outgoing edge of `kind`.
    #[must_use]
    pub fn targets(&self, from: TaskId, kind: RelationKind) -> Vec<TaskId> {
        self.outgoing
            .get(&from)
            .into_iter()
            .flatten()
            .filter(|(_, k)| **k == kind)
            .map(|(to, _)| *to)
            .collect()
    }

    /// Tasks with an edge of `kind` pointing at `to`.
    #[must_use]
    pub fn sources(&self, to: TaskId, kind: RelationKind) -> Vec<TaskId> {
        self.incoming
            .get(&to)
            .into_iter()
            .flatten()
            .filter(|from| self.kind_of(**from, to) == Some(kind))
            .copied()
            .collect()
    }

    /// A task is blocked iff it is the source of at least one blocking edge.
    #[must_use]
    pub fn is_blocked(&self, task: TaskId) -> bool {
        self.outgoing
            .get(&task)
            .is_some_and(|targets| targets.values().any(|k| *k == RelationKind::Blocking))
    }

    /// Tasks `task` is waiting on.
    #[must_use]
    pub fn blockers(&self, task: TaskId) -> Vec<TaskId> {
        self.targets(task, RelationKind::Blocking)
    }

    /// Tasks waiting on `task`.
    #[must_use]
    pub fn dependents(&self, task: TaskId) -> Vec<TaskId> {
        self.sources(task, RelationKind::Blocking)
    }

    #[must_use]
    pub fn children(&self, task: TaskId) -> Vec<TaskId> {
        self.targets(task, RelationKind::ParentChild)
    }

    #[must_use]
    pub fn parents(&self, task: TaskId) -> Vec<TaskId> {
        self.sources(task, RelationKind::ParentChild)
    }

    /// Every task that is the source of a blocking edge.
    #[must_use]
    pub fn blocked_tasks(&self) -> BTreeSet<TaskId> {
        self.outgoing
            .keys()
            .filter(|task| self.is_blocked(**task))
            .copied()
            .collect()
    }

    /// Every task that appears on at least one edge.
    #[must_use]
    pub fn nodes(&self) -> BTreeSet<TaskId> {
        self.outgoing
            .keys()
            .chain(self.incoming.keys())
            .copied()
            .collect()
    }

    /// Shortest path `start → … → goal` following outgoing edges of any kind.
    ///
    /// Breadth-first; each node and edge is visited at most once, so the
    /// search is O(V+E).
    #[must_use]
    pub fn path_between(&self, start: TaskId, goal: TaskId) -> Option<Vec<TaskId>> {
        if start == goal {
            return Some(vec![start]);
        }

        let mut visited: HashSet<TaskId> = HashSet::from([start]);
        let mut parent: HashMap<TaskId, TaskId> = HashMap::new();
        let mut queue: VecDeque<TaskId> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.outgoing.get(&current).into_iter().flat_map(BTreeMap::keys) {
                if !visited.insert(*next) {
                    continue;
                }
                parent.insert(*next, current);
                if *next == goal {
                    let mut path = vec![goal];
                    let mut cursor = goal;
                    while let Some(prev) = parent.get(&cursor) {
                        path.push(*prev);
                        cursor = *prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(*next);
            }
        }

        None
    }

    /// `true` if `goal` is reachable from `start`.
    #[must_use]
    pub fn reaches(&self, start: TaskId, goal: TaskId) -> bool {
        self.path_between(start, goal).is_some()
    }

    /// Check that `edge` may be inserted without mutating anything.
    ///
    /// # Errors
    ///
    /// [`LanesError::SelfReference`] when both endpoints are the same task,
    /// [`LanesError::CircularDependency`] when `edge.to` already reaches
    /// `edge.from`.
    pub fn check_insert(&self, edge: Relation) -> Result<(), LanesError> {
        if edge.from == edge.to {
            return Err(LanesError::SelfReference(edge.from));
        }
        match detect_cycle_on_add(self, edge.from, edge.to) {
            Some(path) => Err(LanesError::CircularDependency {
                from: edge.from,
                to: edge.to,
                path,
            }),
            None => Ok(()),
        }
    }

    /// Validate and insert (or re-kind) an edge.
    ///
    /// Returns the previous kind when the pair already existed.
    ///
    /// # Errors
    ///
    /// See [`RelationGraph::check_insert`]. The graph is unchanged on error.
    pub fn insert(&mut self, edge: Relation) -> Result<Option<RelationKind>, LanesError> {
        self.check_insert(edge)?;
        Ok(self.upsert_unchecked(edge))
    }

    /// Remove `from → to`. Returns the removed kind.
    pub fn remove(&mut self, from: TaskId, to: TaskId) -> Option<RelationKind> {
        let targets = self.outgoing.get_mut(&from)?;
        let kind = targets.remove(&to)?;
        if targets.is_empty() {
            self.outgoing.remove(&from);
        }
        if let Some(sources) = self.incoming.get_mut(&to) {
            sources.remove(&from);
            if sources.is_empty() {
                self.incoming.remove(&to);
            }
        }
        Some(kind)
    }

    /// Drop every edge touching `task`. Returns how many were removed.
    pub fn remove_task(&mut self, task: TaskId) -> usize {
        let edges = self.edges_for(task);
        for edge in &edges {
            self.remove(edge.from, edge.to);
        }
        edges.len()
    }

    fn upsert_unchecked(&mut self, edge: Relation) -> Option<RelationKind> {
        self.incoming.entry(edge.to).or_default().insert(edge.from);
        self.outgoing
            .entry(edge.from)
            .or_default()
            .insert(edge.to, edge.kind)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
