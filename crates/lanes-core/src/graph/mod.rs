//! Task relation graph.
//!
//! ## Submodules
//!
//! - [`relations`]: in-memory adjacency snapshot and edge validation.
//! - [`cycles`]: cycle path type, add-time detection and full scans.
//! - [`blocking`]: blocked status and the ready/blocked task sets.
//!
//! The functions here are the persisted entry points: they load a snapshot,
//! validate against it, and only then write through [`crate::db::relations`].

pub mod blocking;
pub mod cycles;
pub mod relations;

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::board::task_in_scope;
use crate::context::OpContext;
use crate::db::relations as store;
use crate::error::{LanesError, Result};
use crate::model::{Relation, RelationKind, TaskId};
use relations::RelationGraph;

/// Add (or re-kind) the edge `from → to`.
///
/// Returns the previous kind when the pair already existed.
///
/// # Errors
///
/// Id validation, [`crate::LanesError::NotFound`] or
/// [`crate::LanesError::CrossProject`] for either endpoint,
/// [`crate::LanesError::SelfReference`],
/// [`crate::LanesError::CircularDependency`], interruption, or storage
/// failures. Nothing is written on error.
pub fn add_edge(
    conn: &Connection,
    ctx: &OpContext,
    from: TaskId,
    to: TaskId,
    kind: RelationKind,
) -> Result<Option<RelationKind>> {
    if from == to {
        return Err(LanesError::SelfReference(from));
    }
    task_in_scope(conn, ctx, from)?;
    task_in_scope(conn, ctx, to)?;

    let edge = Relation::new(from, to, kind);
    let mut graph = RelationGraph::load_project(conn, ctx.project())?;
    let previous = graph.insert(edge)?;
    ctx.check("write relation")?;
    store::upsert_edge(conn, edge)?;
    debug!(%from, %to, %kind, replaced = ?previous, "relation added");
    Ok(previous)
}

/// Remove `from → to`. Absence is not an error; the return value says
/// whether an edge was removed.
///
/// # Errors
///
/// Id validation, scope, interruption, or storage failures.
pub fn remove_edge(conn: &Connection, ctx: &OpContext, from: TaskId, to: TaskId) -> Result<bool> {
    task_in_scope(conn, ctx, from)?;
    task_in_scope(conn, ctx, to)?;
    ctx.check("delete relation")?;
    let removed = store::delete_edge(conn, from, to)?;
    debug!(%from, %to, removed, "relation removed");
    Ok(removed)
}

/// Every edge touching `task`, outgoing first.
///
/// # Errors
///
/// Scope or storage failures.
pub fn edges_for(conn: &Connection, ctx: &OpContext, task: TaskId) -> Result<Vec<Relation>> {
    task_in_scope(conn, ctx, task)?;
    Ok(store::list_edges_for_task(conn, task)?)
}

/// The typed neighbourhood of one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Neighbours {
    /// Tasks this one waits on.
    pub blockers: Vec<TaskId>,
    /// Tasks waiting on this one.
    pub dependents: Vec<TaskId>,
    pub parents: Vec<TaskId>,
    pub children: Vec<TaskId>,
    /// Related tasks in either direction.
    pub related: Vec<TaskId>,
}

/// Blockers, dependents, parents, children and related tasks of `task`.
///
/// # Errors
///
/// Scope or storage failures.
pub fn neighbours(conn: &Connection, ctx: &OpContext, task: TaskId) -> Result<Neighbours> {
    task_in_scope(conn, ctx, task)?;
    let graph = RelationGraph::load_project(conn, ctx.project())?;
    let mut related = graph.targets(task, RelationKind::Related);
    related.extend(graph.sources(task, RelationKind::Related));
    related.sort_unstable();
    related.dedup();
    Ok(Neighbours {
        blockers: graph.blockers(task),
        dependents: graph.dependents(task),
        parents: graph.parents(task),
        children: graph.children(task),
        related,
    })
}
