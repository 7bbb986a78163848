//! Relation edge rows.
//!
//! One row per ordered pair `(from_id, to_id)`. Writing an existing pair
//! replaces its kind. Validation (self-edges, cycles, project scope) happens
//! in [`crate::graph`] before anything reaches this module.

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};

use super::now_us;
use crate::model::{ProjectId, Relation, RelationKind, TaskId};

fn row_to_relation(row: &Row<'_>) -> rusqlite::Result<Relation> {
    Ok(Relation {
        from: row.get(0)?,
        to: row.get(1)?,
        kind: row.get(2)?,
    })
}

fn collect(stmt: &mut rusqlite::Statement<'_>, args: impl rusqlite::Params) -> Result<Vec<Relation>> {
    let rows = stmt
        .query_map(args, row_to_relation)
        .context("execute relation query")?;
    let mut edges = Vec::new();
    for row in rows {
        edges.push(row.context("read relation row")?);
    }
    Ok(edges)
}

/// Insert `edge`, or replace the kind of the existing pair.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn upsert_edge(conn: &Connection, edge: Relation) -> Result<()> {
    conn.execute(
        "INSERT INTO task_relations (from_id, to_id, kind, created_at_us) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(from_id, to_id) DO UPDATE SET kind = excluded.kind",
        params![edge.from, edge.to, edge.kind, now_us()],
    )
    .with_context(|| format!("upsert relation {edge}"))?;
    Ok(())
}

/// Delete `from → to`. Returns `false` when no such edge existed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_edge(conn: &Connection, from: TaskId, to: TaskId) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM task_relations WHERE from_id = ?1 AND to_id = ?2",
            params![from, to],
        )
        .with_context(|| format!("delete relation {from} -> {to}"))?;
    Ok(changed > 0)
}

/// Delete every edge where `task` is either endpoint. Returns rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_edges_touching(conn: &Connection, task: TaskId) -> Result<usize> {
    conn.execute(
        "DELETE FROM task_relations WHERE from_id = ?1 OR to_id = ?1",
        params![task],
    )
    .with_context(|| format!("delete relations touching task {task}"))
}

/// Every edge where `task` is either endpoint, outgoing first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_edges_for_task(conn: &Connection, task: TaskId) -> Result<Vec<Relation>> {
    let mut stmt = conn
        .prepare(
            "SELECT from_id, to_id, kind FROM task_relations
             WHERE from_id = ?1 OR to_id = ?1
             ORDER BY (from_id <> ?1), from_id, to_id",
        )
        .context("prepare list_edges_for_task")?;
    collect(&mut stmt, params![task])
}

/// Every edge in the store, ordered by `(from_id, to_id)`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_all_edges(conn: &Connection) -> Result<Vec<Relation>> {
    let mut stmt = conn
        .prepare("SELECT from_id, to_id, kind FROM task_relations ORDER BY from_id, to_id")
        .context("prepare list_all_edges")?;
    collect(&mut stmt, [])
}

/// Edges whose source task belongs to `project`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_project_edges(conn: &Connection, project: ProjectId) -> Result<Vec<Relation>> {
    let mut stmt = conn
        .prepare(
            "SELECT r.from_id, r.to_id, r.kind FROM task_relations r
             JOIN tasks t ON t.id = r.from_id
             JOIN columns c ON c.id = t.column_id
             WHERE c.project_id = ?1
             ORDER BY r.from_id, r.to_id",
        )
        .context("prepare list_project_edges")?;
    collect(&mut stmt, params![project])
}

/// `true` if `task` is the source of at least one edge of `kind`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn has_edge_from(conn: &Connection, task: TaskId, kind: RelationKind) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM task_relations WHERE from_id = ?1 AND kind = ?2)",
        params![task, kind],
        |row| row.get(0),
    )
    .with_context(|| format!("has_edge_from {task} kind {kind}"))
}
