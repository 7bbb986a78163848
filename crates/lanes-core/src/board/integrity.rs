//! Read-only invariant checker for one project.
//!
//! Collects every problem instead of stopping at the first, so `lanes check`
//! can show the whole picture. Nothing here writes.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use super::chain::ColumnChain;
use crate::db::{columns, relations, tasks};
use crate::error::Result;
use crate::graph::{cycles::find_cycle, relations::RelationGraph};
use crate::model::ProjectId;

/// Which invariant an issue violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ColumnChain,
    TaskPositions,
    RoleUniqueness,
    RelationCycle,
    RelationScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub kind: IssueKind,
    pub detail: String,
}

/// Outcome of [`check_project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub project: ProjectId,
    pub columns: usize,
    pub tasks: usize,
    pub relations: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, kind: IssueKind, detail: String) {
        self.issues.push(IntegrityIssue { kind, detail });
    }
}

/// Check chain shape, dense positions, role uniqueness and relation
/// acyclicity for `project`.
///
/// # Errors
///
/// Storage failures only; invariant violations are reported, not raised.
pub fn check_project(conn: &Connection, project: ProjectId) -> Result<IntegrityReport> {
    let column_rows = columns::list_project_columns(conn, project)?;
    let graph = RelationGraph::load_project(conn, project)?;
    let mut report = IntegrityReport {
        project,
        columns: column_rows.len(),
        tasks: 0,
        relations: graph.edge_count(),
        issues: Vec::new(),
    };

    if let Err(error) = ColumnChain::from_columns(&column_rows) {
        report.push(IssueKind::ColumnChain, error.to_string());
    }

    let mut role_holders: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for column in &column_rows {
        for role in column.roles.iter() {
            role_holders
                .entry(role.to_string())
                .or_default()
                .push(column.name.clone());
        }

        let rows = tasks::tasks_in_column(conn, column.id)?;
        report.tasks += rows.len();
        let positions: Vec<i64> = rows.iter().map(|t| t.position).collect();
        let dense = positions
            .iter()
            .zip(0_i64..)
            .all(|(position, expected)| *position == expected);
        if !dense {
            report.push(
                IssueKind::TaskPositions,
                format!("column '{}' has positions {positions:?}", column.name),
            );
        }
    }

    for (role, holders) in role_holders {
        if holders.len() > 1 {
            report.push(
                IssueKind::RoleUniqueness,
                format!("role {role} is held by {}", holders.join(", ")),
            );
        }
    }

    for edge in relations::list_project_edges(conn, project)? {
        if tasks::task_project(conn, edge.to)? != Some(project) {
            report.push(
                IssueKind::RelationScope,
                format!("relation {edge} leaves the project"),
            );
        }
    }

    if let Some(cycle) = find_cycle(&graph) {
        report.push(IssueKind::RelationCycle, cycle.to_string());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::columns as board_columns;
    use crate::context::OpContext;
    use crate::db::{open_in_memory, projects::insert_project};
    use crate::model::{ColumnRole, ColumnRoles};

    #[test]
    fn fresh_board_is_clean() {
        let conn = open_in_memory().expect("db");
        let project = insert_project(&conn, "p", "").expect("project");
        let ctx = OpContext::new(project.id);
        board_columns::insert_after(&conn, &ctx, "Todo", None, ColumnRoles::only(ColumnRole::Ready))
            .expect("todo");
        board_columns::insert_after(&conn, &ctx, "Done", None, ColumnRoles::none()).expect("done");

        let report = check_project(&conn, project.id).expect("check");
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.columns, 2);
    }

    #[test]
    fn reports_broken_chain_gapped_positions_and_cycles() {
        let conn = open_in_memory().expect("db");
        let project = insert_project(&conn, "p", "").expect("project");
        let ctx = OpContext::new(project.id);
        let a = board_columns::insert_after(&conn, &ctx, "A", None, ColumnRoles::none()).expect("a");
        board_columns::insert_after(&conn, &ctx, "B", None, ColumnRoles::none()).expect("b");

        // sever A -> B behind the engine's back
        conn.execute("UPDATE columns SET next_id = NULL WHERE id = ?1", [a.id.get()])
            .expect("sever");
        conn.execute_batch(&format!(
            "INSERT INTO tasks (column_id, title, position, created_at_us, updated_at_us)
             VALUES ({0}, 'x', 0, 0, 0), ({0}, 'y', 2, 0, 0);
             INSERT INTO task_relations (from_id, to_id, kind, created_at_us)
             VALUES (1, 2, 2, 0), (2, 1, 3, 0);",
            a.id.get()
        ))
        .expect("corrupt rows");

        let report = check_project(&conn, project.id).expect("check");
        let kinds: Vec<IssueKind> = report.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::ColumnChain));
        assert!(kinds.contains(&IssueKind::TaskPositions));
        assert!(kinds.contains(&IssueKind::RelationCycle));
        assert!(!report.is_clean());
    }
}
