use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::id::{ColumnId, LabelId, ProjectId, TaskId};
use super::item::{ParseEnumError, normalize};

/// A board. Owns its columns, tasks and labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub created_at_us: i64,
}

/// The workflow role a column can be designated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Canonical holder of tasks that are ready to be picked up.
    Ready,
    InProgress,
    Completed,
}

impl ColumnRole {
    pub const ALL: [Self; 3] = [Self::Ready, Self::InProgress, Self::Completed];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Name of the boolean flag column in the `columns` table.
    #[must_use]
    pub const fn flag_column(self) -> &'static str {
        match self {
            Self::Ready => "holds_ready",
            Self::InProgress => "holds_in_progress",
            Self::Completed => "holds_completed",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s).replace('-', "_");
        match normalized.as_str() {
            "ready" | "todo" => Ok(Self::Ready),
            "in_progress" | "doing" | "started" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(ParseEnumError {
                expected: "column role",
                got: s.to_string(),
            }),
        }
    }
}

/// Role flags carried by a column row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub ready: bool,
    pub in_progress: bool,
    pub completed: bool,
}

impl ColumnRoles {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            ready: false,
            in_progress: false,
            completed: false,
        }
    }

    #[must_use]
    pub fn only(role: ColumnRole) -> Self {
        let mut roles = Self::none();
        roles.set(role, true);
        roles
    }

    #[must_use]
    pub const fn has(self, role: ColumnRole) -> bool {
        match role {
            ColumnRole::Ready => self.ready,
            ColumnRole::InProgress => self.in_progress,
            ColumnRole::Completed => self.completed,
        }
    }

    pub fn set(&mut self, role: ColumnRole, value: bool) {
        match role {
            ColumnRole::Ready => self.ready = value,
            ColumnRole::InProgress => self.in_progress = value,
            ColumnRole::Completed => self.completed = value,
        }
    }

    /// Roles that are switched on, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = ColumnRole> {
        ColumnRole::ALL.into_iter().filter(move |role| self.has(*role))
    }
}

/// A column row. `prev_id`/`next_id` link it into its project's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub project_id: ProjectId,
    pub name: String,
    pub prev_id: Option<ColumnId>,
    pub next_id: Option<ColumnId>,
    pub roles: ColumnRoles,
    pub created_at_us: i64,
}

impl Column {
    #[must_use]
    pub const fn is_head(&self) -> bool {
        self.prev_id.is_none()
    }

    #[must_use]
    pub const fn is_tail(&self) -> bool {
        self.next_id.is_none()
    }
}

/// A project-scoped label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub project_id: ProjectId,
    pub name: String,
}

/// A comment on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub task_id: TaskId,
    pub body: String,
    pub created_at_us: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_aliases_parse() {
        assert_eq!("Done".parse::<ColumnRole>(), Ok(ColumnRole::Completed));
        assert_eq!("in-progress".parse::<ColumnRole>(), Ok(ColumnRole::InProgress));
        assert_eq!("todo".parse::<ColumnRole>(), Ok(ColumnRole::Ready));
        assert!("backlog".parse::<ColumnRole>().is_err());
    }

    #[test]
    fn roles_set_and_iterate() {
        let mut roles = ColumnRoles::only(ColumnRole::Ready);
        roles.set(ColumnRole::Completed, true);
        assert!(roles.has(ColumnRole::Ready));
        assert!(!roles.has(ColumnRole::InProgress));
        assert_eq!(
            roles.iter().collect::<Vec<_>>(),
            vec![ColumnRole::Ready, ColumnRole::Completed]
        );
    }
}
