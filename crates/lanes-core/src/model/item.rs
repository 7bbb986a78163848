use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::id::{ColumnId, TaskId};

/// How pressing a task is. Persisted as an integer (1 = low .. 4 = urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Priority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Stored integer value.
    #[must_use]
    pub const fn level(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    #[must_use]
    pub const fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// What sort of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Task,
    Bug,
    Feature,
    Chore,
}

impl Default for TaskType {
    fn default() -> Self {
        Self::Task
    }
}

impl TaskType {
    pub const ALL: [Self; 4] = [Self::Task, Self::Bug, Self::Feature, Self::Chore];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Chore => "chore",
        }
    }
}

/// Kind tag carried by a relation edge.
///
/// The discriminants are the persisted values in `task_relations.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// `from` is the parent of `to`.
    ParentChild,
    /// `from` is blocked by `to`.
    Blocking,
    /// Informational link, no scheduling effect.
    Related,
}

impl Default for RelationKind {
    fn default() -> Self {
        Self::ParentChild
    }
}

impl RelationKind {
    pub const ALL: [Self; 3] = [Self::ParentChild, Self::Blocking, Self::Related];

    const fn as_str(self) -> &'static str {
        match self {
            Self::ParentChild => "parent_child",
            Self::Blocking => "blocking",
            Self::Related => "related",
        }
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParentChild => 1,
            Self::Blocking => 2,
            Self::Related => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::ParentChild),
            2 => Some(Self::Blocking),
            3 => Some(Self::Related),
            _ => None,
        }
    }
}

/// A directed, kind-tagged edge between two tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub from: TaskId,
    pub to: TaskId,
    pub kind: RelationKind,
}

impl Relation {
    #[must_use]
    pub const fn new(from: TaskId, to: TaskId, kind: RelationKind) -> Self {
        Self { from, to, kind }
    }

    /// The endpoint opposite to `task`, if `task` is on this edge.
    #[must_use]
    pub fn other(&self, task: TaskId) -> Option<TaskId> {
        if self.from == task {
            Some(self.to)
        } else if self.to == task {
            Some(self.from)
        } else {
            None
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.kind, self.to)
    }
}

/// A task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub task_type: TaskType,
    /// Zero-based, dense index within the column.
    pub position: i64,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "low" | "1" => Ok(Self::Low),
            "medium" | "normal" | "2" => Ok(Self::Medium),
            "high" | "3" => Ok(Self::High),
            "urgent" | "critical" | "4" => Ok(Self::Urgent),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for TaskType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "task" => Ok(Self::Task),
            "bug" => Ok(Self::Bug),
            "feature" | "feat" => Ok(Self::Feature),
            "chore" => Ok(Self::Chore),
            _ => Err(ParseEnumError {
                expected: "task type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for RelationKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "parent" | "parent_child" | "parent-child" | "child" => Ok(Self::ParentChild),
            "blocks" | "blocking" | "blocked_by" | "blocked-by" => Ok(Self::Blocking),
            "related" | "relates" | "related_to" => Ok(Self::Related),
            _ => Err(ParseEnumError {
                expected: "relation kind",
                got: s.to_string(),
            }),
        }
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.level()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let level = i64::column_result(value)?;
        Self::from_level(level).ok_or(FromSqlError::OutOfRange(level))
    }
}

impl ToSql for TaskType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        raw.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for RelationKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for RelationKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = i64::column_result(value)?;
        Self::from_code(code).ok_or(FromSqlError::OutOfRange(code))
    }
}
