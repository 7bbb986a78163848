use std::fmt;

use crate::graph::cycles::CyclePath;
use crate::model::{ColumnRole, TaskId};

/// Machine-readable error codes for callers that translate failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidId,
    InvalidField,
    SelfReference,
    CycleDetected,
    DuplicateName,
    ColumnNotEmpty,
    CrossProject,
    ProjectNotFound,
    ColumnNotFound,
    TaskNotFound,
    LabelNotFound,
    AlreadyInColumn,
    AlreadyFirst,
    AlreadyLast,
    NoNextColumn,
    NoPrevColumn,
    NoRoleColumn,
    DeadlineExceeded,
    Cancelled,
    CorruptChain,
    StorageFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidId => "E2001",
            Self::InvalidField => "E2002",
            Self::SelfReference => "E2003",
            Self::CycleDetected => "E2004",
            Self::DuplicateName => "E2005",
            Self::ColumnNotEmpty => "E2006",
            Self::CrossProject => "E2007",
            Self::ProjectNotFound => "E3001",
            Self::ColumnNotFound => "E3002",
            Self::TaskNotFound => "E3003",
            Self::LabelNotFound => "E3004",
            Self::AlreadyInColumn => "E4001",
            Self::AlreadyFirst => "E4101",
            Self::AlreadyLast => "E4102",
            Self::NoNextColumn => "E4103",
            Self::NoPrevColumn => "E4104",
            Self::NoRoleColumn => "E5001",
            Self::DeadlineExceeded => "E6001",
            Self::Cancelled => "E6002",
            Self::CorruptChain => "E9001",
            Self::StorageFailure => "E9002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Board database not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidId => "Invalid id",
            Self::InvalidField => "Invalid field value",
            Self::SelfReference => "Task cannot relate to itself",
            Self::CycleDetected => "Relation would create a cycle",
            Self::DuplicateName => "Name already in use",
            Self::ColumnNotEmpty => "Column still holds tasks",
            Self::CrossProject => "Entities belong to different projects",
            Self::ProjectNotFound => "Project not found",
            Self::ColumnNotFound => "Column not found",
            Self::TaskNotFound => "Task not found",
            Self::LabelNotFound => "Label not found",
            Self::AlreadyInColumn => "Task already in target column",
            Self::AlreadyFirst => "Task already first in column",
            Self::AlreadyLast => "Task already last in column",
            Self::NoNextColumn => "No next column",
            Self::NoPrevColumn => "No previous column",
            Self::NoRoleColumn => "No column designated for role",
            Self::DeadlineExceeded => "Operation deadline exceeded",
            Self::Cancelled => "Operation cancelled",
            Self::CorruptChain => "Column chain is corrupt",
            Self::StorageFailure => "Storage failure",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `lanes init` to create the board database."),
            Self::ConfigParseError => Some("Fix syntax in lanes/config.toml and retry."),
            Self::CycleDetected => Some("Remove one of the links on the reported path first."),
            Self::ColumnNotEmpty => Some("Move or delete the column's tasks before removing it."),
            Self::NoRoleColumn => Some("Designate one with `lanes column role <column> <role>`."),
            Self::ProjectNotFound => Some("Pass --project or set board.default_project in config."),
            Self::CorruptChain => Some("Run `lanes check` to see which links are broken."),
            Self::DeadlineExceeded => Some("Retry; raise board.op_timeout_secs if it persists."),
            _ => None,
        }
    }

    /// Process exit code a command-line adapter should use.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::AlreadyInColumn => 0,
            Self::NotInitialized | Self::ConfigParseError | Self::NoRoleColumn => 4,
            Self::ProjectNotFound | Self::ColumnNotFound | Self::TaskNotFound | Self::LabelNotFound => 3,
            Self::DeadlineExceeded | Self::Cancelled => 5,
            Self::CorruptChain | Self::StorageFailure => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Coarse failure families callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    /// Benign signal on a success path (nothing to do).
    State,
    Configuration,
    Boundary,
    Interrupted,
    Storage,
}

/// Errors raised by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum LanesError {
    #[error("task {0} cannot be related to itself")]
    SelfReference(TaskId),

    #[error("relation {from} -> {to} would create a {path}")]
    CircularDependency {
        from: TaskId,
        to: TaskId,
        path: CyclePath,
    },

    #[error("invalid {entity} id {value}: ids are positive integers")]
    InvalidId { entity: &'static str, value: i64 },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} is too long ({len} characters, maximum {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{entity} name '{name}' is already in use")]
    DuplicateName { entity: &'static str, name: String },

    #[error("column '{column}' still holds {tasks} task(s)")]
    ColumnNotEmpty { column: String, tasks: usize },

    #[error("{entity} {id} belongs to a different project")]
    CrossProject { entity: &'static str, id: i64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} '{name}' not found")]
    NameNotFound { entity: &'static str, name: String },

    #[error("task already in '{column}'")]
    AlreadyInTargetColumn { column: String },

    #[error("task {0} is already first in its column")]
    AlreadyFirst(TaskId),

    #[error("task {0} is already last in its column")]
    AlreadyLast(TaskId),

    #[error("no next column")]
    NoNextColumn,

    #[error("no previous column")]
    NoPrevColumn,

    #[error("no column is designated to hold {0} tasks")]
    NoRoleColumnConfigured(ColumnRole),

    #[error("deadline exceeded before step '{step}'")]
    DeadlineExceeded { step: &'static str },

    #[error("cancelled before step '{step}'")]
    Cancelled { step: &'static str },

    #[error("column chain is corrupt: {0}")]
    CorruptChain(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0:#}")]
    Db(#[from] anyhow::Error),
}

impl LanesError {
    pub(crate) const fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SelfReference(_) => ErrorCode::SelfReference,
            Self::CircularDependency { .. } => ErrorCode::CycleDetected,
            Self::InvalidId { .. } => ErrorCode::InvalidId,
            Self::EmptyField { .. } | Self::FieldTooLong { .. } => ErrorCode::InvalidField,
            Self::DuplicateName { .. } => ErrorCode::DuplicateName,
            Self::ColumnNotEmpty { .. } => ErrorCode::ColumnNotEmpty,
            Self::CrossProject { .. } => ErrorCode::CrossProject,
            Self::NotFound { entity, .. } | Self::NameNotFound { entity, .. } => match *entity {
                "project" => ErrorCode::ProjectNotFound,
                "column" => ErrorCode::ColumnNotFound,
                "label" => ErrorCode::LabelNotFound,
                _ => ErrorCode::TaskNotFound,
            },
            Self::AlreadyInTargetColumn { .. } => ErrorCode::AlreadyInColumn,
            Self::AlreadyFirst(_) => ErrorCode::AlreadyFirst,
            Self::AlreadyLast(_) => ErrorCode::AlreadyLast,
            Self::NoNextColumn => ErrorCode::NoNextColumn,
            Self::NoPrevColumn => ErrorCode::NoPrevColumn,
            Self::NoRoleColumnConfigured(_) => ErrorCode::NoRoleColumn,
            Self::DeadlineExceeded { .. } => ErrorCode::DeadlineExceeded,
            Self::Cancelled { .. } => ErrorCode::Cancelled,
            Self::CorruptChain(_) => ErrorCode::CorruptChain,
            Self::Sqlite(_) | Self::Db(_) => ErrorCode::StorageFailure,
        }
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::SelfReference(_)
            | Self::CircularDependency { .. }
            | Self::InvalidId { .. }
            | Self::EmptyField { .. }
            | Self::FieldTooLong { .. }
            | Self::DuplicateName { .. }
            | Self::ColumnNotEmpty { .. }
            | Self::CrossProject { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } | Self::NameNotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyInTargetColumn { .. } => ErrorCategory::State,
            Self::NoRoleColumnConfigured(_) => ErrorCategory::Configuration,
            Self::AlreadyFirst(_) | Self::AlreadyLast(_) | Self::NoNextColumn | Self::NoPrevColumn => {
                ErrorCategory::Boundary
            }
            Self::DeadlineExceeded { .. } | Self::Cancelled { .. } => ErrorCategory::Interrupted,
            Self::CorruptChain(_) | Self::Sqlite(_) | Self::Db(_) => ErrorCategory::Storage,
        }
    }

    /// `true` for signals that mean "nothing to do" rather than failure.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self.category(), ErrorCategory::State)
    }

    /// Remediation hint for the error's code.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Result alias for engine operations.
pub type Result<T, E = LanesError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 23] = [
        ErrorCode::NotInitialized,
        ErrorCode::ConfigParseError,
        ErrorCode::InvalidId,
        ErrorCode::InvalidField,
        ErrorCode::SelfReference,
        ErrorCode::CycleDetected,
        ErrorCode::DuplicateName,
        ErrorCode::ColumnNotEmpty,
        ErrorCode::CrossProject,
        ErrorCode::ProjectNotFound,
        ErrorCode::ColumnNotFound,
        ErrorCode::TaskNotFound,
        ErrorCode::LabelNotFound,
        ErrorCode::AlreadyInColumn,
        ErrorCode::AlreadyFirst,
        ErrorCode::AlreadyLast,
        ErrorCode::NoNextColumn,
        ErrorCode::NoPrevColumn,
        ErrorCode::NoRoleColumn,
        ErrorCode::DeadlineExceeded,
        ErrorCode::Cancelled,
        ErrorCode::CorruptChain,
        ErrorCode::StorageFailure,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let text = code.code();
            assert_eq!(text.len(), 5);
            assert!(text.starts_with('E'));
            assert!(text.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn already_in_column_is_benign_and_exits_zero() {
        let err = LanesError::AlreadyInTargetColumn {
            column: "Done".into(),
        };
        assert!(err.is_benign());
        assert_eq!(err.code().exit_code(), 0);
        assert_eq!(err.to_string(), "task already in 'Done'");
    }

    #[test]
    fn not_found_codes_follow_entity() {
        assert_eq!(
            LanesError::not_found("column", 3).code(),
            ErrorCode::ColumnNotFound
        );
        assert_eq!(
            LanesError::not_found("task", 3).code(),
            ErrorCode::TaskNotFound
        );
        assert_eq!(
            LanesError::not_found("project", 3).category(),
            ErrorCategory::NotFound
        );
    }

    #[test]
    fn boundary_and_configuration_categories() {
        assert_eq!(LanesError::NoNextColumn.category(), ErrorCategory::Boundary);
        assert_eq!(
            LanesError::NoRoleColumnConfigured(ColumnRole::Ready).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            LanesError::NoRoleColumnConfigured(ColumnRole::Ready).to_string(),
            "no column is designated to hold ready tasks"
        );
    }
}
