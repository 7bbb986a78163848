//! Strongly typed row identifiers.
//!
//! Every entity is keyed by a positive SQLite `INTEGER PRIMARY KEY`. The
//! newtypes keep task, column and project ids from being mixed up at call
//! sites and bind directly as SQL parameters.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Entity label used in error messages.
            pub const LABEL: &'static str = $label;

            /// Raw integer value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Ids are assigned by SQLite and always start at 1.
            #[must_use]
            pub const fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
                digits.parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

row_id!(
    /// Identifier of a project (board).
    ProjectId,
    "project"
);

row_id!(
    /// Identifier of a column within a project.
    ColumnId,
    "column"
);

row_id!(
    /// Identifier of a task.
    TaskId,
    "task"
);

row_id!(
    /// Identifier of a project label.
    LabelId,
    "label"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_hash_prefixed_ids() {
        assert_eq!("42".parse::<TaskId>().expect("plain"), TaskId(42));
        assert_eq!(" #7 ".parse::<ColumnId>().expect("hash"), ColumnId(7));
        assert!("abc".parse::<ProjectId>().is_err());
    }

    #[test]
    fn only_positive_ids_are_valid() {
        assert!(TaskId(1).is_valid());
        assert!(!TaskId(0).is_valid());
        assert!(!TaskId(-3).is_valid());
    }

    #[test]
    fn ids_bind_as_sql_integers() -> rusqlite::Result<()> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let echoed: TaskId = conn.query_row("SELECT ?1", [TaskId(9)], |row| row.get(0))?;
        assert_eq!(echoed, TaskId(9));
        Ok(())
    }
}
