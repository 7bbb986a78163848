//! Board data model: projects, columns, tasks and the edges between tasks.

pub mod board;
pub mod id;
pub mod item;

pub use board::{Column, ColumnRole, ColumnRoles, Comment, Label, Project};
pub use id::{ColumnId, LabelId, ProjectId, TaskId};
pub use item::{ParseEnumError, Priority, Relation, RelationKind, Task, TaskType};
