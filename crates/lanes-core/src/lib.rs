//! lanes-core: the engine behind the `lanes` kanban CLI.
//!
//! Tasks live in columns; columns form an ordered chain per project; tasks
//! relate to each other through typed, acyclic edges. [`service::Board`] is
//! the entry point adapters use. Everything below it is usable directly for
//! finer-grained work.
//!
//! # Conventions
//!
//! - **Errors**: engine operations return [`Result`] with a [`LanesError`];
//!   the storage layer in [`db`] uses `anyhow::Result` with context.
//! - **Logging**: `tracing` at `debug!`/`trace!` only. Subscribers are the
//!   adapter's business.
//! - **Interruption**: every operation takes an [`OpContext`] and checks it
//!   before each write.

pub mod board;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod graph;
pub mod model;
pub mod service;
pub mod validate;

pub use context::{DEFAULT_OP_TIMEOUT, OpContext};
pub use error::{ErrorCategory, ErrorCode, LanesError, Result};
pub use model::{
    Column, ColumnId, ColumnRole, ColumnRoles, Comment, Label, LabelId, Priority, Project,
    ProjectId, Relation, RelationKind, Task, TaskId, TaskType,
};
pub use service::{Board, NewTask, TaskUpdate};
