//! Subcommand handlers and the plumbing they share.

pub mod check;
pub mod column;
pub mod comment;
pub mod completions;
pub mod create;
pub mod delete;
pub mod init;
pub mod label;
pub mod link;
pub mod list;
pub mod move_cmd;
pub mod project;
pub mod ready;
pub mod show;
pub mod update;

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use lanes_core::config::{self, LanesConfig};
use lanes_core::db;
use lanes_core::{Board, Column, ColumnId, ErrorCode, OpContext, Project, ProjectId, Task};
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::output::{CliError, OutputMode, Renderable};

/// Global flags every handler sees.
#[derive(Debug, Clone)]
pub struct Globals {
    pub project: Option<String>,
    pub db: Option<PathBuf>,
    pub output: OutputMode,
    pub config: LanesConfig,
}

/// An open board database plus the resolved settings for one invocation.
pub struct Session {
    pub conn: Connection,
    pub globals: Globals,
}

impl Session {
    /// Open an existing database.
    ///
    /// Fails with `E1001` when the file does not exist yet.
    pub fn open(globals: &Globals) -> anyhow::Result<Self> {
        let path = config::resolve_db_path(globals.db.as_deref(), &globals.config)?;
        let Some(conn) = db::try_open_db(&path)? else {
            return Err(CliError::from_code(
                ErrorCode::NotInitialized,
                format!("no board database at {}", path.display()),
            )
            .into());
        };
        debug!(path = %path.display(), "opened board database");
        Ok(Self {
            conn,
            globals: globals.clone(),
        })
    }

    /// Open the database, creating it when missing.
    pub fn create(globals: &Globals) -> anyhow::Result<Self> {
        let path = config::resolve_db_path(globals.db.as_deref(), &globals.config)?;
        let conn = db::open_db(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        debug!(path = %path.display(), "opened or created board database");
        Ok(Self {
            conn,
            globals: globals.clone(),
        })
    }

    pub const fn board(&self) -> Board<'_> {
        Board::new(&self.conn)
    }

    pub const fn output(&self) -> OutputMode {
        self.globals.output
    }

    /// Deadline budget for each engine call.
    pub fn op_timeout(&self) -> Duration {
        self.globals.config.board.op_timeout()
    }

    /// Context scoped to an already resolved project.
    pub fn context_for(&self, project: ProjectId) -> OpContext {
        OpContext::with_timeout(project, self.op_timeout())
    }

    /// The project selected by `--project`, then `board.default_project`,
    /// then the only project when exactly one exists.
    pub fn project(&self) -> anyhow::Result<Project> {
        let board = self.board();
        let key = self
            .globals
            .project
            .as_deref()
            .or(self.globals.config.board.default_project.as_deref());
        if let Some(key) = key {
            return Ok(board.find_project(key)?);
        }

        let mut projects = board.list_projects()?;
        if projects.len() == 1 {
            return Ok(projects.remove(0));
        }
        Err(CliError::from_code(
            ErrorCode::ProjectNotFound,
            format!(
                "no project selected ({} projects exist)",
                projects.len()
            ),
        )
        .into())
    }

    /// Context scoped to the selected project.
    pub fn context(&self) -> anyhow::Result<OpContext> {
        let project = self.project()?;
        Ok(self.context_for(project.id))
    }
}

/// Resolve a column by id (`3`, `#3`) or case-insensitive name.
pub fn resolve_column(board: &Board<'_>, ctx: &OpContext, key: &str) -> anyhow::Result<Column> {
    if let Ok(id) = key.parse::<ColumnId>() {
        if let Some(column) = board
            .list_columns(ctx)?
            .into_iter()
            .find(|c| c.id == id)
        {
            return Ok(column);
        }
    }
    Ok(board.find_column(ctx, key)?)
}

/// A task as listed: the row plus its column name and blocked flag.
#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub column: String,
    pub blocked: bool,
}

impl TaskView {
    /// Attach column names and blocked flags to `tasks`.
    pub fn collect(
        board: &Board<'_>,
        ctx: &OpContext,
        tasks: Vec<Task>,
    ) -> anyhow::Result<Vec<Self>> {
        let names: HashMap<ColumnId, String> = board
            .list_columns(ctx)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        tasks
            .into_iter()
            .map(|task| {
                Ok(Self {
                    blocked: board.is_blocked(ctx, task.id)?,
                    column: names.get(&task.column_id).cloned().unwrap_or_default(),
                    task,
                })
            })
            .collect()
    }
}

impl Renderable for TaskView {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let flag = if self.blocked { " [blocked]" } else { "" };
        writeln!(
            w,
            "{:<6} {:<14} {:<7} {}{flag}",
            format!("#{}", self.task.id),
            self.column,
            self.task.priority.to_string(),
            self.task.title
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}",
            self.task.id,
            self.column,
            self.task.position,
            self.task.priority,
            self.task.task_type,
            if self.blocked { "blocked" } else { "-" },
            self.task.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "COLUMN", "POS", "PRIORITY", "TYPE", "BLOCKED", "TITLE"]
    }
}

impl Renderable for Column {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let roles: Vec<String> = self.roles.iter().map(|role| role.to_string()).collect();
        if roles.is_empty() {
            writeln!(w, "{:<6} {}", format!("#{}", self.id), self.name)
        } else {
            writeln!(w, "{:<6} {} ({})", format!("#{}", self.id), self.name, roles.join(", "))
        }
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let roles: Vec<String> = self.roles.iter().map(|role| role.to_string()).collect();
        let roles = if roles.is_empty() {
            "-".to_string()
        } else {
            roles.join(",")
        };
        writeln!(w, "{}  {}  {roles}", self.id, self.name)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "ROLES"]
    }
}

impl Renderable for Project {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.description.is_empty() {
            writeln!(w, "{:<6} {}", format!("#{}", self.id), self.name)
        } else {
            writeln!(w, "{:<6} {}  {}", format!("#{}", self.id), self.name, self.description)
        }
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}", self.id, self.name)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME"]
    }
}

/// Format a microsecond timestamp as RFC 3339 (UTC).
pub fn format_us(us: i64) -> String {
    chrono::DateTime::from_timestamp_micros(us)
        .map_or_else(|| us.to_string(), |dt| dt.format("%Y-%m-%d %H:%M:%SZ").to_string())
}
