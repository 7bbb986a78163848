//! Canonical SQLite schema for the board database.
//!
//! The schema is normalized around three sub-stores the engine keeps
//! consistent:
//! - `columns` carries the per-project doubly linked chain (`prev_id`/`next_id`)
//!   and the role flags
//! - `tasks` carries the dense per-column `position`
//! - `task_relations` holds kind-tagged edges, one per ordered pair
//!
//! `labels`/`task_labels` and `comments` are owned by tasks and removed with
//! them. `schema_meta` records the applied schema version.

/// Migration v1: core tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE CHECK (length(trim(name)) > 0),
    description TEXT NOT NULL DEFAULT '',
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS columns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    prev_id INTEGER REFERENCES columns(id) ON DELETE SET NULL,
    next_id INTEGER REFERENCES columns(id) ON DELETE SET NULL,
    holds_ready INTEGER NOT NULL DEFAULT 0 CHECK (holds_ready IN (0, 1)),
    holds_in_progress INTEGER NOT NULL DEFAULT 0 CHECK (holds_in_progress IN (0, 1)),
    holds_completed INTEGER NOT NULL DEFAULT 0 CHECK (holds_completed IN (0, 1)),
    created_at_us INTEGER NOT NULL,
    CHECK (prev_id IS NULL OR prev_id <> id),
    CHECK (next_id IS NULL OR next_id <> id)
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    column_id INTEGER NOT NULL REFERENCES columns(id),
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    priority INTEGER NOT NULL DEFAULT 2 CHECK (priority BETWEEN 1 AND 4),
    task_type TEXT NOT NULL DEFAULT 'task'
        CHECK (task_type IN ('task', 'bug', 'feature', 'chore')),
    position INTEGER NOT NULL CHECK (position >= 0),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS task_relations (
    from_id INTEGER NOT NULL REFERENCES tasks(id),
    to_id INTEGER NOT NULL REFERENCES tasks(id),
    kind INTEGER NOT NULL CHECK (kind IN (1, 2, 3)),
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (from_id, to_id),
    CHECK (from_id <> to_id)
);

CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    name TEXT NOT NULL COLLATE NOCASE CHECK (length(trim(name)) > 0),
    UNIQUE (project_id, name)
);

CREATE TABLE IF NOT EXISTS task_labels (
    task_id INTEGER NOT NULL REFERENCES tasks(id),
    label_id INTEGER NOT NULL REFERENCES labels(id),
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (task_id, label_id)
);

CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL REFERENCES tasks(id),
    body TEXT NOT NULL CHECK (length(trim(body)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    migrated_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO schema_meta (id, schema_version, migrated_at_us) VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes plus the one-column-per-role guarantee.
///
/// The partial unique indexes make "at most one column per project holds
/// each role" a storage-level invariant rather than a convention.
pub const MIGRATION_V2_SQL: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_columns_project_name
    ON columns(project_id, name COLLATE NOCASE);

CREATE UNIQUE INDEX IF NOT EXISTS idx_columns_ready_role
    ON columns(project_id) WHERE holds_ready = 1;

CREATE UNIQUE INDEX IF NOT EXISTS idx_columns_in_progress_role
    ON columns(project_id) WHERE holds_in_progress = 1;

CREATE UNIQUE INDEX IF NOT EXISTS idx_columns_completed_role
    ON columns(project_id) WHERE holds_completed = 1;

CREATE INDEX IF NOT EXISTS idx_tasks_column_position
    ON tasks(column_id, position);

CREATE INDEX IF NOT EXISTS idx_task_relations_to
    ON task_relations(to_id, kind);

CREATE INDEX IF NOT EXISTS idx_task_labels_label
    ON task_labels(label_id, task_id);

CREATE INDEX IF NOT EXISTS idx_comments_task_created
    ON comments(task_id, created_at_us DESC);

UPDATE schema_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by the engine's query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_columns_project_name",
    "idx_columns_ready_role",
    "idx_columns_in_progress_role",
    "idx_columns_completed_role",
    "idx_tasks_column_position",
    "idx_task_relations_to",
    "idx_task_labels_label",
    "idx_comments_task_created",
];

/// Tables created by the migrations.
pub const REQUIRED_TABLES: &[&str] = &[
    "projects",
    "columns",
    "tasks",
    "task_relations",
    "labels",
    "task_labels",
    "comments",
    "schema_meta",
];
